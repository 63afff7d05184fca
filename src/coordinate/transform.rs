//! Coordinate transformation functionality
//!
//! Supports WGS84, Web Mercator and UTM on the WGS84 ellipsoid. Any two
//! supported systems are connected by going through WGS84.

use std::f64::consts::PI;

use super::crs::CoordinateSystem;
use super::point::Point;
use crate::errors::{ProcessError, ProcessResult};

/// Transforms points from one frame into another
pub trait CoordinateTransform {
    /// Transform a single point
    fn transform(&self, point: &Point) -> ProcessResult<Point>;
}

/// Transform between two coordinate systems
#[derive(Debug, Clone, Copy)]
pub struct CrsTransform {
    from: CoordinateSystem,
    to: CoordinateSystem,
}

// WGS84 ellipsoid
const SEMI_MAJOR: f64 = 6378137.0;
const FLATTENING: f64 = 1.0 / 298.257223563;
const UTM_SCALE: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10000000.0;

impl CrsTransform {
    /// Create a transform from `from` into `to`
    pub fn new(from: CoordinateSystem, to: CoordinateSystem) -> Self {
        CrsTransform { from, to }
    }

    pub fn source(&self) -> CoordinateSystem {
        self.from
    }

    pub fn target(&self) -> CoordinateSystem {
        self.to
    }

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(lon: f64, lat: f64) -> Point {
        // Maximum latitude for Web Mercator is ~85.05 degrees
        let lat = lat.max(-85.05).min(85.05);

        let x = lon * SEMI_MAJOR * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * SEMI_MAJOR;

        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (SEMI_MAJOR * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / SEMI_MAJOR)) - PI / 2.0);

        Point::new(lon, lat)
    }

    /// Project geographic coordinates into a UTM zone
    pub fn wgs84_to_utm(lon: f64, lat: f64, zone: u8, north: bool) -> Point {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let ep2 = e2 / (1.0 - e2);
        let lon0 = utm_central_meridian(zone).to_radians();
        let phi = lat.to_radians();
        let lam = lon.to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = SEMI_MAJOR / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = phi.tan().powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lam - lon0);
        let m = meridian_arc(phi, e2);

        let x = UTM_SCALE * n * (a
            + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + UTM_FALSE_EASTING;
        let mut y = UTM_SCALE * (m + n * phi.tan() * (a * a / 2.0
            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
        if !north {
            y += UTM_FALSE_NORTHING_SOUTH;
        }

        Point::new(x, y)
    }

    /// Unproject UTM coordinates to geographic longitude/latitude
    pub fn utm_to_wgs84(x: f64, y: f64, zone: u8, north: bool) -> Point {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let ep2 = e2 / (1.0 - e2);
        let lon0 = utm_central_meridian(zone).to_radians();
        let northing = if north { y } else { y - UTM_FALSE_NORTHING_SOUTH };

        let m = northing / UTM_SCALE;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let mu = m / (SEMI_MAJOR * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let n1 = SEMI_MAJOR / (1.0 - e2 * sin1 * sin1).sqrt();
        let t1 = phi1.tan().powi(2);
        let c1 = ep2 * cos1 * cos1;
        let r1 = SEMI_MAJOR * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
        let d = (x - UTM_FALSE_EASTING) / (n1 * UTM_SCALE);

        let phi = phi1 - (n1 * phi1.tan() / r1) * (d * d / 2.0
            - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
            + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d.powi(6) / 720.0);
        let lam = lon0 + (d
            - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
            / cos1;

        Point::new(lam.to_degrees(), phi.to_degrees())
    }

    fn to_wgs84(point: &Point, from: &CoordinateSystem) -> ProcessResult<Point> {
        match from {
            CoordinateSystem::WGS84 => Ok(*point),
            CoordinateSystem::WebMercator => Ok(Self::web_mercator_to_wgs84(point.x, point.y)),
            CoordinateSystem::UTM(zone, north) => Ok(Self::utm_to_wgs84(point.x, point.y, *zone, *north)),
            CoordinateSystem::Other(_) => Err(unsupported(from, &CoordinateSystem::WGS84)),
        }
    }

    fn from_wgs84(point: &Point, to: &CoordinateSystem) -> ProcessResult<Point> {
        match to {
            CoordinateSystem::WGS84 => Ok(*point),
            CoordinateSystem::WebMercator => Ok(Self::wgs84_to_web_mercator(point.x, point.y)),
            CoordinateSystem::UTM(zone, north) => Ok(Self::wgs84_to_utm(point.x, point.y, *zone, *north)),
            CoordinateSystem::Other(_) => Err(unsupported(&CoordinateSystem::WGS84, to)),
        }
    }
}

impl CoordinateTransform for CrsTransform {
    fn transform(&self, point: &Point) -> ProcessResult<Point> {
        if self.from == self.to {
            return Ok(*point);
        }
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(ProcessError::TransformError(format!(
                "Non-finite coordinate ({}, {})", point.x, point.y
            )));
        }

        let geographic = Self::to_wgs84(point, &self.from)
            .map_err(|_| unsupported(&self.from, &self.to))?;
        Self::from_wgs84(&geographic, &self.to)
            .map_err(|_| unsupported(&self.from, &self.to))
    }
}

fn utm_central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Length of the meridian arc from the equator to latitude `phi`
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    SEMI_MAJOR * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

fn unsupported(from: &CoordinateSystem, to: &CoordinateSystem) -> ProcessError {
    ProcessError::TransformError(format!(
        "Unsupported coordinate transformation from {} to {}",
        from.description(), to.description()
    ))
}
