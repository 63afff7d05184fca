//! Elevation lookup with normalised results
//!
//! Whatever shape the raster provider reports, the probe returns either a
//! usable elevation or `None`. Lookup failures never escape the probe.

use log::debug;

use crate::coordinate::{CoordinateTransform, Point};
use crate::raster::{RasterValueProvider, RawSample, RawValue};

/// Reduces a raw provider result to an elevation
///
/// The result is `None` when the success flag is false, the value is not
/// numeric, is NaN, or equals the band's no-data sentinel.
pub fn normalize_sample(raw: &RawSample, nodata: Option<f64>) -> Option<f64> {
    let value = match raw {
        RawSample::Flagged { ok: false, .. } => return None,
        RawSample::Flagged { ok: true, value } => value,
        RawSample::Bare(value) => value,
        RawSample::Wrapped(values) => values.first()?,
    };

    let number = match value {
        RawValue::Number(v) => *v,
        RawValue::Integer(v) => *v as f64,
        RawValue::Text(text) => text.trim().parse::<f64>().ok()?,
        RawValue::Null => return None,
    };

    if number.is_nan() {
        return None;
    }
    if nodata == Some(number) {
        return None;
    }
    Some(number)
}

/// Samples one raster band at planar positions
pub struct ElevationProbe {
    provider: Box<dyn RasterValueProvider>,
    band: usize,
    nodata: Option<f64>,
    to_raster: Option<Box<dyn CoordinateTransform>>,
}

impl ElevationProbe {
    /// Binds a provider band
    ///
    /// # Arguments
    /// * `provider` - Raster value source
    /// * `band` - 1-based band index
    /// * `to_raster` - Transform from the sampling frame into the raster
    ///   frame, `None` when both frames match
    pub fn new(
        provider: Box<dyn RasterValueProvider>,
        band: usize,
        to_raster: Option<Box<dyn CoordinateTransform>>,
    ) -> Self {
        let band = band.max(1);
        let nodata = provider.nodata(band);
        ElevationProbe {
            provider,
            band,
            nodata,
            to_raster,
        }
    }

    pub fn band(&self) -> usize {
        self.band
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Elevation at `point`, or `None` when it cannot be measured
    pub fn sample(&self, point: &Point) -> Option<f64> {
        let target = match &self.to_raster {
            Some(transform) => match transform.transform(point) {
                Ok(p) => p,
                Err(e) => {
                    debug!("Elevation transform failed at ({}, {}): {}", point.x, point.y, e);
                    return None;
                }
            },
            None => *point,
        };

        match self.provider.sample_band(&target, self.band) {
            Ok(raw) => normalize_sample(&raw, self.nodata),
            Err(e) => {
                debug!("Elevation lookup failed at ({}, {}): {}", target.x, target.y, e);
                None
            }
        }
    }
}
