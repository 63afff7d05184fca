//! GeoJSON feature reader
//!
//! Accepts a FeatureCollection, a single Feature or a bare Geometry.
//! LineString and MultiLineString become line geometries; anything else is
//! reported as a non-line geometry so the driver can skip it.

use geojson::{GeoJson, Position, Value};
use log::{debug, info};
use std::fs;
use std::path::Path;

use crate::coordinate::{CoordinateSystem, CoordinateSystemFactory, Point};
use crate::errors::{ProcessError, ProcessResult};
use crate::geometry::LineGeometry;
use crate::sampling::FieldValue;

/// Geometry of an input feature
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Line(LineGeometry),
    /// No geometry, or a line without any usable part
    Empty,
    /// A geometry of another type, named by its GeoJSON type
    Other(&'static str),
}

/// One input feature
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// GeoJSON id, or the zero-based position in the file
    pub id: String,
    pub geometry: FeatureGeometry,
    /// Properties in file order
    pub attributes: Vec<(String, FieldValue)>,
}

impl Feature {
    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// All features of an input file plus its declared CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureSource {
    pub features: Vec<Feature>,
    /// CRS named in the legacy `crs` member, when present
    pub crs: Option<CoordinateSystem>,
}

/// Reads features from a GeoJSON file
pub fn read_features<P: AsRef<Path>>(path: P) -> ProcessResult<FeatureSource> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProcessError::Precondition(format!("Input file not found: {}", path.display())));
    }
    info!("Reading line features from {}", path.display());
    let text = fs::read_to_string(path)?;
    parse_features(&text)
}

/// Parses GeoJSON text into features
pub fn parse_features(text: &str) -> ProcessResult<FeatureSource> {
    let geojson: GeoJson = serde_json::from_str(text)?;

    let source = match geojson {
        GeoJson::FeatureCollection(collection) => {
            let crs = collection
                .foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .and_then(crs_from_member);
            let features = collection
                .features
                .into_iter()
                .enumerate()
                .map(|(index, feature)| convert_feature(index, feature))
                .collect();
            FeatureSource { features, crs }
        },
        GeoJson::Feature(feature) => FeatureSource {
            features: vec![convert_feature(0, feature)],
            crs: None,
        },
        GeoJson::Geometry(geometry) => FeatureSource {
            features: vec![Feature {
                id: "0".to_string(),
                geometry: convert_geometry(&geometry.value),
                attributes: Vec::new(),
            }],
            crs: None,
        },
    };

    debug!("Parsed {} feature(s), declared CRS {:?}", source.features.len(), source.crs);
    Ok(source)
}

fn convert_feature(index: usize, feature: geojson::Feature) -> Feature {
    let id = match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    };

    let geometry = feature
        .geometry
        .as_ref()
        .map(|g| convert_geometry(&g.value))
        .unwrap_or(FeatureGeometry::Empty);

    let attributes = feature
        .properties
        .as_ref()
        .map(|props| {
            props.iter()
                .map(|(name, value)| (name.clone(), FieldValue::from_json(value)))
                .collect()
        })
        .unwrap_or_default();

    Feature { id, geometry, attributes }
}

fn convert_geometry(value: &Value) -> FeatureGeometry {
    let parts = match value {
        Value::LineString(line) => vec![to_points(line)],
        Value::MultiLineString(lines) => lines.iter().map(|line| to_points(line)).collect(),
        Value::Point(_) => return FeatureGeometry::Other("Point"),
        Value::MultiPoint(_) => return FeatureGeometry::Other("MultiPoint"),
        Value::Polygon(_) => return FeatureGeometry::Other("Polygon"),
        Value::MultiPolygon(_) => return FeatureGeometry::Other("MultiPolygon"),
        Value::GeometryCollection(_) => return FeatureGeometry::Other("GeometryCollection"),
    };

    let geometry = LineGeometry::from_parts(parts);
    if geometry.is_empty() {
        FeatureGeometry::Empty
    } else {
        FeatureGeometry::Line(geometry)
    }
}

fn to_points(positions: &[Position]) -> Vec<Point> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Point::new(p[0], p[1]))
        .collect()
}

/// Extracts an EPSG code from a named CRS member
///
/// Handles both `EPSG:32631` and `urn:ogc:def:crs:EPSG::32631`.
fn crs_from_member(member: &serde_json::Value) -> Option<CoordinateSystem> {
    let name = member.get("properties")?.get("name")?.as_str()?;
    let upper = name.to_uppercase();
    if !upper.contains("EPSG") {
        return None;
    }
    let code = upper.rsplit(':').next()?.parse::<u32>().ok()?;
    Some(CoordinateSystemFactory::from_epsg(code))
}
