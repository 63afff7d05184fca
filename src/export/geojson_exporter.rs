//! GeoJSON point export

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use log::{debug, info};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use super::naming::output_file_name;
use super::{ExportSink, RowGroup};
use crate::coordinate::CoordinateSystem;
use crate::errors::ProcessResult;

/// Writes each group as a point FeatureCollection in the working planar CRS
pub struct GeoJsonPointExporter {
    output_dir: PathBuf,
    crs: CoordinateSystem,
}

impl GeoJsonPointExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P, crs: CoordinateSystem) -> Self {
        GeoJsonPointExporter {
            output_dir: output_dir.as_ref().to_path_buf(),
            crs,
        }
    }

    fn build_collection(&self, group: &RowGroup) -> FeatureCollection {
        let features = group
            .rows
            .iter()
            .zip(&group.points)
            .map(|(row, point)| {
                let properties: JsonObject = row
                    .fields()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect();
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![point.x, point.y]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", self.crs.epsg_code()) }
            }),
        );

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        }
    }
}

impl ExportSink for GeoJsonPointExporter {
    fn name(&self) -> &str {
        "geojson"
    }

    fn write_group(&self, group: &RowGroup, label: &str) -> ProcessResult<Option<PathBuf>> {
        if group.is_empty() {
            debug!("Group '{}' has no points, nothing written", group.key);
            return Ok(None);
        }

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(output_file_name(&group.key, label, "geojson"));

        let collection = self.build_collection(group);
        fs::write(&path, serde_json::to_string_pretty(&collection)?)?;

        info!("Wrote {} point(s) to {}", group.len(), path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Point;
    use crate::input::{parse_features, FeatureGeometry};
    use crate::sampling::{FieldValue, Row};

    #[test]
    fn test_point_collection_round_trips_through_reader() {
        let dir = std::env::temp_dir().join(format!("linenode_geojson_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut group = RowGroup::new("feat_0");
        let mut row = Row::new();
        row.insert("KP", 2.5);
        row.insert("Elevation", FieldValue::Missing);
        group.push(row, Point::new(500002.5, 10.0));

        let exporter = GeoJsonPointExporter::new(&dir, CoordinateSystem::UTM(31, true));
        let path = exporter.write_group(&group, "2.5").unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "feat_0_2.5_node.geojson");

        let text = fs::read_to_string(&path).unwrap();
        let source = parse_features(&text).unwrap();
        assert_eq!(source.crs, Some(CoordinateSystem::UTM(31, true)));
        assert_eq!(source.features.len(), 1);
        assert_eq!(source.features[0].geometry, FeatureGeometry::Other("Point"));
        assert_eq!(source.features[0].attribute("KP"), Some(&FieldValue::Float(2.5)));
        assert_eq!(source.features[0].attribute("Elevation"), Some(&FieldValue::Missing));

        fs::remove_dir_all(&dir).unwrap();
    }
}
