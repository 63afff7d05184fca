//! Assembly of output rows from point measurements

use log::debug;

use super::accumulator::PointMeasurement;
use super::row::{FieldValue, Row};
use crate::coordinate::CoordinateTransform;

pub const LONGITUDE: &str = "Longitude";
pub const LATITUDE: &str = "Latitude";
pub const EASTING: &str = "Easting";
pub const NORTHING: &str = "Northing";
pub const ELEVATION: &str = "Elevation";
pub const DISTANCE: &str = "Distance";
pub const LENGTH_3D: &str = "Length_3D";
pub const AZIMUTH: &str = "Azimuth";
pub const KP: &str = "KP";
pub const TOTAL_3D_LENGTH: &str = "Total_3D_Length";
/// Group column name used when no group field is configured
pub const GROUP: &str = "Group";
/// Prefix given to source attributes that clash with an existing column
pub const ATTRIBUTE_PREFIX: &str = "attr_";

/// Builds rows with a fixed column order
pub struct AttributeAssembler {
    to_geographic: Box<dyn CoordinateTransform>,
    preserve_attributes: bool,
}

impl AttributeAssembler {
    /// # Arguments
    /// * `to_geographic` - Transform from the sampling frame to WGS84
    /// * `preserve_attributes` - Whether source attributes are copied into rows
    pub fn new(to_geographic: Box<dyn CoordinateTransform>, preserve_attributes: bool) -> Self {
        AttributeAssembler {
            to_geographic,
            preserve_attributes,
        }
    }

    /// Builds the row for one measurement
    ///
    /// # Arguments
    /// * `measurement` - Rounded measurements of the point
    /// * `attributes` - Source feature attributes, in source order
    /// * `group_field` - Configured group field name, if any
    /// * `group_value` - Group value as text (unsanitised)
    pub fn assemble(
        &self,
        measurement: &PointMeasurement,
        attributes: &[(String, FieldValue)],
        group_field: Option<&str>,
        group_value: &str,
    ) -> Row {
        let position = measurement.position;
        let (longitude, latitude) = match self.to_geographic.transform(&position) {
            Ok(p) => (Some(p.x), Some(p.y)),
            Err(e) => {
                debug!("No geographic position for ({}, {}): {}", position.x, position.y, e);
                (None, None)
            }
        };

        let mut row = Row::new();
        row.insert(LONGITUDE, longitude);
        row.insert(LATITUDE, latitude);
        row.insert(EASTING, position.x);
        row.insert(NORTHING, position.y);
        row.insert(ELEVATION, measurement.elevation);
        row.insert(DISTANCE, measurement.distance_2d);
        row.insert(LENGTH_3D, measurement.distance_3d);
        row.insert(AZIMUTH, measurement.azimuth);
        row.insert(KP, measurement.kp);
        row.insert(TOTAL_3D_LENGTH, measurement.total_3d);

        let group_column = group_field.filter(|name| !name.is_empty()).unwrap_or(GROUP);
        row.insert(group_column, group_value);

        if self.preserve_attributes {
            for (name, value) in attributes {
                if row.contains(name) {
                    row.insert(&format!("{}{}", ATTRIBUTE_PREFIX, name), value.clone());
                } else {
                    row.insert(name, value.clone());
                }
            }
        }

        row
    }
}
