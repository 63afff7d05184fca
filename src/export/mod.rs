//! Export sinks for grouped output rows
//!
//! Each sink receives one group at a time. A failure is returned for that
//! group only; files already written by earlier groups stay on disk.

mod csv_exporter;
mod geojson_exporter;
pub mod naming;

pub use self::csv_exporter::CsvExporter;
pub use self::geojson_exporter::GeoJsonPointExporter;
pub use self::naming::{distance_label, output_file_name, sanitize_name};

use std::path::PathBuf;

use crate::coordinate::Point;
use crate::errors::ProcessResult;
use crate::sampling::Row;

/// Rows sharing one group key, in output order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowGroup {
    /// Unsanitised group value
    pub key: String,
    pub rows: Vec<Row>,
    /// Planar position of every row, same order as `rows`
    pub points: Vec<Point>,
}

impl RowGroup {
    pub fn new(key: &str) -> Self {
        RowGroup {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, row: Row, point: Point) {
        self.rows.push(row);
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Durable storage for grouped rows
pub trait ExportSink {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Writes one group
    ///
    /// # Arguments
    /// * `group` - The rows to write
    /// * `label` - Distance label used in the file name
    ///
    /// # Returns
    /// The path written, or `None` when the group had nothing to write
    fn write_group(&self, group: &RowGroup, label: &str) -> ProcessResult<Option<PathBuf>>;
}
