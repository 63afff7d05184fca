//! CSV table export

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::naming::output_file_name;
use super::{ExportSink, RowGroup};
use crate::errors::{ProcessError, ProcessResult};

/// Writes each group to `<group>_<label>_node.csv`
///
/// The header is the field list of the group's first row. Cells missing
/// from a later row are written empty; fields a later row adds beyond the
/// header are dropped.
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        CsvExporter {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for CsvExporter {
    fn name(&self) -> &str {
        "csv"
    }

    fn write_group(&self, group: &RowGroup, label: &str) -> ProcessResult<Option<PathBuf>> {
        let first = match group.rows.first() {
            Some(row) => row,
            None => {
                debug!("Group '{}' has no rows, nothing written", group.key);
                return Ok(None);
            }
        };

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(output_file_name(&group.key, label, "csv"));

        let header: Vec<&str> = first.names().collect();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&header)?;

        for row in &group.rows {
            let record: Vec<String> = header
                .iter()
                .map(|name| row.get(name).map(|v| v.to_cell()).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        writer.flush().map_err(|e| {
            ProcessError::ExportError(format!("Failed to flush {}: {}", path.display(), e))
        })?;

        info!("Wrote {} row(s) to {}", group.rows.len(), path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Point;
    use crate::sampling::{FieldValue, Row};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("linenode_csv_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_writes_header_and_cells() {
        let dir = scratch_dir("cells");
        let mut group = RowGroup::new("Route 1");

        let mut row = Row::new();
        row.insert("KP", 0.0);
        row.insert("Elevation", FieldValue::Missing);
        row.insert("Group", "Route 1");
        group.push(row, Point::new(0.0, 0.0));

        let mut row = Row::new();
        row.insert("KP", 5.0);
        row.insert("Group", "Route 1");
        row.insert("extra", 1.0);
        group.push(row, Point::new(5.0, 0.0));

        let path = CsvExporter::new(&dir).write_group(&group, "5").unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "Route_1_5_node.csv");

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["KP,Elevation,Group", "0.0,,Route 1", "5.0,,Route 1"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_group_skipped() {
        let dir = scratch_dir("empty");
        let written = CsvExporter::new(&dir).write_group(&RowGroup::new("g"), "5").unwrap();
        assert!(written.is_none());
        assert!(!dir.exists());
    }
}
