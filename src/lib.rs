pub mod errors;
pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod coordinate;
pub mod geometry;
pub mod raster;
pub mod sampling;
pub mod input;
pub mod export;
pub mod config;
pub mod commands;
pub mod api;

pub use crate::api::{open_elevation_probe, LineNodeProcessor};
pub use crate::config::RunConfig;
pub use crate::errors::{ProcessError, ProcessResult};

pub use tiff::TiffReader;
pub use coordinate::{CoordinateSystem, CoordinateTransform, CrsTransform, Point};
pub use geometry::{LineGeometry, LinePath};
pub use raster::{GeoTiffRaster, RasterValueProvider, RawSample, RawValue};
pub use sampling::{ElevationProbe, FieldValue, GeometrySampler, RoundingPolicy, Row, SamplePoint};
pub use export::{CsvExporter, ExportSink, GeoJsonPointExporter, RowGroup};
