//! Error types shared by the sampling pipeline, the DEM reader and the exporters

use std::fmt;
use std::io;

/// Errors raised while reading inputs, sampling lines or writing outputs
#[derive(Debug)]
pub enum ProcessError {
    /// I/O error
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Sample layout the DEM reader cannot decode
    UnsupportedSampleFormat(String),
    /// Run-level precondition violated (CRS, missing input, missing output)
    Precondition(String),
    /// Invalid or unusable configuration value
    InvalidConfig(String),
    /// Geometry that cannot be sampled
    InvalidGeometry(String),
    /// Coordinate transformation failure
    TransformError(String),
    /// Failure while writing a group to disk
    ExportError(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::IoError(e) => write!(f, "I/O error: {}", e),
            ProcessError::InvalidHeader => write!(f, "Invalid TIFF header"),
            ProcessError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            ProcessError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            ProcessError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            ProcessError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            ProcessError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            ProcessError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            ProcessError::MissingDimensions => write!(f, "Image dimensions not found"),
            ProcessError::UnsupportedSampleFormat(msg) => write!(f, "Unsupported raster sample layout: {}", msg),
            ProcessError::Precondition(msg) => write!(f, "{}", msg),
            ProcessError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ProcessError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
            ProcessError::TransformError(msg) => write!(f, "Coordinate transformation failed: {}", msg),
            ProcessError::ExportError(msg) => write!(f, "Export failed: {}", msg),
            ProcessError::GenericError(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<io::Error> for ProcessError {
    fn from(error: io::Error) -> Self {
        ProcessError::IoError(error)
    }
}

impl From<String> for ProcessError {
    fn from(msg: String) -> Self {
        ProcessError::GenericError(msg)
    }
}

impl From<csv::Error> for ProcessError {
    fn from(error: csv::Error) -> Self {
        ProcessError::ExportError(error.to_string())
    }
}

impl From<serde_json::Error> for ProcessError {
    fn from(error: serde_json::Error) -> Self {
        ProcessError::GenericError(format!("JSON error: {}", error))
    }
}

/// Result type for pipeline operations
pub type ProcessResult<T> = Result<T, ProcessError>;
