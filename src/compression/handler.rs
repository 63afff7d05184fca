//! Compression handler trait definition

use crate::errors::ProcessResult;

/// Strategy trait for decoding a compressed raster chunk
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> ProcessResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}
