//! Factory for creating compression handlers

use crate::errors::{ProcessError, ProcessResult};
use crate::tiff::constants::compression;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    pub fn create_handler(code: u64) -> ProcessResult<Box<dyn CompressionHandler>> {
        match code as u16 {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::DEFLATE_LEGACY => Ok(Box::new(AdobeDeflateHandler)),
            compression::ZSTD | compression::ZSTD_GDAL => Ok(Box::new(ZstdHandler)),
            _ => Err(ProcessError::UnsupportedCompression(code)),
        }
    }
}
