//! Handler for ZSTD compressed data

use crate::errors::{ProcessError, ProcessResult};
use super::handler::CompressionHandler;
use log::{debug, warn};

/// ZSTD compression handler (compression codes 14 and 50000)
pub struct ZstdHandler;

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> ProcessResult<Vec<u8>> {
        debug!("ZSTD decompressing {} bytes", data.len());
        if data.is_empty() {
            return Ok(Vec::new());
        }

        match zstd::decode_all(data) {
            Ok(decompressed_data) => {
                debug!("ZSTD decompressed to {} bytes", decompressed_data.len());
                Ok(decompressed_data)
            },
            Err(e) => {
                warn!("ZSTD decompression error: {}", e);
                Err(ProcessError::GenericError(format!("ZSTD decompression error: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        14
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompress_frame() {
        let samples = vec![7u8; 256];
        let compressed = zstd::encode_all(&samples[..], 3).unwrap();
        assert_eq!(ZstdHandler.decompress(&compressed).unwrap(), samples);
    }

    #[test]
    fn test_empty_input() {
        assert!(ZstdHandler.decompress(&[]).unwrap().is_empty());
    }
}
