//! Decompression of DEM strips and tiles
//!
//! Each TIFF compression code maps to a handler that turns a stored
//! chunk back into raw sample bytes.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
