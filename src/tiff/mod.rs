//! TIFF file format parsing module
//!
//! Reads the structure of TIFF and BigTIFF files: header, IFD chain and
//! tag values. Pixel decoding lives in the raster module.

pub mod ifd;
pub mod reader;
pub mod constants;
#[cfg(test)]
pub(crate) mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
