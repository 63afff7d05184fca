//! Low-level readers used by the DEM loader
//!
//! Seekable reader abstraction plus byte order strategies for TIFF data.

pub mod seekable;
pub mod byte_order;
