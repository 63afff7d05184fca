//! Seekable reader trait
//!
//! The DEM loader reads from files in production and from in-memory
//! cursors in tests; both satisfy this trait.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek {}

impl<T: Read + Seek> SeekableReader for T {}
