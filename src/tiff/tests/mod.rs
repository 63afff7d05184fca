//! Tests for TIFF structure parsing

mod reader_tests;
pub(crate) mod test_utils;
