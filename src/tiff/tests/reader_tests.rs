//! Tests for TIFF header and IFD parsing

extern crate std;

use std::io::Cursor;

use super::test_utils::{create_test_bigtiff_buffer, create_test_tiff_buffer, TiffFixture};
use crate::errors::ProcessError;
use crate::tiff::constants::tags;
use crate::tiff::TiffReader;

#[test]
fn test_read_classic_tiff_dimensions() {
    let mut reader = TiffReader::new(create_test_tiff_buffer()).unwrap();
    std::assert!(!reader.is_big_tiff());

    let ifds = reader.read_ifds().unwrap();
    std::assert_eq!(ifds.len(), 1);
    std::assert_eq!(ifds[0].get_dimensions(), Some((800, 600)));
}

#[test]
fn test_read_bigtiff_dimensions() {
    let mut reader = TiffReader::new(create_test_bigtiff_buffer()).unwrap();
    std::assert!(reader.is_big_tiff());

    let ifds = reader.read_ifds().unwrap();
    std::assert_eq!(ifds[0].get_dimensions(), Some((1024, 768)));
}

#[test]
fn test_big_endian_inline_short_array() {
    let mut fixture = TiffFixture::new(true, false);
    fixture
        .add_longs(tags::IMAGE_WIDTH, &[4])
        .add_longs(tags::IMAGE_LENGTH, &[3])
        .add_shorts(tags::BITS_PER_SAMPLE, &[16, 16]);

    let mut reader = TiffReader::new(fixture.cursor()).unwrap();
    let ifd = reader.read_ifds().unwrap().remove(0);

    std::assert_eq!(ifd.get_dimensions(), Some((4, 3)));
    let bits = reader.read_tag_u64s(&ifd, tags::BITS_PER_SAMPLE).unwrap();
    std::assert_eq!(bits, vec![16, 16]);
}

#[test]
fn test_single_short_decoded_into_value() {
    let mut fixture = TiffFixture::new(true, true);
    fixture.add_shorts(tags::COMPRESSION, &[8]).add_longs(tags::IMAGE_WIDTH, &[2]);

    let mut reader = TiffReader::new(fixture.cursor()).unwrap();
    let ifd = reader.read_ifds().unwrap().remove(0);
    std::assert_eq!(ifd.get_tag_value(tags::COMPRESSION), Some(8));
}

#[test]
fn test_out_of_line_doubles_and_ascii() {
    let mut fixture = TiffFixture::new(false, false);
    fixture
        .add_longs(tags::IMAGE_WIDTH, &[2])
        .add_longs(tags::IMAGE_LENGTH, &[2])
        .add_doubles(tags::MODEL_PIXEL_SCALE_TAG, &[10.0, 10.0, 0.0])
        .add_ascii(tags::GDAL_NODATA, "-9999");

    let mut reader = TiffReader::new(fixture.cursor()).unwrap();
    let ifd = reader.read_ifds().unwrap().remove(0);

    let scale = reader.read_tag_f64s(&ifd, tags::MODEL_PIXEL_SCALE_TAG).unwrap();
    std::assert_eq!(scale, vec![10.0, 10.0, 0.0]);
    std::assert_eq!(reader.read_tag_ascii(&ifd, tags::GDAL_NODATA).unwrap(), "-9999");
}

#[test]
fn test_missing_tag_is_reported() {
    let mut reader = TiffReader::new(create_test_tiff_buffer()).unwrap();
    let ifd = reader.read_ifds().unwrap().remove(0);

    match reader.read_tag_u64s(&ifd, tags::STRIP_OFFSETS) {
        Err(ProcessError::TagNotFound(tag)) => std::assert_eq!(tag, tags::STRIP_OFFSETS),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_read_chunk_bounds() {
    let mut fixture = TiffFixture::new(false, false);
    let offset = fixture.add_data(&[1, 2, 3, 4]);
    fixture.add_longs(tags::IMAGE_WIDTH, &[1]);

    let mut reader = TiffReader::new(fixture.cursor()).unwrap();
    std::assert_eq!(reader.read_chunk(offset, 4).unwrap(), vec![1, 2, 3, 4]);
    std::assert!(reader.read_chunk(offset, 1_000_000).is_err());
}

#[test]
fn test_unsupported_version() {
    let bytes = vec![0x49, 0x49, 41, 0, 8, 0, 0, 0];
    match TiffReader::new(Cursor::new(bytes)) {
        Err(ProcessError::UnsupportedVersion(41)) => {},
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("version 41 accepted"),
    }
}

#[test]
fn test_ifd_offset_past_end_rejected() {
    let bytes = vec![0x49, 0x49, 42, 0, 0xFF, 0, 0, 0];
    std::assert!(TiffReader::new(Cursor::new(bytes)).is_err());
}
