//! In-memory TIFF fixtures
//!
//! `TiffFixture` lays out a single-IFD file as header, pixel data, IFD and
//! then the out-of-line tag values, in either byte order and in classic or
//! BigTIFF flavour.

use std::io::Cursor;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::tiff::constants::field_types;

/// Builder for a single-image TIFF held in memory
pub struct TiffFixture {
    big_endian: bool,
    big_tiff: bool,
    data: Vec<u8>,
    entries: Vec<(u16, u16, u64, Vec<u8>)>,
}

impl TiffFixture {
    pub fn new(big_endian: bool, big_tiff: bool) -> Self {
        TiffFixture {
            big_endian,
            big_tiff,
            data: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn header_size(&self) -> u64 {
        if self.big_tiff { 16 } else { 8 }
    }

    /// Appends pixel data and returns its file offset
    pub fn add_data(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.header_size() + self.data.len() as u64;
        self.data.extend_from_slice(bytes);
        offset
    }

    fn put_u16(&self, buffer: &mut Vec<u8>, value: u16) {
        if self.big_endian {
            buffer.write_u16::<BigEndian>(value).unwrap();
        } else {
            buffer.write_u16::<LittleEndian>(value).unwrap();
        }
    }

    fn put_u32(&self, buffer: &mut Vec<u8>, value: u32) {
        if self.big_endian {
            buffer.write_u32::<BigEndian>(value).unwrap();
        } else {
            buffer.write_u32::<LittleEndian>(value).unwrap();
        }
    }

    fn put_u64(&self, buffer: &mut Vec<u8>, value: u64) {
        if self.big_endian {
            buffer.write_u64::<BigEndian>(value).unwrap();
        } else {
            buffer.write_u64::<LittleEndian>(value).unwrap();
        }
    }

    fn put_f64(&self, buffer: &mut Vec<u8>, value: f64) {
        if self.big_endian {
            buffer.write_f64::<BigEndian>(value).unwrap();
        } else {
            buffer.write_f64::<LittleEndian>(value).unwrap();
        }
    }

    /// Encodes a 16-bit sample in the fixture's byte order
    pub fn encode_u16(&self, value: u16) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.put_u16(&mut buffer, value);
        buffer
    }

    /// Encodes a 32-bit float sample in the fixture's byte order
    pub fn encode_f32(&self, value: f32) -> Vec<u8> {
        let mut buffer = Vec::new();
        if self.big_endian {
            buffer.write_f32::<BigEndian>(value).unwrap();
        } else {
            buffer.write_f32::<LittleEndian>(value).unwrap();
        }
        buffer
    }

    pub fn add_shorts(&mut self, tag: u16, values: &[u16]) -> &mut Self {
        let mut bytes = Vec::new();
        for v in values {
            self.put_u16(&mut bytes, *v);
        }
        self.entries.push((tag, field_types::SHORT, values.len() as u64, bytes));
        self
    }

    pub fn add_longs(&mut self, tag: u16, values: &[u32]) -> &mut Self {
        let mut bytes = Vec::new();
        for v in values {
            self.put_u32(&mut bytes, *v);
        }
        self.entries.push((tag, field_types::LONG, values.len() as u64, bytes));
        self
    }

    pub fn add_doubles(&mut self, tag: u16, values: &[f64]) -> &mut Self {
        let mut bytes = Vec::new();
        for v in values {
            self.put_f64(&mut bytes, *v);
        }
        self.entries.push((tag, field_types::DOUBLE, values.len() as u64, bytes));
        self
    }

    pub fn add_ascii(&mut self, tag: u16, value: &str) -> &mut Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.entries.push((tag, field_types::ASCII, bytes.len() as u64, bytes));
        self
    }

    /// Serialises the fixture into file bytes
    pub fn build(&self) -> Vec<u8> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|e| e.0);

        let inline_size = if self.big_tiff { 8 } else { 4 };
        let entry_size = if self.big_tiff { 20 } else { 12 };
        let count_size = if self.big_tiff { 8 } else { 2 };
        let ifd_offset = self.header_size() + self.data.len() as u64;
        let ifd_size = count_size + entries.len() as u64 * entry_size + inline_size as u64;
        let mut value_offset = ifd_offset + ifd_size;

        let mut out = Vec::new();
        if self.big_endian {
            out.extend_from_slice(b"MM");
        } else {
            out.extend_from_slice(b"II");
        }
        if self.big_tiff {
            self.put_u16(&mut out, 43);
            self.put_u16(&mut out, 8);
            self.put_u16(&mut out, 0);
            self.put_u64(&mut out, ifd_offset);
        } else {
            self.put_u16(&mut out, 42);
            self.put_u32(&mut out, ifd_offset as u32);
        }
        out.extend_from_slice(&self.data);

        if self.big_tiff {
            self.put_u64(&mut out, entries.len() as u64);
        } else {
            self.put_u16(&mut out, entries.len() as u16);
        }

        let mut values = Vec::new();
        for (tag, field_type, count, bytes) in &entries {
            self.put_u16(&mut out, *tag);
            self.put_u16(&mut out, *field_type);
            if self.big_tiff {
                self.put_u64(&mut out, *count);
            } else {
                self.put_u32(&mut out, *count as u32);
            }

            if bytes.len() <= inline_size {
                let mut field = bytes.clone();
                field.resize(inline_size, 0);
                out.extend_from_slice(&field);
            } else {
                if self.big_tiff {
                    self.put_u64(&mut out, value_offset);
                } else {
                    self.put_u32(&mut out, value_offset as u32);
                }
                values.extend_from_slice(bytes);
                value_offset += bytes.len() as u64;
            }
        }

        // No further IFDs
        if self.big_tiff {
            self.put_u64(&mut out, 0);
        } else {
            self.put_u32(&mut out, 0);
        }
        out.extend_from_slice(&values);
        out
    }

    pub fn cursor(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.build())
    }
}

/// Creates a minimal classic TIFF with only width and height
pub fn create_test_tiff_buffer() -> Cursor<Vec<u8>> {
    let mut fixture = TiffFixture::new(false, false);
    fixture.add_longs(256, &[800]).add_longs(257, &[600]);
    fixture.cursor()
}

/// Creates a minimal BigTIFF with only width and height
pub fn create_test_bigtiff_buffer() -> Cursor<Vec<u8>> {
    let mut fixture = TiffFixture::new(false, true);
    fixture.add_longs(256, &[1024]).add_longs(257, &[768]);
    fixture.cursor()
}
