//! TIFF file reader implementation
//!
//! Reads the header, the IFD chain and individual tag values of a TIFF or
//! BigTIFF file. Byte order is handled by a strategy object chosen from
//! the header marker.

use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, SeekFrom};
use std::path::Path;

use crate::errors::{ProcessError, ProcessResult};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::ifd::{IFDEntry, IFD};

/// Upper bound on the IFD chain length, guards against offset loops
const MAX_IFDS: usize = 100;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader<R: SeekableReader> {
    /// Underlying byte source
    reader: R,
    /// Byte order handler selected from the header
    handler: Box<dyn ByteOrderHandler>,
    /// Whether the file is BigTIFF
    is_big_tiff: bool,
    /// Offset of the first IFD
    first_ifd_offset: u64,
    /// Total size of the source in bytes
    file_size: u64,
}

impl TiffReader<BufReader<File>> {
    /// Opens a TIFF file from disk
    ///
    /// # Arguments
    /// * `filepath` - Path to the TIFF file
    ///
    /// # Returns
    /// A reader positioned after the header
    pub fn open<P: AsRef<Path>>(filepath: P) -> ProcessResult<Self> {
        info!("Opening TIFF file: {}", filepath.as_ref().display());
        let file = File::open(filepath.as_ref())?;
        TiffReader::new(BufReader::with_capacity(1024 * 1024, file))
    }
}

impl<R: SeekableReader> TiffReader<R> {
    /// Creates a reader and parses the file header
    ///
    /// This detects the byte order, checks the TIFF/BigTIFF version and
    /// reads the first IFD offset.
    pub fn new(mut reader: R) -> ProcessResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let byte_order = ByteOrder::detect(&mut reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        let handler = byte_order.create_handler();

        let version = handler.read_u16(&mut reader)?;
        let is_big_tiff = match version {
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(&mut reader)?;
                let zeros = handler.read_u16(&mut reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
                    return Err(ProcessError::InvalidBigTIFFHeader);
                }
                true
            },
            header::TIFF_VERSION => false,
            _ => return Err(ProcessError::UnsupportedVersion(version)),
        };

        let first_ifd_offset = if is_big_tiff {
            handler.read_u64(&mut reader)?
        } else {
            handler.read_u32(&mut reader)? as u64
        };

        let file_size = reader.seek(SeekFrom::End(0))?;
        if first_ifd_offset >= file_size || first_ifd_offset < 8 {
            return Err(ProcessError::GenericError(format!(
                "Invalid IFD offset: {} (file size: {})",
                first_ifd_offset, file_size
            )));
        }

        debug!("First IFD offset: {}, BigTIFF: {}", first_ifd_offset, is_big_tiff);
        Ok(TiffReader {
            reader,
            handler,
            is_big_tiff,
            first_ifd_offset,
            file_size,
        })
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Returns the byte order handler of the file
    pub fn handler(&self) -> &dyn ByteOrderHandler {
        self.handler.as_ref()
    }

    /// Reads every IFD in the chain
    ///
    /// A broken link in the chain stops the walk with a warning; the IFDs
    /// read so far are returned.
    pub fn read_ifds(&mut self) -> ProcessResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = self.first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= self.file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, self.file_size);
                break;
            }

            let number = ifds.len();
            let ifd = match self.read_ifd(ifd_offset, number) {
                Ok(ifd) => ifd,
                Err(e) if number > 0 => {
                    warn!("Error reading IFD {}: {}", number, e);
                    break;
                },
                Err(e) => return Err(e),
            };

            let next_ifd_offset = match self.read_next_offset() {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    ifds.push(ifd);
                    break;
                }
            };

            ifds.push(ifd);
            if next_ifd_offset != 0 && (next_ifd_offset >= self.file_size || next_ifd_offset < 8) {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next_ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        info!("Read {} IFDs from TIFF file", ifds.len());
        Ok(ifds)
    }

    /// Reads an IFD at the given offset
    pub fn read_ifd(&mut self, offset: u64, number: usize) -> ProcessResult<IFD> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            self.handler.read_u64(&mut self.reader)?
        } else {
            self.handler.read_u16(&mut self.reader)? as u64
        };
        debug!("IFD #{} at {} has {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let entry = self.read_ifd_entry()?;
            ifd.add_entry(entry);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry, decoding single inline values
    fn read_ifd_entry(&mut self) -> ProcessResult<IFDEntry> {
        let tag = self.handler.read_u16(&mut self.reader)?;
        let field_type = self.handler.read_u16(&mut self.reader)?;
        let count = if self.is_big_tiff {
            self.handler.read_u64(&mut self.reader)?
        } else {
            self.handler.read_u32(&mut self.reader)? as u64
        };

        let mut raw = [0u8; 8];
        let field_len = if self.is_big_tiff { 8 } else { 4 };
        self.reader.read_exact(&mut raw[..field_len])?;

        let probe = IFDEntry::with_raw(tag, field_type, count, 0, raw);
        let value_offset = if probe.is_value_inline(self.is_big_tiff) && count == 1 {
            let mut cursor = Cursor::new(raw);
            read_unsigned(&mut cursor, field_type, self.handler.as_ref())?
        } else {
            let mut cursor = Cursor::new(raw);
            if self.is_big_tiff {
                self.handler.read_u64(&mut cursor)?
            } else {
                self.handler.read_u32(&mut cursor)? as u64
            }
        };

        Ok(IFDEntry::with_raw(tag, field_type, count, value_offset, raw))
    }

    /// Reads the next-IFD link that follows the entries just read
    fn read_next_offset(&mut self) -> ProcessResult<u64> {
        if self.is_big_tiff {
            Ok(self.handler.read_u64(&mut self.reader)?)
        } else {
            Ok(self.handler.read_u32(&mut self.reader)? as u64)
        }
    }

    /// Reads a tag's values as unsigned integers
    ///
    /// # Arguments
    /// * `ifd` - The IFD containing the tag
    /// * `tag` - The tag number to read
    ///
    /// # Returns
    /// One value per tag count
    pub fn read_tag_u64s(&mut self, ifd: &IFD, tag: u16) -> ProcessResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(ProcessError::TagNotFound(tag))?.clone();
        let mut values = Vec::with_capacity(entry.count as usize);

        if entry.is_value_inline(self.is_big_tiff) {
            let mut cursor = Cursor::new(entry.raw);
            for _ in 0..entry.count {
                values.push(read_unsigned(&mut cursor, entry.field_type, self.handler.as_ref())?);
            }
        } else {
            self.reader.seek(SeekFrom::Start(entry.value_offset))?;
            for _ in 0..entry.count {
                values.push(read_unsigned(&mut self.reader, entry.field_type, self.handler.as_ref())?);
            }
        }

        Ok(values)
    }

    /// Reads a tag's values as floating point numbers
    ///
    /// Integer field types are widened, so this also works for tags that
    /// writers sometimes store with an integer type.
    pub fn read_tag_f64s(&mut self, ifd: &IFD, tag: u16) -> ProcessResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(ProcessError::TagNotFound(tag))?.clone();
        let mut values = Vec::with_capacity(entry.count as usize);

        if entry.is_value_inline(self.is_big_tiff) {
            let mut cursor = Cursor::new(entry.raw);
            for _ in 0..entry.count {
                values.push(read_float(&mut cursor, entry.field_type, self.handler.as_ref())?);
            }
        } else {
            self.reader.seek(SeekFrom::Start(entry.value_offset))?;
            for _ in 0..entry.count {
                values.push(read_float(&mut self.reader, entry.field_type, self.handler.as_ref())?);
            }
        }

        Ok(values)
    }

    /// Reads an ASCII tag, trailing nulls removed
    pub fn read_tag_ascii(&mut self, ifd: &IFD, tag: u16) -> ProcessResult<String> {
        let entry = ifd.get_entry(tag).ok_or(ProcessError::TagNotFound(tag))?.clone();
        if entry.field_type != field_types::ASCII {
            return Err(ProcessError::UnsupportedFieldType(entry.field_type));
        }

        let mut buffer = if entry.is_value_inline(self.is_big_tiff) {
            entry.raw[..entry.count as usize].to_vec()
        } else {
            self.reader.seek(SeekFrom::Start(entry.value_offset))?;
            let mut buffer = vec![0u8; entry.count as usize];
            self.reader.read_exact(&mut buffer)?;
            buffer
        };

        while buffer.last() == Some(&0) {
            buffer.pop();
        }

        String::from_utf8(buffer)
            .map_err(|e| ProcessError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }

    /// Reads a block of bytes (a strip or tile) at a file offset
    pub fn read_chunk(&mut self, offset: u64, byte_count: u64) -> ProcessResult<Vec<u8>> {
        if offset.saturating_add(byte_count) > self.file_size {
            return Err(ProcessError::GenericError(format!(
                "Chunk at {} with {} bytes exceeds file size {}",
                offset, byte_count, self.file_size
            )));
        }
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; byte_count as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }
}

/// Reads one unsigned integer value of the given field type
fn read_unsigned(
    reader: &mut dyn SeekableReader,
    field_type: u16,
    handler: &dyn ByteOrderHandler,
) -> ProcessResult<u64> {
    let mut byte = [0u8; 1];
    let value = match field_type {
        field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
            reader.read_exact(&mut byte)?;
            byte[0] as u64
        },
        field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
        field_types::LONG | field_types::SLONG => handler.read_u32(reader)? as u64,
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(reader)?,
        _ => return Err(ProcessError::UnsupportedFieldType(field_type)),
    };
    Ok(value)
}

/// Reads one value of the given field type as f64
fn read_float(
    reader: &mut dyn SeekableReader,
    field_type: u16,
    handler: &dyn ByteOrderHandler,
) -> ProcessResult<f64> {
    let value = match field_type {
        field_types::DOUBLE => handler.read_f64(reader)?,
        field_types::FLOAT => handler.read_f32(reader)? as f64,
        field_types::SSHORT => handler.read_i16(reader)? as f64,
        field_types::SLONG => handler.read_i32(reader)? as f64,
        field_types::SLONG8 => handler.read_i64(reader)? as f64,
        field_types::RATIONAL => {
            let num = handler.read_u32(reader)? as f64;
            let den = handler.read_u32(reader)? as f64;
            if den == 0.0 { f64::NAN } else { num / den }
        },
        field_types::SRATIONAL => {
            let num = handler.read_i32(reader)? as f64;
            let den = handler.read_i32(reader)? as f64;
            if den == 0.0 { f64::NAN } else { num / den }
        },
        other => read_unsigned(reader, other, handler)? as f64,
    };
    Ok(value)
}
