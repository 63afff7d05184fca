//! GeoTIFF elevation model reader
//!
//! Decodes single pixels out of a GeoTIFF DEM on demand. Strips or tiles
//! are read, decompressed and un-predicted the first time a pixel inside
//! them is requested, then kept in a small cache since consecutive
//! samples along a line tend to hit the same chunk.

use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use super::provider::{RasterValueProvider, RawSample, RawValue};
use crate::compression::{CompressionFactory, CompressionHandler};
use crate::coordinate::{CoordinateSystem, CoordinateSystemFactory, Point};
use crate::errors::{ProcessError, ProcessResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geo_keys, planar_config, predictor, sample_format, tags, GEOKEY_USER_DEFINED};
use crate::tiff::{TiffReader, IFD};

/// Decoded chunks kept before the cache is flushed
const MAX_CACHED_CHUNKS: usize = 64;

/// Affine mapping between pixel and map coordinates, north-up only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// Map X of the upper-left corner of the upper-left pixel
    pub origin_x: f64,
    /// Map Y of the upper-left corner of the upper-left pixel
    pub origin_y: f64,
    /// Pixel size along X in map units
    pub pixel_width: f64,
    /// Pixel size along Y in map units (positive, rows grow southward)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Pixel (column, row) containing `point`, or None when outside
    pub fn to_pixel(&self, point: &Point, width: u64, height: u64) -> Option<(u64, u64)> {
        let col = ((point.x - self.origin_x) / self.pixel_width).floor();
        let row = ((self.origin_y - point.y) / self.pixel_height).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        if col >= width as f64 || row >= height as f64 {
            return None;
        }
        Some((col as u64, row as u64))
    }
}

/// How the pixel data of the image is stored
#[derive(Debug, Clone)]
struct RasterLayout {
    width: u64,
    height: u64,
    samples_per_pixel: u64,
    bits_per_sample: u64,
    sample_format: u16,
    planar: bool,
    predictor: u16,
    chunk_width: u64,
    chunk_height: u64,
    chunks_across: u64,
    chunks_down: u64,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl RasterLayout {
    fn samples_per_chunk_pixel(&self) -> u64 {
        if self.planar { 1 } else { self.samples_per_pixel }
    }

    /// Chunk index and position inside the chunk for a pixel sample
    fn locate(&self, col: u64, row: u64, band: u64) -> (usize, usize) {
        let mut chunk = (row / self.chunk_height) * self.chunks_across + col / self.chunk_width;
        if self.planar {
            chunk += band * self.chunks_across * self.chunks_down;
        }
        let local_row = row % self.chunk_height;
        let local_col = col % self.chunk_width;
        let spp = self.samples_per_chunk_pixel();
        let band_offset = if self.planar { 0 } else { band };
        let index = (local_row * self.chunk_width + local_col) * spp + band_offset;
        (chunk as usize, index as usize)
    }

    /// Converts the stored bits of one sample to a provider value
    fn to_raw_value(&self, bits: u64) -> RawValue {
        match self.sample_format {
            sample_format::IEEEFP if self.bits_per_sample == 32 => {
                RawValue::Number(f32::from_bits(bits as u32) as f64)
            },
            sample_format::IEEEFP => RawValue::Number(f64::from_bits(bits)),
            sample_format::SIGNED => {
                let shift = 64 - self.bits_per_sample as u32;
                RawValue::Integer(((bits << shift) as i64) >> shift)
            },
            _ => {
                if bits <= i64::MAX as u64 {
                    RawValue::Integer(bits as i64)
                } else {
                    RawValue::Number(bits as f64)
                }
            }
        }
    }
}

/// A GeoTIFF DEM exposed as a raster value provider
pub struct GeoTiffRaster<R: SeekableReader> {
    reader: RefCell<TiffReader<R>>,
    layout: RasterLayout,
    compression: Box<dyn CompressionHandler>,
    transform: GeoTransform,
    nodata: Option<f64>,
    crs: Option<CoordinateSystem>,
    cache: RefCell<HashMap<usize, Vec<u64>>>,
}

impl GeoTiffRaster<BufReader<File>> {
    /// Opens a GeoTIFF DEM from disk
    pub fn open<P: AsRef<Path>>(path: P) -> ProcessResult<Self> {
        GeoTiffRaster::from_reader(TiffReader::open(path)?)
    }
}

impl<R: SeekableReader> GeoTiffRaster<R> {
    /// Builds the provider from the first image of a TIFF
    ///
    /// # Arguments
    /// * `reader` - TIFF reader positioned after the header
    ///
    /// # Returns
    /// A provider ready for pixel lookups, or an error when the image
    /// layout, compression or georeferencing is not supported
    pub fn from_reader(mut reader: TiffReader<R>) -> ProcessResult<Self> {
        let ifd = reader
            .read_ifds()?
            .into_iter()
            .next()
            .ok_or_else(|| ProcessError::GenericError("TIFF contains no image".to_string()))?;

        let layout = read_layout(&mut reader, &ifd)?;
        let compression_code = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        let compression = CompressionFactory::create_handler(compression_code)?;
        let transform = read_geo_transform(&mut reader, &ifd)?;
        let nodata = read_nodata(&mut reader, &ifd);
        let crs = read_coordinate_system(&mut reader, &ifd);

        info!(
            "DEM {}x{} with {} band(s), {}-bit samples, {}, {}",
            layout.width,
            layout.height,
            layout.samples_per_pixel,
            layout.bits_per_sample,
            compression.name(),
            crs.map(|c| c.description()).unwrap_or_else(|| "unknown CRS".to_string())
        );
        debug!("DEM transform: {:?}, nodata: {:?}", transform, nodata);

        Ok(GeoTiffRaster {
            reader: RefCell::new(reader),
            layout,
            compression,
            transform,
            nodata,
            crs,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn width(&self) -> u64 {
        self.layout.width
    }

    pub fn height(&self) -> u64 {
        self.layout.height
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.transform
    }

    /// Replaces the CRS declared in the file
    pub fn set_coordinate_system(&mut self, crs: CoordinateSystem) {
        self.crs = Some(crs);
    }

    /// Reads, decompresses and decodes one strip or tile into raw sample bits
    fn decode_chunk(&self, chunk: usize) -> ProcessResult<Vec<u64>> {
        let offset = *self.layout.offsets.get(chunk).ok_or_else(|| {
            ProcessError::GenericError(format!("Chunk {} has no offset", chunk))
        })?;
        let byte_count = *self.layout.byte_counts.get(chunk).ok_or_else(|| {
            ProcessError::GenericError(format!("Chunk {} has no byte count", chunk))
        })?;

        let mut reader = self.reader.borrow_mut();
        let stored = reader.read_chunk(offset, byte_count)?;
        let data = self.compression.decompress(&stored)?;
        debug!("Decoded chunk {} ({} -> {} bytes)", chunk, stored.len(), data.len());

        let mut samples = decode_samples(&data, self.layout.bits_per_sample, reader.handler())?;
        if self.layout.predictor == predictor::HORIZONTAL_DIFFERENCING {
            let row_len = (self.layout.chunk_width * self.layout.samples_per_chunk_pixel()) as usize;
            undo_horizontal_predictor(
                &mut samples,
                row_len,
                self.layout.samples_per_chunk_pixel() as usize,
                self.layout.bits_per_sample,
            );
        }
        Ok(samples)
    }

    /// Raw bits of one sample, decoding its chunk when not cached
    fn sample_bits(&self, col: u64, row: u64, band: u64) -> ProcessResult<u64> {
        let (chunk, index) = self.layout.locate(col, row, band);

        if !self.cache.borrow().contains_key(&chunk) {
            let samples = self.decode_chunk(chunk)?;
            let mut cache = self.cache.borrow_mut();
            if cache.len() >= MAX_CACHED_CHUNKS {
                cache.clear();
            }
            cache.insert(chunk, samples);
        }

        self.cache
            .borrow()
            .get(&chunk)
            .and_then(|samples| samples.get(index).copied())
            .ok_or_else(|| ProcessError::GenericError(format!(
                "Chunk {} is shorter than expected (sample {})", chunk, index
            )))
    }
}

impl<R: SeekableReader> RasterValueProvider for GeoTiffRaster<R> {
    fn sample_band(&self, point: &Point, band: usize) -> ProcessResult<RawSample> {
        if band == 0 || band as u64 > self.layout.samples_per_pixel {
            return Err(ProcessError::InvalidConfig(format!(
                "Band {} out of range (raster has {} band(s))",
                band, self.layout.samples_per_pixel
            )));
        }

        match self.transform.to_pixel(point, self.layout.width, self.layout.height) {
            None => Ok(RawSample::Flagged { ok: false, value: RawValue::Null }),
            Some((col, row)) => {
                let bits = self.sample_bits(col, row, band as u64 - 1)?;
                Ok(RawSample::Flagged { ok: true, value: self.layout.to_raw_value(bits) })
            }
        }
    }

    fn nodata(&self, _band: usize) -> Option<f64> {
        self.nodata
    }

    fn band_count(&self) -> usize {
        self.layout.samples_per_pixel as usize
    }

    fn coordinate_system(&self) -> Option<CoordinateSystem> {
        self.crs
    }
}

/// Reads and validates the storage layout of an image
fn read_layout<R: SeekableReader>(reader: &mut TiffReader<R>, ifd: &IFD) -> ProcessResult<RasterLayout> {
    let (width, height) = ifd.get_dimensions().ok_or(ProcessError::MissingDimensions)?;
    if width == 0 || height == 0 {
        return Err(ProcessError::MissingDimensions);
    }
    let samples_per_pixel = ifd.get_samples_per_pixel().max(1);

    let bits = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
        reader.read_tag_u64s(ifd, tags::BITS_PER_SAMPLE)?
    } else {
        vec![1]
    };
    let bits_per_sample = bits[0];
    if bits.iter().any(|b| *b != bits_per_sample) {
        return Err(ProcessError::UnsupportedSampleFormat(format!("mixed bits per sample {:?}", bits)));
    }
    if ![8, 16, 32, 64].contains(&bits_per_sample) {
        return Err(ProcessError::UnsupportedSampleFormat(format!("{}-bit samples", bits_per_sample)));
    }

    let format = if ifd.has_tag(tags::SAMPLE_FORMAT) {
        reader.read_tag_u64s(ifd, tags::SAMPLE_FORMAT)?[0] as u16
    } else {
        sample_format::UNSIGNED
    };
    match format {
        sample_format::UNSIGNED | sample_format::SIGNED => {},
        sample_format::IEEEFP if bits_per_sample == 32 || bits_per_sample == 64 => {},
        _ => return Err(ProcessError::UnsupportedSampleFormat(format!(
            "sample format {} with {}-bit samples", format, bits_per_sample
        ))),
    }

    let pred = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64) as u16;
    match pred {
        predictor::NONE => {},
        predictor::HORIZONTAL_DIFFERENCING if format != sample_format::IEEEFP => {},
        _ => return Err(ProcessError::UnsupportedSampleFormat(format!(
            "predictor {} with sample format {}", pred, format
        ))),
    }

    let planar = samples_per_pixel > 1
        && ifd.get_tag_value(tags::PLANAR_CONFIGURATION) == Some(planar_config::PLANAR as u64);

    let (chunk_width, chunk_height, offsets, byte_counts) = if ifd.is_tiled() {
        let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).unwrap_or(0);
        let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).unwrap_or(0);
        if tile_width == 0 || tile_height == 0 {
            return Err(ProcessError::UnsupportedSampleFormat("zero tile size".to_string()));
        }
        (
            tile_width,
            tile_height,
            reader.read_tag_u64s(ifd, tags::TILE_OFFSETS)?,
            reader.read_tag_u64s(ifd, tags::TILE_BYTE_COUNTS)?,
        )
    } else {
        let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP).unwrap_or(height).clamp(1, height);
        (
            width,
            rows_per_strip,
            reader.read_tag_u64s(ifd, tags::STRIP_OFFSETS)?,
            reader.read_tag_u64s(ifd, tags::STRIP_BYTE_COUNTS)?,
        )
    };

    let chunks_across = (width + chunk_width - 1) / chunk_width;
    let chunks_down = (height + chunk_height - 1) / chunk_height;
    let planes = if planar { samples_per_pixel } else { 1 };
    let expected = chunks_across * chunks_down * planes;
    if (offsets.len() as u64) < expected || (byte_counts.len() as u64) < expected {
        return Err(ProcessError::GenericError(format!(
            "Expected {} chunks, found {} offsets and {} byte counts",
            expected, offsets.len(), byte_counts.len()
        )));
    }

    Ok(RasterLayout {
        width,
        height,
        samples_per_pixel,
        bits_per_sample,
        sample_format: format,
        planar,
        predictor: pred,
        chunk_width,
        chunk_height,
        chunks_across,
        chunks_down,
        offsets,
        byte_counts,
    })
}

/// Reads the pixel-to-map transform from the GeoTIFF model tags
fn read_geo_transform<R: SeekableReader>(reader: &mut TiffReader<R>, ifd: &IFD) -> ProcessResult<GeoTransform> {
    let transform = if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
        let m = reader.read_tag_f64s(ifd, tags::MODEL_TRANSFORMATION_TAG)?;
        if m.len() < 16 {
            return Err(ProcessError::GenericError("ModelTransformation needs 16 values".to_string()));
        }
        if m[1] != 0.0 || m[4] != 0.0 {
            return Err(ProcessError::UnsupportedSampleFormat("rotated model transformation".to_string()));
        }
        GeoTransform {
            origin_x: m[3],
            origin_y: m[7],
            pixel_width: m[0],
            pixel_height: -m[5],
        }
    } else if ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) && ifd.has_tag(tags::MODEL_TIEPOINT_TAG) {
        let scale = reader.read_tag_f64s(ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        let tie = reader.read_tag_f64s(ifd, tags::MODEL_TIEPOINT_TAG)?;
        if scale.len() < 2 || tie.len() < 6 {
            return Err(ProcessError::GenericError("Incomplete pixel scale or tiepoint".to_string()));
        }
        GeoTransform {
            origin_x: tie[3] - tie[0] * scale[0],
            origin_y: tie[4] + tie[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        }
    } else {
        return Err(ProcessError::GenericError("Raster has no georeferencing".to_string()));
    };

    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(transform.pixel_width) || !valid(transform.pixel_height) {
        return Err(ProcessError::UnsupportedSampleFormat(format!(
            "pixel size {} x {}", transform.pixel_width, transform.pixel_height
        )));
    }
    Ok(transform)
}

/// GDAL no-data sentinel, when declared and numeric
fn read_nodata<R: SeekableReader>(reader: &mut TiffReader<R>, ifd: &IFD) -> Option<f64> {
    if !ifd.has_tag(tags::GDAL_NODATA) {
        return None;
    }
    match reader.read_tag_ascii(ifd, tags::GDAL_NODATA) {
        Ok(text) => text.trim().parse::<f64>().ok(),
        Err(e) => {
            debug!("Ignoring unreadable GDAL_NODATA: {}", e);
            None
        }
    }
}

/// EPSG code declared in the GeoKey directory, projected before geographic
fn read_coordinate_system<R: SeekableReader>(reader: &mut TiffReader<R>, ifd: &IFD) -> Option<CoordinateSystem> {
    if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
        return None;
    }
    let directory = match reader.read_tag_u64s(ifd, tags::GEO_KEY_DIRECTORY_TAG) {
        Ok(values) => values,
        Err(e) => {
            debug!("Ignoring unreadable GeoKey directory: {}", e);
            return None;
        }
    };
    parse_geo_keys(&directory)
}

/// Picks the EPSG code out of a GeoKey directory
///
/// Only keys stored directly in the directory (location 0) are considered.
fn parse_geo_keys(directory: &[u64]) -> Option<CoordinateSystem> {
    if directory.len() < 4 {
        return None;
    }
    let key_count = directory[3] as usize;
    let mut keys = HashMap::new();
    for entry in directory[4..].chunks(4).take(key_count) {
        if entry.len() == 4 && entry[1] == 0 {
            keys.insert(entry[0] as u16, entry[3] as u16);
        }
    }

    [geo_keys::PROJECTED_CS_TYPE, geo_keys::GEOGRAPHIC_TYPE]
        .iter()
        .filter_map(|key| keys.get(key).copied())
        .find(|code| *code != 0 && *code != GEOKEY_USER_DEFINED)
        .map(|code| CoordinateSystemFactory::from_epsg(code as u32))
}

/// Splits decompressed bytes into samples, widening each to u64
fn decode_samples(data: &[u8], bits_per_sample: u64, handler: &dyn ByteOrderHandler) -> ProcessResult<Vec<u64>> {
    let bytes_per_sample = (bits_per_sample / 8) as usize;
    let count = data.len() / bytes_per_sample;
    let mut samples = Vec::with_capacity(count);
    let mut cursor = Cursor::new(data);

    for _ in 0..count {
        let value = match bits_per_sample {
            8 => {
                let mut byte = [0u8; 1];
                cursor.read_exact(&mut byte)?;
                byte[0] as u64
            },
            16 => handler.read_u16(&mut cursor)? as u64,
            32 => handler.read_u32(&mut cursor)? as u64,
            _ => handler.read_u64(&mut cursor)?,
        };
        samples.push(value);
    }
    Ok(samples)
}

/// Reverses horizontal differencing row by row, wrapping at the sample width
fn undo_horizontal_predictor(samples: &mut [u64], row_len: usize, stride: usize, bits_per_sample: u64) {
    let mask = if bits_per_sample >= 64 { u64::MAX } else { (1u64 << bits_per_sample) - 1 };
    if row_len == 0 {
        return;
    }
    for row in samples.chunks_mut(row_len) {
        for i in stride..row.len() {
            row[i] = row[i].wrapping_add(row[i - stride]) & mask;
        }
    }
}
