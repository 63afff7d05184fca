//! Raster value provider interface
//!
//! Providers report raw lookups in one of several shapes; the elevation
//! probe normalises them into a single optional value.

use crate::coordinate::{CoordinateSystem, Point};
use crate::errors::ProcessResult;

/// A single value as reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Integer(i64),
    Text(String),
    Null,
}

/// Shape of a raw lookup result
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    /// Value with no success indicator
    Bare(RawValue),
    /// Value paired with a success flag
    Flagged { ok: bool, value: RawValue },
    /// Sequence whose first element is the value
    Wrapped(Vec<RawValue>),
}

/// Source of per-band raster values at planar positions
pub trait RasterValueProvider {
    /// Look up `band` (1-based) at `point`, given in the raster's own CRS
    fn sample_band(&self, point: &Point, band: usize) -> ProcessResult<RawSample>;

    /// Declared no-data sentinel of a band
    fn nodata(&self, band: usize) -> Option<f64>;

    fn band_count(&self) -> usize;

    /// CRS the raster is referenced in, when known
    fn coordinate_system(&self) -> Option<CoordinateSystem>;
}
