//! Line sampling and per-point measurements
//!
//! The sampler turns a line geometry into ordered sample points with
//! linear-reference values; the accumulator walks those points, probing
//! elevation and deriving distances, azimuth and cumulative 3D length;
//! the assembler turns each measurement into an output row.

pub mod rounding;
pub mod azimuth;
pub mod elevation;
pub mod sampler;
pub mod accumulator;
pub mod assembler;
pub mod row;

pub use rounding::RoundingPolicy;
pub use azimuth::AzimuthCalculator;
pub use elevation::{normalize_sample, ElevationProbe};
pub use sampler::{GeometrySampler, SamplePoint};
pub use accumulator::{MeasurementAccumulator, PointMeasurement};
pub use assembler::AttributeAssembler;
pub use row::{FieldValue, Row};
