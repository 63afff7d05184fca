//! Coordinate handling for line sampling
//!
//! Planar points, coordinate reference systems with the CRS guard used
//! before a run starts, and the transforms that feed the geographic
//! output columns and the elevation lookup.

mod point;
mod transform;
mod crs;

// Re-export key types
pub use self::point::Point;
pub use self::transform::{CoordinateTransform, CrsTransform};
pub use self::crs::{CoordinateSystem, CoordinateSystemFactory};
