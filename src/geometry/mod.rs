//! Line geometry primitives and the operations the sampler relies on

mod line;
mod service;

pub use self::line::{LineGeometry, LinePath};
pub use self::service::{GeometryService, PlanarGeometry};
