//! Raster value providers for elevation lookup

mod provider;
mod geotiff_raster;

pub use self::provider::{RasterValueProvider, RawSample, RawValue};
pub use self::geotiff_raster::{GeoTiffRaster, GeoTransform};
