//! Line features read from GeoJSON

mod geojson_reader;

pub use self::geojson_reader::{parse_features, read_features, Feature, FeatureGeometry, FeatureSource};
