//! Coordinate Reference System handling
//!
//! Besides identifying a CRS, this answers the two questions checked
//! before any line is sampled: is the system geographic, and are its
//! map units something other than meters.

use std::collections::HashSet;
use lazy_static::lazy_static;

use crate::errors::{ProcessError, ProcessResult};

lazy_static! {
    // Geographic (lat/lon) systems in common use
    static ref GEOGRAPHIC_CODES: HashSet<u32> = [
        4326, 4258, 4269, 4267, 4283, 4230, 4617, 4674, 4612, 4019,
        4148, 4167, 4171, 4190, 4322, 4490, 4618, 4759, 4979, 4937,
    ].iter().copied().collect();

    // Projected systems whose linear unit is the foot or US survey foot
    static ref FOOT_UNIT_CODES: HashSet<u32> = [
        2225, 2226, 2227, 2228, 2229, 2230, 2231, 2232, 2233, 2234,
        2235, 2236, 2237, 2238, 2239, 2240, 2241, 2263, 2264, 2272,
        2273, 2277, 2278, 2279, 2281, 2282, 2283, 2284, 2285, 2286,
        2868, 2869, 2870, 3418, 3419, 3433, 3434, 3435, 3436, 3453,
        3454, 3455, 3456, 3457, 6418, 6420, 6422, 6424, 6426, 6428,
        6430, 6432, 6434, 6436, 6438, 6440, 6442, 6444, 6446, 6448,
        6450, 6452, 6454, 6456, 6458, 6460, 6462, 6464, 6466, 6468,
    ].iter().copied().collect();
}

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { 'N' } else { 'S' };
                format!("UTM Zone {}{} (EPSG:{})", zone, hemisphere, self.epsg_code())
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }

    /// Whether coordinates are angular (longitude/latitude)
    pub fn is_geographic(&self) -> bool {
        match self {
            CoordinateSystem::WGS84 => true,
            CoordinateSystem::WebMercator | CoordinateSystem::UTM(_, _) => false,
            CoordinateSystem::Other(code) => GEOGRAPHIC_CODES.contains(code),
        }
    }

    /// Whether the map units differ from meters
    ///
    /// Geographic systems count as non-meter systems. Unknown projected
    /// codes are taken to be metric.
    pub fn map_units_not_meters(&self) -> bool {
        if self.is_geographic() {
            return true;
        }
        match self {
            CoordinateSystem::Other(code) => FOOT_UNIT_CODES.contains(code),
            _ => false,
        }
    }

    /// Checks that this system can be sampled in meters
    ///
    /// # Arguments
    /// * `role` - What the CRS belongs to, used in the error message
    pub fn ensure_planar_meters(&self, role: &str) -> ProcessResult<()> {
        if self.is_geographic() {
            return Err(ProcessError::Precondition(format!(
                "{} CRS {} is geographic. Please reproject to a projected CRS (meters).",
                role, self.description()
            )));
        }
        if self.map_units_not_meters() {
            return Err(ProcessError::Precondition(format!(
                "{} CRS {} map units are not meters. Please reproject to a CRS in meters.",
                role, self.description()
            )));
        }
        Ok(())
    }
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> CoordinateSystem {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Parse a coordinate system from a string (e.g. "EPSG:32633" or "32633")
    pub fn from_string(crs_str: &str) -> ProcessResult<CoordinateSystem> {
        let crs_str = crs_str.trim().to_uppercase();
        let code = crs_str.strip_prefix("EPSG:").unwrap_or(&crs_str);

        match code.parse::<u32>() {
            Ok(epsg) if epsg > 0 => Ok(Self::from_epsg(epsg)),
            _ => Err(ProcessError::InvalidConfig(format!("Unsupported CRS format: {}", crs_str))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string_variants() {
        assert_eq!(CoordinateSystemFactory::from_string("EPSG:32633").unwrap(), CoordinateSystem::UTM(33, true));
        assert_eq!(CoordinateSystemFactory::from_string(" epsg:32733 ").unwrap(), CoordinateSystem::UTM(33, false));
        assert_eq!(CoordinateSystemFactory::from_string("3857").unwrap(), CoordinateSystem::WebMercator);
        assert!(CoordinateSystemFactory::from_string("UTM33").is_err());
    }

    #[test]
    fn test_guard_rejects_geographic() {
        let wgs84 = CoordinateSystem::WGS84;
        assert!(wgs84.is_geographic());
        match wgs84.ensure_planar_meters("Input") {
            Err(ProcessError::Precondition(msg)) => assert!(msg.contains("geographic")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(CoordinateSystem::Other(4258).is_geographic());
    }

    #[test]
    fn test_guard_rejects_feet() {
        let ny = CoordinateSystem::Other(2263);
        assert!(!ny.is_geographic());
        assert!(ny.map_units_not_meters());
        match ny.ensure_planar_meters("Input") {
            Err(ProcessError::Precondition(msg)) => assert!(msg.contains("not meters")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_guard_accepts_projected_meters() {
        assert!(CoordinateSystem::UTM(31, true).ensure_planar_meters("Input").is_ok());
        assert!(CoordinateSystem::WebMercator.ensure_planar_meters("Input").is_ok());
        assert!(CoordinateSystem::Other(2056).ensure_planar_meters("Input").is_ok());
    }
}
