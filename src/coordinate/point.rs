//! Point structure for representing coordinates

use crate::errors::{ProcessError, ProcessResult};

/// A point in a planar or geographic coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (easting, or longitude in geographic systems)
    pub x: f64,
    /// Y coordinate (northing, or latitude in geographic systems)
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Parses an `x,y` pair
    pub fn from_string(coord_str: &str) -> ProcessResult<Self> {
        let parts: Vec<&str> = coord_str.split(',').collect();
        if parts.len() != 2 {
            return Err(ProcessError::InvalidConfig(
                "Coordinate must be in format 'x,y'".to_string()));
        }

        let x = parts[0].trim().parse::<f64>()
            .map_err(|_| ProcessError::InvalidConfig(format!("Invalid x coordinate: {}", parts[0])))?;
        let y = parts[1].trim().parse::<f64>()
            .map_err(|_| ProcessError::InvalidConfig(format!("Invalid y coordinate: {}", parts[1])))?;
        Ok(Point::new(x, y))
    }

    /// Coordinates rounded to 1e-6 units, used as the duplicate key
    pub fn rounded_key(&self) -> (i64, i64) {
        (
            (self.x * 1e6).round_ties_even() as i64,
            (self.y * 1e6).round_ties_even() as i64,
        )
    }
}
