//! Line value types

use log::debug;

use crate::coordinate::Point;
use crate::errors::{ProcessError, ProcessResult};

/// One connected polyline, at least two points
#[derive(Debug, Clone, PartialEq)]
pub struct LinePath {
    points: Vec<Point>,
}

impl LinePath {
    /// Create a path from its vertices
    pub fn new(points: Vec<Point>) -> ProcessResult<Self> {
        if points.len() < 2 {
            return Err(ProcessError::InvalidGeometry(format!(
                "A line part needs at least 2 points, got {}", points.len()
            )));
        }
        Ok(LinePath { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

/// A possibly multi-part line geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    parts: Vec<LinePath>,
}

impl LineGeometry {
    /// Single-part geometry
    pub fn single(path: LinePath) -> Self {
        LineGeometry { parts: vec![path] }
    }

    /// Build from raw parts, skipping parts with fewer than two points
    pub fn from_parts(parts: Vec<Vec<Point>>) -> Self {
        let mut kept = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            match LinePath::new(part) {
                Ok(path) => kept.push(path),
                Err(e) => debug!("Skipping part {}: {}", index, e),
            }
        }
        LineGeometry { parts: kept }
    }

    pub fn parts(&self) -> &[LinePath] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_multipart(&self) -> bool {
        self.parts.len() > 1
    }
}
