//! Geometry operations used by the sampler
//!
//! The sampler only ever talks to `GeometryService`, so another geometry
//! backend can be swapped in without touching the sampling code.

use super::line::{LineGeometry, LinePath};
use crate::coordinate::Point;

/// Linear-referencing operations on line paths
pub trait GeometryService {
    /// Total planar length of the path
    fn length(&self, path: &LinePath) -> f64;

    /// Point at `distance` along the path, clamped to `[0, length]`
    fn interpolate_at(&self, path: &LinePath, distance: f64) -> Point;

    /// Distance along the path of the closest projection of `point`
    fn locate(&self, path: &LinePath, point: &Point) -> f64;

    /// Original vertices in path order
    fn vertices_of<'a>(&self, path: &'a LinePath) -> &'a [Point];

    /// Decompose a geometry into its parts
    fn parts<'a>(&self, geometry: &'a LineGeometry) -> &'a [LinePath];

    /// Representative location of a path
    fn centroid(&self, path: &LinePath) -> Point;
}

/// Euclidean implementation for planar coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarGeometry;

impl GeometryService for PlanarGeometry {
    fn length(&self, path: &LinePath) -> f64 {
        path.points()
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    fn interpolate_at(&self, path: &LinePath, distance: f64) -> Point {
        let total = self.length(path);
        if distance <= 0.0 || total == 0.0 {
            return path.first();
        }
        if distance >= total {
            return path.last();
        }

        let mut travelled = 0.0;
        for pair in path.points().windows(2) {
            let segment = pair[0].distance_to(&pair[1]);
            if segment > 0.0 && travelled + segment >= distance {
                let t = (distance - travelled) / segment;
                return Point::new(
                    pair[0].x + t * (pair[1].x - pair[0].x),
                    pair[0].y + t * (pair[1].y - pair[0].y),
                );
            }
            travelled += segment;
        }
        path.last()
    }

    fn locate(&self, path: &LinePath, point: &Point) -> f64 {
        let mut best_distance = f64::INFINITY;
        let mut best_measure = 0.0;
        let mut travelled = 0.0;

        for pair in path.points().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let len_sq = dx * dx + dy * dy;
            let segment = len_sq.sqrt();

            let t = if len_sq == 0.0 {
                0.0
            } else {
                (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
            };
            let projected = Point::new(a.x + t * dx, a.y + t * dy);
            let offset = projected.distance_to(point);

            // strict comparison: the earliest segment wins ties
            if offset < best_distance {
                best_distance = offset;
                best_measure = travelled + t * segment;
            }
            travelled += segment;
        }

        best_measure
    }

    fn vertices_of<'a>(&self, path: &'a LinePath) -> &'a [Point] {
        path.points()
    }

    fn parts<'a>(&self, geometry: &'a LineGeometry) -> &'a [LinePath] {
        geometry.parts()
    }

    fn centroid(&self, path: &LinePath) -> Point {
        let points = path.points();
        let n = points.len() as f64;
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn l_shape() -> LinePath {
        LinePath::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]).unwrap()
    }

    #[test]
    fn test_length() {
        assert_eq!(PlanarGeometry.length(&l_shape()), 20.0);
    }

    #[test]
    fn test_interpolate_across_corner() {
        let path = l_shape();
        assert_eq!(PlanarGeometry.interpolate_at(&path, 5.0), Point::new(5.0, 0.0));
        assert_eq!(PlanarGeometry.interpolate_at(&path, 15.0), Point::new(10.0, 5.0));
        assert_eq!(PlanarGeometry.interpolate_at(&path, 25.0), Point::new(10.0, 10.0));
        assert_eq!(PlanarGeometry.interpolate_at(&path, -1.0), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_locate_vertices_and_offsets() {
        let path = l_shape();
        assert_eq!(PlanarGeometry.locate(&path, &Point::new(10.0, 0.0)), 10.0);
        assert_eq!(PlanarGeometry.locate(&path, &Point::new(10.0, 10.0)), 20.0);
        assert_abs_diff_eq!(PlanarGeometry.locate(&path, &Point::new(4.0, 3.0)), 4.0);
        assert_abs_diff_eq!(PlanarGeometry.locate(&path, &Point::new(12.0, 7.0)), 17.0);
    }

    #[test]
    fn test_locate_closed_ring_start_wins() {
        let ring = LinePath::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 0.0),
        ]).unwrap();
        assert_eq!(PlanarGeometry.locate(&ring, &Point::new(0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_degenerate_path() {
        let path = LinePath::new(vec![Point::new(3.0, 4.0), Point::new(3.0, 4.0)]).unwrap();
        assert_eq!(PlanarGeometry.length(&path), 0.0);
        assert_eq!(PlanarGeometry.centroid(&path), Point::new(3.0, 4.0));
        assert_eq!(PlanarGeometry.interpolate_at(&path, 1.0), Point::new(3.0, 4.0));
    }
}
