//! North-referenced bearing between consecutive samples

use crate::coordinate::Point;

/// Computes compass bearings in degrees, clockwise from north
pub struct AzimuthCalculator;

impl AzimuthCalculator {
    /// Bearing from `prev` to `cur`, in `[0, 360)`
    ///
    /// Returns `None` when either point is absent or both coincide.
    pub fn compute(prev: Option<&Point>, cur: Option<&Point>) -> Option<f64> {
        let (prev, cur) = (prev?, cur?);
        let dx = cur.x - prev.x;
        let dy = cur.y - prev.y;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }

        let mut degrees = dx.atan2(dy).to_degrees();
        if degrees < 0.0 {
            degrees += 360.0;
        }
        // tiny negative angles round up to exactly 360
        if degrees >= 360.0 {
            degrees -= 360.0;
        }
        Some(degrees + 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearing(dx: f64, dy: f64) -> Option<f64> {
        AzimuthCalculator::compute(Some(&Point::new(0.0, 0.0)), Some(&Point::new(dx, dy)))
    }

    #[test]
    fn test_cardinal_directions() {
        assert_eq!(bearing(0.0, 1.0), Some(0.0));
        assert_eq!(bearing(1.0, 0.0), Some(90.0));
        assert_eq!(bearing(0.0, -1.0), Some(180.0));
        assert_eq!(bearing(-1.0, 0.0), Some(270.0));
    }

    #[test]
    fn test_missing_or_coincident() {
        let p = Point::new(5.0, 5.0);
        assert_eq!(AzimuthCalculator::compute(None, Some(&p)), None);
        assert_eq!(AzimuthCalculator::compute(Some(&p), None), None);
        assert_eq!(AzimuthCalculator::compute(Some(&p), Some(&p)), None);
    }

    #[test]
    fn test_range() {
        for (dx, dy) in [(-1e-300, 1.0), (-0.0, 1.0), (-3.0, 4.0), (2.0, -7.0)] {
            let az = bearing(dx, dy).unwrap();
            assert!((0.0..360.0).contains(&az), "azimuth {} out of range", az);
        }
    }
}
