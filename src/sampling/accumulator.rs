//! Per-segment measurements along one part
//!
//! The accumulator walks sample points in order and derives, for each
//! point, the 2D and 3D length of the segment ending there, its azimuth
//! and the running 3D total. All lengths are rounded before they are
//! reported, and the running total is rounded at every step.

use super::azimuth::AzimuthCalculator;
use super::elevation::ElevationProbe;
use super::rounding::RoundingPolicy;
use super::sampler::SamplePoint;
use crate::coordinate::Point;

/// Measurements for one sample point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMeasurement {
    pub position: Point,
    pub elevation: Option<f64>,
    /// Planar length of the segment ending here, rounded
    pub distance_2d: Option<f64>,
    /// Slope length of the segment ending here, rounded, never below 2D
    pub distance_3d: Option<f64>,
    pub azimuth: Option<f64>,
    pub kp: Option<f64>,
    /// Running 3D length, present only when elevation is probed
    pub total_3d: Option<f64>,
}

/// Running state while walking one part
pub struct MeasurementAccumulator<'a> {
    rounding: RoundingPolicy,
    probe: Option<&'a ElevationProbe>,
    prev_position: Option<Point>,
    prev_elevation: Option<f64>,
    total_3d: f64,
}

impl<'a> MeasurementAccumulator<'a> {
    pub fn new(rounding: RoundingPolicy, probe: Option<&'a ElevationProbe>) -> Self {
        MeasurementAccumulator {
            rounding,
            probe,
            prev_position: None,
            prev_elevation: None,
            total_3d: 0.0,
        }
    }

    /// Forgets the previous point and zeroes the running total
    pub fn reset(&mut self) {
        self.prev_position = None;
        self.prev_elevation = None;
        self.total_3d = 0.0;
    }

    /// Measures the next sample point
    pub fn push(&mut self, sample: &SamplePoint) -> PointMeasurement {
        let position = sample.position;
        let elevation = self.probe.and_then(|probe| probe.sample(&position));

        let mut distance_2d = None;
        let mut distance_3d = None;
        if let Some(prev) = self.prev_position {
            let planar = prev.distance_to(&position);
            distance_2d = Some(planar);
            if self.probe.is_some() {
                distance_3d = Some(match (self.prev_elevation, elevation) {
                    (Some(z0), Some(z1)) => {
                        let dz = z1 - z0;
                        (planar * planar + dz * dz).sqrt()
                    },
                    // flat-segment fallback
                    _ => planar,
                });
            }
        }

        let azimuth = AzimuthCalculator::compute(self.prev_position.as_ref(), Some(&position));

        let distance_2d = self.rounding.round(distance_2d);
        let mut distance_3d = self.rounding.round(distance_3d);
        if let (Some(d2), Some(d3)) = (distance_2d, distance_3d) {
            if d3 < d2 {
                distance_3d = Some(d2);
            }
        }

        let total_3d = if self.probe.is_some() {
            if let Some(d3) = distance_3d {
                self.total_3d = self.rounding.round_value(self.total_3d + d3);
            }
            Some(self.total_3d)
        } else {
            None
        };

        self.prev_position = Some(position);
        self.prev_elevation = elevation;

        PointMeasurement {
            position,
            elevation,
            distance_2d,
            distance_3d,
            azimuth,
            kp: self.rounding.round(sample.kp),
            total_3d,
        }
    }

    /// Measures a whole part from a fresh state
    pub fn measure_part(&mut self, samples: &[SamplePoint]) -> Vec<PointMeasurement> {
        self.reset();
        samples.iter().map(|sample| self.push(sample)).collect()
    }
}
