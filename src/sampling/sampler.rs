//! Resampling of line geometries at a fixed step
//!
//! Every part yields a sample at its start and at its true end, plus one
//! every `distance` units in between. Original vertices can be merged in
//! with their linear-referenced position. Output is sorted by KP and then
//! by position, with points closer than 1e-6 units collapsed into the
//! first one.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::coordinate::Point;
use crate::geometry::{GeometryService, LineGeometry, LinePath, PlanarGeometry};

/// A sampled position and its distance along the owning part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Point,
    /// Distance from the start of the part, `None` only for degenerate input
    pub kp: Option<f64>,
}

impl SamplePoint {
    pub fn new(position: Point, kp: f64) -> Self {
        SamplePoint { position, kp: Some(kp) }
    }
}

/// Produces ordered sample points for line geometries
pub struct GeometrySampler<G: GeometryService = PlanarGeometry> {
    geometry: G,
    distance: f64,
    preserve_vertices: bool,
}

impl GeometrySampler<PlanarGeometry> {
    /// Sampler over planar Euclidean geometry
    pub fn new(distance: f64, preserve_vertices: bool) -> Self {
        GeometrySampler::with_service(PlanarGeometry, distance, preserve_vertices)
    }
}

impl<G: GeometryService> GeometrySampler<G> {
    /// Sampler over any geometry backend
    ///
    /// A distance that is not strictly positive selects vertices-only mode.
    pub fn with_service(geometry: G, distance: f64, preserve_vertices: bool) -> Self {
        let distance = if distance.is_finite() && distance > 0.0 { distance } else { 0.0 };
        GeometrySampler {
            geometry,
            distance,
            preserve_vertices,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn is_vertices_only(&self) -> bool {
        self.distance == 0.0
    }

    /// Samples one part
    ///
    /// The samples are sorted by KP and deduplicated on rounded
    /// coordinates, keeping the first. A closed ring's end therefore
    /// collapses into its start: the ring has one row at KP 0 and none at
    /// KP equal to its length, although the end point is otherwise always
    /// sampled.
    pub fn sample_path(&self, path: &LinePath) -> Vec<SamplePoint> {
        let length = self.geometry.length(path);
        if length <= 0.0 {
            return vec![SamplePoint::new(self.geometry.centroid(path), 0.0)];
        }

        let mut candidates = Vec::new();
        if self.is_vertices_only() {
            self.push_vertices(path, &mut candidates);
        } else {
            candidates.push(SamplePoint::new(self.geometry.interpolate_at(path, 0.0), 0.0));
            let mut measure = self.distance;
            while measure < length {
                candidates.push(SamplePoint::new(self.geometry.interpolate_at(path, measure), measure));
                let next = measure + self.distance;
                if next <= measure {
                    break;
                }
                measure = next;
            }
            candidates.push(SamplePoint::new(self.geometry.interpolate_at(path, length), length));

            if self.preserve_vertices {
                self.push_vertices(path, &mut candidates);
            }
        }

        sort_and_dedup(candidates)
    }

    /// Samples each part on its own, KPs local to the part
    pub fn sample_parts(&self, geometry: &LineGeometry) -> Vec<Vec<SamplePoint>> {
        self.geometry
            .parts(geometry)
            .iter()
            .map(|path| self.sample_path(path))
            .collect()
    }

    /// Samples all parts and merges them into one ordered sequence
    pub fn sample_geometry(&self, geometry: &LineGeometry) -> Vec<SamplePoint> {
        let mut parts = self.sample_parts(geometry);
        if parts.len() == 1 {
            return parts.remove(0);
        }
        sort_and_dedup(parts.into_iter().flatten().collect())
    }

    fn push_vertices(&self, path: &LinePath, candidates: &mut Vec<SamplePoint>) {
        for vertex in self.geometry.vertices_of(path) {
            let kp = self.geometry.locate(path, vertex);
            candidates.push(SamplePoint::new(*vertex, kp));
        }
    }
}

/// Orders by KP (missing last) and then rounded position
fn compare_samples(a: &SamplePoint, b: &SamplePoint) -> Ordering {
    let kp_a = a.kp.unwrap_or(f64::INFINITY);
    let kp_b = b.kp.unwrap_or(f64::INFINITY);
    kp_a.total_cmp(&kp_b)
        .then_with(|| a.position.rounded_key().cmp(&b.position.rounded_key()))
}

fn sort_and_dedup(mut candidates: Vec<SamplePoint>) -> Vec<SamplePoint> {
    candidates.sort_by(compare_samples);
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates.retain(|sample| seen.insert(sample.position.rounded_key()));
    candidates
}
