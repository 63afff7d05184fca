//! Processing driver
//!
//! `LineNodeProcessor` is the library entry point: it samples every line
//! feature, measures each part, assembles rows and collects them into
//! groups that the export sinks write out.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RunConfig;
use crate::coordinate::{CoordinateSystem, CoordinateTransform, CrsTransform};
use crate::errors::{ProcessError, ProcessResult};
use crate::export::{distance_label, sanitize_name, ExportSink, RowGroup};
use crate::input::{Feature, FeatureGeometry};
use crate::raster::{GeoTiffRaster, RasterValueProvider};
use crate::sampling::{AttributeAssembler, ElevationProbe, GeometrySampler, MeasurementAccumulator, RoundingPolicy};

/// Opens a GeoTIFF elevation model as a probe for points in `working_crs`
///
/// # Arguments
/// * `path` - GeoTIFF file
/// * `band` - 1-based band index
/// * `working_crs` - CRS of the points that will be probed, `None` when
///   points are given in the raster's own frame
/// * `raster_crs` - Overrides the CRS stored in the file
///
/// # Returns
/// The probe, or an error when the band does not exist or the raster CRS
/// is not planar with meter units
pub fn open_elevation_probe<P: AsRef<Path>>(
    path: P,
    band: usize,
    working_crs: Option<CoordinateSystem>,
    raster_crs: Option<CoordinateSystem>,
) -> ProcessResult<ElevationProbe> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProcessError::Precondition(format!("Elevation raster not found: {}", path.display())));
    }

    let mut raster = GeoTiffRaster::open(path)?;
    if let Some(crs) = raster_crs {
        raster.set_coordinate_system(crs);
    }

    if band < 1 || band > raster.band_count() {
        return Err(ProcessError::InvalidConfig(format!(
            "Band {} does not exist, raster has {} band(s)", band, raster.band_count()
        )));
    }

    let to_raster: Option<Box<dyn CoordinateTransform>> = match (working_crs, raster.coordinate_system()) {
        (Some(working), Some(crs)) => {
            crs.ensure_planar_meters("Elevation raster")?;
            if crs == working {
                None
            } else {
                info!("Probing elevation through {} -> {}", working.description(), crs.description());
                Some(Box::new(CrsTransform::new(working, crs)))
            }
        },
        (Some(working), None) => {
            warn!("Elevation raster has no CRS, assuming {}", working.description());
            None
        },
        (None, _) => None,
    };

    info!(
        "Elevation model {} ({}x{}), band {}",
        path.display(), raster.width(), raster.height(), band
    );
    Ok(ElevationProbe::new(Box::new(raster), band, to_raster))
}

/// Samples line features into grouped output rows
pub struct LineNodeProcessor {
    sampler: GeometrySampler,
    rounding: RoundingPolicy,
    probe: Option<ElevationProbe>,
    assembler: AttributeAssembler,
    group_field: Option<String>,
    label: String,
}

impl LineNodeProcessor {
    /// Creates a processor without elevation
    ///
    /// # Arguments
    /// * `crs` - Planar CRS of the input lines
    /// * `distance` - Sampling step, 0 or less for vertices only (labelled
    ///   `verts`; `from_config` labels an explicit 0 as `0`)
    /// * `preserve_vertices` - Whether original vertices are kept between steps
    /// * `preserve_attributes` - Whether source attributes are copied into rows
    pub fn new(crs: CoordinateSystem, distance: f64, preserve_vertices: bool, preserve_attributes: bool) -> Self {
        let to_geographic = CrsTransform::new(crs, CoordinateSystem::WGS84);
        let sampler = GeometrySampler::new(distance, preserve_vertices);
        let label = if sampler.is_vertices_only() {
            distance_label(None)
        } else {
            distance_label(Some(sampler.distance()))
        };

        LineNodeProcessor {
            rounding: RoundingPolicy::for_step(sampler.distance()),
            sampler,
            probe: None,
            assembler: AttributeAssembler::new(Box::new(to_geographic), preserve_attributes),
            group_field: None,
            label,
        }
    }

    /// Creates a processor from a validated run configuration
    pub fn from_config(config: &RunConfig, crs: CoordinateSystem, probe: Option<ElevationProbe>) -> Self {
        let mut processor = LineNodeProcessor::new(
            crs,
            config.sampling_distance(),
            config.preserve_vertices(),
            config.keep_attributes,
        )
        .with_group_field(config.group_field());
        processor.probe = probe;
        processor.label = config.label();
        processor
    }

    /// Attaches an elevation probe
    pub fn with_elevation(mut self, probe: ElevationProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Groups rows by a feature attribute instead of by feature
    pub fn with_group_field(mut self, field: Option<&str>) -> Self {
        self.group_field = field.filter(|f| !f.is_empty()).map(str::to_string);
        self
    }

    /// Distance label used in output file names
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Group value of a feature
    ///
    /// The configured field's value as text when the feature has that
    /// field, `feat_<id>` otherwise.
    pub fn group_value(&self, feature: &Feature) -> String {
        self.group_field
            .as_deref()
            .and_then(|field| feature.attribute(field))
            .map(|value| value.to_string())
            .unwrap_or_else(|| format!("feat_{}", feature.id))
    }

    /// Samples and measures one feature
    ///
    /// Every part is measured on its own, so KP and the 3D total restart
    /// at each part. Returns `None` for features without line geometry.
    pub fn process_feature(&self, feature: &Feature) -> Option<RowGroup> {
        let geometry = match &feature.geometry {
            FeatureGeometry::Line(geometry) => geometry,
            FeatureGeometry::Empty => {
                warn!("Feature {} has no line geometry, skipped", feature.id);
                return None;
            },
            FeatureGeometry::Other(kind) => {
                warn!("Feature {} is a {}, not a line, skipped", feature.id, kind);
                return None;
            },
        };

        let key = self.group_value(feature);
        let mut group = RowGroup::new(&key);
        let mut accumulator = MeasurementAccumulator::new(self.rounding, self.probe.as_ref());

        for samples in self.sampler.sample_parts(geometry) {
            for measurement in accumulator.measure_part(&samples) {
                let row = self.assembler.assemble(
                    &measurement,
                    &feature.attributes,
                    self.group_field.as_deref(),
                    &key,
                );
                group.push(row, measurement.position);
            }
        }

        debug!("Feature {}: {} row(s) in group '{}'", feature.id, group.len(), key);
        Some(group)
    }

    /// Processes features in order and merges their rows by group
    ///
    /// Groups are keyed by their sanitised name, the name their files are
    /// written under, so "A 1" and "A/1" share one group. The group keeps
    /// the first raw value seen; each row keeps its own.
    ///
    /// The cancel flag is checked before each feature; rows of features
    /// finished before cancellation are kept.
    pub fn process_all(&self, features: &[Feature], cancel: &AtomicBool) -> Vec<RowGroup> {
        self.process_all_with(features, cancel, &mut |_| {})
    }

    /// Same as `process_all`, calling `progress` after each feature
    pub fn process_all_with(
        &self,
        features: &[Feature],
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(&Feature),
    ) -> Vec<RowGroup> {
        let mut groups: Vec<RowGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for feature in features {
            if cancel.load(Ordering::Relaxed) {
                warn!("Processing cancelled");
                break;
            }

            if let Some(group) = self.process_feature(feature) {
                let file_key = sanitize_name(&group.key);
                match index.get(&file_key) {
                    Some(&slot) => {
                        let target = &mut groups[slot];
                        target.rows.extend(group.rows);
                        target.points.extend(group.points);
                    },
                    None => {
                        index.insert(file_key, groups.len());
                        groups.push(group);
                    },
                }
            }
            progress(feature);
        }

        info!("Collected {} group(s) from {} feature(s)", groups.len(), features.len());
        groups
    }

    /// Writes every group to every sink
    ///
    /// Stops at the first failure; files already written are left in place.
    pub fn export_groups(&self, groups: &[RowGroup], sinks: &[Box<dyn ExportSink>]) -> ProcessResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for group in groups {
            for sink in sinks {
                debug!("Exporting group '{}' with {} sink", group.key, sink.name());
                if let Some(path) = sink.write_group(group, &self.label)? {
                    written.push(path);
                }
            }
        }
        Ok(written)
    }
}
