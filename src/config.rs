//! Run configuration
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! command-line flags, each layer overriding the one before.

use clap::ArgMatches;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinate::{CoordinateSystem, CoordinateSystemFactory};
use crate::errors::{ProcessError, ProcessResult};
use crate::export::distance_label;

/// Settings for one processing run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// GeoJSON file with line features
    pub input: Option<PathBuf>,
    /// Directory receiving the output files
    pub output_dir: Option<PathBuf>,
    /// Sampling step; `None` samples original vertices only
    pub distance: Option<f64>,
    pub keep_vertices: bool,
    pub keep_attributes: bool,
    /// Also write a point GeoJSON next to each CSV
    pub write_points: bool,
    pub group_field: Option<String>,
    /// GeoTIFF elevation model
    pub elevation: Option<PathBuf>,
    /// 1-based raster band
    pub band: usize,
    /// CRS of the input lines; falls back to the CRS declared in the file
    pub crs: Option<CoordinateSystem>,
    /// Overrides the CRS read from the elevation model
    pub raster_crs: Option<CoordinateSystem>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input: None,
            output_dir: None,
            distance: None,
            keep_vertices: true,
            keep_attributes: true,
            write_points: true,
            group_field: None,
            elevation: None,
            band: 1,
            crs: None,
            raster_crs: None,
        }
    }
}

impl RunConfig {
    /// Builds the configuration for a command line
    ///
    /// Reads the file named by `--config` first, then applies the flags.
    pub fn from_args(args: &ArgMatches) -> ProcessResult<Self> {
        let mut config = match args.get_one::<String>("config") {
            Some(path) => RunConfig::load_file(path)?,
            None => RunConfig::default(),
        };
        config.apply_args(args)?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Reads a TOML configuration file over the defaults
    pub fn load_file<P: AsRef<Path>>(path: P) -> ProcessResult<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            ProcessError::InvalidConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;
        RunConfig::from_toml_str(&content)
    }

    /// Parses TOML text over the defaults
    pub fn from_toml_str(content: &str) -> ProcessResult<Self> {
        let value: toml::Value = content
            .parse()
            .map_err(|e| ProcessError::InvalidConfig(format!("Malformed TOML: {}", e)))?;
        let table = value
            .as_table()
            .ok_or_else(|| ProcessError::InvalidConfig("Expected a TOML table".to_string()))?;

        let mut config = RunConfig::default();
        for (key, item) in table {
            match key.as_str() {
                "input" => config.input = Some(PathBuf::from(toml_str(key, item)?)),
                "output_dir" => config.output_dir = Some(PathBuf::from(toml_str(key, item)?)),
                "distance" => config.distance = Some(toml_f64(key, item)?),
                "keep_vertices" => config.keep_vertices = toml_bool(key, item)?,
                "keep_attributes" => config.keep_attributes = toml_bool(key, item)?,
                "write_points" => config.write_points = toml_bool(key, item)?,
                "group_field" => config.group_field = Some(toml_str(key, item)?.to_string()),
                "elevation" => config.elevation = Some(PathBuf::from(toml_str(key, item)?)),
                "band" => {
                    let band = item.as_integer().ok_or_else(|| wrong_type(key, "an integer"))?;
                    config.band = usize::try_from(band)
                        .map_err(|_| ProcessError::InvalidConfig(format!("band must be positive, got {}", band)))?;
                },
                "crs" => config.crs = Some(toml_crs(key, item)?),
                "raster_crs" => config.raster_crs = Some(toml_crs(key, item)?),
                other => {
                    return Err(ProcessError::InvalidConfig(format!("Unknown configuration key '{}'", other)));
                }
            }
        }
        Ok(config)
    }

    /// Applies command-line flags on top of the current values
    pub fn apply_args(&mut self, args: &ArgMatches) -> ProcessResult<()> {
        if let Some(input) = args.get_one::<String>("input") {
            self.input = Some(PathBuf::from(input));
        }
        if let Some(output) = args.get_one::<String>("output") {
            self.output_dir = Some(PathBuf::from(output));
        }
        if let Some(distance) = args.get_one::<String>("distance") {
            let value = distance.trim().parse::<f64>().map_err(|_| {
                ProcessError::InvalidConfig(format!("Invalid distance: {}", distance))
            })?;
            self.distance = Some(value);
        }
        if let Some(elevation) = args.get_one::<String>("elevation") {
            self.elevation = Some(PathBuf::from(elevation));
        }
        if let Some(band) = args.get_one::<String>("band") {
            self.band = band.trim().parse::<usize>().map_err(|_| {
                ProcessError::InvalidConfig(format!("Invalid band: {}", band))
            })?;
        }
        if let Some(field) = args.get_one::<String>("group-field") {
            self.group_field = Some(field.clone());
        }
        if let Some(crs) = args.get_one::<String>("crs") {
            self.crs = Some(CoordinateSystemFactory::from_string(crs)?);
        }
        if let Some(crs) = args.get_one::<String>("raster-crs") {
            self.raster_crs = Some(CoordinateSystemFactory::from_string(crs)?);
        }
        if args.get_flag("no-vertices") {
            self.keep_vertices = false;
        }
        if args.get_flag("no-attributes") {
            self.keep_attributes = false;
        }
        if args.get_flag("no-points") {
            self.write_points = false;
        }
        Ok(())
    }

    /// Checks the values that do not depend on the input data
    pub fn validate(&self) -> ProcessResult<()> {
        match &self.input {
            Some(path) if !path.as_os_str().is_empty() => {},
            _ => return Err(ProcessError::Precondition("No input layer given".to_string())),
        }
        match &self.output_dir {
            Some(path) if !path.as_os_str().is_empty() => {},
            _ => return Err(ProcessError::Precondition("No output folder given".to_string())),
        }
        if let Some(distance) = self.distance {
            if !distance.is_finite() || distance < 0.0 {
                return Err(ProcessError::InvalidConfig(format!(
                    "Distance must be a finite value >= 0, got {}", distance
                )));
            }
        }
        if self.band < 1 {
            return Err(ProcessError::InvalidConfig("Raster band numbers start at 1".to_string()));
        }
        if let Some(crs) = &self.crs {
            crs.ensure_planar_meters("Input layer")?;
        }
        if let Some(crs) = &self.raster_crs {
            crs.ensure_planar_meters("Elevation raster")?;
        }
        Ok(())
    }

    /// Sampling step handed to the sampler, 0 for vertices only
    pub fn sampling_distance(&self) -> f64 {
        self.distance.unwrap_or(0.0)
    }

    /// Vertex preservation, always on without a sampling distance
    pub fn preserve_vertices(&self) -> bool {
        self.keep_vertices || self.distance.is_none()
    }

    /// Distance part of the output file names, `verts` when no distance is set
    pub fn label(&self) -> String {
        distance_label(self.distance)
    }

    /// Group field name, ignoring blank values
    pub fn group_field(&self) -> Option<&str> {
        self.group_field.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

fn wrong_type(key: &str, expected: &str) -> ProcessError {
    ProcessError::InvalidConfig(format!("'{}' must be {}", key, expected))
}

fn toml_str<'v>(key: &str, item: &'v toml::Value) -> ProcessResult<&'v str> {
    item.as_str().ok_or_else(|| wrong_type(key, "a string"))
}

fn toml_bool(key: &str, item: &toml::Value) -> ProcessResult<bool> {
    item.as_bool().ok_or_else(|| wrong_type(key, "a boolean"))
}

fn toml_f64(key: &str, item: &toml::Value) -> ProcessResult<f64> {
    match item {
        toml::Value::Float(f) => Ok(*f),
        toml::Value::Integer(i) => Ok(*i as f64),
        _ => Err(wrong_type(key, "a number")),
    }
}

fn toml_crs(key: &str, item: &toml::Value) -> ProcessResult<CoordinateSystem> {
    match item {
        toml::Value::Integer(code) => u32::try_from(*code)
            .map(CoordinateSystemFactory::from_epsg)
            .map_err(|_| ProcessError::InvalidConfig(format!("Invalid EPSG code: {}", code))),
        toml::Value::String(s) => CoordinateSystemFactory::from_string(s),
        _ => Err(wrong_type(key, "an EPSG code")),
    }
}
