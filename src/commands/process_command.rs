//! Line sampling command
//!
//! Reads the line layer, checks the CRS guard, opens the elevation model,
//! samples every feature and writes one CSV (and optionally one point
//! GeoJSON) per group.

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use crate::api::{open_elevation_probe, LineNodeProcessor};
use crate::commands::command_traits::Command;
use crate::config::RunConfig;
use crate::errors::{ProcessError, ProcessResult};
use crate::export::{CsvExporter, ExportSink, GeoJsonPointExporter};
use crate::input::read_features;
use crate::utils::progress::ProgressTracker;

/// Command sampling a GeoJSON line layer
pub struct ProcessCommand {
    config: RunConfig,
    show_progress: bool,
}

impl ProcessCommand {
    /// Create a new process command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// A new ProcessCommand, or the first configuration problem found
    pub fn new(args: &ArgMatches) -> ProcessResult<Self> {
        let config = RunConfig::from_args(args)?;
        let command = ProcessCommand::from_config(config)?;
        Ok(ProcessCommand { show_progress: true, ..command })
    }

    /// Create a command from a ready configuration, without a progress bar
    pub fn from_config(config: RunConfig) -> ProcessResult<Self> {
        config.validate()?;
        Ok(ProcessCommand {
            config,
            show_progress: false,
        })
    }

    /// Runs the whole pass and returns the files written
    pub fn run(&self) -> ProcessResult<Vec<PathBuf>> {
        let config = &self.config;
        let input = config
            .input
            .as_ref()
            .ok_or_else(|| ProcessError::Precondition("No input layer given".to_string()))?;
        let output_dir = config
            .output_dir
            .as_ref()
            .ok_or_else(|| ProcessError::Precondition("No output folder given".to_string()))?;

        let source = read_features(input)?;
        let crs = config.crs.or(source.crs).ok_or_else(|| {
            ProcessError::Precondition(
                "Input layer CRS is unknown. Declare it in the file or pass --crs.".to_string(),
            )
        })?;
        crs.ensure_planar_meters("Input layer")?;
        info!("Input layer: {} feature(s) in {}", source.features.len(), crs.description());

        let probe = match &config.elevation {
            Some(path) => Some(open_elevation_probe(path, config.band, Some(crs), config.raster_crs)?),
            None => None,
        };

        std::fs::create_dir_all(output_dir)?;

        let processor = LineNodeProcessor::from_config(config, crs, probe);
        let progress = if self.show_progress {
            ProgressTracker::new(source.features.len() as u64, "Sampling features")
        } else {
            ProgressTracker::hidden()
        };

        let cancel = AtomicBool::new(false);
        let groups = processor.process_all_with(&source.features, &cancel, &mut |_| progress.increment(1));
        progress.finish();

        let mut sinks: Vec<Box<dyn ExportSink>> = vec![Box::new(CsvExporter::new(output_dir))];
        if config.write_points {
            sinks.push(Box::new(GeoJsonPointExporter::new(output_dir, crs)));
        }

        let written = processor.export_groups(&groups, &sinks)?;
        info!("Wrote {} file(s) to {}", written.len(), output_dir.display());
        Ok(written)
    }
}

impl Command for ProcessCommand {
    fn execute(&self) -> ProcessResult<()> {
        self.run().map(|_| ())
    }
}
