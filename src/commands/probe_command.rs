//! Elevation probe command
//!
//! Prints the normalized elevation of a DEM at one planar coordinate.

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;

use crate::api::open_elevation_probe;
use crate::commands::command_traits::Command;
use crate::coordinate::{CoordinateSystem, CoordinateSystemFactory, Point};
use crate::errors::{ProcessError, ProcessResult};

/// Command sampling a single point of an elevation model
pub struct ProbeCommand {
    raster: PathBuf,
    point: Point,
    band: usize,
    /// CRS of `point`; the raster's own CRS when not given
    crs: Option<CoordinateSystem>,
    raster_crs: Option<CoordinateSystem>,
}

impl ProbeCommand {
    /// Create a new probe command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    pub fn new(args: &ArgMatches) -> ProcessResult<Self> {
        let raster = args
            .get_one::<String>("input")
            .map(PathBuf::from)
            .ok_or_else(|| ProcessError::Precondition("No elevation raster given".to_string()))?;

        let coordinate = args
            .get_one::<String>("probe")
            .ok_or_else(|| ProcessError::InvalidConfig("Missing --probe coordinate".to_string()))?;
        let point = Point::from_string(coordinate)?;

        let band = match args.get_one::<String>("band") {
            Some(b) => b.trim().parse::<usize>()
                .map_err(|_| ProcessError::InvalidConfig(format!("Invalid band: {}", b)))?,
            None => 1,
        };

        let crs = args.get_one::<String>("crs")
            .map(|c| CoordinateSystemFactory::from_string(c))
            .transpose()?;
        let raster_crs = args.get_one::<String>("raster-crs")
            .map(|c| CoordinateSystemFactory::from_string(c))
            .transpose()?;

        Ok(ProbeCommand {
            raster,
            point,
            band,
            crs,
            raster_crs,
        })
    }

    /// Elevation at the configured point, `None` when it cannot be measured
    pub fn probe(&self) -> ProcessResult<Option<f64>> {
        if let Some(crs) = self.crs {
            crs.ensure_planar_meters("Probe coordinate")?;
        }
        let probe = open_elevation_probe(&self.raster, self.band, self.crs, self.raster_crs)?;
        Ok(probe.sample(&self.point))
    }
}

impl Command for ProbeCommand {
    fn execute(&self) -> ProcessResult<()> {
        info!("Probing {} band {} at ({}, {})", self.raster.display(), self.band, self.point.x, self.point.y);
        match self.probe()? {
            Some(z) => println!("{} {} {}", self.point.x, self.point.y, z),
            None => println!("{} {} NULL", self.point.x, self.point.y),
        }
        Ok(())
    }
}
