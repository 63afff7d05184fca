//! CLI command implementations
//!
//! This module contains the commands supported by the CLI application
//! using the Command pattern, plus the argument definitions they read.

pub mod command_traits;
pub mod process_command;
pub mod probe_command;

pub use command_traits::{Command, CommandFactory};
pub use process_command::ProcessCommand;
pub use probe_command::ProbeCommand;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::errors::ProcessResult;

/// Builds the command-line definition
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("linenode")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sample line features into measured nodes with optional DEM elevation")
        .arg(
            Arg::new("input")
                .help("Input GeoJSON line layer (or GeoTIFF with --probe)")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output folder")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("distance")
                .short('d')
                .long("distance")
                .help("Sampling distance in meters; omit to keep original vertices only")
                .value_name("METERS"),
        )
        .arg(
            Arg::new("elevation")
                .long("elevation")
                .help("GeoTIFF elevation model")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("band")
                .long("band")
                .help("Raster band, starting at 1")
                .value_name("N"),
        )
        .arg(
            Arg::new("group-field")
                .long("group-field")
                .help("Attribute used to group output rows")
                .value_name("FIELD"),
        )
        .arg(
            Arg::new("crs")
                .long("crs")
                .help("EPSG code of the input lines (e.g. 32631)")
                .value_name("CODE"),
        )
        .arg(
            Arg::new("raster-crs")
                .long("raster-crs")
                .help("EPSG code of the elevation model, overriding its GeoKeys")
                .value_name("CODE"),
        )
        .arg(
            Arg::new("no-vertices")
                .long("no-vertices")
                .help("Drop original vertices between sampling steps")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-attributes")
                .long("no-attributes")
                .help("Do not copy source attributes into the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-points")
                .long("no-points")
                .help("Write CSV tables only, without point GeoJSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("probe")
                .long("probe")
                .help("Print the elevation at one planar coordinate 'x,y'")
                .value_name("X,Y"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Factory for creating command instances based on CLI arguments
pub struct LineNodeCommandFactory;

impl LineNodeCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        LineNodeCommandFactory
    }
}

impl Default for LineNodeCommandFactory {
    fn default() -> Self {
        LineNodeCommandFactory::new()
    }
}

impl CommandFactory for LineNodeCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> ProcessResult<Box<dyn Command>> {
        if args.get_one::<String>("probe").is_some() {
            Ok(Box::new(ProbeCommand::new(args)?))
        } else {
            Ok(Box::new(ProcessCommand::new(args)?))
        }
    }
}
