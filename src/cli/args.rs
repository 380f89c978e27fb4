//! Command-line argument parsing for the IMGW RainGRS fetcher
//!
//! This module defines the CLI structure using clap derive macros: hourly
//! raster acquisition, point series extraction and configuration management.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::models::{parse_timestamp, GeoPoint, TimeRange};
use crate::app::MissingRasterPolicy;
use crate::errors::Result;

/// IMGW RainGRS fetcher - hourly precipitation rasters and point series
#[derive(Parser, Debug)]
#[command(
    name = "imgw_raingrs",
    version,
    about = "Fetch IMGW RainGRS hourly precipitation rasters and extract point time series",
    long_about = "Downloads hourly RainGRS 60-minute accumulation grids from the IMGW public data store,
falling back to the daily archives for hours no longer on the live feed, and extracts
precipitation values at geographic points."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every hourly raster of a time range into the cache
    Acquire(AcquireArgs),

    /// Extract precipitation series at points
    Series(SeriesArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Inclusive hourly time range
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First hour (YYYY-MM-DDTHH:MM)
    #[arg(short, long, value_parser = parse_timestamp_arg)]
    pub start: NaiveDateTime,

    /// Last hour, inclusive (YYYY-MM-DDTHH:MM)
    #[arg(short, long, value_parser = parse_timestamp_arg)]
    pub end: NaiveDateTime,
}

impl RangeArgs {
    pub fn time_range(&self) -> Result<TimeRange> {
        TimeRange::new(self.start, self.end)
    }
}

/// Arguments for the acquire command
#[derive(Args, Debug, Clone)]
pub struct AcquireArgs {
    #[command(flatten)]
    pub range: RangeArgs,
}

/// Output format of the series command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Arguments for the series command
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Point of interest, repeatable
    #[arg(short, long = "point", value_name = "LAT,LON[,LABEL]", value_parser = parse_point_arg)]
    pub points: Vec<GeoPoint>,

    /// File with one LAT,LON[,LABEL] per line
    #[arg(long, value_name = "FILE")]
    pub points_file: Option<PathBuf>,

    /// Use only rasters already in the cache
    #[arg(long)]
    pub offline: bool,

    /// Emit empty values for hours without a raster instead of skipping them
    #[arg(long)]
    pub emit_missing: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SeriesArgs {
    /// Policy override requested on the command line, if any
    pub fn missing_raster_policy(&self) -> Option<MissingRasterPolicy> {
        self.emit_missing.then_some(MissingRasterPolicy::EmitMissing)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.points.is_empty() && self.points_file.is_none() {
            return Err("At least one --point or a --points-file is required".to_string());
        }
        Ok(())
    }
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Target path (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn parse_timestamp_arg(value: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(value).map_err(|e| e.to_string())
}

fn parse_point_arg(value: &str) -> std::result::Result<GeoPoint, String> {
    GeoPoint::from_str(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from the verbosity flags, falling back to the
    /// configured level
    pub fn log_level(&self, configured: &str) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::from_str(configured).unwrap_or(tracing::Level::WARN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(global: GlobalArgs) -> Cli {
        Cli {
            global,
            command: Commands::Config(ConfigArgs {
                action: ConfigAction::Show,
            }),
        }
    }

    fn global() -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config: None,
            cache_dir: None,
        }
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = cli(GlobalArgs {
            quiet: true,
            ..global()
        });
        let cli_verbose = cli(GlobalArgs {
            verbose: true,
            ..global()
        });
        let cli_default = cli(global());

        assert_eq!(cli_quiet.log_level("debug"), tracing::Level::ERROR);
        assert_eq!(cli_verbose.log_level("warn"), tracing::Level::INFO);
        assert_eq!(cli_default.log_level("debug"), tracing::Level::DEBUG);
        assert_eq!(cli_default.log_level("nonsense"), tracing::Level::WARN);
    }

    #[test]
    fn test_series_command_parsing() {
        let cli = Cli::try_parse_from([
            "imgw_raingrs",
            "series",
            "--start",
            "2024-07-20T00:00",
            "--end",
            "2024-07-20 05:00",
            "--point",
            "51.413447,21.965275,Pulawy",
            "-p",
            "52.2297,21.0122",
            "--emit-missing",
            "--format",
            "json",
        ])
        .unwrap();

        let Commands::Series(args) = cli.command else {
            panic!("expected series command");
        };
        assert_eq!(args.points.len(), 2);
        assert_eq!(args.points[0].label.as_deref(), Some("Pulawy"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(
            args.missing_raster_policy(),
            Some(MissingRasterPolicy::EmitMissing)
        );
        assert_eq!(args.range.time_range().unwrap().len(), 6);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_invalid_point_rejected() {
        let result = Cli::try_parse_from([
            "imgw_raingrs",
            "series",
            "--start",
            "2024-07-20T00:00",
            "--end",
            "2024-07-20T01:00",
            "--point",
            "north,south",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_series_requires_points() {
        let cli = Cli::try_parse_from([
            "imgw_raingrs",
            "series",
            "--start",
            "2024-07-20T00:00",
            "--end",
            "2024-07-20T01:00",
        ])
        .unwrap();
        let Commands::Series(args) = cli.command else {
            panic!("expected series command");
        };
        assert!(args.validate().is_err());
        assert_eq!(args.missing_raster_policy(), None);
    }

    #[test]
    fn test_acquire_with_global_flags() {
        let cli = Cli::try_parse_from([
            "imgw_raingrs",
            "acquire",
            "-s",
            "2024-07-20T00:00",
            "-e",
            "2024-07-21T00:00",
            "--cache-dir",
            "/tmp/grs_asc",
            "-v",
        ])
        .unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.cache_dir, Some(PathBuf::from("/tmp/grs_asc")));
        assert!(matches!(cli.command, Commands::Acquire(_)));
    }
}
