//! Command-line interface components
//!
//! This module contains CLI-specific code for the IMGW RainGRS fetcher,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AcquireArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, OutputFormat, RangeArgs,
    SeriesArgs,
};
pub use commands::{handle_acquire, handle_config, handle_series};
pub use progress::{AcquisitionProgress, ProgressConfig};
