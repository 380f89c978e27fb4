//! IMGW RainGRS Library
//!
//! Fetches hourly RainGRS precipitation rasters from the IMGW public data
//! store, keeps them in a local cache with a live/archive fallback, and
//! extracts precipitation time series at geographic points.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
