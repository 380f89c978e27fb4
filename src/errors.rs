//! Error types for the IMGW RainGRS fetcher
//!
//! This module defines error types for all components of the application.
//! An upstream "not found" is not an error here: it is modelled as
//! [`FetchOutcome::NotFound`](crate::app::FetchOutcome) and recovered by the
//! archive fallback schedule.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// HTTP transport errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Invalid URL provided or built from configuration
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Invalid client settings
    #[error("Invalid HTTP client setting: {reason}")]
    InvalidSetting { reason: String },
}

/// Local raster cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory not found, not creatable or not a directory
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Raster requested for a timestamp that has no local file
    #[error("No raster cached for {timestamp} (expected at {path})")]
    RasterNotFound {
        timestamp: NaiveDateTime,
        path: PathBuf,
    },

    /// Raster file exists but could not be decoded
    #[error("Failed to decode raster {path}")]
    MalformedRaster {
        path: PathBuf,
        #[source]
        source: RasterError,
    },

    /// I/O failure reading or writing a cache file
    #[error("Cache I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be unpacked
    #[error("Failed to extract archive {path}")]
    ArchiveExtraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Background blocking task failed
    #[error("Background cache task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// ESRI ASCII grid decoding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// One of the six header lines is missing or does not parse
    #[error("Malformed raster header at line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },

    /// Grid body does not match the header dimensions or holds a non-number
    #[error("Malformed raster data: {reason}")]
    MalformedData { reason: String },
}

/// Coordinate reprojection errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Projection definition rejected
    #[error("Invalid projection definition '{definition}': {reason}")]
    InvalidDefinition { definition: String, reason: String },

    /// Point could not be transformed
    #[error("Failed to project ({latitude}, {longitude}): {reason}")]
    TransformFailed {
        latitude: f64,
        longitude: f64,
        reason: String,
    },
}

/// Series extraction errors, reported per row
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Raster could not be read from the cache
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Point could not be projected into the grid reference system
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Projected coordinate is NaN or infinite
    #[error("Non-finite projected coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// Resolved grid cell falls outside the raster extent
    #[error("Grid cell ({row}, {col}) outside raster of {nrows} rows x {ncols} columns")]
    OutOfBoundsCell {
        row: i64,
        col: i64,
        nrows: usize,
        ncols: usize,
    },
}

impl ExtractionError {
    /// Check whether the failure comes from an unparsable raster header
    pub fn is_malformed_header(&self) -> bool {
        matches!(
            self,
            ExtractionError::Cache(CacheError::MalformedRaster {
                source: RasterError::MalformedHeader { .. },
                ..
            })
        )
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No user config directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Raster decoding error
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Projection error
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Extraction error
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CSV input or output error
    #[error("CSV error")]
    Csv(#[from] csv::Error),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Download(DownloadError::Http(_))
                | AppError::Download(DownloadError::RateLimitExceeded)
                | AppError::Download(DownloadError::ServerOverloaded)
                | AppError::Download(DownloadError::MaxRetriesExceeded { .. })
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Cache(_) => "cache",
            AppError::Raster(_) => "raster",
            AppError::Projection(_) => "projection",
            AppError::Extraction(_) => "extraction",
            AppError::Config(_) => "config",
            AppError::Csv(_) => "csv",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Raster result type alias
pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Projection result type alias
pub type ProjectionResult<T> = std::result::Result<T, ProjectionError>;

/// Extraction result type alias
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
