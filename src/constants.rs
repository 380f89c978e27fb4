//! Application constants for the IMGW RainGRS fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("imgw-raingrs/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for data store requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for transport failures, 429 and 503
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
}

/// IMGW public data store endpoints
pub mod imgw {
    /// Data store download root
    pub const BASE_URL: &str = "https://danepubliczne.imgw.pl/datastore/getfiledown/";

    /// Near-real-time (operational) RainGRS 60 minute product path
    pub const LIVE_PATH: &str = "Oper/Nowcasting/RainGRS/grs_60_asc/";

    /// Archived RainGRS 60 minute product path, bucketed by `{year}/{month}/`
    pub const ARCHIVE_PATH: &str = "Arch/Nowcasting/RainGRS/grs_60_asc/";

    /// Body marker of the placeholder page served with a success status
    /// for resources that do not exist
    pub const NOT_FOUND_MARKER: &str = "<title>404 Not Found</title>";
}

/// File naming and cache layout constants
pub mod files {
    /// `chrono` format of the timestamp prefix of a raster file name
    pub const RASTER_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

    /// Suffix appended to the timestamp prefix of a raster file name
    pub const RASTER_FILE_SUFFIX: &str = "_acc0060_grs.asc";

    /// Prefix of daily archive names (`grs_60_asc_2024-07-22.tar`)
    pub const ARCHIVE_FILE_PREFIX: &str = "grs_60_asc_";

    /// Extension of daily archive names
    pub const ARCHIVE_FILE_EXTENSION: &str = ".tar";

    /// Temporary file suffix for atomic writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Application directory name under the user config directory
    pub const APP_DIR_NAME: &str = "imgw-raingrs";
}

/// Archive publication lag schedule
pub mod archive {
    /// Days added to the target hour to find the archive tried first
    pub const PRIMARY_LAG_DAYS: i64 = 2;

    /// Days added to the target hour to find the fallback archive
    pub const FALLBACK_LAG_DAYS: i64 = 1;
}

/// RainGRS grid geometry in EPSG:2180
pub mod grid {
    /// Cell size in metres
    pub const CELL_SIZE: f64 = 1000.0;

    /// Easting of the grid origin
    pub const X_OFFSET: f64 = 50_000.0;

    /// Northing of the grid origin
    pub const Y_OFFSET: f64 = 30_000.0;
}

/// Coordinate reference systems
pub mod crs {
    /// Input points: WGS84 geographic coordinates (EPSG:4326)
    pub const GEOGRAPHIC: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

    /// Raster grid: ETRF2000-PL / CS92 (EPSG:2180)
    pub const CS92: &str = "+proj=tmerc +lat_0=0 +lon_0=19 +k=0.9993 +x_0=500000 +y_0=-5300000 +ellps=GRS80 +units=m +no_defs";
}

// Re-export commonly used constants at the top level for convenience
pub use http::USER_AGENT;
pub use imgw::{BASE_URL, NOT_FOUND_MARKER};
