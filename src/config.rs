//! Configuration management for the IMGW RainGRS fetcher
//!
//! Settings come from one TOML file found in a fixed search order, with
//! every section and field optional. Missing values fall back to the
//! built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CacheConfig, ClientConfig, ExtractionConfig, GridConfig, SourceConfig};
use crate::constants::{files, http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Log levels accepted in `[logging] level`
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Local cache settings
    pub cache: CacheConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Upstream data store layout
    pub source: SourceConfig,
    /// Raster grid geometry
    pub grid: GridConfig,
    /// Series extraction settings
    pub extraction: ExtractionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (None = system default)
    pub cache_root: Option<PathBuf>,
    /// Keep downloaded daily archives after extraction
    pub keep_archives: bool,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            keep_archives: true,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive interval (None = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout (None = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Runtime configuration of every component
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub cache: CacheConfig,
    pub client: ClientConfig,
    pub source: SourceConfig,
    pub grid: GridConfig,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            cache: self.cache.to_runtime_config(),
            client: self.client.to_runtime_config(),
            source: self.source.clone(),
            grid: self.grid,
            extraction: self.extraction.clone(),
        }
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one the standard locations are
    /// searched and the defaults are used if none has a file.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.rate_limit_rps == 0 {
            return Err(invalid("client.rate_limit_rps", "0", "must be at least 1"));
        }

        if !(self.grid.cell_size.is_finite() && self.grid.cell_size > 0.0) {
            return Err(invalid(
                "grid.cell_size",
                &self.grid.cell_size.to_string(),
                "must be a positive number",
            ));
        }

        for (field, value) in [
            ("grid.x_offset", self.grid.x_offset),
            ("grid.y_offset", self.grid.y_offset),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, &value.to_string(), "must be finite"));
            }
        }

        if let Err(e) = self.source.base() {
            return Err(invalid(
                "source.base_url",
                &self.source.base_url,
                &e.to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(
                "logging.level",
                &self.logging.level,
                "expected one of error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            PathBuf::from(format!("./{}.toml", files::APP_DIR_NAME)),
            PathBuf::from("./config.toml"),
        ];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write the commented default configuration
    ///
    /// Writes to `path`, or to the user config location when `None`. An
    /// existing file is only replaced when `force` is set.
    pub async fn write_default(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: "file already exists (use --force to overwrite)".to_string(),
            });
        }

        let io_error = |source| ConfigError::Io {
            path: config_path.clone(),
            source,
        };

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(io_error)?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let default_cache_path = dirs::config_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME).join("cache"))
            .unwrap_or_else(|| PathBuf::from("./grs_asc"));
        let source = SourceConfig::default();

        format!(
            r#"# IMGW RainGRS fetcher configuration

[cache]
# Cache directory (leave unset to use {cache})
# cache_root = "/path/to/grs_asc"

# Keep daily archives after their rasters have been extracted
keep_archives = true

[client]
tcp_keepalive = "30s"
pool_idle_timeout = "{pool_idle}s"
pool_max_per_host = {pool_max}
request_timeout = "{request}s"
connect_timeout = "{connect}s"
rate_limit_rps = {rps}

[source]
base_url = "{base_url}"
live_path = "{live_path}"
archive_path = "{archive_path}"
not_found_marker = "{marker}"

[grid]
# EPSG:2180 metres
cell_size = {cell_size:.1}
x_offset = {x_offset:.1}
y_offset = {y_offset:.1}

[extraction]
# "skip" drops hours without a raster, "emit_missing" reports them as empty values
missing_raster = "skip"

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            cache = default_cache_path.display(),
            pool_idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool_max = http::POOL_MAX_PER_HOST,
            request = http::DEFAULT_TIMEOUT.as_secs(),
            connect = http::CONNECT_TIMEOUT.as_secs(),
            rps = limits::DEFAULT_RATE_LIMIT_RPS,
            base_url = source.base_url,
            live_path = source.live_path,
            archive_path = source.archive_path,
            marker = source.not_found_marker,
            cell_size = GridConfig::default().cell_size,
            x_offset = GridConfig::default().x_offset,
            y_offset = GridConfig::default().y_offset,
        )
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            keep_archives: self.keep_archives,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}
