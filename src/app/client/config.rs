//! HTTP client and upstream source configuration
//!
//! [`ClientConfig`] controls the transport; [`SourceConfig`] names the data
//! store endpoints so that nothing about the upstream layout is global.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{http, imgw, limits};
use crate::errors::{DownloadError, DownloadResult};

/// Configuration for the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// TCP keep-alive settings
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
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

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> DownloadResult<Client> {
        let mut client_builder = Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(DownloadError::Http)
    }
}

/// Upstream data store layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Download root, e.g. `https://danepubliczne.imgw.pl/datastore/getfiledown/`
    pub base_url: String,
    /// Live product path below the root
    pub live_path: String,
    /// Archive product path below the root, followed by `{year}/{month}/`
    pub archive_path: String,
    /// Body marker identifying a placeholder "not found" page
    pub not_found_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: imgw::BASE_URL.to_string(),
            live_path: imgw::LIVE_PATH.to_string(),
            archive_path: imgw::ARCHIVE_PATH.to_string(),
            not_found_marker: imgw::NOT_FOUND_MARKER.to_string(),
        }
    }
}

impl SourceConfig {
    /// Parse the base URL, normalizing it to end with a slash
    pub fn base(&self) -> DownloadResult<Url> {
        let normalized = with_trailing_slash(&self.base_url);
        Url::parse(&normalized).map_err(|e| DownloadError::InvalidUrl {
            url: self.base_url.clone(),
            error: e.to_string(),
        })
    }

    /// URL of a live raster file
    pub fn live_url(&self, file_name: &str) -> DownloadResult<Url> {
        self.join(&format!("{}{}", with_trailing_slash(&self.live_path), file_name))
    }

    /// URL of a daily archive under its `{year}/{month}/` bucket
    pub fn archive_url(&self, year: &str, month: &str, tar_name: &str) -> DownloadResult<Url> {
        self.join(&format!(
            "{}{}/{}/{}",
            with_trailing_slash(&self.archive_path),
            year,
            month,
            tar_name
        ))
    }

    fn join(&self, relative: &str) -> DownloadResult<Url> {
        let relative = relative.trim_start_matches('/');
        self.base()?
            .join(relative)
            .map_err(|e| DownloadError::InvalidUrl {
                url: format!("{}{}", self.base_url, relative),
                error: e.to_string(),
            })
    }
}

fn with_trailing_slash(value: &str) -> String {
    if value.is_empty() || value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.request_timeout, http::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_http_client_creation() {
        let config = ClientConfig {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            ..Default::default()
        };
        assert!(config.build_http_client().is_ok());
    }

    #[test]
    fn test_live_url() {
        let url = SourceConfig::default()
            .live_url("202407201500_acc0060_grs.asc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://danepubliczne.imgw.pl/datastore/getfiledown/Oper/Nowcasting/RainGRS/grs_60_asc/202407201500_acc0060_grs.asc"
        );
    }

    #[test]
    fn test_archive_url() {
        let url = SourceConfig::default()
            .archive_url("2024", "07", "grs_60_asc_2024-07-22.tar")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://danepubliczne.imgw.pl/datastore/getfiledown/Arch/Nowcasting/RainGRS/grs_60_asc/2024/07/grs_60_asc_2024-07-22.tar"
        );
    }

    #[test]
    fn test_paths_without_trailing_slashes() {
        let config = SourceConfig {
            base_url: "http://localhost:8080/store".to_string(),
            live_path: "/live".to_string(),
            archive_path: "arch".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.live_url("a.asc").unwrap().as_str(),
            "http://localhost:8080/store/live/a.asc"
        );
        assert_eq!(
            config.archive_url("2024", "01", "b.tar").unwrap().as_str(),
            "http://localhost:8080/store/arch/2024/01/b.tar"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SourceConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.live_url("a.asc"),
            Err(DownloadError::InvalidUrl { .. })
        ));
    }
}
