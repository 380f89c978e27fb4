//! HTTP client for the IMGW public data store
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and upstream layout
//! - `http`: Core HTTP operations with resilience patterns
//! - `source`: The [`SourceFetcher`] seam and response classification

use async_trait::async_trait;
use chrono::NaiveDateTime;
use url::Url;

use crate::app::models::{raster_file_name, ArchiveKey};
use crate::errors::DownloadResult;

pub mod config;
pub mod http;
pub mod source;

pub use config::{ClientConfig, SourceConfig};
pub use source::{FetchOutcome, SourceFetcher};

use http::HttpHandler;
use source::classify_response;

/// HTTP client for the live and archive RainGRS products
///
/// Handles rate limiting and retries, and turns placeholder pages into
/// [`FetchOutcome::NotFound`].
#[derive(Debug)]
pub struct ImgwClient {
    http_handler: HttpHandler,
    source: SourceConfig,
}

impl ImgwClient {
    /// Creates a client against the public IMGW data store
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(ClientConfig::default(), SourceConfig::default())
    }

    /// Creates a client with custom transport and upstream settings
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP client cannot be built, the rate
    /// limit is zero, or the base URL does not parse.
    pub fn with_config(config: ClientConfig, source: SourceConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;
        source.base()?;

        tracing::info!("Created IMGW client for {}", source.base_url);

        Ok(Self {
            http_handler,
            source,
        })
    }

    /// Upstream layout in use
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    async fn fetch(&self, url: &Url) -> DownloadResult<FetchOutcome> {
        let body = self.http_handler.get_body(url).await?;
        let outcome = classify_response(body.status, body.bytes, &self.source.not_found_marker);
        match &outcome {
            FetchOutcome::Found(bytes) => {
                tracing::debug!("Received {} bytes from {}", bytes.len(), url)
            }
            FetchOutcome::NotFound => {
                tracing::debug!("Resource not available: {} ({})", url, body.status)
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl SourceFetcher for ImgwClient {
    async fn fetch_live(&self, timestamp: &NaiveDateTime) -> DownloadResult<FetchOutcome> {
        let url = self.source.live_url(&raster_file_name(timestamp))?;
        self.fetch(&url).await
    }

    async fn fetch_archive(&self, key: &ArchiveKey) -> DownloadResult<FetchOutcome> {
        let url = self
            .source
            .archive_url(&key.year(), &key.month(), &key.file_name())?;
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DownloadError;

    #[test]
    fn test_default_client_creation() {
        let client = ImgwClient::new().unwrap();
        assert_eq!(client.source(), &SourceConfig::default());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let source = SourceConfig {
            base_url: "::not-a-url".to_string(),
            ..Default::default()
        };
        let result = ImgwClient::with_config(ClientConfig::default(), source);
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = ClientConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        let result = ImgwClient::with_config(config, SourceConfig::default());
        assert!(matches!(result, Err(DownloadError::InvalidSetting { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let source = SourceConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            ..Default::default()
        };
        let config = ClientConfig {
            request_timeout: std::time::Duration::from_millis(200),
            connect_timeout: std::time::Duration::from_millis(200),
            ..Default::default()
        };
        let client = ImgwClient::with_config(config, source).unwrap();
        let hour = chrono::NaiveDate::from_ymd_opt(2024, 7, 20)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert!(client.fetch_live(&hour).await.is_err());
    }
}
