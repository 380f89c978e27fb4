//! Upstream source abstraction
//!
//! The acquisition pipeline only sees [`SourceFetcher`]; the HTTP client is
//! one implementation and tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::StatusCode;

use crate::app::models::ArchiveKey;
use crate::errors::DownloadResult;

/// Result of asking the upstream for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Resource body
    Found(Vec<u8>),
    /// Upstream does not have the resource (yet)
    NotFound,
}

impl FetchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }
}

/// Source of hourly rasters and daily archives
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the live raster for an hour
    async fn fetch_live(&self, timestamp: &NaiveDateTime) -> DownloadResult<FetchOutcome>;

    /// Fetch the daily archive for a publication day
    async fn fetch_archive(&self, key: &ArchiveKey) -> DownloadResult<FetchOutcome>;
}

/// True if `body` is the upstream's placeholder page rather than data
pub fn is_placeholder_page(body: &[u8], marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    let marker = marker.as_bytes();
    body.windows(marker.len()).any(|window| window == marker)
}

/// Decide whether a completed response carries the requested resource
///
/// Any non-success status, or a success carrying the placeholder page, is
/// treated as "not found".
pub fn classify_response(status: StatusCode, body: Vec<u8>, marker: &str) -> FetchOutcome {
    if !status.is_success() {
        return FetchOutcome::NotFound;
    }
    if is_placeholder_page(&body, marker) {
        return FetchOutcome::NotFound;
    }
    FetchOutcome::Found(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NOT_FOUND_MARKER;

    const PLACEHOLDER: &str =
        "<html>\r\n<head><title>404 Not Found</title></head>\r\n<body></body></html>";

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder_page(PLACEHOLDER.as_bytes(), NOT_FOUND_MARKER));
        assert!(!is_placeholder_page(b"ncols 700\nnrows 800\n", NOT_FOUND_MARKER));
        assert!(!is_placeholder_page(b"", NOT_FOUND_MARKER));
        assert!(!is_placeholder_page(PLACEHOLDER.as_bytes(), ""));
    }

    #[test]
    fn test_classify_success() {
        let outcome = classify_response(StatusCode::OK, b"ncols 1".to_vec(), NOT_FOUND_MARKER);
        assert_eq!(outcome, FetchOutcome::Found(b"ncols 1".to_vec()));
        assert!(outcome.is_found());
    }

    #[test]
    fn test_classify_placeholder_with_ok_status() {
        let outcome = classify_response(
            StatusCode::OK,
            PLACEHOLDER.as_bytes().to_vec(),
            NOT_FOUND_MARKER,
        );
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[test]
    fn test_classify_error_status() {
        let outcome = classify_response(StatusCode::NOT_FOUND, Vec::new(), NOT_FOUND_MARKER);
        assert_eq!(outcome, FetchOutcome::NotFound);

        let outcome = classify_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            b"data".to_vec(),
            NOT_FOUND_MARKER,
        );
        assert!(!outcome.is_found());
    }
}
