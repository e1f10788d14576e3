//! Page fetching seam shared by the HTTP client and the browser

use crate::engines::EngineResponse;
use async_trait::async_trait;
use std::time::Duration;

/// Extra time callers allow on top of a fetch's own timeout, so the fetcher
/// can report the timeout and release what it holds before being dropped
pub const FETCH_GRACE: Duration = Duration::from_secs(5);

/// Transport-level failure of one fetch
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("browser unavailable: {0}")]
    Unavailable(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report which limit fired
            FetchError::Timeout(Duration::ZERO)
        } else if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Fetches one URL and returns status, headers and body.
///
/// Non-success statuses are returned as responses, not errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<EngineResponse, FetchError>;
}
