//! Error types for search orchestration
//!
//! Only request-level failures live here. Per-backend and per-URL failures
//! are recovered where they happen and are recorded as data
//! ([`BackendError`](crate::results::BackendError) and
//! [`ExtractionFailure`](crate::results::ExtractionFailure)).

/// Errors surfaced to the caller of a search operation
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    /// Bad input, rejected before any network call
    #[error("invalid request: {0}")]
    InvalidFilter(String),

    /// Every backend, including the browser fallback, failed
    #[error("search unavailable: {0}")]
    SearchUnavailable(String),

    /// The request was cancelled or exceeded its overall deadline
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Invalid settings
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Whether the caller sent something unacceptable, as opposed to a
    /// failure on our side or upstream
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFilter(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
