//! Result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Characters kept in a content preview
pub const PREVIEW_CHARS: usize = 500;

/// A single search hit, as returned by one backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    /// The title of the hit
    pub title: String,
    /// Absolute http(s) URL
    pub url: String,
    /// Snippet shown by the backend
    pub description: String,
    /// Backend that returned this hit
    pub backend: String,
    /// Publication date as reported by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

impl SearchHit {
    /// Create a new hit
    pub fn new(url: impl Into<String>, title: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
            backend: backend.into(),
            published: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a publication date
    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }

    /// Whether the URL is an absolute http(s) URL
    pub fn has_valid_url(&self) -> bool {
        is_web_url(&self.url)
    }
}

/// Whether `url` parses as an absolute http or https URL with a host
pub fn is_web_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Per-backend failure, recovered by trying the next candidate
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BackendError {
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("CAPTCHA required")]
    Captcha,
    #[error("no results")]
    Empty,
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// One backend attempt made while serving a request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendAttempt {
    pub backend: String,
    /// Hits parsed (0 on failure)
    pub hits: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BackendError>,
}

impl BackendAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Why a single URL could not be extracted
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("{}", status_line(*.0))]
    HttpStatus(u16),
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("blocked by bot protection")]
    Blocked,
    #[error("no readable content")]
    EmptyContent,
    #[error("browser fallback unavailable")]
    BrowserUnavailable,
    #[error("{primary}; browser fallback: {browser}")]
    Fallback {
        primary: Box<ExtractionFailure>,
        browser: Box<ExtractionFailure>,
    },
    #[error("cancelled")]
    Cancelled,
}

impl ExtractionFailure {
    /// Failures the browser cannot fix: the page is gone
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::HttpStatus(404) | Self::HttpStatus(410))
    }
}

/// `HTTP 404 Not Found`, or just the code when it has no canonical reason
pub fn status_line(code: u16) -> String {
    match reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("HTTP {code} {reason}"),
        None => format!("HTTP {code}"),
    }
}

/// Extraction status for one URL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Ok,
    Failed,
    /// Extraction was not requested
    Skipped,
}

/// Which path produced the text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Http,
    Browser,
}

/// Extraction result for one URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub url: String,
    pub status: ExtractionStatus,
    /// Extracted text, possibly truncated
    pub text: String,
    /// Length of `text` in characters
    pub length: usize,
    pub word_count: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<FetchMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    /// Successful extraction
    pub fn ok(url: impl Into<String>, text: String, truncated: bool, method: FetchMethod) -> Self {
        Self {
            url: url.into(),
            status: ExtractionStatus::Ok,
            length: text.chars().count(),
            word_count: word_count(&text),
            text,
            truncated,
            method: Some(method),
            error: None,
        }
    }

    /// Failed extraction with a reason
    pub fn failed(url: impl Into<String>, failure: &ExtractionFailure) -> Self {
        Self {
            url: url.into(),
            status: ExtractionStatus::Failed,
            text: String::new(),
            length: 0,
            word_count: 0,
            truncated: false,
            method: None,
            error: Some(failure.to_string()),
        }
    }

    /// Extraction not requested
    pub fn skipped(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ExtractionStatus::Skipped,
            text: String::new(),
            length: 0,
            word_count: 0,
            truncated: false,
            method: None,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }

    /// First [`PREVIEW_CHARS`] characters, with `...` when cut
    pub fn preview(&self) -> Option<String> {
        if self.text.is_empty() {
            return None;
        }
        if self.length > PREVIEW_CHARS {
            let cut: String = self.text.chars().take(PREVIEW_CHARS).collect();
            Some(format!("{cut}..."))
        } else {
            Some(self.text.clone())
        }
    }
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A hit paired with its extraction outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntry {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub content: ExtractionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

/// Response for both search operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    /// Backend whose hits are returned
    pub backend: String,
    pub results: Vec<ResultEntry>,
    pub total_results: usize,
    /// Entries whose extraction succeeded
    pub extracted_count: usize,
    /// Every backend tried, in order
    pub attempts: Vec<BackendAttempt>,
    pub elapsed_ms: u64,
}

/// Response for a single page extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtraction {
    #[serde(flatten)]
    pub outcome: ExtractionOutcome,
    pub timestamp: DateTime<Utc>,
}

impl PageExtraction {
    pub fn new(outcome: ExtractionOutcome) -> Self {
        Self {
            outcome,
            timestamp: Utc::now(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.outcome.word_count
    }
}
