//! Request parsing module
//!
//! Turns the raw fields sent by either front-end into a validated
//! [`SearchRequest`]:
//! - `limit` / `top_n` alias resolution and clamping
//! - recency window to [`TimeRange`] mapping
//! - `source` to [`Category`]
//! - language / country code validation

mod normalize;

pub use normalize::normalize;

use crate::error::{Result, SearchError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum query length in characters
pub const MAX_QUERY_CHARS: usize = 200;

static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{2,3})(?:[-_][A-Za-z0-9]{2,8})*$").expect("valid regex"));
static COUNTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").expect("valid regex"));

/// Raw caller fields, identical for the tool and REST front-ends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: Option<String>,
    pub limit: Option<i64>,
    /// Alias for `limit`; `limit` wins when both are given
    pub top_n: Option<i64>,
    pub include_content: Option<bool>,
    pub max_content_length: Option<i64>,
    pub recency_days: Option<i64>,
    pub source: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    /// Explicit backend preference
    pub backend: Option<String>,
}

/// Defaults applied when the caller leaves a field out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_max_content_length: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 10,
            default_max_content_length: 500_000,
        }
    }
}

/// A validated search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// Always within `1..=max_limit`
    pub limit: usize,
    pub include_content: bool,
    /// 0 means unlimited
    pub max_content_length: usize,
    /// `None` when absent or not positive
    pub recency_days: Option<u32>,
    pub category: Category,
    /// Primary language subtag, lowercase
    pub language: Option<String>,
    /// ISO 3166 alpha-2, uppercase
    pub country: Option<String>,
    pub backend: Option<String>,
}

impl SearchRequest {
    /// Build a request with defaults for everything but the query
    pub fn new(query: impl Into<String>) -> Self {
        let defaults = RequestDefaults::default();
        Self {
            query: query.into(),
            limit: defaults.default_limit,
            include_content: true,
            max_content_length: defaults.default_max_content_length,
            recency_days: None,
            category: Category::Web,
            language: None,
            country: None,
            backend: None,
        }
    }

    /// Validate caller fields and apply defaults.
    ///
    /// `include_content_default` differs per operation: true for the full
    /// search, irrelevant for summaries.
    pub fn from_args(
        args: SearchArgs,
        defaults: &RequestDefaults,
        include_content_default: bool,
    ) -> Result<Self> {
        let query = validate_query(args.query.as_deref().unwrap_or(""))?;

        let max_limit = defaults.max_limit.max(1);
        let limit = match args.limit.or(args.top_n) {
            Some(n) => n.clamp(1, max_limit as i64) as usize,
            None => defaults.default_limit.clamp(1, max_limit),
        };

        let max_content_length = match args.max_content_length {
            Some(n) if n < 0 => {
                return Err(SearchError::invalid("max_content_length must be >= 0"));
            }
            Some(n) => n as usize,
            None => defaults.default_max_content_length,
        };

        let recency_days = args
            .recency_days
            .filter(|d| *d > 0)
            .map(|d| d.min(u32::MAX as i64) as u32);

        let category = match non_empty(args.source) {
            Some(source) => source.parse()?,
            None => Category::Web,
        };

        let language = non_empty(args.language)
            .map(|l| parse_language(&l))
            .transpose()?;
        let country = non_empty(args.country)
            .map(|c| parse_country(&c))
            .transpose()?;

        Ok(Self {
            query,
            limit,
            include_content: args.include_content.unwrap_or(include_content_default),
            max_content_length,
            recency_days,
            category,
            language,
            country,
            backend: non_empty(args.backend).map(|b| b.to_lowercase()),
        })
    }

    /// Time range derived from the recency window
    pub fn time_range(&self) -> Option<TimeRange> {
        self.recency_days.and_then(TimeRange::from_recency_days)
    }

    /// Whether a non-default category filter was requested
    pub fn wants_category(&self) -> bool {
        self.category != Category::Web
    }
}

/// Raw caller fields for a single page extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageArgs {
    pub url: Option<String>,
    pub max_content_length: Option<i64>,
}

/// A validated single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    /// 0 means unlimited
    pub max_content_length: usize,
}

impl PageRequest {
    pub fn from_args(args: PageArgs, defaults: &RequestDefaults) -> Result<Self> {
        let url = non_empty(args.url).ok_or_else(|| SearchError::invalid("url is required"))?;
        if !crate::results::is_web_url(&url) {
            return Err(SearchError::invalid(format!(
                "url must be an absolute http or https URL: {url}"
            )));
        }

        let max_content_length = match args.max_content_length {
            Some(n) if n < 0 => {
                return Err(SearchError::invalid("max_content_length must be >= 0"));
            }
            Some(n) => n as usize,
            None => defaults.default_max_content_length,
        };

        Ok(Self {
            url,
            max_content_length,
        })
    }
}

/// Trim the query and check its length
pub fn validate_query(raw: &str) -> Result<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(SearchError::invalid("query must not be empty"));
    }
    let chars = query.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(SearchError::invalid(format!(
            "query must be at most {MAX_QUERY_CHARS} characters (got {chars})"
        )));
    }
    Ok(query.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_language(raw: &str) -> Result<String> {
    LANGUAGE_RE
        .captures(raw)
        .map(|cap| cap[1].to_lowercase())
        .ok_or_else(|| SearchError::invalid(format!("invalid language code: {raw}")))
}

fn parse_country(raw: &str) -> Result<String> {
    if COUNTRY_RE.is_match(raw) {
        Ok(raw.to_uppercase())
    } else {
        Err(SearchError::invalid(format!("invalid country code: {raw}")))
    }
}

/// Time range filter for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Smallest range covering the window; `None` past a year
    pub fn from_recency_days(days: u32) -> Option<Self> {
        match days {
            0 => None,
            1 => Some(Self::Day),
            2..=7 => Some(Self::Week),
            8..=30 => Some(Self::Month),
            31..=365 => Some(Self::Year),
            _ => None,
        }
    }

    /// Get the string representation for API calls
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content category requested by the caller
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Web,
    News,
    Images,
    Videos,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::News => "news",
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "web" | "text" | "general" => Ok(Self::Web),
            "news" => Ok(Self::News),
            "images" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            other => Err(SearchError::invalid(format!(
                "unknown source '{other}' (expected web, news, images or videos)"
            ))),
        }
    }
}
