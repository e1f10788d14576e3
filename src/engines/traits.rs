//! Backend traits and types

use crate::query::{Category, TimeRange};
use crate::results::SearchHit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which filters a backend can express.
///
/// Defined once per backend at process start and never changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackendCapabilities {
    pub language: bool,
    pub country: bool,
    pub time_range: bool,
    /// Categories besides `web`, which every backend serves
    pub categories: &'static [Category],
}

impl BackendCapabilities {
    pub const fn new() -> Self {
        Self {
            language: false,
            country: false,
            time_range: false,
            categories: &[],
        }
    }

    pub const fn language(mut self) -> Self {
        self.language = true;
        self
    }

    pub const fn country(mut self) -> Self {
        self.country = true;
        self
    }

    pub const fn time_range(mut self) -> Self {
        self.time_range = true;
        self
    }

    pub const fn categories(mut self, categories: &'static [Category]) -> Self {
        self.categories = categories;
        self
    }

    pub fn supports_category(&self, category: Category) -> bool {
        category == Category::Web || self.categories.contains(&category)
    }
}

/// How a backend's request reaches the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Plain HTTP through the shared client
    Http,
    /// Rendered in the headless browser
    Browser,
}

/// Parameters for building a backend request, already normalized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Maximum number of hits wanted
    pub limit: usize,
    /// Time range filter
    pub time_range: Option<TimeRange>,
    /// Category (`Web` when the backend cannot filter)
    pub category: Category,
    /// Lowercase language code
    pub language: Option<String>,
    /// Uppercase country code
    pub country: Option<String>,
}

impl RequestParams {
    /// Create new request parameters with no filters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 10,
            time_range: None,
            category: Category::Web,
            language: None,
            country: None,
        }
    }
}

/// HTTP request to be made for a backend
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body data
    pub data: Option<RequestBody>,
    /// Cookies to send
    pub cookies: HashMap<String, String>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
            cookies: HashMap::new(),
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add form data (sets content-type to form-urlencoded)
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Add a cookie
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(key.into(), value.into());
        self
    }

    /// The URL with query parameters applied, sorted for stable output.
    ///
    /// Used when the request is replayed by the browser, which can only
    /// navigate to a GET URL.
    pub fn full_url(&self) -> anyhow::Result<String> {
        let mut params: Vec<(&String, &String)> = self.params.iter().collect();
        params.sort();
        let url = url::Url::parse_with_params(&self.url, params)?;
        Ok(url.to_string())
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
}

/// HTTP response from a backend request or a page fetch
#[derive(Debug, Clone)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// A 200 HTML response, as produced by the browser
    pub fn html(url: impl Into<String>, text: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        Self {
            status: 200,
            headers,
            text: text.into(),
            url: url.into(),
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercase
    pub fn content_type(&self) -> Option<String> {
        self.headers.get("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        })
    }

    /// Check if response indicates CAPTCHA
    pub fn is_captcha(&self) -> bool {
        looks_like_captcha(&self.text)
    }
}

/// Common CAPTCHA and bot-wall indicators
pub fn looks_like_captcha(text: &str) -> bool {
    text.contains("captcha")
        || text.contains("CAPTCHA")
        || text.contains("unusual traffic")
        || text.contains("automated requests")
        || text.contains("bots use DuckDuckGo too")
}

/// A searchable backend.
///
/// Implementations only build requests and parse responses; the executor
/// owns transport, timeouts and fallback.
pub trait Backend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Filters this backend can express
    fn capabilities(&self) -> BackendCapabilities;

    /// How requests are sent
    fn transport(&self) -> Transport {
        Transport::Http
    }

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        10.0
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> anyhow::Result<EngineRequest>;

    /// Parse the HTTP response into hits, in backend order
    fn response(&self, response: EngineResponse) -> anyhow::Result<Vec<SearchHit>>;
}
