//! Settings structures for MixSearch configuration

use crate::error::SearchError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Names of the searchable backends this build knows how to construct
pub const KNOWN_BACKENDS: &[&str] = &["brave", "duckduckgo", "bing"];

/// Main settings structure, loaded from `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub extraction: ExtractionSettings,
    pub outgoing: OutgoingSettings,
    pub browser: BrowserSettings,
    pub backends: Vec<BackendConfig>,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (MIXSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("MIXSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("MIXSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("MIXSEARCH_CORS_ORIGINS") {
            self.server.cors_origins = val
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }
        if let Some(val) = var("MIXSEARCH_MAX_CONCURRENT_REQUESTS") {
            if let Ok(n) = val.parse() {
                self.extraction.max_concurrent_requests = n;
            }
        }
        if let Some(val) = var("MIXSEARCH_MAX_CONTENT_LENGTH") {
            if let Ok(n) = val.parse() {
                self.extraction.default_max_content_length = n;
            }
        }
        if let Some(val) = var("MIXSEARCH_BROWSER_ENABLED") {
            self.browser.enabled = val.parse().unwrap_or(self.browser.enabled);
        }
        if let Some(val) = var("MIXSEARCH_LOG_LEVEL") {
            self.logging.level = val.to_lowercase();
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> std::result::Result<(), SearchError> {
        if self.extraction.max_concurrent_requests == 0 {
            return Err(SearchError::Config(
                "extraction.max_concurrent_requests must be > 0".into(),
            ));
        }
        if self.search.max_limit == 0 || self.search.default_limit == 0 {
            return Err(SearchError::Config("search limits must be > 0".into()));
        }
        let timeouts = [
            ("search.request_timeout", self.search.request_timeout),
            ("search.backend_timeout", self.search.backend_timeout),
            ("extraction.http_timeout", self.extraction.http_timeout),
            ("extraction.browser_timeout", self.extraction.browser_timeout),
            ("outgoing.request_timeout", self.outgoing.request_timeout),
        ];
        for (key, secs) in timeouts {
            check_timeout(key, secs)?;
        }
        for name in &self.search.backend_priority {
            if !KNOWN_BACKENDS.contains(&name.as_str()) {
                return Err(SearchError::Config(format!(
                    "unknown backend in search.backend_priority: {name}"
                )));
            }
        }
        for backend in &self.backends {
            if !KNOWN_BACKENDS.contains(&backend.name.as_str()) {
                return Err(SearchError::Config(format!(
                    "unknown backend in backends: {}",
                    backend.name
                )));
            }
            if let Some(secs) = backend.timeout {
                check_timeout(&format!("backends.{}.timeout", backend.name), secs)?;
            }
        }
        Ok(())
    }

    /// Get backend config by name
    pub fn get_backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Backend names in the order they should be constructed, honouring
    /// `search.backend_priority` and skipping disabled entries
    pub fn enabled_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.search.backend_priority.clone();
        for name in KNOWN_BACKENDS {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
            .into_iter()
            .filter(|name| !self.get_backend(name).map(|b| b.disabled).unwrap_or(false))
            .collect()
    }
}

/// Timeouts are turned into `Duration`s, which need a finite positive value
fn check_timeout(key: &str, secs: f64) -> std::result::Result<(), SearchError> {
    if secs.is_finite() && secs > 0.0 {
        Ok(())
    } else {
        Err(SearchError::Config(format!("{key} must be a positive number of seconds, got {secs}")))
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "127.0.0.1".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// Search behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Tie-break order used when ranking backends
    pub backend_priority: Vec<String>,
    /// Result limit when the caller gives none
    pub default_limit: usize,
    /// Upper bound for the result limit
    pub max_limit: usize,
    /// Overall deadline for one request, in seconds
    pub request_timeout: f64,
    /// Default per-backend timeout, in seconds
    pub backend_timeout: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend_priority: vec![
                "brave".to_string(),
                "duckduckgo".to_string(),
                "bing".to_string(),
            ],
            default_limit: 5,
            max_limit: 10,
            request_timeout: 120.0,
            backend_timeout: 10.0,
        }
    }
}

impl SearchSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }
}

/// Content extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Maximum extractions in flight across the whole process
    pub max_concurrent_requests: usize,
    /// Length budget used when the caller does not send one (0 = unlimited)
    pub default_max_content_length: usize,
    /// Timeout for the direct HTTP fetch, in seconds
    pub http_timeout: f64,
    /// Timeout for the browser fetch, in seconds
    pub browser_timeout: f64,
    /// Extracted text shorter than this triggers the browser path
    pub min_meaningful_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            default_max_content_length: 500_000,
            http_timeout: 10.0,
            browser_timeout: 30.0,
            min_meaningful_chars: 100,
        }
    }
}

impl ExtractionSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.http_timeout)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.browser_timeout)
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Maximum redirects followed by page fetches
    pub max_redirects: usize,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            max_redirects: 10,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Headless browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Whether the browser fallback may be used at all
    pub enabled: bool,
    /// Chrome/Chromium executable (autodetected when absent)
    pub executable: Option<String>,
    /// Delay after navigation so scripts can render content, in milliseconds
    pub settle_delay_ms: u64,
    /// Extra command-line switches for the browser
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            executable: None,
            settle_delay_ms: 2000,
            args: vec![],
        }
    }
}

/// Individual backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend name (one of [`KNOWN_BACKENDS`])
    pub name: String,
    /// Whether the backend is disabled
    pub disabled: bool,
    /// Custom timeout for this backend, in seconds
    pub timeout: Option<f64>,
    /// Override for the backend's endpoint
    pub base_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            disabled: false,
            timeout: None,
            base_url: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
