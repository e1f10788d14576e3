//! HTTP client for backend requests and page fetches

use super::fetcher::{FetchError, PageFetcher};
use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::engines::{EngineRequest, EngineResponse, HttpMethod, RequestBody};
use async_trait::async_trait;
use reqwest::{redirect, Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Media types whose body is worth downloading for text extraction
const TEXTUAL_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "text/plain"];

/// HTTP client wrapper with outgoing settings applied
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: generate_user_agent(),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Execute a backend request
    pub async fn execute(&self, request: EngineRequest) -> Result<EngineResponse, FetchError> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute a backend request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse, FetchError> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_html())
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1");

        if !has_header(&request.headers, "accept-language") {
            req_builder = req_builder.header("Accept-Language", accept_language(None));
        }

        for (key, value) in self.extra_headers.iter().chain(request.headers.iter()) {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if !request.cookies.is_empty() {
            let cookie_str = request
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            req_builder = req_builder.header("Cookie", cookie_str);
        }

        if let Some(body) = request.data {
            req_builder = match body {
                RequestBody::Form(data) => req_builder.form(&data),
            };
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        Self::parse_response(response, true)
            .await
            .map_err(|e| classify(e, timeout))
    }

    /// Convert a reqwest response; the body is skipped for binary media
    async fn parse_response(
        response: Response,
        always_read: bool,
    ) -> Result<EngineResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let mut engine_response = EngineResponse {
            status,
            headers,
            text: String::new(),
            url,
        };

        let textual = engine_response
            .content_type()
            .map(|ct| TEXTUAL_TYPES.contains(&ct.as_str()))
            .unwrap_or(true);

        if always_read || textual {
            engine_response.text = response.text().await?;
        } else {
            debug!(url = %engine_response.url, "skipping non-text body");
        }

        Ok(engine_response)
    }
}

fn has_header(headers: &HashMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        err.into()
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<EngineResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept_html())
            .header("Accept-Language", accept_language(None))
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        Self::parse_response(response, false)
            .await
            .map_err(|e| classify(e, timeout))
    }
}
