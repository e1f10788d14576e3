//! Sequential search execution with backend fallback

use super::models::{describe_failures, SearchExecution};
use super::selector::{select, Candidate};
use crate::engines::{Backend, BackendRegistry, EngineResponse, Transport};
use crate::error::{Result, SearchError};
use crate::metrics::Metrics;
use crate::network::{FetchError, HttpClient, PageFetcher, FETCH_GRACE};
use crate::query::{normalize, SearchRequest};
use crate::results::{BackendAttempt, BackendError, SearchHit};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Tries backends one at a time until one returns hits
pub struct SearchExecutor {
    /// HTTP client for backend requests
    client: HttpClient,
    /// Renders the browser fallback's result page
    browser: Option<Arc<dyn PageFetcher>>,
    registry: Arc<BackendRegistry>,
    metrics: Arc<Metrics>,
    /// Per-backend timeout in seconds, unless configured per backend
    default_timeout: f64,
}

impl SearchExecutor {
    pub fn new(client: HttpClient, registry: Arc<BackendRegistry>, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            browser: None,
            registry,
            metrics,
            default_timeout: 10.0,
        }
    }

    /// Set the fetcher used for browser-transport backends
    pub fn with_browser(mut self, browser: Arc<dyn PageFetcher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Set default per-backend timeout
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.default_timeout = seconds;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Run the fallback chain for `request`.
    ///
    /// Returns the hits of the first backend that produced any. Fails with
    /// `SearchUnavailable` when every candidate failed, or `Cancelled`
    /// when `cancel` fires first.
    pub async fn execute(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchExecution> {
        let candidates = select(&self.registry, request)?;
        let mut attempts = Vec::with_capacity(candidates.len());

        info!(
            query = %request.query,
            candidates = candidates.len(),
            "executing search"
        );

        for candidate in &candidates {
            if cancel.is_cancelled() {
                return Err(SearchError::Cancelled("search was cancelled".into()));
            }

            let start = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(SearchError::Cancelled("search was cancelled".into()));
                }
                result = self.attempt(candidate, request) => result?,
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(mut hits) => {
                    hits.truncate(request.limit);
                    self.metrics.record_attempt(candidate.name(), true, elapsed_ms);
                    debug!(
                        backend = %candidate.name(),
                        hits = hits.len(),
                        elapsed_ms,
                        "backend succeeded"
                    );
                    attempts.push(BackendAttempt {
                        backend: candidate.name().to_string(),
                        hits: hits.len(),
                        elapsed_ms,
                        error: None,
                    });
                    return Ok(SearchExecution {
                        backend: candidate.name().to_string(),
                        hits,
                        attempts,
                    });
                }
                Err(err) => {
                    self.metrics.record_attempt(candidate.name(), false, elapsed_ms);
                    warn!(backend = %candidate.name(), error = %err, "backend failed");
                    attempts.push(BackendAttempt {
                        backend: candidate.name().to_string(),
                        hits: 0,
                        elapsed_ms,
                        error: Some(err),
                    });
                }
            }
        }

        let reasons = describe_failures(&attempts);
        error!(query = %request.query, %reasons, "all backends failed");
        Err(SearchError::SearchUnavailable(format!(
            "all search backends failed ({reasons})"
        )))
    }

    /// One backend attempt. The outer error is request-level and aborts
    /// the chain; the inner one moves on to the next candidate.
    async fn attempt(
        &self,
        candidate: &Candidate,
        request: &SearchRequest,
    ) -> Result<std::result::Result<Vec<SearchHit>, BackendError>> {
        let backend = &candidate.backend;
        let params = normalize(request, &backend.capabilities())?;

        let engine_request = match backend.request(&params) {
            Ok(req) => req,
            Err(e) => {
                error!(backend = %backend.name(), "failed to build request: {}", e);
                return Ok(Err(BackendError::Unavailable(e.to_string())));
            }
        };

        let seconds = self.registry.get_timeout(backend.as_ref(), self.default_timeout);
        let Ok(limit) = Duration::try_from_secs_f64(seconds) else {
            return Ok(Err(BackendError::Unavailable(format!("invalid timeout: {seconds}s"))));
        };
        debug!(backend = %backend.name(), timeout = ?limit, "trying backend");

        // fetchers enforce `limit` themselves; the outer bound is a backstop
        let deadline = limit + FETCH_GRACE;
        let fetched = match backend.transport() {
            Transport::Http => timeout(deadline, self.client.execute_with_timeout(engine_request, limit)).await,
            Transport::Browser => {
                let Some(browser) = self.browser.as_ref() else {
                    return Ok(Err(BackendError::Unavailable("browser is not configured".into())));
                };
                let url = match engine_request.full_url() {
                    Ok(url) => url,
                    Err(e) => return Ok(Err(BackendError::Unavailable(e.to_string()))),
                };
                timeout(deadline, browser.fetch(&url, limit)).await
            }
        };

        let response = match fetched {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Ok(Err(fetch_error(err, seconds))),
            Err(_) => return Ok(Err(BackendError::Timeout(seconds.round() as u64))),
        };

        Ok(parse(backend.as_ref(), response, request.limit))
    }
}

fn parse(
    backend: &dyn Backend,
    response: EngineResponse,
    limit: usize,
) -> std::result::Result<Vec<SearchHit>, BackendError> {
    if !response.is_success() {
        return Err(BackendError::HttpStatus(response.status));
    }

    let hits = backend.response(response).map_err(|e| {
        e.downcast_ref::<BackendError>()
            .cloned()
            .unwrap_or_else(|| BackendError::Parse(e.to_string()))
    })?;

    let hits: Vec<SearchHit> = hits
        .into_iter()
        .filter(SearchHit::has_valid_url)
        .take(limit)
        .collect();

    if hits.is_empty() {
        return Err(BackendError::Empty);
    }
    Ok(hits)
}

fn fetch_error(err: FetchError, seconds: f64) -> BackendError {
    match err {
        FetchError::Timeout(_) => BackendError::Timeout(seconds.round() as u64),
        FetchError::Network(msg) | FetchError::InvalidRequest(msg) => BackendError::Network(msg),
        FetchError::Unavailable(msg) => BackendError::Unavailable(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{BackendCapabilities, EngineRequest, RequestParams};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that answers from canned data without touching the network
    struct Canned {
        name: &'static str,
        outcome: std::result::Result<usize, BackendError>,
        transport: Transport,
    }

    impl Canned {
        fn ok(name: &'static str, hits: usize) -> Arc<dyn Backend> {
            Arc::new(Self {
                name,
                outcome: Ok(hits),
                transport: Transport::Browser,
            })
        }

        fn failing(name: &'static str, err: BackendError) -> Arc<dyn Backend> {
            Arc::new(Self {
                name,
                outcome: Err(err),
                transport: Transport::Browser,
            })
        }
    }

    impl Backend for Canned {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> BackendCapabilities {
            BackendCapabilities::new()
        }

        fn transport(&self) -> Transport {
            self.transport
        }

        fn request(&self, params: &RequestParams) -> anyhow::Result<EngineRequest> {
            Ok(EngineRequest::get(format!("https://{}.test/search", self.name)).param("q", &params.query))
        }

        fn response(&self, _response: EngineResponse) -> anyhow::Result<Vec<SearchHit>> {
            match &self.outcome {
                Ok(n) => Ok((0..*n)
                    .map(|i| SearchHit::new(format!("https://{}.test/{i}", self.name), "hit", self.name))
                    .collect()),
                Err(e) => Err(e.clone().into()),
            }
        }
    }

    /// Browser stand-in that returns an empty page
    struct Blank {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for Blank {
        fn name(&self) -> &str {
            "blank"
        }

        async fn fetch(&self, url: &str, _timeout: Duration) -> std::result::Result<EngineResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EngineResponse::html(url, "<html></html>"))
        }
    }

    fn executor(backends: Vec<Arc<dyn Backend>>) -> (SearchExecutor, Arc<Metrics>) {
        let mut registry = BackendRegistry::new();
        for backend in backends {
            registry.register(backend, None);
        }
        let metrics = Arc::new(Metrics::new());
        let executor = SearchExecutor::new(HttpClient::new().unwrap(), Arc::new(registry), metrics.clone())
            .with_browser(Arc::new(Blank {
                calls: AtomicUsize::new(0),
            }));
        (executor, metrics)
    }

    #[tokio::test]
    async fn test_falls_back_to_next_backend() {
        let (executor, metrics) = executor(vec![
            Canned::failing("first", BackendError::Captcha),
            Canned::ok("second", 4),
            Canned::ok("third", 4),
        ]);

        let mut request = SearchRequest::new("rust");
        request.limit = 3;
        let execution = executor.execute(&request, &CancellationToken::new()).await.unwrap();

        assert_eq!(execution.backend, "second");
        assert_eq!(execution.hits.len(), 3);
        assert!(execution.hits.iter().all(|h| h.backend == "second"));
        assert_eq!(execution.attempts.len(), 2);
        assert_eq!(execution.attempts[0].error, Some(BackendError::Captcha));
        assert_eq!(execution.failed_attempts(), 1);
        assert_eq!(metrics.snapshot().backends["first"].failures, 1);
    }

    #[tokio::test]
    async fn test_empty_results_count_as_failure() {
        let (executor, _) = executor(vec![Canned::ok("empty", 0), Canned::ok("full", 2)]);
        let execution = executor
            .execute(&SearchRequest::new("rust"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(execution.backend, "full");
        assert_eq!(execution.attempts[0].error, Some(BackendError::Empty));
    }

    #[tokio::test]
    async fn test_all_backends_fail() {
        let (executor, metrics) = executor(vec![
            Canned::failing("first", BackendError::HttpStatus(503)),
            Canned::failing("second", BackendError::Captcha),
        ]);
        let err = executor
            .execute(&SearchRequest::new("rust"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            SearchError::SearchUnavailable(reason) => {
                assert!(reason.contains("first: HTTP error: 503"));
                assert!(reason.contains("second: CAPTCHA required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(metrics.snapshot().backends.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_browser_is_a_failed_attempt() {
        let mut registry = BackendRegistry::new();
        registry.register(Canned::ok("rendered", 2), None);
        let executor = SearchExecutor::new(
            HttpClient::new().unwrap(),
            Arc::new(registry),
            Arc::new(Metrics::new()),
        );

        let err = executor
            .execute(&SearchRequest::new("rust"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("browser is not configured"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (executor, _) = executor(vec![Canned::ok("first", 2)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = executor
            .execute(&SearchRequest::new("rust"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled(_)));
    }
}
