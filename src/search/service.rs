//! The three search operations shared by both front-ends

use super::executor::SearchExecutor;
use crate::config::Settings;
use crate::engines::BackendRegistry;
use crate::error::{Result, SearchError};
use crate::extract::{BatchExtractor, ContentExtractor};
use crate::metrics::Metrics;
use crate::network::{HttpClient, PageFetcher};
use crate::query::{PageArgs, PageRequest, RequestDefaults, SearchArgs, SearchRequest};
use crate::results::{assemble, ExtractionStatus, PageExtraction, SearchResponse};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Search plus extraction, with an overall deadline per request
pub struct WebSearchService {
    executor: SearchExecutor,
    batch: BatchExtractor,
    metrics: Arc<Metrics>,
    defaults: RequestDefaults,
    request_timeout: Duration,
}

impl WebSearchService {
    pub fn new(
        executor: SearchExecutor,
        batch: BatchExtractor,
        metrics: Arc<Metrics>,
        settings: &Settings,
    ) -> Self {
        Self {
            executor,
            batch,
            metrics,
            defaults: RequestDefaults {
                default_limit: settings.search.default_limit,
                max_limit: settings.search.max_limit,
                default_max_content_length: settings.extraction.default_max_content_length,
            },
            request_timeout: settings.search.request_timeout(),
        }
    }

    /// Wire the executor and extractor from settings.
    ///
    /// `client` serves both backend requests and page fetches; `browser`
    /// renders the fallback search page and pages HTTP could not read.
    pub fn from_settings(
        settings: &Settings,
        registry: BackendRegistry,
        client: HttpClient,
        browser: Option<Arc<dyn PageFetcher>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut executor = SearchExecutor::new(client.clone(), Arc::new(registry), metrics.clone())
            .with_timeout(settings.search.backend_timeout);
        if let Some(ref browser) = browser {
            executor = executor.with_browser(browser.clone());
        }

        let extractor = ContentExtractor::new(Arc::new(client), browser, settings.extraction.clone());
        let batch = BatchExtractor::new(extractor, settings.extraction.max_concurrent_requests);

        Self::new(executor, batch, metrics, settings)
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Backend names in priority order, fallback last
    pub fn backend_names(&self) -> Vec<String> {
        self.executor
            .registry()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// `full_web_search`: hits plus extracted page text
    pub async fn full_search(&self, args: SearchArgs, cancel: &CancellationToken) -> Result<SearchResponse> {
        let request = SearchRequest::from_args(args, &self.defaults, true)?;
        self.search(request, cancel).await
    }

    /// `get_web_search_summaries`: hits only, nothing fetched
    pub async fn summaries(&self, args: SearchArgs, cancel: &CancellationToken) -> Result<SearchResponse> {
        let mut request = SearchRequest::from_args(args, &self.defaults, false)?;
        request.include_content = false;
        self.search(request, cancel).await
    }

    /// Run a validated request end to end
    pub async fn search(&self, request: SearchRequest, cancel: &CancellationToken) -> Result<SearchResponse> {
        let token = cancel.child_token();
        let result = self
            .with_deadline(&token, self.search_inner(&request, &token))
            .await;
        self.metrics.record_search(result.is_ok());
        result
    }

    async fn search_inner(&self, request: &SearchRequest, cancel: &CancellationToken) -> Result<SearchResponse> {
        let start = Instant::now();
        let execution = self.executor.execute(request, cancel).await?;

        let outcomes = if request.include_content {
            let urls: Vec<String> = execution.hits.iter().map(|h| h.url.clone()).collect();
            let outcomes = self
                .batch
                .extract_all(&urls, request.max_content_length, cancel)
                .await?;
            for outcome in &outcomes {
                self.metrics.record_extraction(outcome.is_ok());
            }
            Some(outcomes)
        } else {
            None
        };

        let response = assemble(
            &request.query,
            &execution.backend,
            execution.hits,
            outcomes,
            execution.attempts,
            start.elapsed(),
        );

        info!(
            query = %request.query,
            backend = %response.backend,
            results = response.total_results,
            extracted = response.extracted_count,
            elapsed_ms = response.elapsed_ms,
            "search completed"
        );
        Ok(response)
    }

    /// `get_single_web_page_content`
    pub async fn extract_page(&self, args: PageArgs, cancel: &CancellationToken) -> Result<PageExtraction> {
        let page = PageRequest::from_args(args, &self.defaults)?;
        let token = cancel.child_token();

        let urls = [page.url];
        let mut outcomes = self
            .with_deadline(
                &token,
                self.batch.extract_all(&urls, page.max_content_length, &token),
            )
            .await?;

        let outcome = outcomes
            .pop()
            .ok_or_else(|| SearchError::Cancelled("content extraction was cancelled".into()))?;
        self.metrics.record_extraction(outcome.is_ok());

        if outcome.status == ExtractionStatus::Failed {
            warn!(url = %outcome.url, error = ?outcome.error, "page extraction failed");
        } else {
            info!(url = %outcome.url, chars = outcome.length, "page extracted");
        }
        Ok(PageExtraction::new(outcome))
    }

    /// Bound `work` by the request timeout; firing cancels `token`
    async fn with_deadline<T>(
        &self,
        token: &CancellationToken,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                token.cancel();
                warn!(timeout = ?self.request_timeout, "request deadline exceeded");
                Err(SearchError::Cancelled(format!(
                    "request timed out after {}s",
                    self.request_timeout.as_secs_f64()
                )))
            }
        }
    }
}
