//! Single-URL content extraction with browser fallback

use super::html::{html_to_text, normalise_whitespace, truncate_chars};
use crate::config::ExtractionSettings;
use crate::engines::EngineResponse;
use crate::network::{FetchError, PageFetcher, FETCH_GRACE};
use crate::results::{is_web_url, ExtractionFailure, ExtractionOutcome, FetchMethod};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Phrases that mark an interstitial instead of the page itself
const BLOCK_INDICATORS: &[&str] = &[
    "captcha",
    "verify you are human",
    "are you a robot",
    "unusual traffic",
    "access denied",
    "enable javascript and cookies",
];

/// Block pages are short; longer pages mentioning these words are real content
const BLOCK_PAGE_MAX_CHARS: usize = 2_000;

/// What one fetch path produced
struct Attempt {
    failure: ExtractionFailure,
    /// Text usable as a last resort
    partial: Option<String>,
}

/// Fetches one URL over HTTP, falling back to the browser
#[derive(Clone)]
pub struct ContentExtractor {
    http: Arc<dyn PageFetcher>,
    browser: Option<Arc<dyn PageFetcher>>,
    settings: ExtractionSettings,
}

impl ContentExtractor {
    pub fn new(
        http: Arc<dyn PageFetcher>,
        browser: Option<Arc<dyn PageFetcher>>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            http,
            browser,
            settings,
        }
    }

    /// Extract readable text from `url`, cut to `max_length` characters
    /// (0 = unlimited). Never fails; failures are carried in the outcome.
    pub async fn extract(
        &self,
        url: &str,
        max_length: usize,
        cancel: &CancellationToken,
    ) -> ExtractionOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => ExtractionOutcome::failed(url, &ExtractionFailure::Cancelled),
            outcome = self.run(url, max_length) => outcome,
        }
    }

    async fn run(&self, url: &str, max_length: usize) -> ExtractionOutcome {
        if !is_web_url(url) {
            return ExtractionOutcome::failed(url, &ExtractionFailure::InvalidUrl(url.to_string()));
        }

        let primary = match self
            .fetch_text(self.http.as_ref(), url, self.settings.http_timeout(), true)
            .await
        {
            Ok(text) => return finish(url, text, max_length, FetchMethod::Http),
            Err(attempt) => attempt,
        };

        if primary.failure.is_definitive() {
            debug!(url, reason = %primary.failure, "page is gone, skipping browser");
            return ExtractionOutcome::failed(url, &primary.failure);
        }

        let Some(browser) = self.browser.as_ref() else {
            return match primary.partial {
                Some(text) => finish(url, text, max_length, FetchMethod::Http),
                None => ExtractionOutcome::failed(url, &primary.failure),
            };
        };

        debug!(url, reason = %primary.failure, "falling back to browser");
        match self
            .fetch_text(browser.as_ref(), url, self.settings.browser_timeout(), false)
            .await
        {
            Ok(text) => finish(url, text, max_length, FetchMethod::Browser),
            Err(secondary) => match primary.partial {
                Some(text) => {
                    debug!(url, reason = %secondary.failure, "browser failed, keeping HTTP text");
                    finish(url, text, max_length, FetchMethod::Http)
                }
                None => {
                    let failure = ExtractionFailure::Fallback {
                        primary: Box::new(primary.failure),
                        browser: Box::new(secondary.failure),
                    };
                    warn!(url, reason = %failure, "extraction failed");
                    ExtractionOutcome::failed(url, &failure)
                }
            },
        }
    }

    /// Fetch and convert one page. With `strict`, short text is rejected
    /// so the caller can try the browser.
    async fn fetch_text(
        &self,
        fetcher: &dyn PageFetcher,
        url: &str,
        timeout: Duration,
        strict: bool,
    ) -> Result<String, Attempt> {
        let response = match tokio::time::timeout(timeout + FETCH_GRACE, fetcher.fetch(url, timeout)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(fetch_failure(err, timeout)),
            Err(_) => return Err(fetch_failure(FetchError::Timeout(timeout), timeout)),
        };

        if !response.is_success() {
            return Err(Attempt {
                failure: ExtractionFailure::HttpStatus(response.status),
                partial: None,
            });
        }

        let text = response_text(&response)?;

        if looks_blocked(&text) {
            return Err(Attempt {
                failure: ExtractionFailure::Blocked,
                partial: None,
            });
        }
        if text.is_empty() {
            return Err(Attempt {
                failure: ExtractionFailure::EmptyContent,
                partial: None,
            });
        }
        if strict && text.chars().count() < self.settings.min_meaningful_chars {
            return Err(Attempt {
                failure: ExtractionFailure::EmptyContent,
                partial: Some(text),
            });
        }

        debug!(url, fetcher = fetcher.name(), chars = text.len(), "extracted");
        Ok(text)
    }
}

/// Convert a successful response body to text by media type
fn response_text(response: &EngineResponse) -> Result<String, Attempt> {
    match response.content_type().as_deref() {
        None | Some("text/html") | Some("application/xhtml+xml") => Ok(html_to_text(&response.text)),
        Some("text/plain") => Ok(normalise_whitespace(&response.text)),
        Some(other) => Err(Attempt {
            failure: ExtractionFailure::UnsupportedContent(other.to_string()),
            partial: None,
        }),
    }
}

fn looks_blocked(text: &str) -> bool {
    if text.chars().count() > BLOCK_PAGE_MAX_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    BLOCK_INDICATORS.iter().any(|i| lower.contains(i))
}

fn fetch_failure(err: FetchError, timeout: Duration) -> Attempt {
    let failure = match err {
        FetchError::Timeout(_) => ExtractionFailure::Timeout(timeout.as_secs()),
        FetchError::Network(msg) => ExtractionFailure::Network(msg),
        FetchError::Unavailable(_) => ExtractionFailure::BrowserUnavailable,
        FetchError::InvalidRequest(msg) => ExtractionFailure::InvalidUrl(msg),
    };
    Attempt {
        failure,
        partial: None,
    }
}

fn finish(url: &str, text: String, max_length: usize, method: FetchMethod) -> ExtractionOutcome {
    let (text, truncated) = truncate_chars(text, max_length);
    ExtractionOutcome::ok(url, text, truncated, method)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::results::ExtractionStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned responses keyed by URL and counts calls
    pub(crate) struct FakeFetcher {
        pages: HashMap<String, Result<EngineResponse, FetchError>>,
        pub calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self {
                pages: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn page(mut self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
            let mut response = EngineResponse::html(url, body);
            response.status = status;
            response
                .headers
                .insert("content-type".into(), content_type.into());
            self.pages.insert(url.to_string(), Ok(response));
            self
        }

        pub fn error(mut self, url: &str, err: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(err));
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<EngineResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Network("connection refused".into())))
        }
    }

    pub(crate) fn article(words: usize) -> String {
        let body = vec!["lorem"; words].join(" ");
        format!("<html><body><article><p>{body}</p></article></body></html>")
    }

    fn extractor(http: FakeFetcher, browser: Option<FakeFetcher>) -> ContentExtractor {
        ContentExtractor::new(
            Arc::new(http),
            browser.map(|b| Arc::new(b) as Arc<dyn PageFetcher>),
            ExtractionSettings::default(),
        )
    }

    const URL: &str = "https://site.test/page";

    #[tokio::test]
    async fn test_http_success() {
        let ex = extractor(FakeFetcher::new().page(URL, 200, "text/html", &article(50)), None);
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert_eq!(outcome.status, ExtractionStatus::Ok);
        assert_eq!(outcome.method, Some(FetchMethod::Http));
        assert_eq!(outcome.word_count, 50);
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_truncation() {
        let ex = extractor(FakeFetcher::new().page(URL, 200, "text/html", &article(200)), None);
        let outcome = ex.extract(URL, 120, &CancellationToken::new()).await;
        assert_eq!(outcome.length, 120);
        assert_eq!(outcome.text.chars().count(), 120);
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_not_found_skips_browser() {
        let browser = Arc::new(FakeFetcher::new().page(URL, 200, "text/html", &article(50)));
        let ex = ContentExtractor::new(
            Arc::new(FakeFetcher::new().page(URL, 404, "text/html", "missing")),
            Some(browser.clone()),
            ExtractionSettings::default(),
        );
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert_eq!(outcome.status, ExtractionStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("HTTP 404 Not Found"));
        assert_eq!(browser.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forbidden_uses_browser() {
        let ex = extractor(
            FakeFetcher::new().page(URL, 403, "text/html", "nope"),
            Some(FakeFetcher::new().page(URL, 200, "text/html", &article(40))),
        );
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.method, Some(FetchMethod::Browser));
    }

    #[tokio::test]
    async fn test_short_text_kept_when_browser_fails() {
        let ex = extractor(
            FakeFetcher::new().page(URL, 200, "text/html", "<p>Tiny page</p>"),
            Some(FakeFetcher::new().error(URL, FetchError::Unavailable("no chrome".into()))),
        );
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.text, "Tiny page");
        assert_eq!(outcome.method, Some(FetchMethod::Http));
    }

    #[tokio::test]
    async fn test_both_paths_fail() {
        let ex = extractor(
            FakeFetcher::new().error(URL, FetchError::Network("reset".into())),
            Some(FakeFetcher::new().error(URL, FetchError::Timeout(Duration::from_secs(30)))),
        );
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert_eq!(outcome.status, ExtractionStatus::Failed);
        let reason = outcome.error.unwrap();
        assert!(reason.contains("reset"));
        assert!(reason.contains("browser fallback"));
    }

    #[tokio::test]
    async fn test_captcha_page_is_not_content() {
        let ex = extractor(
            FakeFetcher::new().page(URL, 200, "text/html", "<p>Please complete the CAPTCHA to continue</p>"),
            None,
        );
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert_eq!(outcome.status, ExtractionStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("blocked by bot protection"));
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let ex = extractor(FakeFetcher::new().page(URL, 200, "application/pdf", ""), None);
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert!(outcome.error.unwrap().contains("application/pdf"));
    }

    #[tokio::test]
    async fn test_plain_text() {
        let body = "word ".repeat(40);
        let ex = extractor(FakeFetcher::new().page(URL, 200, "text/plain", &body), None);
        let outcome = ex.extract(URL, 0, &CancellationToken::new()).await;
        assert!(outcome.is_ok());
        assert_eq!(outcome.word_count, 40);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let ex = extractor(FakeFetcher::new(), None);
        let outcome = ex.extract("not a url", 0, &CancellationToken::new()).await;
        assert!(outcome.error.unwrap().starts_with("invalid URL"));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let ex = extractor(FakeFetcher::new().page(URL, 200, "text/html", &article(50)), None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = ex.extract(URL, 0, &cancel).await;
        assert_eq!(outcome.error.as_deref(), Some("cancelled"));
    }
}
