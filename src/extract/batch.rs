//! Bounded-concurrency extraction over a list of URLs

use super::extractor::ContentExtractor;
use crate::error::{Result, SearchError};
use crate::results::ExtractionOutcome;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs the extractor over many URLs.
///
/// The semaphore is shared by every request in the process, so at most
/// `max_concurrent_requests` extractions are in flight in total.
#[derive(Clone)]
pub struct BatchExtractor {
    extractor: ContentExtractor,
    permits: Arc<Semaphore>,
}

impl BatchExtractor {
    pub fn new(extractor: ContentExtractor, max_concurrent: usize) -> Self {
        Self {
            extractor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Permits currently free
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Extract every URL; outcomes are returned in input order.
    ///
    /// Fails only when `cancel` fires, in which case partial outcomes are
    /// discarded.
    pub async fn extract_all(
        &self,
        urls: &[String],
        max_length: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractionOutcome>> {
        debug!(count = urls.len(), "extracting batch");

        let tasks = urls.iter().map(|url| {
            let permits = self.permits.clone();
            async move {
                let _permit = tokio::select! {
                    permit = permits.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return None,
                    },
                    _ = cancel.cancelled() => return None,
                };
                let outcome = self.extractor.extract(url, max_length, cancel).await;
                Some(outcome)
            }
        });

        let outcomes = tokio::select! {
            outcomes = join_all(tasks) => outcomes,
            _ = cancel.cancelled() => {
                return Err(SearchError::Cancelled("content extraction was cancelled".into()));
            }
        };

        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled("content extraction was cancelled".into()));
        }

        outcomes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| SearchError::Cancelled("extraction permits closed".into()))
    }
}
