//! Response assembly

use super::types::{BackendAttempt, ExtractionOutcome, ResultEntry, SearchHit, SearchResponse};
use std::time::Duration;

/// Zip hits with their outcomes and compute the counters.
///
/// `outcomes` is `None` when extraction was not requested; every entry is
/// then marked skipped. Otherwise it must hold one outcome per hit, in hit
/// order.
pub fn assemble(
    query: &str,
    backend: &str,
    hits: Vec<SearchHit>,
    outcomes: Option<Vec<ExtractionOutcome>>,
    attempts: Vec<BackendAttempt>,
    elapsed: Duration,
) -> SearchResponse {
    let outcomes = outcomes
        .unwrap_or_else(|| hits.iter().map(|h| ExtractionOutcome::skipped(&h.url)).collect());
    debug_assert_eq!(hits.len(), outcomes.len());

    let results: Vec<ResultEntry> = hits
        .into_iter()
        .zip(outcomes)
        .map(|(hit, content)| ResultEntry {
            content_preview: content.preview(),
            hit,
            content,
        })
        .collect();

    let extracted_count = results.iter().filter(|e| e.content.is_ok()).count();

    SearchResponse {
        query: query.to_string(),
        backend: backend.to_string(),
        total_results: results.len(),
        extracted_count,
        results,
        attempts,
        elapsed_ms: elapsed.as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ExtractionFailure, ExtractionStatus, FetchMethod};

    fn hits(n: usize) -> Vec<SearchHit> {
        (0..n)
            .map(|i| SearchHit::new(format!("https://site{i}.test/"), format!("Site {i}"), "brave"))
            .collect()
    }

    #[test]
    fn test_skipped_when_no_outcomes() {
        let response = assemble("q", "brave", hits(3), None, vec![], Duration::from_millis(12));
        assert_eq!(response.total_results, 3);
        assert_eq!(response.extracted_count, 0);
        assert_eq!(response.elapsed_ms, 12);
        assert!(response
            .results
            .iter()
            .all(|e| e.content.status == ExtractionStatus::Skipped && e.content_preview.is_none()));
    }

    #[test]
    fn test_order_and_counts() {
        let hits = hits(3);
        let outcomes = vec![
            ExtractionOutcome::ok(&hits[0].url, "zero".into(), false, FetchMethod::Http),
            ExtractionOutcome::failed(&hits[1].url, &ExtractionFailure::HttpStatus(404)),
            ExtractionOutcome::ok(&hits[2].url, "two".into(), false, FetchMethod::Browser),
        ];
        let response = assemble("q", "brave", hits, Some(outcomes), vec![], Duration::ZERO);

        assert_eq!(response.extracted_count, 2);
        for entry in &response.results {
            assert_eq!(entry.hit.url, entry.content.url);
        }
        assert_eq!(response.results[1].content.status, ExtractionStatus::Failed);
    }
}
