//! Search execution data models

use crate::results::{BackendAttempt, SearchHit};
use serde::Serialize;

/// What the sequential backend loop produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchExecution {
    /// Backend whose hits were kept
    pub backend: String,
    /// Hits from that backend only, at most the requested limit
    pub hits: Vec<SearchHit>,
    /// Every attempt made, in order, including the successful one
    pub attempts: Vec<BackendAttempt>,
}

impl SearchExecution {
    /// Attempts that failed before the winning backend
    pub fn failed_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| !a.succeeded()).count()
    }
}

/// Summarize failed attempts as `name: reason; name: reason`
pub fn describe_failures(attempts: &[BackendAttempt]) -> String {
    attempts
        .iter()
        .filter_map(|a| a.error.as_ref().map(|e| format!("{}: {}", a.backend, e)))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::BackendError;

    #[test]
    fn test_describe_failures() {
        let attempts = vec![
            BackendAttempt {
                backend: "brave".into(),
                hits: 0,
                elapsed_ms: 10,
                error: Some(BackendError::Captcha),
            },
            BackendAttempt {
                backend: "bing".into(),
                hits: 0,
                elapsed_ms: 10,
                error: Some(BackendError::HttpStatus(503)),
            },
        ];
        assert_eq!(
            describe_failures(&attempts),
            "brave: CAPTCHA required; bing: HTTP error: 503"
        );
    }
}
