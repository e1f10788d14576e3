//! Backend selection: which backends to try, and in what order

use crate::engines::{Backend, BackendCapabilities, BackendRegistry};
use crate::error::{Result, SearchError};
use crate::query::SearchRequest;
use std::sync::Arc;
use tracing::debug;

/// One backend scheduled for an attempt
#[derive(Clone)]
pub struct Candidate {
    pub backend: Arc<dyn Backend>,
    /// The browser last resort
    pub fallback: bool,
}

impl Candidate {
    fn searchable(backend: &Arc<dyn Backend>) -> Self {
        Self {
            backend: backend.clone(),
            fallback: false,
        }
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("backend", &self.name())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Number of requested filters among category, language and country that
/// `caps` can express
pub fn filter_score(request: &SearchRequest, caps: &BackendCapabilities) -> usize {
    let category = request.wants_category() && caps.supports_category(request.category);
    let language = request.language.is_some() && caps.language;
    let country = request.country.is_some() && caps.country;
    [category, language, country].iter().filter(|b| **b).count()
}

/// Number of filters in the request that ranking considers
fn requested_filters(request: &SearchRequest) -> usize {
    [
        request.wants_category(),
        request.language.is_some(),
        request.country.is_some(),
    ]
    .iter()
    .filter(|b| **b)
    .count()
}

/// Order the candidates for a request.
///
/// The browser fallback, when registered, is always last. Fails when the
/// request names a backend that is not registered, or when nothing at all
/// can be tried.
pub fn select(registry: &BackendRegistry, request: &SearchRequest) -> Result<Vec<Candidate>> {
    let mut candidates = match request.backend.as_deref() {
        Some(name) => explicit(registry, request, name)?,
        None => ranked(registry, request),
    };

    if let Some(fallback) = registry.fallback() {
        if candidates.iter().all(|c| c.name() != fallback.name()) {
            candidates.push(Candidate {
                backend: fallback.clone(),
                fallback: true,
            });
        }
    }

    if candidates.is_empty() {
        return Err(SearchError::SearchUnavailable(
            "no search backends are enabled".into(),
        ));
    }

    debug!(
        order = ?candidates.iter().map(|c| c.name()).collect::<Vec<_>>(),
        "selected backends"
    );
    Ok(candidates)
}

fn explicit(registry: &BackendRegistry, request: &SearchRequest, name: &str) -> Result<Vec<Candidate>> {
    if registry.fallback().is_some_and(|f| f.name() == name) {
        // the fallback is appended by the caller
        return Ok(Vec::new());
    }

    let Some(backend) = registry.get(name) else {
        return Err(SearchError::invalid(format!(
            "unknown backend '{}' (available: {})",
            name,
            registry.names().join(", ")
        )));
    };

    if filter_score(request, &backend.capabilities()) == requested_filters(request) {
        Ok(vec![Candidate::searchable(backend)])
    } else {
        debug!(backend = %name, "preferred backend lacks requested filters, ranking all");
        Ok(ranked(registry, request))
    }
}

/// Every searchable backend, best filter coverage first; ties keep the
/// configured priority
fn ranked(registry: &BackendRegistry, request: &SearchRequest) -> Vec<Candidate> {
    let mut scored: Vec<(usize, &Arc<dyn Backend>)> = registry
        .backends()
        .iter()
        .map(|b| (filter_score(request, &b.capabilities()), b))
        .collect();

    // stable: equal scores stay in priority order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .map(|(_, b)| Candidate::searchable(b))
        .collect()
}
