//! Backend registry

use super::traits::{Backend, Transport};
use crate::config::BackendConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Searchable backends in priority order, plus the browser fallback
pub struct BackendRegistry {
    /// Searchable backends, highest priority first
    backends: Vec<Arc<dyn Backend>>,
    /// Last-resort backend, never ranked
    fallback: Option<Arc<dyn Backend>>,
    /// Backend configurations
    configs: HashMap<String, BackendConfig>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            fallback: None,
            configs: HashMap::new(),
        }
    }

    /// Register a searchable backend; registration order is priority order
    pub fn register(&mut self, backend: Arc<dyn Backend>, config: Option<BackendConfig>) {
        let name = backend.name().to_string();
        if let Some(config) = config {
            self.configs.insert(name.clone(), config);
        }
        self.backends.retain(|b| b.name() != name);
        self.backends.push(backend);
    }

    /// Set the browser fallback
    pub fn set_fallback(&mut self, backend: Arc<dyn Backend>) {
        self.fallback = Some(backend);
    }

    /// Get a searchable backend by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// Searchable backends in priority order
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    pub fn fallback(&self) -> Option<&Arc<dyn Backend>> {
        self.fallback.as_ref()
    }

    /// Position in the priority order
    pub fn priority(&self, name: &str) -> Option<usize> {
        self.backends.iter().position(|b| b.name() == name)
    }

    /// Get all backend names, fallback last
    pub fn names(&self) -> Vec<&str> {
        self.backends
            .iter()
            .chain(self.fallback.iter())
            .map(|b| b.name())
            .collect()
    }

    /// Check if a backend exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get number of searchable backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty() && self.fallback.is_none()
    }

    /// Get effective timeout for a backend, in seconds
    pub fn get_timeout(&self, backend: &dyn Backend, default: f64) -> f64 {
        self.configs
            .get(backend.name())
            .and_then(|c| c.timeout)
            .unwrap_or_else(|| match backend.transport() {
                Transport::Browser => backend.timeout().max(default),
                Transport::Http => default,
            })
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
