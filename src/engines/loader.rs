//! Builds the backend registry from configuration

use super::registry::BackendRegistry;
use super::traits::Backend;
use super::{bing, brave, browser, duckduckgo};
use crate::config::Settings;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Loader for initializing backends from configuration
pub struct BackendLoader;

impl BackendLoader {
    /// Load enabled backends in priority order, plus the browser fallback
    /// when the browser is enabled
    pub fn load(settings: &Settings) -> Result<BackendRegistry> {
        let mut registry = BackendRegistry::new();

        for name in settings.enabled_backends() {
            let config = settings.get_backend(&name).cloned();
            let base_url = config.as_ref().and_then(|c| c.base_url.clone());
            let backend = Self::create_backend(&name, base_url)?;
            info!("Loaded backend: {}", name);
            registry.register(backend, config);
        }

        if settings.browser.enabled {
            registry.set_fallback(Arc::new(browser::BrowserSearch::new()));
            info!("Browser fallback enabled");
        }

        info!("Loaded {} backends", registry.len());
        Ok(registry)
    }

    /// Create a backend instance by name
    fn create_backend(name: &str, base_url: Option<String>) -> Result<Arc<dyn Backend>> {
        let backend: Arc<dyn Backend> = match (name, base_url) {
            ("brave", None) => Arc::new(brave::Brave::new()),
            ("brave", Some(url)) => Arc::new(brave::Brave::with_base_url(url)),
            ("duckduckgo", None) => Arc::new(duckduckgo::DuckDuckGo::new()),
            ("duckduckgo", Some(url)) => Arc::new(duckduckgo::DuckDuckGo::with_base_url(url)),
            ("bing", None) => Arc::new(bing::Bing::new()),
            ("bing", Some(url)) => Arc::new(bing::Bing::with_base_url(url)),
            (other, _) => {
                return Err(anyhow::anyhow!("Unknown backend: {}", other));
            }
        };

        Ok(backend)
    }
}
