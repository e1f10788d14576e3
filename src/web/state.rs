//! Application state shared across handlers

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::WebSearchService;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search and extraction operations
    pub service: Arc<WebSearchService>,
    /// The same operations as tools, for `/mcp`
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, service: Arc<WebSearchService>) -> Self {
        let tools = Arc::new(ToolRegistry::new(service.clone()));
        Self {
            settings: Arc::new(settings),
            service,
            tools,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        self.service.metrics()
    }
}
