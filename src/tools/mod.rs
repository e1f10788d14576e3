//! Tool front-end
//!
//! Exposes the search operations as named tools with JSON schemas, served
//! over JSON-RPC on stdio or `POST /mcp`.

pub mod base;
pub mod rpc;
pub mod search;

use base::{Tool, ToolError, ToolResult};
use crate::search::WebSearchService;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tool registry, in listing order
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the three search tools
    pub fn new(service: Arc<WebSearchService>) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(search::FullWebSearchTool::new(service.clone())));
        registry.register(Arc::new(search::SearchSummariesTool::new(service.clone())));
        registry.register(Arc::new(search::PageContentTool::new(service)));
        registry
    }

    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool, replacing any with the same id
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.id() != tool.id());
        self.tools.push(tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.id() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id()).collect()
    }

    /// Definitions for `tools/list`
    pub fn list_tool_definitions(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.id(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect()
    }

    /// Run a tool by name
    pub async fn call(
        &self,
        name: &str,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        debug!(tool = %name, "calling tool");
        tool.execute(params, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn id(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the parameters"
        }

        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }

        async fn execute(
            &self,
            params: serde_json::Value,
            _cancel: &CancellationToken,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::new(params.to_string(), params))
        }
    }

    #[tokio::test]
    async fn test_registry_call() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Echo));
        registry.register(Arc::new(Echo));
        assert_eq!(registry.names(), ["echo"]);

        let definitions = registry.list_tool_definitions();
        assert_eq!(definitions[0]["name"], "echo");
        assert_eq!(definitions[0]["inputSchema"]["type"], "object");

        let result = registry
            .call("echo", json!({"a": 1}), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.text, r#"{"a":1}"#);

        let err = registry
            .call("missing", json!({}), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }
}
