//! The three search operations as tools

use super::base::{parse_params, Tool, ToolError, ToolResult};
use crate::query::{PageArgs, SearchArgs};
use crate::results::{render_page, render_search, render_summaries};
use crate::search::WebSearchService;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn search_schema(include_content: bool) -> serde_json::Value {
    let mut properties = json!({
        "query": {
            "type": "string",
            "description": "Search query (1-200 characters)"
        },
        "limit": {
            "type": "integer",
            "minimum": 1,
            "maximum": 10,
            "description": "Number of results to return (default 5)"
        },
        "top_n": {
            "type": "integer",
            "minimum": 1,
            "maximum": 10,
            "description": "Alias for limit"
        },
        "recency_days": {
            "type": "integer",
            "description": "Only results published within this many days"
        },
        "source": {
            "type": "string",
            "enum": ["web", "news", "images", "videos"],
            "description": "Result category (default web)"
        },
        "language": {
            "type": "string",
            "description": "Language code, e.g. 'en' or 'fr'"
        },
        "country": {
            "type": "string",
            "description": "Two-letter country code, e.g. 'US' or 'FR'"
        },
        "backend": {
            "type": "string",
            "description": "Preferred search backend"
        }
    });

    if include_content {
        properties["include_content"] = json!({
            "type": "boolean",
            "description": "Fetch and extract each result's page (default true)"
        });
        properties["max_content_length"] = json!({
            "type": "integer",
            "minimum": 0,
            "description": "Maximum characters of content per result, 0 for unlimited"
        });
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": ["query"]
    })
}

/// `full_web_search`
pub struct FullWebSearchTool {
    service: Arc<WebSearchService>,
}

impl FullWebSearchTool {
    pub fn new(service: Arc<WebSearchService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Tool for FullWebSearchTool {
    fn id(&self) -> &str {
        "full_web_search"
    }

    fn description(&self) -> &str {
        "Search the web and fetch the full text of each result page"
    }

    fn input_schema(&self) -> serde_json::Value {
        search_schema(true)
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let args: SearchArgs = parse_params(params)?;
        let response = self.service.full_search(args, cancel).await?;
        ToolResult::from_serialize(render_search(&response), &response)
    }
}

/// `get_web_search_summaries`
pub struct SearchSummariesTool {
    service: Arc<WebSearchService>,
}

impl SearchSummariesTool {
    pub fn new(service: Arc<WebSearchService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Tool for SearchSummariesTool {
    fn id(&self) -> &str {
        "get_web_search_summaries"
    }

    fn description(&self) -> &str {
        "Search the web and return result titles, URLs and descriptions only"
    }

    fn input_schema(&self) -> serde_json::Value {
        search_schema(false)
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let args: SearchArgs = parse_params(params)?;
        let response = self.service.summaries(args, cancel).await?;
        ToolResult::from_serialize(render_summaries(&response), &response)
    }
}

/// `get_single_web_page_content`
pub struct PageContentTool {
    service: Arc<WebSearchService>,
}

impl PageContentTool {
    pub fn new(service: Arc<WebSearchService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl Tool for PageContentTool {
    fn id(&self) -> &str {
        "get_single_web_page_content"
    }

    fn description(&self) -> &str {
        "Fetch one web page and return its readable text"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http or https URL"
                },
                "max_content_length": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Maximum characters of content, 0 for unlimited"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let args: PageArgs = parse_params(params)?;
        let page = self.service.extract_page(args, cancel).await?;
        ToolResult::from_serialize(render_page(&page), &page)
    }
}
