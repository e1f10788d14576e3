//! MixSearch: web search with fallback and page content extraction
//!
//! Searches one backend at a time until one returns hits, ending with a
//! headless-browser rendering of a search page, then extracts readable
//! text from the result pages under a shared concurrency limit. Served as
//! JSON-RPC tools (stdio or `POST /mcp`) and as a REST API.

pub mod config;
pub mod engines;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod tools;
pub mod web;

pub use config::Settings;
pub use engines::Backend;
pub use error::{Result, SearchError};
pub use results::{PageExtraction, SearchResponse};
pub use search::WebSearchService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
