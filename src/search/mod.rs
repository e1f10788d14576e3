//! Search orchestration module
//!
//! Picks backends for a request, runs them one at a time until one
//! returns hits, and wraps the three public operations in
//! [`WebSearchService`].

mod executor;
mod models;
mod selector;
mod service;

pub use executor::SearchExecutor;
pub use models::*;
pub use selector::{filter_score, select, Candidate};
pub use service::WebSearchService;
