//! Networking module
//!
//! HTTP client for backend requests and page fetches, the headless browser
//! fetcher, and the [`PageFetcher`] seam both implement.

mod browser;
mod client;
mod fetcher;
mod user_agent;

pub use browser::BrowserFetcher;
pub use client::HttpClient;
pub use fetcher::{FetchError, PageFetcher, FETCH_GRACE};
pub use user_agent::generate_user_agent;
