//! Content extraction module
//!
//! Turns result URLs into readable text:
//! - [`ContentExtractor`]: one URL, HTTP first with a browser fallback
//! - [`BatchExtractor`]: many URLs under a shared concurrency limit
//! - [`html`]: HTML to text conversion and truncation

mod batch;
pub(crate) mod extractor;
pub mod html;

pub use batch::BatchExtractor;
pub use extractor::ContentExtractor;
