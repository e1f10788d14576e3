//! Search backend module
//!
//! Defines the Backend trait, capability flags, and a registry for the
//! searchable backends and the browser fallback.

mod loader;
mod registry;
mod traits;

// Backend implementations
pub mod bing;
pub mod brave;
pub mod browser;
pub mod duckduckgo;

pub use bing::Bing;
pub use brave::Brave;
pub use browser::BrowserSearch;
pub use duckduckgo::DuckDuckGo;
pub use loader::BackendLoader;
pub use registry::BackendRegistry;
pub use traits::*;
