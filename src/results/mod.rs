//! Result types, assembly and rendering
//!
//! Hits and extraction outcomes are created once per request and never
//! mutated after the response is assembled.

mod assembler;
mod render;
mod types;

pub use assembler::assemble;
pub use render::{render_page, render_search, render_summaries};
pub use types::*;
