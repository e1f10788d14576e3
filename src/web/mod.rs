//! Web server module
//!
//! REST front-end: one GET route per search operation, `POST /mcp` for
//! JSON-RPC tool calls, plus health and statistics.

mod handlers;
mod routes;
mod state;

pub use handlers::sanitize_param;
pub use routes::create_router;
pub use state::AppState;
