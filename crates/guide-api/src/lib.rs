//! Guide API crate - axum HTTP server for the museum guide.
//!
//! Serves the guide page and exposes the four feature areas (artifact
//! analysis, text chat, voice chat, fun facts) plus the tour log. Interaction
//! endpoints stream their display output as Server-Sent Events.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
