//! # CRM API
//!
//! HTTP handlers, extractors, routing and error mapping.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
