//! Clipshelf API Library
//!
//! HTTP handlers, authentication and application setup for the Clipshelf
//! video service.

mod api_doc;
mod handlers;
mod middleware;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use api_doc::{get_openapi_spec, ApiDoc};
pub use error::ErrorResponse;
