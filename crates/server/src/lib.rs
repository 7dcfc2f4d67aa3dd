//! Iris inference server
//!
//! HTTP surface over the inference library: routing, error mapping and
//! configuration.

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, serve, AppState};
pub use config::{ModelSource, ServerConfig};
pub use error::ApiError;
