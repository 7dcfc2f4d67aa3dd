//! Core library for the iris inference service
//!
//! This crate provides:
//! - Request validation and the prediction pipeline
//! - Tree-ensemble and ONNX classifiers with a standard scaler
//! - Model providers and the swappable active-model store
//! - Health checks and observability

pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod provider;

pub use health::{HealthResponse, HealthStatus, SERVICE_VERSION};
pub use models::*;
pub use observability::{MetricsSink, NoopSink, PrometheusSink, StructuredLogger};
pub use provider::{
    FallbackProvider, LocalFileProvider, ModelHandle, ModelManager, ModelProvider, ModelStore,
    RegistryConfig, RegistryProvider,
};
