//! Health reporting for the inference service
//!
//! The service is healthy exactly when a model handle is active.

use crate::models::Provenance;
use crate::provider::ModelStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service version reported by the health endpoint
pub const SERVICE_VERSION: &str = "1.0.0";

/// Overall health of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Health response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub model_loaded: bool,
    pub model_info: Option<Provenance>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    /// Snapshot the store's health
    pub fn from_store(store: &ModelStore) -> Self {
        match store.current() {
            Some(handle) => Self {
                status: HealthStatus::Healthy,
                timestamp: Utc::now(),
                model_loaded: true,
                model_info: Some(handle.provenance().clone()),
                version: SERVICE_VERSION.to_string(),
                error: None,
            },
            None => Self {
                status: HealthStatus::Unhealthy,
                timestamp: Utc::now(),
                model_loaded: false,
                model_info: None,
                version: SERVICE_VERSION.to_string(),
                error: Some("Model not loaded".to_string()),
            },
        }
    }
}
