//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use inference_lib::predictor::ValidationError;
use inference_lib::FEATURE_NAMES;
use serde_json::{json, Map, Value};

/// Endpoints listed in 404 responses
pub const AVAILABLE_ENDPOINTS: [&str; 5] = [
    "/health",
    "/predict",
    "/metrics",
    "/model/info",
    "/model/reload",
];

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    /// No model handle is active
    ModelNotLoaded,
    /// The model info endpoint without an active handle
    ModelInfoUnavailable,
    /// The request body broke a validation rule
    Validation(ValidationError),
    /// Prediction failed after validation passed
    Prediction,
    /// Model reload failed
    ReloadFailed,
    /// Metrics are disabled
    MetricsUnavailable,
    /// Unexpected failure
    Internal,
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelNotLoaded
            | ApiError::ModelInfoUnavailable
            | ApiError::MetricsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Prediction | ApiError::ReloadFailed | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::ModelNotLoaded => json!({
                "error": "Model not loaded",
                "message": "Please ensure the model is properly trained and available",
            }),
            ApiError::ModelInfoUnavailable => json!({ "error": "Model not loaded" }),
            ApiError::Validation(err) => validation_body(err),
            ApiError::Prediction => json!({
                "error": "Internal server error",
                "message": "Prediction failed",
                "timestamp": Utc::now(),
            }),
            ApiError::ReloadFailed => json!({
                "error": "Failed to reload model",
                "timestamp": Utc::now(),
            }),
            ApiError::MetricsUnavailable => json!({ "error": "Prometheus metrics not available" }),
            ApiError::Internal => json!({
                "error": "Internal server error",
                "message": "An unexpected error occurred",
            }),
            ApiError::NotFound => json!({
                "error": "Not found",
                "message": "The requested endpoint does not exist",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        }
    }
}

fn validation_body(err: &ValidationError) -> Value {
    let mut body = Map::new();
    body.insert("error".to_string(), json!(err.to_string()));
    body.insert("rule".to_string(), json!(err.rule()));

    match err {
        ValidationError::MalformedJson => {
            body.insert(
                "message".to_string(),
                json!("Please provide valid JSON with 'features' field"),
            );
        }
        ValidationError::MissingField => {
            body.insert(
                "expected_format".to_string(),
                json!({ "features": [5.1, 3.5, 1.4, 0.2] }),
            );
        }
        ValidationError::WrongArity { .. } => {
            body.insert("feature_names".to_string(), json!(FEATURE_NAMES));
        }
        ValidationError::NonNumeric { .. } => {}
    }

    if let Some(provided) = err.provided() {
        body.insert("provided".to_string(), provided.clone());
    }
    Value::Object(body)
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::ModelNotLoaded.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Validation(ValidationError::MissingField).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Prediction.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::ReloadFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_wrong_arity_body() {
        let body = ApiError::Validation(ValidationError::WrongArity {
            provided: json!([1, 2, 3]),
        })
        .body();
        assert_eq!(body["error"], "Features must be a list of 4 numeric values");
        assert_eq!(body["rule"], "wrong_arity");
        assert_eq!(body["provided"], json!([1, 2, 3]));
        assert_eq!(body["feature_names"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_missing_field_body_shows_format() {
        let body = ApiError::Validation(ValidationError::MissingField).body();
        assert_eq!(body["error"], "Missing 'features' field");
        assert_eq!(body["expected_format"]["features"], json!([5.1, 3.5, 1.4, 0.2]));
        assert!(body.get("provided").is_none());
    }

    #[test]
    fn test_not_found_lists_endpoints() {
        let body = ApiError::NotFound.body();
        assert_eq!(body["available_endpoints"], json!(AVAILABLE_ENDPOINTS));
    }
}
