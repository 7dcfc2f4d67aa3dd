//! HTTP API for predictions, model management, health and metrics

use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use inference_lib::{
    observability::{metric_names, METRICS_CONTENT_TYPE},
    predictor::{self, parse_body},
    HealthResponse, MetricsSink, ModelManager, ModelProvider, ModelStore, NamedValues, Provenance,
    StructuredLogger, FEATURE_NAMES, TARGET_NAMES,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub models: ModelManager,
    pub metrics: Arc<dyn MetricsSink>,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        metrics: Arc<dyn MetricsSink>,
        logger: StructuredLogger,
    ) -> Self {
        let models = ModelManager::new(provider, ModelStore::new(), metrics.clone(), logger.clone());
        Self {
            models,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictionBody {
    class_id: usize,
    class_name: &'static str,
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    prediction: PredictionBody,
    probabilities: NamedValues,
    input_features: NamedValues,
    model_info: Provenance,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ModelInfoResponse {
    model_info: Provenance,
    feature_names: [&'static str; 4],
    target_names: [&'static str; 3],
    model_type: String,
    model_version: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    message: &'static str,
    model_info: Provenance,
    timestamp: DateTime<Utc>,
}

/// Health check - 200 if a model is active, 503 otherwise
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = HealthResponse::from_store(state.models.store());

    let status_code = if health.status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let Some(handle) = state.models.current() else {
        state
            .metrics
            .increment(metric_names::PREDICTION_ERRORS, &["unavailable"]);
        return Err(ApiError::ModelNotLoaded);
    };

    let features = parse_body(&body).map_err(|e| {
        state
            .metrics
            .increment(metric_names::PREDICTION_ERRORS, &["validation"]);
        ApiError::from(e)
    })?;

    let start = Instant::now();
    let result = predictor::predict(&handle, &features).map_err(|e| {
        error!(error = %e, model_version = %handle.version(), "Prediction error");
        state
            .metrics
            .increment(metric_names::PREDICTION_ERRORS, &["pipeline"]);
        ApiError::Prediction
    })?;
    state.metrics.observe(
        metric_names::PREDICTION_LATENCY,
        start.elapsed().as_secs_f64(),
    );
    state
        .metrics
        .increment(metric_names::PREDICTION_COUNT, &[handle.version()]);
    state
        .logger
        .log_prediction(result.class_name(), result.confidence(), handle.version());

    Ok(Json(PredictResponse {
        prediction: PredictionBody {
            class_id: result.class_id(),
            class_name: result.class_name(),
            confidence: result.confidence(),
        },
        probabilities: result.named_probabilities(),
        input_features: features.named(),
        model_info: handle.provenance().clone(),
        timestamp: Utc::now(),
    }))
}

async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelInfoResponse>, ApiError> {
    let handle = state
        .models
        .current()
        .ok_or(ApiError::ModelInfoUnavailable)?;

    Ok(Json(ModelInfoResponse {
        model_info: handle.provenance().clone(),
        feature_names: FEATURE_NAMES,
        target_names: TARGET_NAMES,
        model_type: handle.model_type().to_string(),
        model_version: handle.version().to_string(),
        timestamp: Utc::now(),
    }))
}

async fn reload_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    match state.models.reload().await {
        Ok(handle) => Ok(Json(ReloadResponse {
            message: "Model reloaded successfully",
            model_info: handle.provenance().clone(),
            timestamp: Utc::now(),
        })),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Model reload failed");
            Err(ApiError::ReloadFailed)
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match state.metrics.export() {
        Ok(Some(text)) => {
            Ok(([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response())
        }
        Ok(None) => Err(ApiError::MetricsUnavailable),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            Err(ApiError::Internal)
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Count and time every request by method, route and status
async fn track_requests(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(req).await;

    state
        .metrics
        .observe(metric_names::REQUEST_LATENCY, start.elapsed().as_secs_f64());
    state.metrics.increment(
        metric_names::REQUEST_COUNT,
        &[method.as_str(), endpoint.as_str(), response.status().as_str()],
    );

    response
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/model/info", get(model_info))
        .route("/model/reload", post(reload_model))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
