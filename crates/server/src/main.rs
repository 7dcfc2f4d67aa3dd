//! Iris inference server
//!
//! Loads the iris classifier and serves predictions over HTTP.

use anyhow::Result;
use inference_lib::{MetricsSink, NoopSink, PrometheusSink, StructuredLogger};
use iris_server::{api, ServerConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting iris-server");

    let config = ServerConfig::load()?;
    info!(
        model_root = %config.model_root.display(),
        model_source = ?config.model_source,
        metrics_enabled = config.metrics_enabled,
        "Server configured"
    );

    let metrics: Arc<dyn MetricsSink> = if config.metrics_enabled {
        Arc::new(PrometheusSink::new()?)
    } else {
        Arc::new(NoopSink)
    };

    let logger = StructuredLogger::new("iris-server");
    let state = Arc::new(api::AppState::new(
        config.build_provider(),
        metrics,
        logger.clone(),
    ));

    // Serve even without a model; /model/reload can recover later.
    if let Err(e) = state.models.reload().await {
        warn!(error = %format!("{:#}", e), "Starting without a model");
    }

    let addr = config.bind_addr();
    logger.log_startup(SERVER_VERSION, &addr);

    tokio::select! {
        result = api::serve(addr, state) => {
            if let Err(e) = &result {
                error!(error = %e, "API server failed");
            }
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
