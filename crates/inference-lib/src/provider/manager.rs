use super::{ModelHandle, ModelProvider, ModelStore};
use crate::observability::{metric_names, MetricsSink, StructuredLogger};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Loads handles from a provider and installs them into the store.
///
/// Reloads are serialized; a failed load leaves the previous handle active.
pub struct ModelManager {
    provider: Arc<dyn ModelProvider>,
    store: ModelStore,
    metrics: Arc<dyn MetricsSink>,
    logger: StructuredLogger,
    reload_lock: Mutex<()>,
}

impl ModelManager {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        store: ModelStore,
        metrics: Arc<dyn MetricsSink>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            provider,
            store,
            metrics,
            logger,
            reload_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        self.store.current()
    }

    /// Load a fresh handle and make it active
    pub async fn reload(&self) -> Result<Arc<ModelHandle>> {
        let _guard = self.reload_lock.lock().await;

        let start = Instant::now();
        let loaded = self.provider.load().await;
        let elapsed = start.elapsed().as_secs_f64();
        self.metrics
            .observe(metric_names::MODEL_LOAD_TIME, elapsed);

        match loaded {
            Ok(handle) => {
                let handle = Arc::new(handle);
                self.store.install(handle.clone());
                self.metrics
                    .increment(metric_names::MODEL_RELOADS, &["success"]);
                self.logger.log_model_loaded(
                    &provenance_summary(&handle),
                    handle.version(),
                    elapsed,
                );
                Ok(handle)
            }
            Err(e) => {
                self.metrics
                    .increment(metric_names::MODEL_RELOADS, &["failure"]);
                let kept = self.store.current();
                self.logger.log_model_load_failed(
                    &format!("{:#}", e),
                    kept.as_ref().map(|h| h.version()),
                );
                Err(e.context(format!("provider '{}' failed", self.provider.name())))
            }
        }
    }
}

fn provenance_summary(handle: &ModelHandle) -> String {
    serde_json::to_string(handle.provenance()).unwrap_or_else(|_| handle.version().to_string())
}
