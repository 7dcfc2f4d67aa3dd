//! Model providers and the active-model store
//!
//! A [`ModelProvider`] produces a complete [`ModelHandle`]; the
//! [`ModelManager`] installs it into the [`ModelStore`] that request handlers
//! read from.

pub mod artifact;
mod handle;
mod local;
mod manager;
mod registry;
mod store;

pub use handle::ModelHandle;
pub use local::{LocalFileProvider, LOCAL_MODEL_FILES};
pub use manager::ModelManager;
pub use registry::{RegistryConfig, RegistryProvider, LATEST};
pub use store::ModelStore;

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, warn};

// Re-export async_trait for implementors
pub use async_trait::async_trait;

/// Source of model handles
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Load a complete handle
    async fn load(&self) -> Result<ModelHandle>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Tries each provider in order and returns the first handle loaded
pub struct FallbackProvider {
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn ModelProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl ModelProvider for FallbackProvider {
    async fn load(&self) -> Result<ModelHandle> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.load().await {
                Ok(handle) => {
                    debug!(provider = provider.name(), "Provider supplied model");
                    return Ok(handle);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %format!("{:#}", e), "Provider failed");
                    failures.push(format!("{}: {:#}", provider.name(), e));
                }
            }
        }

        if failures.is_empty() {
            bail!("No model providers configured");
        }
        bail!("All model providers failed: {}", failures.join("; "))
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use crate::predictor::{StandardScaler, TreeEnsemble};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(&'static str);

    #[async_trait]
    impl ModelProvider for Fixed {
        async fn load(&self) -> Result<ModelHandle> {
            let forest = TreeEnsemble::from_json(
                br#"{"trees": [{"nodes": [{"value": [1.0, 0.0, 0.0]}]}]}"#,
            )?;
            Ok(ModelHandle::new(
                Box::new(forest),
                StandardScaler::reference()?,
                Provenance::LocalFile {
                    file: self.0.to_string(),
                },
            ))
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Broken {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelProvider for Broken {
        async fn load(&self) -> Result<ModelHandle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bail!("disk on fire")
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let broken = Arc::new(Broken {
            calls: AtomicUsize::new(0),
        });
        let chain = FallbackProvider::new(vec![
            broken.clone(),
            Arc::new(Fixed("second")),
            Arc::new(Fixed("third")),
        ]);

        let handle = chain.load().await.unwrap();
        assert_eq!(
            handle.provenance(),
            &Provenance::LocalFile {
                file: "second".to_string()
            }
        );
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failures_reported() {
        let chain = FallbackProvider::new(vec![
            Arc::new(Broken {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(Broken {
                calls: AtomicUsize::new(0),
            }),
        ]);
        let err = chain.load().await.err().unwrap().to_string();
        assert!(err.starts_with("All model providers failed"));
        assert_eq!(err.matches("disk on fire").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = FallbackProvider::new(Vec::new());
        assert!(chain.load().await.is_err());
    }
}
