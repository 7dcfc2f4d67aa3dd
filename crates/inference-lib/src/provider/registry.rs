//! Registry-layout model provider
//!
//! Reads models from a directory tree shaped like a model registry:
//!
//! ```text
//! <root>/registry/<model-name>/<version>/model.{json,onnx}
//! <root>/experiments/<experiment>/<run-id>/model.{json,onnx}
//! <root>/experiments/<experiment>/<run-id>/metrics.json   {"accuracy": 0.97}
//! ```
//!
//! The registry entry wins; when the model is not registered, the experiment
//! run with the highest accuracy is used instead.

use super::artifact::{find_model_file, load_artifact, DEFAULT_MAX_MODEL_BYTES};
use super::{ModelHandle, ModelProvider};
use crate::models::Provenance;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Version alias resolving to the highest numeric version
pub const LATEST: &str = "latest";

/// Configuration for registry lookups
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Root directory holding `registry/` and `experiments/`
    pub root: PathBuf,
    /// Registered model name
    pub model_name: String,
    /// Version to load, or `latest`
    pub model_version: String,
    /// Experiment searched when the registry has no entry
    pub experiment_name: String,
    /// Maximum model size in bytes
    pub max_model_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./models"),
            model_name: "iris-classifier".to_string(),
            model_version: LATEST.to_string(),
            experiment_name: "iris-classification".to_string(),
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunMetrics {
    accuracy: f64,
}

/// Provider backed by the registry directory layout
pub struct RegistryProvider {
    config: RegistryConfig,
}

impl RegistryProvider {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    async fn load_registered(&self) -> Result<ModelHandle> {
        let model_dir = self
            .config
            .root
            .join("registry")
            .join(&self.config.model_name);

        let version = if self.config.model_version == LATEST {
            latest_version(&model_dir).await?
        } else {
            self.config.model_version.clone()
        };

        let version_dir = model_dir.join(&version);
        let model_path = find_model_file(&version_dir)
            .await
            .ok_or_else(|| anyhow!("No model file in {:?}", version_dir))?;
        let artifact = load_artifact(&model_path, self.config.max_model_bytes).await?;

        info!(
            name = %self.config.model_name,
            version = %version,
            "Loaded model from registry"
        );

        Ok(ModelHandle::new(
            artifact.classifier,
            artifact.scaler,
            Provenance::ModelRegistry {
                name: self.config.model_name.clone(),
                version,
            },
        ))
    }

    async fn load_best_run(&self) -> Result<ModelHandle> {
        let experiment_dir = self
            .config
            .root
            .join("experiments")
            .join(&self.config.experiment_name);
        if !is_dir(&experiment_dir).await {
            bail!("Experiment '{}' not found", self.config.experiment_name);
        }

        let mut best: Option<(String, f64, PathBuf)> = None;
        for run_dir in sorted_subdirs(&experiment_dir).await? {
            let Some(run_id) = dir_name(&run_dir) else {
                continue;
            };
            let Some(model_path) = find_model_file(&run_dir).await else {
                continue;
            };
            let accuracy = match read_run_accuracy(&run_dir).await {
                Ok(accuracy) => accuracy,
                Err(e) => {
                    warn!(run_id = %run_id, error = %e, "Skipping run without usable metrics");
                    continue;
                }
            };
            if best.as_ref().map(|(_, a, _)| accuracy > *a).unwrap_or(true) {
                best = Some((run_id, accuracy, model_path));
            }
        }

        let (run_id, accuracy, model_path) = best.ok_or_else(|| {
            anyhow!(
                "No trained models found in experiment '{}'",
                self.config.experiment_name
            )
        })?;
        let artifact = load_artifact(&model_path, self.config.max_model_bytes).await?;

        info!(run_id = %run_id, accuracy = accuracy, "Loaded model from experiment run");

        Ok(ModelHandle::new(
            artifact.classifier,
            artifact.scaler,
            Provenance::ExperimentRun { run_id, accuracy },
        ))
    }
}

#[async_trait]
impl ModelProvider for RegistryProvider {
    async fn load(&self) -> Result<ModelHandle> {
        match self.load_registered().await {
            Ok(handle) => Ok(handle),
            Err(registry_err) => {
                warn!(error = %format!("{:#}", registry_err), "Could not load from model registry");
                self.load_best_run()
                    .await
                    .with_context(|| format!("registry lookup failed ({:#})", registry_err))
            }
        }
    }

    fn name(&self) -> &str {
        "registry"
    }
}

/// Highest numeric version directory; non-numeric names are ignored
async fn latest_version(model_dir: &Path) -> Result<String> {
    let mut latest: Option<(u64, String)> = None;
    for dir in sorted_subdirs(model_dir).await? {
        let Some(name) = dir_name(&dir) else {
            continue;
        };
        if let Ok(number) = name.parse::<u64>() {
            if latest.as_ref().map(|(n, _)| number > *n).unwrap_or(true) {
                latest = Some((number, name));
            }
        }
    }
    latest
        .map(|(_, name)| name)
        .ok_or_else(|| anyhow!("No versions registered in {:?}", model_dir))
}

async fn read_run_accuracy(run_dir: &Path) -> Result<f64> {
    let path = run_dir.join("metrics.json");
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let metrics: RunMetrics =
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {:?}", path))?;
    if !metrics.accuracy.is_finite() {
        bail!("Accuracy in {:?} is not finite", path);
    }
    Ok(metrics.accuracy)
}

async fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {:?}", dir))?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
