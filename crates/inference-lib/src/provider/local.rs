//! Local-file model provider

use super::artifact::{load_artifact, DEFAULT_MAX_MODEL_BYTES};
use super::{ModelHandle, ModelProvider};
use crate::models::Provenance;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Candidate files, in priority order
pub const LOCAL_MODEL_FILES: [&str; 4] = [
    "best_model.json",
    "model.json",
    "best_model.onnx",
    "model.onnx",
];

/// Loads the first model file found directly under a directory
pub struct LocalFileProvider {
    dir: PathBuf,
    max_model_bytes: usize,
}

impl LocalFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
        }
    }

    pub fn with_max_model_bytes(mut self, max_model_bytes: usize) -> Self {
        self.max_model_bytes = max_model_bytes;
        self
    }
}

#[async_trait]
impl ModelProvider for LocalFileProvider {
    async fn load(&self) -> Result<ModelHandle> {
        for file in LOCAL_MODEL_FILES {
            let path = self.dir.join(file);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            let artifact = load_artifact(&path, self.max_model_bytes).await?;
            info!(file = %file, "Loaded model from local file");

            return Ok(ModelHandle::new(
                artifact.classifier,
                artifact.scaler,
                Provenance::LocalFile {
                    file: file.to_string(),
                },
            ));
        }

        bail!(
            "No model files found in {:?}. Please train a model first.",
            self.dir
        )
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FOREST: &str = r#"{"trees": [{"nodes": [{"value": [1.0, 2.0, 1.0]}]}]}"#;

    #[tokio::test]
    async fn test_best_model_preferred() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model.json"), FOREST).unwrap();
        std::fs::write(dir.path().join("best_model.json"), FOREST).unwrap();

        let handle = LocalFileProvider::new(dir.path()).load().await.unwrap();
        assert_eq!(
            handle.provenance(),
            &Provenance::LocalFile {
                file: "best_model.json".to_string()
            }
        );
        assert_eq!(handle.version(), "local");
    }

    #[tokio::test]
    async fn test_missing_model_reported() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileProvider::new(dir.path()).load().await.err().unwrap();
        assert!(err.to_string().contains("No model files found"));
    }

    #[tokio::test]
    async fn test_corrupt_model_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("best_model.json"), "{").unwrap();
        std::fs::write(dir.path().join("model.json"), FOREST).unwrap();

        assert!(LocalFileProvider::new(dir.path()).load().await.is_err());
    }

    #[tokio::test]
    async fn test_bundled_model_directory() {
        let models = concat!(env!("CARGO_MANIFEST_DIR"), "/../../models");
        let handle = LocalFileProvider::new(models).load().await.unwrap();
        assert_eq!(handle.model_type(), "RandomForestClassifier");
    }
}
