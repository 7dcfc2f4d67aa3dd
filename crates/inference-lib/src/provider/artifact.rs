//! Model artifact loading
//!
//! An artifact is a model file (`.json` tree ensemble or `.onnx` graph) plus
//! optional siblings:
//! - `<file>.sha256`: hex SHA-256 the file must match
//! - `scaler.json`: scaler parameters replacing the reference fit

use crate::predictor::{Classifier, OnnxClassifier, StandardScaler, TreeEnsemble};
use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default maximum artifact size (10 MiB)
pub const DEFAULT_MAX_MODEL_BYTES: usize = 10 * 1024 * 1024;

/// File names looked up inside an artifact directory, in order
pub const MODEL_FILE_NAMES: [&str; 2] = ["model.json", "model.onnx"];

/// Sibling file holding scaler parameters
pub const SCALER_FILE_NAME: &str = "scaler.json";

/// Classifier and scaler loaded from disk
pub struct LoadedArtifact {
    pub classifier: Box<dyn Classifier>,
    pub scaler: StandardScaler,
    pub path: PathBuf,
}

/// Find the model file inside an artifact directory
pub async fn find_model_file(dir: &Path) -> Option<PathBuf> {
    for name in MODEL_FILE_NAMES {
        let candidate = dir.join(name);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}

/// Load a model file and its optional siblings
pub async fn load_artifact(path: &Path, max_bytes: usize) -> Result<LoadedArtifact> {
    let size = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Failed to stat model file {:?}", path))?
        .len();
    if size > max_bytes as u64 {
        bail!("Model size {} exceeds maximum {}", size, max_bytes);
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read model file {:?}", path))?;
    // The file may have grown between the stat and the read.
    if bytes.len() > max_bytes {
        bail!("Model size {} exceeds maximum {}", bytes.len(), max_bytes);
    }

    verify_checksum(path, &bytes).await?;

    let classifier: Box<dyn Classifier> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Box::new(
            TreeEnsemble::from_json(&bytes)
                .with_context(|| format!("Invalid tree ensemble {:?}", path))?,
        ),
        Some("onnx") => Box::new(
            OnnxClassifier::new(&bytes).with_context(|| format!("Invalid ONNX model {:?}", path))?,
        ),
        _ => bail!("Unsupported model format {:?}", path),
    };

    let scaler = load_scaler(path).await?;

    debug!(
        path = %path.display(),
        size = bytes.len(),
        model_type = classifier.model_type(),
        "Model artifact loaded"
    );

    Ok(LoadedArtifact {
        classifier,
        scaler,
        path: path.to_path_buf(),
    })
}

async fn verify_checksum(path: &Path, bytes: &[u8]) -> Result<()> {
    let checksum_path = checksum_path(path);
    let expected = match tokio::fs::read_to_string(&checksum_path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {:?}", checksum_path));
        }
    };

    // Accept both a bare digest and `sha256sum` output.
    let expected = expected
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let computed = compute_checksum(bytes);
    if computed != expected {
        bail!(
            "Checksum mismatch for {:?}: expected {}, got {}",
            path,
            expected,
            computed
        );
    }

    info!(path = %path.display(), checksum = %computed, "Model checksum validated");
    Ok(())
}

async fn load_scaler(model_path: &Path) -> Result<StandardScaler> {
    let scaler_path = model_path
        .parent()
        .map(|dir| dir.join(SCALER_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SCALER_FILE_NAME));

    match tokio::fs::read(&scaler_path).await {
        Ok(bytes) => StandardScaler::from_json(&bytes)
            .with_context(|| format!("Invalid scaler parameters {:?}", scaler_path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StandardScaler::reference(),
        Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", scaler_path)),
    }
}

fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
