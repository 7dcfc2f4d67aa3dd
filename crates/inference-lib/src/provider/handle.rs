use crate::models::Provenance;
use crate::predictor::{Classifier, StandardScaler};
use chrono::{DateTime, Utc};

/// The active classifier with its scaler and provenance.
///
/// Built complete and never mutated, so a swap always exposes a consistent
/// classifier/scaler pair.
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    scaler: StandardScaler,
    provenance: Provenance,
    version: String,
    loaded_at: DateTime<Utc>,
}

impl ModelHandle {
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: StandardScaler,
        provenance: Provenance,
    ) -> Self {
        let version = provenance.version_label();
        Self {
            classifier,
            scaler,
            provenance,
            version,
            loaded_at: Utc::now(),
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Short version label (registry version, run id prefix or `local`)
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn model_type(&self) -> &str {
        self.classifier.model_type()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_type", &self.model_type())
            .field("provenance", &self.provenance)
            .field("version", &self.version)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}
