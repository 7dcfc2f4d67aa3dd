//! Prediction engine: validation, scaling, classifiers and the pipeline
//! that ties them together

mod forest;
mod inference;
mod pipeline;
mod scaler;
pub mod validation;

pub use forest::TreeEnsemble;
pub use inference::OnnxClassifier;
pub use pipeline::{predict, PipelineError, PROBABILITY_TOLERANCE};
pub use scaler::{StandardScaler, REFERENCE_POINTS};
pub use validation::{parse_body, validate, ValidationError};

use crate::models::NUM_FEATURES;
use anyhow::Result;

/// Trait for classifier implementations.
///
/// Inputs are already scaled.
pub trait Classifier: Send + Sync {
    /// Predicted class id
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> Result<usize>;

    /// Probability of each class, in class-id order
    fn predict_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<Vec<f64>>;

    /// Class id and probabilities together; override when one evaluation yields both
    fn predict_with_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<(usize, Vec<f64>)> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    /// Human-readable model family name
    fn model_type(&self) -> &str;
}
