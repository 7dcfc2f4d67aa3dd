//! Prediction pipeline
//!
//! Scales a validated vector, runs the classifier of the given handle and
//! assembles the [`PredictionResult`].

use crate::models::{ClassLabel, FeatureVector, PredictionResult, NUM_CLASSES};
use crate::provider::ModelHandle;
use thiserror::Error;
use tracing::warn;

/// Allowed deviation of the probability sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Failure inside the pipeline after validation passed
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("classifier failed: {0:#}")]
    Classifier(anyhow::Error),

    #[error("class id {0} is outside the label table")]
    UnknownClass(usize),

    #[error("expected {expected} class probabilities, got {got}")]
    ProbabilityShape { expected: usize, got: usize },

    #[error("invalid probability distribution (sum {sum})")]
    InvalidProbabilities { sum: f64 },
}

/// Run one prediction against `handle`.
///
/// Confidence is the probability at the class id the classifier predicted,
/// not a re-derived maximum. If the two ever disagree the result still
/// follows the classifier's decision and a warning is logged.
pub fn predict(
    handle: &ModelHandle,
    features: &FeatureVector,
) -> Result<PredictionResult, PipelineError> {
    let scaled = handle.scaler().transform(features);
    let classifier = handle.classifier();

    let (class_id, proba) = classifier
        .predict_with_proba(&scaled)
        .map_err(PipelineError::Classifier)?;

    let label = ClassLabel::from_id(class_id).ok_or(PipelineError::UnknownClass(class_id))?;
    let probabilities = check_distribution(&proba)?;

    let argmax = argmax(&probabilities);
    if argmax != class_id {
        warn!(
            predicted = class_id,
            argmax = argmax,
            model_version = %handle.version(),
            "Classifier decision differs from probability argmax"
        );
    }

    Ok(PredictionResult::new(label, probabilities))
}

fn check_distribution(proba: &[f64]) -> Result<[f64; NUM_CLASSES], PipelineError> {
    let probabilities: [f64; NUM_CLASSES] =
        proba
            .try_into()
            .map_err(|_| PipelineError::ProbabilityShape {
                expected: NUM_CLASSES,
                got: proba.len(),
            })?;

    let sum: f64 = probabilities.iter().sum();
    let in_range = probabilities
        .iter()
        .all(|p| p.is_finite() && (0.0..=1.0).contains(p));
    if !in_range || (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PipelineError::InvalidProbabilities { sum });
    }
    Ok(probabilities)
}

/// Index of the largest value, lowest index on ties
fn argmax(values: &[f64; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
