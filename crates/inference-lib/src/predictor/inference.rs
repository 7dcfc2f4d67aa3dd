//! ONNX inference using tract
//!
//! Loads classifiers exported to ONNX (e.g. a scikit-learn forest converted
//! without the zipmap post-processing). The graph takes one `f32[1, 4]`
//! input and produces the predicted label as output 0 and the class
//! probabilities `[1, 3]` as output 1.

use super::Classifier;
use crate::models::NUM_FEATURES;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed classifier
pub struct OnnxClassifier {
    model: TractModel,
}

impl OnnxClassifier {
    /// Create a classifier from model bytes
    pub fn new(model_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            model: Self::load_model(model_bytes)?,
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn run(&self, features: &[f64; NUM_FEATURES]) -> Result<TVec<TValue>> {
        let start = Instant::now();

        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)?.into();
        let outputs = self.model.run(tvec!(input.into()))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(outputs)
    }
}

fn label_output(outputs: &TVec<TValue>) -> Result<usize> {
    let label = outputs.first().context("No label output from model")?;
    let label = label.cast_to::<i64>()?;
    let value = label
        .to_array_view::<i64>()?
        .iter()
        .next()
        .copied()
        .context("Empty label output")?;
    usize::try_from(value).with_context(|| format!("Negative class label {}", value))
}

fn proba_output(outputs: &TVec<TValue>) -> Result<Vec<f64>> {
    let proba = outputs.get(1).context("No probability output from model")?;
    let proba = proba.cast_to::<f32>()?;
    let values = proba
        .to_array_view::<f32>()?
        .iter()
        .map(|p| *p as f64)
        .collect();
    Ok(values)
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> Result<usize> {
        label_output(&self.run(features)?)
    }

    fn predict_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<Vec<f64>> {
        proba_output(&self.run(features)?)
    }

    /// Both outputs come from a single run of the graph
    fn predict_with_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<(usize, Vec<f64>)> {
        let outputs = self.run(features)?;
        Ok((label_output(&outputs)?, proba_output(&outputs)?))
    }

    fn model_type(&self) -> &str {
        "OnnxClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scores class `c` with feature `c`; label is the argmax, probabilities the softmax
    const LINEAR_MODEL: &[u8] = include_bytes!("../../tests/fixtures/linear.onnx");

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(OnnxClassifier::new(b"definitely not an onnx graph").is_err());
    }

    #[test]
    fn test_label_and_probabilities() {
        let classifier = OnnxClassifier::new(LINEAR_MODEL).unwrap();
        assert_eq!(classifier.model_type(), "OnnxClassifier");

        assert_eq!(classifier.predict(&[3.0, 1.0, 0.0, 9.0]).unwrap(), 0);
        assert_eq!(classifier.predict(&[0.0, 2.0, 1.0, 0.0]).unwrap(), 1);
        assert_eq!(classifier.predict(&[-1.0, -2.0, 0.5, 0.0]).unwrap(), 2);

        let proba = classifier.predict_proba(&[3.0, 1.0, 0.0, 9.0]).unwrap();
        assert_eq!(proba.len(), 3);
        let expected = [0.843_794, 0.114_195, 0.042_010];
        for (p, e) in proba.iter().zip(expected) {
            assert!((p - e).abs() < 1e-4, "{:?}", proba);
        }
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_combined_matches_separate_calls() {
        let classifier = OnnxClassifier::new(LINEAR_MODEL).unwrap();
        let features = [0.2, 1.5, 0.7, 0.0];

        let (class_id, proba) = classifier.predict_with_proba(&features).unwrap();
        assert_eq!(class_id, classifier.predict(&features).unwrap());
        assert_eq!(proba, classifier.predict_proba(&features).unwrap());
        assert_eq!(class_id, 1);
    }
}
