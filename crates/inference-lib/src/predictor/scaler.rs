//! Standard scaling of feature vectors

use crate::models::{FeatureVector, NUM_FEATURES};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Representative samples used to fit the default scaler, one per class
pub const REFERENCE_POINTS: [[f64; NUM_FEATURES]; 3] = [
    [5.1, 3.5, 1.4, 0.2],
    [7.0, 3.2, 4.7, 1.4],
    [6.3, 3.3, 6.0, 2.5],
];

/// Per-feature standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; NUM_FEATURES],
    scale: [f64; NUM_FEATURES],
}

impl StandardScaler {
    /// Build a scaler from explicit parameters
    pub fn new(mean: [f64; NUM_FEATURES], scale: [f64; NUM_FEATURES]) -> Result<Self> {
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            bail!("Scaler parameters must be finite");
        }
        if scale.iter().any(|s| *s <= 0.0) {
            bail!("Scaler scale values must be positive");
        }
        Ok(Self { mean, scale })
    }

    /// Fit on sample rows using the population standard deviation.
    /// Columns with zero variance get a scale of 1.
    pub fn fit(samples: &[[f64; NUM_FEATURES]]) -> Result<Self> {
        if samples.is_empty() {
            bail!("Cannot fit scaler on an empty sample set");
        }
        let n = samples.len() as f64;

        let mut mean = [0.0; NUM_FEATURES];
        for row in samples {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut scale = [0.0; NUM_FEATURES];
        for row in samples {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scale.iter_mut() {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self::new(mean, scale)
    }

    /// Scaler fit on [`REFERENCE_POINTS`]
    pub fn reference() -> Result<Self> {
        Self::fit(&REFERENCE_POINTS)
    }

    /// Parse scaler parameters from JSON (`{"mean": [...], "scale": [...]}`)
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: StandardScaler = serde_json::from_slice(bytes)?;
        Self::new(raw.mean, raw.scale)
    }

    pub fn transform(&self, features: &FeatureVector) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for (i, x) in features.values().iter().enumerate() {
            out[i] = (x - self.mean[i]) / self.scale[i];
        }
        out
    }

    pub fn mean(&self) -> &[f64; NUM_FEATURES] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; NUM_FEATURES] {
        &self.scale
    }
}
