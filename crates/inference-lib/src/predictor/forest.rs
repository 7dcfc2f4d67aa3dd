//! Tree-ensemble classifier loaded from a JSON artifact
//!
//! Mirrors random-forest inference: every tree routes the sample to a leaf,
//! leaf class weights are normalized, and the per-tree distributions are
//! averaged. The predicted class is the argmax of that average, lowest index
//! first on ties.

use super::Classifier;
use crate::models::{NUM_CLASSES, NUM_FEATURES, TARGET_NAMES};
use anyhow::{bail, Context, Result};
use serde::Deserialize;

const DEFAULT_MODEL_TYPE: &str = "TreeEnsembleClassifier";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
struct ForestArtifact {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    n_features: Option<usize>,
    #[serde(default)]
    classes: Option<Vec<String>>,
    trees: Vec<Tree>,
}

/// Ensemble of binary decision trees
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    model_type: String,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Parse and validate a JSON model artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: ForestArtifact =
            serde_json::from_slice(bytes).context("Failed to parse tree ensemble artifact")?;

        if let Some(n) = artifact.n_features {
            if n != NUM_FEATURES {
                bail!("Model expects {} features, service provides {}", n, NUM_FEATURES);
            }
        }
        if let Some(classes) = &artifact.classes {
            if classes.iter().map(String::as_str).ne(TARGET_NAMES.iter().copied()) {
                bail!("Model classes {:?} do not match {:?}", classes, TARGET_NAMES);
            }
        }
        if artifact.trees.is_empty() {
            bail!("Tree ensemble has no trees");
        }
        for (i, tree) in artifact.trees.iter().enumerate() {
            validate_tree(tree).with_context(|| format!("Invalid tree {}", i))?;
        }

        Ok(Self {
            model_type: artifact
                .model_type
                .unwrap_or_else(|| DEFAULT_MODEL_TYPE.to_string()),
            trees: artifact.trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn leaf_distribution(tree: &Tree, x: &[f64; NUM_FEATURES]) -> [f64; NUM_CLASSES] {
        let mut idx = 0;
        loop {
            match &tree.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => {
                    let total: f64 = value.iter().sum();
                    let mut dist = [0.0; NUM_CLASSES];
                    for (d, v) in dist.iter_mut().zip(value) {
                        *d = v / total;
                    }
                    return dist;
                }
            }
        }
    }

    fn average_distribution(&self, x: &[f64; NUM_FEATURES]) -> [f64; NUM_CLASSES] {
        let n = self.trees.len() as f64;
        let mut avg = [0.0; NUM_CLASSES];
        for tree in &self.trees {
            for (a, p) in avg.iter_mut().zip(Self::leaf_distribution(tree, x)) {
                *a += p / n;
            }
        }
        avg
    }
}

/// Children must point forward, which rules out cycles and guarantees every
/// walk reaches a leaf.
fn validate_tree(tree: &Tree) -> Result<()> {
    if tree.nodes.is_empty() {
        bail!("tree has no nodes");
    }
    let len = tree.nodes.len();
    for (i, node) in tree.nodes.iter().enumerate() {
        match node {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= NUM_FEATURES {
                    bail!("node {} splits on feature {} (max {})", i, feature, NUM_FEATURES - 1);
                }
                if threshold.is_nan() {
                    bail!("node {} has a NaN threshold", i);
                }
                for child in [*left, *right] {
                    if child <= i || child >= len {
                        bail!("node {} has invalid child index {}", i, child);
                    }
                }
            }
            Node::Leaf { value } => {
                if value.len() != NUM_CLASSES {
                    bail!("leaf {} has {} class weights, expected {}", i, value.len(), NUM_CLASSES);
                }
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    bail!("leaf {} has a negative or non-finite weight", i);
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    bail!("leaf {} has no weight", i);
                }
            }
        }
    }
    Ok(())
}

impl Classifier for TreeEnsemble {
    fn predict(&self, features: &[f64; NUM_FEATURES]) -> Result<usize> {
        let dist = self.average_distribution(features);
        let mut best = 0;
        for (i, p) in dist.iter().enumerate().skip(1) {
            if *p > dist[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn predict_proba(&self, features: &[f64; NUM_FEATURES]) -> Result<Vec<f64>> {
        Ok(self.average_distribution(features).to_vec())
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUMP: &str = r#"{
        "trees": [
            {"nodes": [
                {"feature": 2, "threshold": 0.0, "left": 1, "right": 2},
                {"value": [3.0, 1.0, 0.0]},
                {"value": [0.0, 1.0, 1.0]}
            ]}
        ]
    }"#;

    #[test]
    fn test_single_tree_routes_on_threshold() {
        let model = TreeEnsemble::from_json(STUMP.as_bytes()).unwrap();
        assert_eq!(model.model_type(), DEFAULT_MODEL_TYPE);

        let left = model.predict_proba(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(left, vec![0.75, 0.25, 0.0]);
        assert_eq!(model.predict(&[0.0, 0.0, 0.0, 0.0]).unwrap(), 0);

        let right = model.predict_proba(&[0.0, 0.0, 0.1, 0.0]).unwrap();
        assert_eq!(right, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_ties_go_to_lowest_class() {
        let model = TreeEnsemble::from_json(STUMP.as_bytes()).unwrap();
        assert_eq!(model.predict(&[0.0, 0.0, 1.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn test_ensemble_averages_trees() {
        let json = r#"{
            "model_type": "RandomForestClassifier",
            "trees": [
                {"nodes": [{"value": [1.0, 0.0, 0.0]}]},
                {"nodes": [{"value": [0.0, 0.0, 2.0]}]},
                {"nodes": [{"value": [0.0, 0.0, 4.0]}]}
            ]
        }"#;
        let model = TreeEnsemble::from_json(json.as_bytes()).unwrap();
        assert_eq!(model.n_trees(), 3);
        assert_eq!(model.model_type(), "RandomForestClassifier");

        let proba = model.predict_proba(&[0.0; 4]).unwrap();
        assert!((proba[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((proba[2] - 2.0 / 3.0).abs() < 1e-12);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[0.0; 4]).unwrap(), 2);
    }

    #[test]
    fn test_rejects_backward_child() {
        let json = r#"{"trees": [{"nodes": [
            {"feature": 0, "threshold": 1.0, "left": 0, "right": 1},
            {"value": [1.0, 0.0, 0.0]}
        ]}]}"#;
        assert!(TreeEnsemble::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let json = r#"{"trees": [{"nodes": [
            {"feature": 4, "threshold": 1.0, "left": 1, "right": 2},
            {"value": [1.0, 0.0, 0.0]},
            {"value": [0.0, 1.0, 0.0]}
        ]}]}"#;
        assert!(TreeEnsemble::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_bad_leaves() {
        let wrong_len = r#"{"trees": [{"nodes": [{"value": [1.0, 0.0]}]}]}"#;
        assert!(TreeEnsemble::from_json(wrong_len.as_bytes()).is_err());

        let empty_weight = r#"{"trees": [{"nodes": [{"value": [0.0, 0.0, 0.0]}]}]}"#;
        assert!(TreeEnsemble::from_json(empty_weight.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_mismatched_classes() {
        let json = r#"{"classes": ["a", "b", "c"], "trees": [{"nodes": [{"value": [1.0, 0.0, 0.0]}]}]}"#;
        assert!(TreeEnsemble::from_json(json.as_bytes()).is_err());

        let empty = r#"{"trees": []}"#;
        assert!(TreeEnsemble::from_json(empty.as_bytes()).is_err());
    }

    #[test]
    fn test_bundled_model_loads() {
        let bytes = include_bytes!("../../../../models/best_model.json");
        let model = TreeEnsemble::from_json(bytes).unwrap();
        assert_eq!(model.n_trees(), 3);
        assert_eq!(model.model_type(), "RandomForestClassifier");
    }
}
