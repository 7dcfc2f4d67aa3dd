//! Core data models for the inference service

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Number of input features expected by every model
pub const NUM_FEATURES: usize = 4;

/// Number of output classes
pub const NUM_CLASSES: usize = 3;

/// Feature names, in the order the model consumes them
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

/// Class names, indexed by class id
pub const TARGET_NAMES: [&str; NUM_CLASSES] = ["setosa", "versicolor", "virginica"];

/// Output class of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Setosa,
    Versicolor,
    Virginica,
}

impl ClassLabel {
    /// All labels in class-id order
    pub const ALL: [ClassLabel; NUM_CLASSES] =
        [ClassLabel::Setosa, ClassLabel::Versicolor, ClassLabel::Virginica];

    pub fn from_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    pub fn id(&self) -> usize {
        match self {
            ClassLabel::Setosa => 0,
            ClassLabel::Versicolor => 1,
            ClassLabel::Virginica => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        TARGET_NAMES[self.id()]
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; NUM_FEATURES]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; NUM_FEATURES] {
        &self.0
    }

    /// Feature values keyed by feature name, in model order
    pub fn named(&self) -> NamedValues {
        NamedValues(FEATURE_NAMES.iter().copied().zip(self.0).collect())
    }
}

/// Ordered name/value pairs serialized as a JSON object.
///
/// Keys keep their insertion order on the wire, which a plain map would not.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValues(pub Vec<(&'static str, f64)>);

impl NamedValues {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    label: ClassLabel,
    confidence: f64,
    probabilities: [f64; NUM_CLASSES],
}

impl PredictionResult {
    pub(crate) fn new(label: ClassLabel, probabilities: [f64; NUM_CLASSES]) -> Self {
        Self {
            label,
            confidence: probabilities[label.id()],
            probabilities,
        }
    }

    pub fn label(&self) -> ClassLabel {
        self.label
    }

    pub fn class_id(&self) -> usize {
        self.label.id()
    }

    pub fn class_name(&self) -> &'static str {
        self.label.name()
    }

    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn probabilities(&self) -> &[f64; NUM_CLASSES] {
        &self.probabilities
    }

    /// Probabilities keyed by class name, in class-id order
    pub fn named_probabilities(&self) -> NamedValues {
        NamedValues(TARGET_NAMES.iter().copied().zip(self.probabilities).collect())
    }
}

/// Where the active model came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    ModelRegistry { name: String, version: String },
    ExperimentRun { run_id: String, accuracy: f64 },
    LocalFile { file: String },
}

impl Provenance {
    /// Short version label used for metrics and logs
    pub fn version_label(&self) -> String {
        match self {
            Provenance::ModelRegistry { version, .. } => version.clone(),
            Provenance::ExperimentRun { run_id, .. } => run_id.chars().take(8).collect(),
            Provenance::LocalFile { .. } => "local".to_string(),
        }
    }
}
