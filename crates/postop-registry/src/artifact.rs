//! Model artifact documents.
//!
//! An artifact bundles a trained classifier with the encoding its features
//! were produced by, so the two can never drift apart:
//!
//! ```json
//! {
//!   "format": "postop-risk.artifact",
//!   "format_version": 1,
//!   "complication": "medicalComp",
//!   "expose_probability": true,
//!   "scheme": { "name": "ordinal-v1", "columns": [ ... ] },
//!   "classifier": { "type": "tree_ensemble", "feature_names": [ ... ], ... }
//! }
//! ```
//!
//! A scheme column either names its encoding explicitly or records the label
//! set the training pipeline saw (`"classes": [0, 1]`). Label sets are turned
//! into an explicit encoding here, once, when the artifact is registered.

#![deny(unsafe_code)]

use std::path::Path;

use serde::{Deserialize, Serialize};

use postop_model::{
    Classifier, ClassifierError, ColumnSpec, ComplicationKey, Encoding, EncodingScheme,
    FeatureVector, RawValue,
};

use crate::error::RegistryError;

/// Expected `format` value.
pub const ARTIFACT_FORMAT: &str = "postop-risk.artifact";
/// Supported `format_version`.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

fn default_threshold() -> f64 {
    0.5
}

fn default_learning_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDocument {
    pub format: String,
    pub format_version: u32,
    pub complication: ComplicationKey,
    /// When false the model only answers `predict`.
    #[serde(default = "default_true")]
    pub expose_probability: bool,
    pub scheme: ArtifactScheme,
    pub classifier: ClassifierSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactScheme {
    pub name: String,
    pub columns: Vec<ArtifactColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactColumn {
    pub column: String,
    /// Defaults to `column`.
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub encoding: Option<Encoding>,
    /// Stored label set, used when `encoding` is absent.
    #[serde(default)]
    pub classes: Option<Vec<RawValue>>,
    #[serde(default)]
    pub default: Option<RawValue>,
}

impl ArtifactScheme {
    /// Resolve every column to an explicit encoding.
    pub fn resolve(&self, path: &Path) -> Result<EncodingScheme, RegistryError> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let encoding = match (&column.encoding, &column.classes) {
                (Some(encoding), _) => encoding.clone(),
                (None, Some(classes)) if !classes.is_empty() => {
                    Encoding::from_label_set(classes.iter().map(RawValue::as_text))
                }
                _ => {
                    return Err(RegistryError::artifact(
                        path,
                        format!("column '{}' has neither an encoding nor classes", column.column),
                    ));
                }
            };
            let variable = column.variable.clone().unwrap_or_else(|| column.column.clone());
            let mut spec = ColumnSpec::new(variable, encoding).with_column(column.column.clone());
            spec.default = column.default.clone();
            columns.push(spec);
        }
        Ok(EncodingScheme::new(self.name.clone(), columns))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    TreeEnsemble(TreeEnsemble),
    Logistic(Logistic),
}

/// Gradient-boosted binary trees with a logistic link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    /// Node 0 is the root.
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Logistic regression over the integer codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logistic {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl ClassifierSpec {
    pub fn feature_names(&self) -> &[String] {
        match self {
            ClassifierSpec::TreeEnsemble(model) => &model.feature_names,
            ClassifierSpec::Logistic(model) => &model.feature_names,
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            ClassifierSpec::TreeEnsemble(model) => model.threshold,
            ClassifierSpec::Logistic(model) => model.threshold,
        }
    }

    /// Structural checks that would otherwise surface mid-inference.
    pub fn validate(&self, path: &Path) -> Result<(), RegistryError> {
        let threshold = self.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RegistryError::artifact(
                path,
                format!("threshold {threshold} is outside [0, 1]"),
            ));
        }
        match self {
            ClassifierSpec::Logistic(model) => {
                if model.coefficients.len() != model.feature_names.len() {
                    return Err(RegistryError::artifact(
                        path,
                        format!(
                            "{} coefficients for {} features",
                            model.coefficients.len(),
                            model.feature_names.len()
                        ),
                    ));
                }
            }
            ClassifierSpec::TreeEnsemble(model) => {
                let n_features = model.feature_names.len();
                for (index, tree) in model.trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|message| {
                            RegistryError::artifact(path, format!("tree {index}: {message}"))
                        })?;
                }
            }
        }
        Ok(())
    }

    /// Positive-class probability.
    fn probability(&self, codes: &[f64]) -> Result<f64, ClassifierError> {
        let margin = match self {
            ClassifierSpec::TreeEnsemble(model) => {
                let mut sum = 0.0;
                for tree in &model.trees {
                    sum += tree.leaf_value(codes)?;
                }
                model.base_score + model.learning_rate * sum
            }
            ClassifierSpec::Logistic(model) => {
                model.intercept
                    + model
                        .coefficients
                        .iter()
                        .zip(codes)
                        .map(|(coefficient, x)| coefficient * x)
                        .sum::<f64>()
            }
        };
        Ok(sigmoid(margin))
    }
}

impl Tree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {index} splits on unknown feature {feature}"));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err(format!("node {index} points outside the tree"));
                }
                if *left <= index || *right <= index {
                    return Err(format!("node {index} points backwards"));
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, codes: &[f64]) -> Result<f64, ClassifierError> {
        let mut index = 0;
        // Children always point forward, so this terminates within len steps.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = codes.get(*feature).ok_or(ClassifierError::ShapeMismatch {
                        expected: feature + 1,
                        found: codes.len(),
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(ClassifierError::Message(format!(
            "tree traversal left the tree at node {index}"
        )))
    }
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Classifier backed by a decoded artifact.
#[derive(Debug, Clone)]
pub struct ArtifactClassifier {
    spec: ClassifierSpec,
    expose_probability: bool,
}

impl ArtifactClassifier {
    pub fn new(spec: ClassifierSpec, expose_probability: bool) -> Self {
        Self {
            spec,
            expose_probability,
        }
    }

    fn codes(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        let expected = self.spec.feature_names();
        if features.len() != expected.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: expected.len(),
                found: features.len(),
            });
        }
        let mut codes = Vec::with_capacity(features.len());
        for (index, ((name, code), want)) in features.iter().zip(expected).enumerate() {
            if name != want.as_str() {
                return Err(ClassifierError::FeatureName {
                    index,
                    expected: want.clone(),
                    found: name.to_string(),
                });
            }
            // Codes are small integers; the cast is exact.
            codes.push(code as f64);
        }
        Ok(codes)
    }
}

impl Classifier for ArtifactClassifier {
    fn feature_names(&self) -> &[String] {
        self.spec.feature_names()
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        let codes = self.codes(features)?;
        let probability = self.spec.probability(&codes)?;
        Ok(probability > self.spec.threshold())
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<f64>, ClassifierError> {
        if !self.expose_probability {
            return Ok(None);
        }
        let codes = self.codes(features)?;
        self.spec.probability(&codes).map(Some)
    }
}

/// Parse and structurally validate an artifact.
pub fn decode_artifact(
    path: &Path,
    bytes: &[u8],
) -> Result<(ArtifactDocument, EncodingScheme), RegistryError> {
    let document: ArtifactDocument =
        serde_json::from_slice(bytes).map_err(|source| RegistryError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if document.format != ARTIFACT_FORMAT {
        return Err(RegistryError::artifact(
            path,
            format!("unsupported format: {}", document.format),
        ));
    }
    if document.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(RegistryError::artifact(
            path,
            format!("unsupported format_version: {}", document.format_version),
        ));
    }
    document.classifier.validate(path)?;
    let scheme = document.scheme.resolve(path)?;
    Ok((document, scheme))
}
