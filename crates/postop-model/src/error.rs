use thiserror::Error;

use crate::complication::ComplicationKey;

/// Failure raised by a classifier while scoring one feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("feature {index} is '{found}', model expects '{expected}'")]
    FeatureName {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("model produced an invalid probability: {0}")]
    InvalidProbability(f64),
    #[error("{0}")]
    Message(String),
}

/// Errors surfaced by a scoring request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// A raw value is outside its variable's domain. Recoverable at the form.
    #[error("invalid input for {variable}: {reason}")]
    InvalidInput { variable: String, reason: String },

    /// Normalized columns do not match what the model was trained on.
    #[error(
        "feature encoding mismatch for {key}: model expects [{}], normalizer produced [{}]",
        .expected.join(", "),
        .found.join(", ")
    )]
    EncodingMismatch {
        key: ComplicationKey,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The classifier failed while scoring.
    #[error("model invocation failed for {key}: {source}")]
    ModelInvocation {
        key: ComplicationKey,
        #[source]
        source: ClassifierError,
    },

    /// The model artifact could not be loaded.
    #[error("failed to load model for {key}: {message}")]
    ModelLoad {
        key: ComplicationKey,
        message: String,
    },
}

impl RiskError {
    pub fn invalid_input(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            variable: variable.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the user can fix by correcting the form.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RiskError::InvalidInput { .. })
    }

    /// Complication key involved, when the error is tied to one model.
    pub fn key(&self) -> Option<ComplicationKey> {
        match self {
            RiskError::InvalidInput { .. } => None,
            RiskError::EncodingMismatch { key, .. }
            | RiskError::ModelInvocation { key, .. }
            | RiskError::ModelLoad { key, .. } => Some(*key),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
