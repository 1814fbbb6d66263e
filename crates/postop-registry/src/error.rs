#![deny(unsafe_code)]

use std::path::PathBuf;

use postop_model::{ComplicationKey, RiskError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML manifest {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("duplicate complication in manifest: {key}")]
    DuplicateModel { key: ComplicationKey },

    #[error("invalid sha256 for {path}: {message}")]
    InvalidSha256 { path: PathBuf, message: String },

    #[error("invalid manifest path {path}: {message}")]
    InvalidPath { path: PathBuf, message: String },

    #[error("missing file listed in manifest: {path}")]
    MissingFile { path: PathBuf },

    #[error("sha256 mismatch for {path} (expected {expected}, got {actual})")]
    Sha256Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid model artifact {path}: {message}")]
    InvalidArtifact { path: PathBuf, message: String },
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Report this failure as the model load error for `key`.
    pub fn into_load_error(self, key: ComplicationKey) -> RiskError {
        RiskError::ModelLoad {
            key,
            message: self.to_string(),
        }
    }
}
