#![deny(unsafe_code)]

use postop_model::ComplicationKey;
use serde::{Deserialize, Serialize};

/// Expected `manifest.schema` value.
pub const MANIFEST_SCHEMA: &str = "postop-risk.model-manifest";
/// Supported `manifest.schema_version`.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest: ManifestHeader,
    #[serde(default)]
    pub notes: Option<ManifestNotes>,
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub schema: String,
    pub schema_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestNotes {
    pub summary: Option<String>,
}

/// One trained model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub complication: ComplicationKey,
    /// Path relative to the models directory.
    pub path: String,
    pub sha256: String,
    #[serde(default)]
    pub notes: Option<String>,
}
