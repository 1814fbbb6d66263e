#![deny(unsafe_code)]

//! Model manifest verification and the lazily loaded model registry.

pub mod artifact;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod registry;

pub use crate::artifact::{ArtifactClassifier, ArtifactDocument, ClassifierSpec, decode_artifact};
pub use crate::error::RegistryError;
pub use crate::manifest::{Manifest, ModelEntry};
pub use crate::registry::{
    DEFAULT_LOAD_TIMEOUT, LoadOptions, MANIFEST_FILE, ModelRegistry, VerifiedModel, VerifySummary,
    load_variant,
};
