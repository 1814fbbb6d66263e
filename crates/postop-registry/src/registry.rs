#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span};

use postop_model::{ComplicationKey, ModelVariant, RiskError};

use crate::artifact::{ArtifactClassifier, decode_artifact};
use crate::error::RegistryError;
use crate::hash::sha256_hex;
use crate::manifest::{MANIFEST_SCHEMA, MANIFEST_SCHEMA_VERSION, Manifest, ModelEntry};

/// Manifest file name inside a models directory.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Default bound on a single artifact load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// How artifacts are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Upper bound on reading, verifying and decoding one artifact.
    pub timeout: Duration,
    /// Compare artifact bytes against the manifest SHA-256.
    pub verify_checksums: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOAD_TIMEOUT,
            verify_checksums: true,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_verify_checksums(mut self, enable: bool) -> Self {
        self.verify_checksums = enable;
        self
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifiedModel {
    pub complication: ComplicationKey,
    pub path: String,
    pub scheme: String,
    pub feature_count: usize,
    pub probability: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifySummary {
    pub models_dir: PathBuf,
    pub model_count: usize,
    pub models: Vec<VerifiedModel>,
}

type Slot = OnceLock<Result<Arc<ModelVariant>, RiskError>>;

/// Process-wide, read-only cache of model variants.
///
/// Each variant is loaded at most once, on first access, and kept for the
/// lifetime of the registry. Failed loads are cached as well: a corrupt or
/// missing artifact stays unusable for the session while the other variants
/// keep working.
#[derive(Debug)]
pub struct ModelRegistry {
    models_dir: PathBuf,
    entries: Vec<ModelEntry>,
    options: LoadOptions,
    slots: BTreeMap<ComplicationKey, Slot>,
}

impl ModelRegistry {
    /// Read and validate `<models_dir>/manifest.toml`. Artifacts are not
    /// touched until requested.
    pub fn open(models_dir: &Path, options: LoadOptions) -> Result<Self, RegistryError> {
        let manifest = load_manifest(&models_dir.join(MANIFEST_FILE))?;
        validate_manifest(&manifest)?;

        let slots = manifest
            .models
            .iter()
            .map(|entry| (entry.complication, Slot::new()))
            .collect();
        info!(
            models_dir = %models_dir.display(),
            model_count = manifest.models.len(),
            "model manifest loaded"
        );
        Ok(Self {
            models_dir: models_dir.to_path_buf(),
            entries: manifest.models,
            options,
            slots,
        })
    }

    /// Registry pre-populated with already-built variants.
    pub fn from_variants(variants: impl IntoIterator<Item = ModelVariant>) -> Self {
        let mut entries = Vec::new();
        let mut slots = BTreeMap::new();
        for variant in variants {
            let key = variant.key;
            entries.push(ModelEntry {
                complication: key,
                path: String::new(),
                sha256: String::new(),
                notes: Some("in-memory".to_string()),
            });
            slots.insert(key, OnceLock::from(Ok(Arc::new(variant))));
        }
        Self {
            models_dir: PathBuf::new(),
            entries,
            options: LoadOptions::default(),
            slots,
        }
    }

    /// Registered complications, in manifest order.
    pub fn keys(&self) -> Vec<ComplicationKey> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .map(|entry| entry.complication)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    pub fn contains(&self, key: ComplicationKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Fetch a variant, loading it on first access.
    ///
    /// # Errors
    ///
    /// [`RiskError::ModelLoad`] when the key is not registered or the artifact
    /// cannot be read, verified or decoded in time;
    /// [`RiskError::EncodingMismatch`] when the artifact's scheme disagrees
    /// with its classifier.
    pub fn get(&self, key: ComplicationKey) -> Result<Arc<ModelVariant>, RiskError> {
        let slot = self.slots.get(&key).ok_or_else(|| RiskError::ModelLoad {
            key,
            message: "no model registered for this complication".to_string(),
        })?;
        slot.get_or_init(|| self.load_bounded(key)).clone()
    }

    /// Load every registered variant.
    pub fn verify(&self) -> Result<VerifySummary, RiskError> {
        let mut models = Vec::with_capacity(self.entries.len());
        for key in self.keys() {
            let variant = self.get(key)?;
            let path = self
                .entry(key)
                .map(|entry| entry.path.clone())
                .unwrap_or_default();
            let probability = variant
                .classifier()
                .predict_proba(&probe_vector(&variant))
                .map_err(|source| RiskError::ModelInvocation { key, source })?
                .is_some();
            models.push(VerifiedModel {
                complication: key,
                path,
                scheme: variant.scheme.name.clone(),
                feature_count: variant.expected_feature_order().len(),
                probability,
            });
        }
        Ok(VerifySummary {
            models_dir: self.models_dir.clone(),
            model_count: models.len(),
            models,
        })
    }

    fn entry(&self, key: ComplicationKey) -> Option<&ModelEntry> {
        self.entries.iter().find(|entry| entry.complication == key)
    }

    fn load_bounded(&self, key: ComplicationKey) -> Result<Arc<ModelVariant>, RiskError> {
        let entry = self.entry(key).cloned().ok_or_else(|| RiskError::ModelLoad {
            key,
            message: "no model registered for this complication".to_string(),
        })?;
        let span = info_span!("load_model", complication = %key, path = %entry.path);
        let _guard = span.enter();

        let models_dir = self.models_dir.clone();
        let verify = self.options.verify_checksums;
        let timeout = self.options.timeout;
        let start = Instant::now();
        let (sender, receiver) = mpsc::channel();

        thread::Builder::new()
            .name(format!("load-{key}"))
            .spawn(move || {
                // The receiver is gone if the load already timed out.
                let _ = sender.send(load_variant(&models_dir, &entry, verify));
            })
            .map_err(|e| RiskError::ModelLoad {
                key,
                message: format!("failed to start loader: {e}"),
            })?;

        match receiver.recv_timeout(timeout) {
            Ok(Ok(variant)) => {
                info!(
                    scheme = %variant.scheme.name,
                    features = variant.expected_feature_order().len(),
                    duration_ms = start.elapsed().as_millis(),
                    "model loaded"
                );
                Ok(Arc::new(variant))
            }
            Ok(Err(err)) => {
                error!(error = %err, "model load failed");
                Err(err)
            }
            Err(RecvTimeoutError::Timeout) => {
                error!(timeout_ms = timeout.as_millis(), "model load timed out");
                Err(RiskError::ModelLoad {
                    key,
                    message: format!("timed out after {} ms", timeout.as_millis()),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RiskError::ModelLoad {
                key,
                message: "loader exited without a result".to_string(),
            }),
        }
    }
}

/// Read, verify and decode one artifact.
pub fn load_variant(
    models_dir: &Path,
    entry: &ModelEntry,
    verify_checksum: bool,
) -> Result<ModelVariant, RiskError> {
    let key = entry.complication;
    let full_path = models_dir.join(&entry.path);
    let bytes = read_file(&full_path).map_err(|e| e.into_load_error(key))?;

    if verify_checksum {
        verify_bytes(&full_path, &bytes, &entry.sha256).map_err(|e| e.into_load_error(key))?;
        debug!(path = %full_path.display(), "checksum verified");
    }

    let (document, scheme) =
        decode_artifact(&full_path, &bytes).map_err(|e| e.into_load_error(key))?;
    if document.complication != key {
        return Err(RegistryError::artifact(
            &full_path,
            format!(
                "artifact is for {} but manifest lists it under {key}",
                document.complication
            ),
        )
        .into_load_error(key));
    }

    let classifier = ArtifactClassifier::new(document.classifier, document.expose_probability);
    ModelVariant::new(key, scheme, Arc::new(classifier))
}

fn read_file(path: &Path) -> Result<Vec<u8>, RegistryError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RegistryError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            RegistryError::io(path, e)
        }
    })
}

fn verify_bytes(path: &Path, bytes: &[u8], expected: &str) -> Result<(), RegistryError> {
    let actual = sha256_hex(bytes);
    let expected = expected.to_ascii_lowercase();
    if actual != expected {
        return Err(RegistryError::Sha256Mismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn load_manifest(path: &Path) -> Result<Manifest, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| RegistryError::Toml {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validate_manifest(manifest: &Manifest) -> Result<(), RegistryError> {
    if manifest.manifest.schema != MANIFEST_SCHEMA {
        return Err(RegistryError::InvalidManifest {
            message: format!("unsupported schema: {}", manifest.manifest.schema),
        });
    }
    if manifest.manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(RegistryError::InvalidManifest {
            message: format!(
                "unsupported schema_version: {}",
                manifest.manifest.schema_version
            ),
        });
    }
    if manifest.models.is_empty() {
        return Err(RegistryError::InvalidManifest {
            message: "no models listed".to_string(),
        });
    }

    let mut keys = BTreeSet::new();
    for entry in &manifest.models {
        if !keys.insert(entry.complication) {
            return Err(RegistryError::DuplicateModel {
                key: entry.complication,
            });
        }
        validate_sha(&entry.sha256, &entry.path)?;
        validate_path(&entry.path)?;
    }
    Ok(())
}

fn validate_sha(sha: &str, path: &str) -> Result<(), RegistryError> {
    if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RegistryError::InvalidSha256 {
            path: PathBuf::from(path),
            message: "sha256 must be 64 hex characters".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, RegistryError> {
    if path.contains('\\') {
        return Err(RegistryError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(RegistryError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }

    for c in p.components() {
        if matches!(c, Component::ParentDir) {
            return Err(RegistryError::InvalidPath {
                path: PathBuf::from(path),
                message: "manifest path must not leave the models directory".to_string(),
            });
        }
    }

    Ok(p)
}

/// All-zero vector in the variant's feature order.
fn probe_vector(variant: &ModelVariant) -> postop_model::FeatureVector {
    variant
        .expected_feature_order()
        .iter()
        .map(|name| (name.clone(), 0))
        .collect()
}
