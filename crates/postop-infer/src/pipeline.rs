//! Submission scoring with explicit stages.
//!
//! 1. **Resolve**: fetch every requested variant from the registry
//! 2. **Normalize**: encode the raw input once per distinct scheme content
//! 3. **Check**: each variant's vector must carry its expected feature order
//! 4. **Invoke**: run the batch through the [`Orchestrator`]
//!
//! Nothing is invoked unless every earlier stage succeeded for every key.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use postop_model::{
    ComplicationKey, EncodingScheme, FeatureVector, ModelVariant, PredictionReport, RawInput,
    Result, RiskError,
};
use postop_normalize::normalize;
use postop_registry::ModelRegistry;

use crate::orchestrator::{Invocation, Orchestrator, ScoringOptions};

/// Score one submission against the requested complications.
///
/// Repeated keys are scored once, at their first position.
///
/// # Errors
///
/// - [`RiskError::ModelLoad`] if any requested model is unavailable
/// - [`RiskError::InvalidInput`] if the input does not satisfy a scheme
/// - [`RiskError::EncodingMismatch`] if a vector disagrees with its model
/// - [`RiskError::ModelInvocation`] if any model call fails
pub fn score(
    registry: &ModelRegistry,
    keys: &[ComplicationKey],
    raw: &RawInput,
    options: &ScoringOptions,
) -> Result<PredictionReport> {
    let span = info_span!("score", requested = keys.len());
    let _guard = span.enter();
    let start = Instant::now();

    let variants = info_span!("resolve").in_scope(|| resolve(registry, keys))?;
    let vectors = info_span!("normalize").in_scope(|| normalize_per_scheme(&variants, raw))?;

    let mut invocations = Vec::with_capacity(variants.len());
    for variant in &variants {
        let features = vectors
            .iter()
            .find(|(scheme, _)| **scheme == variant.scheme)
            .map(|(_, features)| features)
            .ok_or_else(|| RiskError::EncodingMismatch {
                key: variant.key,
                expected: variant.expected_feature_order().to_vec(),
                found: Vec::new(),
            })?;
        check_order(variant, features)?;
        invocations.push(Invocation::new(variant, features));
    }

    let report = Orchestrator::new(*options).invoke_all(&invocations)?;
    info!(
        models = report.len(),
        schemes = vectors.len(),
        duration_ms = start.elapsed().as_millis(),
        "submission scored"
    );
    Ok(report)
}

fn resolve(
    registry: &ModelRegistry,
    keys: &[ComplicationKey],
) -> Result<Vec<Arc<ModelVariant>>> {
    let mut seen = Vec::with_capacity(keys.len());
    for key in keys {
        if !seen.contains(key) {
            seen.push(*key);
        }
    }
    seen.into_iter().map(|key| registry.get(key)).collect()
}

/// Vectors are shared only between variants whose schemes are equal in full.
/// A name alone does not identify an encoding: two artifacts may reuse one
/// with different rules or columns, and each must get its own vector.
fn normalize_per_scheme<'a>(
    variants: &'a [Arc<ModelVariant>],
    raw: &RawInput,
) -> Result<Vec<(&'a EncodingScheme, FeatureVector)>> {
    let mut vectors: Vec<(&EncodingScheme, FeatureVector)> = Vec::new();
    for variant in variants {
        let scheme = &variant.scheme;
        if vectors.iter().any(|(seen, _)| *seen == scheme) {
            continue;
        }
        if vectors.iter().any(|(seen, _)| seen.name == scheme.name) {
            warn!(
                scheme = %scheme.name,
                complication = %variant.key,
                "scheme name reused with different content; normalizing separately"
            );
        }
        let features = normalize(raw, scheme)?;
        debug!(scheme = %scheme.name, complication = %variant.key, "scheme normalized");
        vectors.push((scheme, features));
    }
    Ok(vectors)
}

fn check_order(variant: &ModelVariant, features: &FeatureVector) -> Result<()> {
    let expected = variant.expected_feature_order();
    if features.matches_order(expected) {
        return Ok(());
    }
    Err(RiskError::EncodingMismatch {
        key: variant.key,
        expected: expected.to_vec(),
        found: features.names().map(str::to_string).collect(),
    })
}
