//! Batch invocation of model variants.
//!
//! A batch either produces a result for every requested complication or
//! fails as a whole. A report missing one complication without saying so
//! would read as "no risk" for that outcome.

use tracing::debug;

use postop_model::{
    ClassifierError, FeatureVector, ModelVariant, PredictionReport, PredictionResult, Result,
    RiskError,
};

/// Per-request scoring switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringOptions {
    /// Ask every model for its thresholded label as well as the probability.
    pub want_labels: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self { want_labels: true }
    }
}

/// One variant paired with the vector produced by its scheme.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub variant: &'a ModelVariant,
    pub features: &'a FeatureVector,
}

impl<'a> Invocation<'a> {
    pub fn new(variant: &'a ModelVariant, features: &'a FeatureVector) -> Self {
        Self { variant, features }
    }
}

/// Stateless batch invoker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Orchestrator {
    options: ScoringOptions,
}

impl Orchestrator {
    pub fn new(options: ScoringOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ScoringOptions {
        self.options
    }

    /// Invoke every variant in order.
    ///
    /// # Errors
    ///
    /// The first [`RiskError::ModelInvocation`] encountered; no partial
    /// report is returned.
    pub fn invoke_all(&self, invocations: &[Invocation<'_>]) -> Result<PredictionReport> {
        let mut report = PredictionReport::new();
        for invocation in invocations {
            let result = self.invoke(invocation)?;
            report.insert(invocation.variant.key, result);
        }
        Ok(report)
    }

    fn invoke(&self, invocation: &Invocation<'_>) -> Result<PredictionResult> {
        let key = invocation.variant.key;
        let classifier = invocation.variant.classifier();
        let failed = |source: ClassifierError| RiskError::ModelInvocation { key, source };

        let probability = classifier
            .predict_proba(invocation.features)
            .map_err(failed)?;
        if let Some(p) = probability
            && !(p.is_finite() && (0.0..=1.0).contains(&p))
        {
            return Err(failed(ClassifierError::InvalidProbability(p)));
        }

        // Label-only models are always asked for their label.
        let label = if self.options.want_labels || probability.is_none() {
            Some(classifier.predict(invocation.features).map_err(failed)?)
        } else {
            None
        };

        debug!(
            complication = %key,
            has_probability = probability.is_some(),
            has_label = label.is_some(),
            "model invoked"
        );
        Ok(PredictionResult::new(probability, label))
    }
}
