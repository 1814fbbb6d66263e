//! Classifier seam and the model variants built on it.
//!
//! A trained model is an opaque capability: given a feature vector it returns
//! a class label and, when the model supports it, a positive-class
//! probability. Artifact formats implement [`Classifier`]; tests substitute
//! stubs.

use std::fmt;
use std::sync::Arc;

use crate::complication::ComplicationKey;
use crate::encoding::EncodingScheme;
use crate::error::{ClassifierError, RiskError};
use crate::feature::FeatureVector;

/// A trained binary classifier.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Feature names in the order the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Predicted class: `true` when a complication is predicted.
    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError>;

    /// Positive-class probability, or `None` when the model only labels.
    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<f64>, ClassifierError> {
        let _ = features;
        Ok(None)
    }
}

/// A classifier bound to one complication and its encoding scheme.
#[derive(Debug, Clone)]
pub struct ModelVariant {
    pub key: ComplicationKey,
    pub scheme: EncodingScheme,
    classifier: Arc<dyn Classifier>,
}

impl ModelVariant {
    /// Bind a classifier to a scheme.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::EncodingMismatch`] when the scheme's columns are
    /// not exactly the classifier's feature names.
    pub fn new(
        key: ComplicationKey,
        scheme: EncodingScheme,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, RiskError> {
        let columns = scheme.column_names();
        if columns != classifier.feature_names() {
            return Err(RiskError::EncodingMismatch {
                key,
                expected: classifier.feature_names().to_vec(),
                found: columns,
            });
        }
        Ok(Self {
            key,
            scheme,
            classifier,
        })
    }

    /// Feature names and order the classifier requires.
    pub fn expected_feature_order(&self) -> &[String] {
        self.classifier.feature_names()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{ColumnSpec, Encoding};

    #[derive(Debug)]
    struct Fixed(Vec<String>);

    impl Classifier for Fixed {
        fn feature_names(&self) -> &[String] {
            &self.0
        }

        fn predict(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
            Ok(false)
        }
    }

    fn scheme() -> EncodingScheme {
        EncodingScheme::new(
            "test",
            vec![
                ColumnSpec::new("DM", Encoding::YesNo),
                ColumnSpec::new("FHS", Encoding::FunctionalStatus),
            ],
        )
    }

    #[test]
    fn binds_matching_scheme() {
        let classifier = Arc::new(Fixed(vec!["DM".to_string(), "FHS".to_string()]));
        let variant = ModelVariant::new(ComplicationKey::Any, scheme(), classifier).unwrap();
        assert_eq!(variant.expected_feature_order(), ["DM", "FHS"]);
        assert_eq!(
            variant.classifier().predict_proba(&FeatureVector::new()),
            Ok(None)
        );
    }

    #[test]
    fn rejects_reordered_scheme() {
        let classifier = Arc::new(Fixed(vec!["FHS".to_string(), "DM".to_string()]));
        let err = ModelVariant::new(ComplicationKey::Any, scheme(), classifier).unwrap_err();
        assert!(matches!(err, RiskError::EncodingMismatch { .. }));
        assert!(err.to_string().contains("model expects [FHS, DM]"));
    }
}
