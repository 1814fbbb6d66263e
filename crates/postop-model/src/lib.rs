//! Data model for postoperative complication risk scoring.
//!
//! - **complication**: outcome keys the trained models predict
//! - **enums**: accepted spellings for categorical inputs (ASA, FHS, yes/no)
//! - **variable**: clinical variables and their display labels
//! - **encoding**: declarative per-model encoding schemes
//! - **raw** / **feature**: form input before and after normalization
//! - **classifier**: the trained-model seam and [`ModelVariant`]
//! - **prediction**: per-complication results

pub mod classifier;
pub mod complication;
pub mod encoding;
pub mod enums;
pub mod error;
pub mod feature;
pub mod prediction;
pub mod raw;
pub mod variable;

pub use classifier::{Classifier, ModelVariant};
pub use complication::ComplicationKey;
pub use encoding::{AsaGrouping, BINARY_V1, ColumnSpec, Encoding, EncodingScheme, ORDINAL_V1};
pub use enums::{AsaClass, FunctionalStatus, YesNo};
pub use error::{ClassifierError, Result, RiskError};
pub use feature::FeatureVector;
pub use prediction::{DisplayValue, PredictionReport, PredictionResult};
pub use raw::{RawInput, RawValue, format_numeric};
pub use variable::{ClinicalVariable, VariableKind, display_label};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offender() {
        let err = RiskError::invalid_input("ASA", "Unknown ASA class: VI");
        assert_eq!(err.to_string(), "invalid input for ASA: Unknown ASA class: VI");
        assert!(err.is_user_error());
        assert_eq!(err.key(), None);

        let err = RiskError::ModelInvocation {
            key: ComplicationKey::Surgical,
            source: ClassifierError::ShapeMismatch {
                expected: 11,
                found: 6,
            },
        };
        assert_eq!(
            err.to_string(),
            "model invocation failed for surgicalComp: expected 11 features, got 6"
        );
        assert_eq!(err.key(), Some(ComplicationKey::Surgical));
        assert!(!err.is_user_error());
    }
}
