//! Clinical input variables as presented to the input form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a raw clinical entry becomes a model code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableKind {
    /// Two-option choice coded 0/1.
    BinaryCategorical,
    /// Choice with more than two options or an ordered grouping.
    OrdinalCategorical,
    /// Continuous lab value bucketed into normal/low/high.
    ContinuousToOrdinal,
    /// Continuous lab value flagged normal/abnormal.
    ContinuousToBinary,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::BinaryCategorical => "binary-categorical",
            VariableKind::OrdinalCategorical => "ordinal-categorical",
            VariableKind::ContinuousToOrdinal => "continuous-to-ordinal",
            VariableKind::ContinuousToBinary => "continuous-to-binary",
        }
    }

    /// True when the form should collect a number.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            VariableKind::ContinuousToOrdinal | VariableKind::ContinuousToBinary
        )
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalVariable {
    /// Canonical key (e.g. `Albumin`).
    pub name: String,
    pub kind: VariableKind,
    /// Presentation-only label.
    pub label: String,
}

impl ClinicalVariable {
    /// Create a variable using the standard display label for `name`.
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        let name = name.into();
        let label = display_label(&name).to_string();
        Self { name, kind, label }
    }
}

/// Friendly label for a canonical variable name.
///
/// Unknown names are shown as-is.
pub fn display_label(name: &str) -> &str {
    match name {
        "DM" => "Diabetes",
        "HTN" => "Hypertension",
        "COPD" => "COPD",
        "FHS" => "Functional Health Status",
        "smokingStatus" => "Smoking Status",
        "preopTransfusion" => "Transfusion",
        "bleedingDisorder" => "Bleeding Disorder",
        "Albumin" => "Albumin (g/dL)",
        "HCT" => "Hematocrit (%)",
        "BUN" => "BUN (mg/dL)",
        "ASA" => "ASA Class",
        other => other,
    }
}
