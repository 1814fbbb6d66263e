//! Complication outcomes predicted by the trained models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome class a single trained classifier predicts.
///
/// The string forms are the names the models were trained and stored under,
/// so they are kept verbatim (including the odd `any_comp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplicationKey {
    /// Medical complication (e.g. pneumonia, renal failure, DVT).
    #[serde(rename = "medicalComp")]
    Medical,
    /// Surgical complication (e.g. wound dehiscence, surgical site infection).
    #[serde(rename = "surgicalComp")]
    Surgical,
    /// Any complication.
    #[serde(rename = "any_comp")]
    Any,
    /// Serious complication.
    #[serde(rename = "seriousComp")]
    Serious,
}

impl ComplicationKey {
    /// All keys, in the order the selection list presents them.
    pub const ALL: [ComplicationKey; 4] = [
        ComplicationKey::Medical,
        ComplicationKey::Surgical,
        ComplicationKey::Any,
        ComplicationKey::Serious,
    ];

    /// Returns the stored model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplicationKey::Medical => "medicalComp",
            ComplicationKey::Surgical => "surgicalComp",
            ComplicationKey::Any => "any_comp",
            ComplicationKey::Serious => "seriousComp",
        }
    }

    /// Returns a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ComplicationKey::Medical => "Medical complication",
            ComplicationKey::Surgical => "Surgical complication",
            ComplicationKey::Any => "Any complication",
            ComplicationKey::Serious => "Serious complication",
        }
    }
}

impl fmt::Display for ComplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplicationKey {
    type Err = String;

    /// Parse a stored model name (case-insensitive, `_` optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "medicalcomp" | "medical" => Ok(ComplicationKey::Medical),
            "surgicalcomp" | "surgical" => Ok(ComplicationKey::Surgical),
            "anycomp" | "any" => Ok(ComplicationKey::Any),
            "seriouscomp" | "serious" => Ok(ComplicationKey::Serious),
            _ => Err(format!("Unknown complication type: {s}")),
        }
    }
}
