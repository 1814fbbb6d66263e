//! Declarative encoding schemes.
//!
//! Each trained model expects its own feature encoding. Two models may
//! discretize the same lab value differently (a three-level ordinal bucket in
//! one, an abnormal flag in another) and may even name the same concept
//! differently (`DM` versus the one-hot `DM_Yes`). An [`EncodingScheme`] is the
//! complete, explicit description of what one model expects: an ordered list
//! of output columns, each tagged with the rule that produces its code.
//!
//! Schemes are data. They are stored next to the model artifact and fixed when
//! the model is registered, so the normalizer never has to guess.
//!
//! ## Shipped presets
//!
//! | Variable | `ordinal-v1` (3-level) | `binary-v1` (flag) |
//! |---|---|---|
//! | Albumin | 1 in [3.5, 5.49], 2 below, 3 above | 1 below 3.5 |
//! | HCT | 1 in [39, 49], 2 below, 3 above | 1 below 39 |
//! | BUN | 1 in [5, 20], 2 below, 3 above | 1 above 20 |
//! | ASA | I-II = 1, III-V = 2 | III-V = 1, else 0 |
//! | FHS | Independent 0, Dependent 1 | same |
//! | Comorbidities | `DM` Yes 1 / No 0 | `DM_Yes` indicator |

use serde::{Deserialize, Serialize};

use crate::raw::RawValue;
use crate::variable::{ClinicalVariable, VariableKind};

/// Name of the three-level ordinal preset.
pub const ORDINAL_V1: &str = "ordinal-v1";
/// Name of the binary-flag preset.
pub const BINARY_V1: &str = "binary-v1";

const COMORBIDITIES: &[&str] = &[
    "DM",
    "HTN",
    "COPD",
    "smokingStatus",
    "preopTransfusion",
    "bleedingDisorder",
];

/// How ASA classes are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsaGrouping {
    /// I-II -> 1, III-V -> 2.
    Ordinal,
    /// I-II -> 0, III-V -> 1.
    Binary,
}

/// Rule producing the code of one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Encoding {
    /// 1 when `low <= v <= high`, 2 when below, 3 when above.
    OrdinalRange { low: f64, high: f64 },
    /// 1 when strictly below `below` or strictly above `above`, else 0.
    AbnormalFlag {
        #[serde(default)]
        below: Option<f64>,
        #[serde(default)]
        above: Option<f64>,
    },
    Asa { grouping: AsaGrouping },
    /// Independent 0, Dependent 1.
    FunctionalStatus,
    /// Yes 1, No 0.
    YesNo,
    /// One-hot column: 1 when the choice equals `level`. The choice must be
    /// one of `levels`.
    Indicator { level: String, levels: Vec<String> },
    /// Label-encoder lookup: the code is the index of the chosen class.
    Labels { classes: Vec<String> },
}

impl Encoding {
    /// Pick the encoding for a stored label set.
    ///
    /// A label set of exactly `{"0", "1"}` is a yes/no flag. Anything else is
    /// translated by lookup.
    pub fn from_label_set<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: Vec<String> = classes
            .into_iter()
            .map(|class| class.as_ref().trim().to_string())
            .collect();
        let mut sorted: Vec<&str> = classes.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted == ["0", "1"] {
            Encoding::YesNo
        } else {
            Encoding::Labels { classes }
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Encoding::OrdinalRange { .. } => VariableKind::ContinuousToOrdinal,
            Encoding::AbnormalFlag { .. } => VariableKind::ContinuousToBinary,
            Encoding::Asa { .. } => VariableKind::OrdinalCategorical,
            Encoding::FunctionalStatus | Encoding::YesNo | Encoding::Indicator { .. } => {
                VariableKind::BinaryCategorical
            }
            Encoding::Labels { classes } if classes.len() == 2 => VariableKind::BinaryCategorical,
            Encoding::Labels { .. } => VariableKind::OrdinalCategorical,
        }
    }
}

/// One output column of a feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Feature name the model was trained with (e.g. `DM_Yes`).
    pub column: String,
    /// Clinical variable the value is read from (e.g. `DM`).
    pub variable: String,
    pub encoding: Encoding,
    /// Value the form pre-fills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<RawValue>,
}

impl ColumnSpec {
    /// Column named after its variable.
    pub fn new(variable: impl Into<String>, encoding: Encoding) -> Self {
        let variable = variable.into();
        Self {
            column: variable.clone(),
            variable,
            encoding,
            default: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<RawValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn clinical_variable(&self) -> ClinicalVariable {
        ClinicalVariable::new(self.variable.clone(), self.encoding.kind())
    }
}

/// The full set of rules one model expects, in feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingScheme {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl EncodingScheme {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Expected feature order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.column.clone()).collect()
    }

    /// Distinct input variables, in first-appearance order.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for column in &self.columns {
            if !seen.contains(&column.variable.as_str()) {
                seen.push(column.variable.as_str());
            }
        }
        seen
    }

    /// All columns read from `variable`.
    pub fn columns_for<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a ColumnSpec> {
        self.columns.iter().filter(move |c| c.variable == variable)
    }

    /// Look up a shipped preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            ORDINAL_V1 => Some(Self::ordinal_v1()),
            BINARY_V1 => Some(Self::binary_v1()),
            _ => None,
        }
    }

    /// Three-level lab buckets with plain variable names.
    pub fn ordinal_v1() -> Self {
        let mut columns: Vec<ColumnSpec> = COMORBIDITIES
            .iter()
            .map(|name| ColumnSpec::new(*name, Encoding::YesNo))
            .collect();
        columns.insert(3, ColumnSpec::new("FHS", Encoding::FunctionalStatus));
        columns.extend([
            ColumnSpec::new(
                "Albumin",
                Encoding::OrdinalRange {
                    low: 3.5,
                    high: 5.49,
                },
            )
            .with_default(4.0),
            ColumnSpec::new(
                "HCT",
                Encoding::OrdinalRange {
                    low: 39.0,
                    high: 49.0,
                },
            )
            .with_default(40.0),
            ColumnSpec::new(
                "BUN",
                Encoding::OrdinalRange {
                    low: 5.0,
                    high: 20.0,
                },
            )
            .with_default(15.0),
            ColumnSpec::new(
                "ASA",
                Encoding::Asa {
                    grouping: AsaGrouping::Ordinal,
                },
            ),
        ]);
        Self::new(ORDINAL_V1, columns)
    }

    /// Abnormal-flag lab values with one-hot comorbidity columns.
    pub fn binary_v1() -> Self {
        let yes_no = vec!["Yes".to_string(), "No".to_string()];
        let mut columns: Vec<ColumnSpec> = COMORBIDITIES
            .iter()
            .map(|name| {
                ColumnSpec::new(
                    *name,
                    Encoding::Indicator {
                        level: "Yes".to_string(),
                        levels: yes_no.clone(),
                    },
                )
                .with_column(format!("{name}_Yes"))
            })
            .collect();
        columns.insert(3, ColumnSpec::new("FHS", Encoding::FunctionalStatus));
        columns.extend([
            ColumnSpec::new(
                "Albumin",
                Encoding::AbnormalFlag {
                    below: Some(3.5),
                    above: None,
                },
            )
            .with_default(4.0),
            ColumnSpec::new(
                "HCT",
                Encoding::AbnormalFlag {
                    below: Some(39.0),
                    above: None,
                },
            )
            .with_default(40.0),
            ColumnSpec::new(
                "BUN",
                Encoding::AbnormalFlag {
                    below: None,
                    above: Some(20.0),
                },
            )
            .with_default(15.0),
            ColumnSpec::new(
                "ASA",
                Encoding::Asa {
                    grouping: AsaGrouping::Binary,
                },
            ),
        ]);
        Self::new(BINARY_V1, columns)
    }
}
