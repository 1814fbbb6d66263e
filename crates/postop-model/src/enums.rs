//! Type-safe enumerations for categorical clinical inputs.
//!
//! Form controls hand back free text; these enums pin down the accepted
//! spellings so that an unrecognized option is rejected instead of being
//! coerced into a code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ASA physical status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AsaClass {
    /// Normal healthy patient.
    I,
    /// Mild systemic disease.
    II,
    /// Severe systemic disease.
    III,
    /// Severe systemic disease that is a constant threat to life.
    IV,
    /// Moribund patient.
    V,
}

impl AsaClass {
    /// All classes in ascending severity.
    pub const ALL: [AsaClass; 5] = [
        AsaClass::I,
        AsaClass::II,
        AsaClass::III,
        AsaClass::IV,
        AsaClass::V,
    ];

    /// Roman numeral as shown on the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AsaClass::I => "I",
            AsaClass::II => "II",
            AsaClass::III => "III",
            AsaClass::IV => "IV",
            AsaClass::V => "V",
        }
    }

    /// Numeric class (1-5).
    pub fn number(&self) -> u8 {
        match self {
            AsaClass::I => 1,
            AsaClass::II => 2,
            AsaClass::III => 3,
            AsaClass::IV => 4,
            AsaClass::V => 5,
        }
    }

    /// Classes III and above.
    pub fn is_severe(&self) -> bool {
        self.number() >= 3
    }
}

impl fmt::Display for AsaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AsaClass {
    type Err = String;

    /// Accepts roman (`III`), arabic (`3`) and prefixed (`ASA III`) forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let stripped = upper
            .strip_prefix("ASA")
            .map(str::trim_start)
            .unwrap_or(upper.as_str());

        match stripped {
            "I" | "1" => Ok(AsaClass::I),
            "II" | "2" => Ok(AsaClass::II),
            "III" | "3" => Ok(AsaClass::III),
            "IV" | "4" => Ok(AsaClass::IV),
            "V" | "5" => Ok(AsaClass::V),
            _ => Err(format!("Unknown ASA class: {s}")),
        }
    }
}

/// Preoperative functional health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionalStatus {
    Independent,
    Dependent,
}

impl FunctionalStatus {
    pub const ALL: [FunctionalStatus; 2] =
        [FunctionalStatus::Independent, FunctionalStatus::Dependent];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalStatus::Independent => "Independent",
            FunctionalStatus::Dependent => "Dependent",
        }
    }
}

impl fmt::Display for FunctionalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INDEPENDENT" => Ok(FunctionalStatus::Independent),
            "DEPENDENT" => Ok(FunctionalStatus::Dependent),
            _ => Err(format!("Unknown functional status: {s}")),
        }
    }
}

/// A yes/no answer for comorbidity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    /// Option order as presented on the form.
    pub const ALL: [YesNo; 2] = [YesNo::Yes, YesNo::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" | "Y" | "1" | "TRUE" => Ok(YesNo::Yes),
            "NO" | "N" | "0" | "FALSE" => Ok(YesNo::No),
            _ => Err(format!("Expected Yes or No, got: {s}")),
        }
    }
}
