//! Input-form description derived from an encoding scheme.
//!
//! The form layer renders one control per clinical variable and hands back
//! raw values. Columns that share a variable (one-hot expansions) collapse
//! into a single field.

use serde::Serialize;

use postop_model::{
    AsaClass, ClinicalVariable, ColumnSpec, Encoding, EncodingScheme, FunctionalStatus, RawInput,
    RawValue, YesNo,
};

/// Increment for numeric lab controls.
pub const LAB_STEP: f64 = 0.1;

/// Widget kind and its options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    Number { default: f64, step: f64 },
    Choice { options: Vec<String>, default: String },
}

impl Control {
    /// Pre-filled value.
    pub fn default_value(&self) -> RawValue {
        match self {
            Control::Number { default, .. } => RawValue::Number(*default),
            Control::Choice { default, .. } => RawValue::Text(default.clone()),
        }
    }
}

/// One input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    #[serde(flatten)]
    pub variable: ClinicalVariable,
    #[serde(flatten)]
    pub control: Control,
}

/// Fields for every variable `scheme` reads, in first-appearance order.
pub fn form_fields(scheme: &EncodingScheme) -> Vec<FormField> {
    scheme
        .variables()
        .into_iter()
        .filter_map(|variable| {
            let mut columns = scheme.columns_for(variable);
            let first = columns.next()?;
            let control = control_for(first, columns);
            Some(FormField {
                variable: first.clinical_variable(),
                control,
            })
        })
        .collect()
}

/// Fill fields missing from `input` with their defaults.
///
/// Returns the names that were filled. Never called implicitly by the
/// normalizer.
pub fn apply_defaults(input: &mut RawInput, fields: &[FormField]) -> Vec<String> {
    let mut filled = Vec::new();
    for field in fields {
        if !input.contains(&field.variable.name) {
            input.insert(field.variable.name.clone(), field.control.default_value());
            filled.push(field.variable.name.clone());
        }
    }
    filled
}

fn control_for<'a>(first: &'a ColumnSpec, rest: impl Iterator<Item = &'a ColumnSpec>) -> Control {
    match &first.encoding {
        Encoding::OrdinalRange { low, .. } => number(first, *low),
        Encoding::AbnormalFlag { below, above } => {
            number(first, below.or(*above).unwrap_or_default())
        }
        Encoding::Asa { .. } => choice(first, AsaClass::ALL.iter().map(ToString::to_string)),
        Encoding::FunctionalStatus => {
            choice(first, FunctionalStatus::ALL.iter().map(ToString::to_string))
        }
        Encoding::YesNo => choice(first, YesNo::ALL.iter().map(ToString::to_string)),
        Encoding::Indicator { levels, .. } => {
            let mut options = levels.clone();
            for column in rest {
                if let Encoding::Indicator { levels, .. } = &column.encoding {
                    for level in levels {
                        if !options.iter().any(|o| o.eq_ignore_ascii_case(level)) {
                            options.push(level.clone());
                        }
                    }
                }
            }
            choice(first, options)
        }
        Encoding::Labels { classes } => choice(first, classes.iter().cloned()),
    }
}

/// Numeric control; without an explicit default the value sits on the normal
/// side of the rule's boundary.
fn number(column: &ColumnSpec, normal: f64) -> Control {
    let default = column
        .default
        .as_ref()
        .and_then(RawValue::as_f64)
        .unwrap_or(normal);
    Control::Number {
        default,
        step: LAB_STEP,
    }
}

fn choice(column: &ColumnSpec, options: impl IntoIterator<Item = String>) -> Control {
    let options: Vec<String> = options.into_iter().collect();
    let default = column
        .default
        .as_ref()
        .map(RawValue::as_text)
        .and_then(|wanted| {
            options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(&wanted))
                .cloned()
        })
        .or_else(|| options.first().cloned())
        .unwrap_or_default();
    Control::Choice { options, default }
}
