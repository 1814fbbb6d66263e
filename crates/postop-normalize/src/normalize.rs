//! Raw form input to feature vector.

use tracing::debug;

use postop_model::{
    AsaClass, ColumnSpec, Encoding, EncodingScheme, FeatureVector, FunctionalStatus, RawInput,
    RawValue, Result, RiskError, YesNo,
};

use crate::rules::{
    abnormal_flag, asa_code, functional_status_code, ordinal_range, yes_no_code,
};

/// Encode every column of `scheme` from `input`.
///
/// The output follows the scheme's column order. Inputs not named by the
/// scheme are ignored.
///
/// # Errors
///
/// Returns [`RiskError::InvalidInput`] naming the first variable that is
/// missing or outside its domain.
pub fn normalize(input: &RawInput, scheme: &EncodingScheme) -> Result<FeatureVector> {
    let mut vector = FeatureVector::with_capacity(scheme.columns.len());
    for column in &scheme.columns {
        let code = encode_column(input, column)?;
        vector.push(column.column.clone(), code);
    }
    debug!(
        scheme = %scheme.name,
        columns = vector.len(),
        "normalized submission"
    );
    Ok(vector)
}

/// Encode a single column.
pub fn encode_column(input: &RawInput, column: &ColumnSpec) -> Result<i64> {
    let raw = input
        .get(&column.variable)
        .ok_or_else(|| RiskError::invalid_input(&column.variable, "no value provided"))?;
    encode_value(&column.variable, raw, &column.encoding)
}

/// Encode one raw value with `encoding`; `variable` is used for error reporting.
pub fn encode_value(variable: &str, raw: &RawValue, encoding: &Encoding) -> Result<i64> {
    match encoding {
        Encoding::OrdinalRange { low, high } => {
            let value = lab_value(variable, raw)?;
            Ok(ordinal_range(value, *low, *high))
        }
        Encoding::AbnormalFlag { below, above } => {
            let value = lab_value(variable, raw)?;
            Ok(abnormal_flag(value, *below, *above))
        }
        Encoding::Asa { grouping } => {
            let class: AsaClass = parse_choice(variable, raw)?;
            Ok(asa_code(class, *grouping))
        }
        Encoding::FunctionalStatus => {
            let status: FunctionalStatus = parse_choice(variable, raw)?;
            Ok(functional_status_code(status))
        }
        Encoding::YesNo => {
            let answer: YesNo = parse_choice(variable, raw)?;
            Ok(yes_no_code(answer))
        }
        Encoding::Indicator { level, levels } => {
            let chosen = if is_yes_no(levels) {
                let answer: YesNo = parse_choice(variable, raw)?;
                answer.as_str().to_string()
            } else {
                let index = lookup_choice(variable, raw, levels)?;
                levels[index].clone()
            };
            Ok(i64::from(chosen.eq_ignore_ascii_case(level)))
        }
        Encoding::Labels { classes } => {
            let index = lookup_choice(variable, raw, classes)?;
            i64::try_from(index)
                .map_err(|_| RiskError::invalid_input(variable, "label index out of range"))
        }
    }
}

/// Inverse lookup from a code back to the label a user would pick.
///
/// Only categorical encodings with an unambiguous inverse are supported.
pub fn decode(encoding: &Encoding, code: i64) -> Option<String> {
    match encoding {
        Encoding::YesNo => match code {
            1 => Some(YesNo::Yes.to_string()),
            0 => Some(YesNo::No.to_string()),
            _ => None,
        },
        Encoding::FunctionalStatus => match code {
            0 => Some(FunctionalStatus::Independent.to_string()),
            1 => Some(FunctionalStatus::Dependent.to_string()),
            _ => None,
        },
        Encoding::Labels { classes } => usize::try_from(code)
            .ok()
            .and_then(|index| classes.get(index))
            .cloned(),
        Encoding::Indicator { level, levels } => match code {
            1 => Some(level.clone()),
            0 if levels.len() == 2 => levels
                .iter()
                .find(|candidate| !candidate.eq_ignore_ascii_case(level))
                .cloned(),
            _ => None,
        },
        Encoding::OrdinalRange { .. } | Encoding::AbnormalFlag { .. } | Encoding::Asa { .. } => {
            None
        }
    }
}

fn lab_value(variable: &str, raw: &RawValue) -> Result<f64> {
    let value = raw.as_f64().ok_or_else(|| {
        RiskError::invalid_input(variable, format!("expected a number, got '{raw}'"))
    })?;
    if !value.is_finite() {
        return Err(RiskError::invalid_input(variable, "value must be finite"));
    }
    if value < 0.0 {
        return Err(RiskError::invalid_input(
            variable,
            format!("value must not be negative, got {raw}"),
        ));
    }
    Ok(value)
}

fn parse_choice<T>(variable: &str, raw: &RawValue) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.as_text()
        .parse::<T>()
        .map_err(|reason| RiskError::invalid_input(variable, reason))
}

/// Yes/No level sets accept every spelling [`YesNo`] does, so one-hot and
/// ordinal models agree on what a comorbidity answer may look like.
fn is_yes_no(levels: &[String]) -> bool {
    levels.len() == 2
        && YesNo::ALL
            .iter()
            .all(|answer| levels.iter().any(|l| l.trim().eq_ignore_ascii_case(answer.as_str())))
}

fn lookup_choice(variable: &str, raw: &RawValue, options: &[String]) -> Result<usize> {
    let text = raw.as_text();
    options
        .iter()
        .position(|option| option.trim().eq_ignore_ascii_case(&text))
        .ok_or_else(|| {
            RiskError::invalid_input(
                variable,
                format!(
                    "unrecognized option '{text}', expected one of: {}",
                    options.join(", ")
                ),
            )
        })
}
