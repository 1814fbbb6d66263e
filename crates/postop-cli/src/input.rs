//! Raw input collection from the command line and JSON files.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::trace;

use postop_model::{RawInput, RawValue};

use crate::logging::redact_value;

/// Parse one `--set NAME=VALUE` argument.
///
/// Values that parse as numbers become [`RawValue::Number`]; categorical
/// normalization accepts both forms, so `ASA=3` and `ASA=III` are equivalent.
pub fn parse_assignment(arg: &str) -> Result<(String, RawValue), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{arg}'"));
    }
    let value = value.trim();
    let raw = match value.parse::<f64>() {
        Ok(number) if number.is_finite() => RawValue::Number(number),
        _ => RawValue::text(value),
    };
    Ok((name.to_string(), raw))
}

/// Read a JSON object of raw values.
pub fn load_input_file(path: &Path) -> Result<RawInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read input file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parse input file {} as a JSON object", path.display()))
}

/// Combine an optional input file with `--set` overrides.
pub fn collect_input(file: Option<&Path>, assignments: &[(String, RawValue)]) -> Result<RawInput> {
    let mut input = match file {
        Some(path) => load_input_file(path)?,
        None => RawInput::new(),
    };
    for (name, value) in assignments {
        input.insert(name.clone(), value.clone());
    }
    for (name, value) in input.iter() {
        trace!(variable = name, value = redact_value(&value.as_text()), "raw input");
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_text_are_distinguished() {
        assert_eq!(
            parse_assignment("Albumin=3.2"),
            Ok(("Albumin".to_string(), RawValue::Number(3.2)))
        );
        assert_eq!(
            parse_assignment(" ASA = III "),
            Ok(("ASA".to_string(), RawValue::text("III")))
        );
        assert_eq!(
            parse_assignment("note=a=b"),
            Ok(("note".to_string(), RawValue::text("a=b")))
        );
        assert_eq!(
            parse_assignment("HCT=NaN"),
            Ok(("HCT".to_string(), RawValue::text("NaN")))
        );
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert!(parse_assignment("Albumin").is_err());
        assert!(parse_assignment("=4.0").is_err());
    }
}
