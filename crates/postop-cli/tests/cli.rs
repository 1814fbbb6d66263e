//! End-to-end runs of the `postop-risk` binary against the demo models.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use postop_cli::input::collect_input;
use postop_cli::summary::report_table;
use postop_model::{ComplicationKey, PredictionReport, PredictionResult, RawValue};

fn models_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/models")
}

fn unique_temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "postop-cli-{}-{}-{}",
        name,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_postop-risk"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[rustfmt::skip]
const FULL_FORM: &[&str] = &[
    "--set", "DM=No",
    "--set", "HTN=Yes",
    "--set", "COPD=No",
    "--set", "FHS=Independent",
    "--set", "smokingStatus=No",
    "--set", "preopTransfusion=No",
    "--set", "bleedingDisorder=No",
    "--set", "Albumin=4.0",
    "--set", "HCT=40",
    "--set", "BUN=15",
    "--set", "ASA=II",
];

fn predict(extra: &[&str]) -> Output {
    let models = models_dir();
    let mut args = vec!["predict", "--models", models.to_str().unwrap()];
    args.extend_from_slice(extra);
    run(&args)
}

#[test]
fn predict_reports_every_model_in_manifest_order() {
    let mut args = FULL_FORM.to_vec();
    args.extend(["--format", "json"]);
    let output = predict(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["medicalComp", "surgicalComp", "any_comp", "seriousComp"]);
    assert!(json["medicalComp"]["probability"].is_f64());
    assert_eq!(json["medicalComp"]["label"], false);
    assert!(json["seriousComp"].get("probability").is_none());
    assert_eq!(json["seriousComp"]["label"], false);
}

#[test]
fn predict_honours_requested_order_and_no_labels() {
    let mut args = FULL_FORM.to_vec();
    args.extend([
        "--complication",
        "serious",
        "--complication",
        "medicalComp",
        "--no-labels",
        "--format",
        "json",
    ]);
    let output = predict(&args);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["seriousComp", "medicalComp"]);
    assert!(json["medicalComp"].get("label").is_none());
    // Label-only models still answer with their label.
    assert_eq!(json["seriousComp"]["label"], false);
}

#[test]
fn missing_input_exits_with_invalid_input_code() {
    let output = predict(&["--set", "ASA=II", "--format", "json"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid input for"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_asa_is_rejected_by_name() {
    let mut args = FULL_FORM.to_vec();
    args.extend(["--set", "ASA=VI"]);
    let output = predict(&args);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid input for ASA"), "{stderr}");
}

#[test]
fn fill_defaults_completes_an_empty_form() {
    let output = predict(&["--fill-defaults", "--set", "ASA=IV"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Medical complication"), "{stdout}");
    assert!(stdout.contains('%'), "{stdout}");
}

#[test]
fn input_file_is_overridden_by_set() {
    let dir = unique_temp_dir("input");
    let path = dir.join("patient.json");
    fs::write(&path, r#"{"Albumin": 3.2, "ASA": "II", "DM": "Yes"}"#).unwrap();

    let input = collect_input(
        Some(&path),
        &[("ASA".to_string(), RawValue::text("III"))],
    )
    .unwrap();
    assert_eq!(input.len(), 3);
    assert_eq!(input.get("Albumin"), Some(&RawValue::Number(3.2)));
    assert_eq!(input.get("ASA"), Some(&RawValue::text("III")));
}

#[test]
fn malformed_input_file_is_reported() {
    let dir = unique_temp_dir("bad-input");
    let path = dir.join("patient.json");
    fs::write(&path, "[1, 2]").unwrap();
    let err = collect_input(Some(&path), &[]).unwrap_err();
    assert!(format!("{err:#}").contains("as a JSON object"), "{err:#}");
}

#[test]
fn verify_lists_all_models() {
    let models = models_dir();
    let output = run(&["verify", "--models", models.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["model_count"], 4);
    assert_eq!(json["models"][3]["complication"], "seriousComp");
    assert_eq!(json["models"][3]["probability"], false);
}

#[test]
fn missing_models_dir_is_a_failure() {
    let dir = unique_temp_dir("empty-models");
    let output = run(&["verify", "--models", dir.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open models directory"), "{stderr}");
}

#[test]
fn fields_from_preset_and_from_models() {
    let output = run(&["fields", "--scheme", "binary-v1", "--format", "json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json[0]["scheme"], "binary-v1");
    assert_eq!(json[0]["fields"][0]["name"], "DM");
    assert_eq!(json[0]["fields"][0]["label"], "Diabetes");

    let models = models_dir();
    let output = run(&["fields", "--models", models.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let schemes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|group| group["scheme"].as_str().unwrap())
        .collect();
    assert_eq!(schemes, ["ordinal-v1", "binary-v1"]);
    assert_eq!(json[0]["complications"][1], "any_comp");
}

#[test]
fn report_table_shows_probability_and_label() {
    let mut report = PredictionReport::new();
    report.insert(
        ComplicationKey::Medical,
        PredictionResult::new(Some(0.0356), Some(false)),
    );
    report.insert(ComplicationKey::Serious, PredictionResult::new(None, Some(true)));
    let rendered = report_table(&report).to_string();
    assert!(rendered.contains("Complication"));
    assert!(rendered.contains("Medical complication"));
    assert!(rendered.contains("3.6%"));
    assert!(rendered.contains("Serious complication"));
    assert!(rendered.contains("Yes"));
}

#[test]
fn asa_field_snapshot() {
    let output = run(&["fields", "--scheme", "binary-v1", "--format", "json"]);
    let json = stdout_json(&output);
    insta::assert_json_snapshot!(json[0]["fields"][10], @r#"
    {
      "name": "ASA",
      "kind": "ordinal-categorical",
      "label": "ASA Class",
      "control": "choice",
      "options": [
        "I",
        "II",
        "III",
        "IV",
        "V"
      ],
      "default": "I"
    }
    "#);
}
