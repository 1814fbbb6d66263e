use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use postop_infer::{Invocation, Orchestrator, ScoringOptions, score};
use postop_model::{
    Classifier, ClassifierError, ColumnSpec, ComplicationKey, DisplayValue, Encoding,
    EncodingScheme, FeatureVector, ModelVariant, RawInput, RiskError,
};
use postop_normalize::normalize;
use postop_registry::{LoadOptions, ModelRegistry};
use proptest::prelude::*;

#[derive(Debug, Default)]
struct Stub {
    names: Vec<String>,
    probability: Option<f64>,
    fail: bool,
    calls: AtomicUsize,
}

impl Stub {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn probability(mut self, p: f64) -> Self {
        self.probability = Some(p);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Classifier for Stub {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClassifierError::Message("corrupted model state".into()));
        }
        Ok(self.probability.map_or(features.codes().sum::<i64>() > 0, |p| p > 0.5))
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<f64>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.names.len() + 1,
                found: features.len(),
            });
        }
        Ok(self.probability)
    }
}

fn small_scheme(name: &str) -> EncodingScheme {
    EncodingScheme::new(
        name,
        vec![
            ColumnSpec::new("DM", Encoding::YesNo),
            ColumnSpec::new(
                "Albumin",
                Encoding::OrdinalRange {
                    low: 3.5,
                    high: 5.49,
                },
            ),
        ],
    )
}

fn stub_variant(key: ComplicationKey, stub: Stub) -> ModelVariant {
    ModelVariant::new(key, small_scheme("small"), Arc::new(stub)).unwrap()
}

fn input() -> RawInput {
    RawInput::new().with("DM", "Yes").with("Albumin", 3.2)
}

fn fixtures_registry() -> ModelRegistry {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/models");
    ModelRegistry::open(&dir, LoadOptions::default()).unwrap()
}

fn form_input() -> RawInput {
    RawInput::new()
        .with("DM", "No")
        .with("HTN", "Yes")
        .with("COPD", "No")
        .with("FHS", "Independent")
        .with("smokingStatus", "No")
        .with("preopTransfusion", "No")
        .with("bleedingDisorder", "No")
        .with("Albumin", 4.0)
        .with("HCT", 40.0)
        .with("BUN", 15.0)
        .with("ASA", "II")
}

#[test]
fn report_follows_requested_order() {
    let registry = ModelRegistry::from_variants([
        stub_variant(ComplicationKey::Medical, Stub::new(&["DM", "Albumin"]).probability(0.25)),
        stub_variant(ComplicationKey::Surgical, Stub::new(&["DM", "Albumin"]).probability(0.5)),
        stub_variant(ComplicationKey::Serious, Stub::new(&["DM", "Albumin"])),
    ]);
    let requested = [
        ComplicationKey::Serious,
        ComplicationKey::Medical,
        ComplicationKey::Surgical,
        ComplicationKey::Medical,
    ];
    let report = score(&registry, &requested, &input(), &ScoringOptions::default()).unwrap();

    let keys: Vec<_> = report.keys().collect();
    assert_eq!(keys, requested[..3]);
    insta::assert_json_snapshot!(report, @r#"
    {
      "seriousComp": {
        "label": true
      },
      "medicalComp": {
        "probability": 0.25,
        "label": false
      },
      "surgicalComp": {
        "probability": 0.5,
        "label": false
      }
    }
    "#);
}

#[test]
fn one_failing_model_fails_the_batch() {
    let registry = ModelRegistry::from_variants([
        stub_variant(ComplicationKey::Medical, Stub::new(&["DM", "Albumin"]).probability(0.1)),
        stub_variant(ComplicationKey::Surgical, Stub::new(&["DM", "Albumin"]).failing()),
        stub_variant(ComplicationKey::Any, Stub::new(&["DM", "Albumin"]).probability(0.3)),
    ]);
    let err = score(
        &registry,
        &[
            ComplicationKey::Medical,
            ComplicationKey::Surgical,
            ComplicationKey::Any,
        ],
        &input(),
        &ScoringOptions::default(),
    )
    .unwrap_err();
    assert!(
        matches!(
            err,
            RiskError::ModelInvocation {
                key: ComplicationKey::Surgical,
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(
        err.to_string(),
        "model invocation failed for surgicalComp: expected 3 features, got 2"
    );
}

#[test]
fn invalid_input_stops_before_any_model_runs() {
    let stub = Arc::new(Stub::new(&["DM", "Albumin"]).probability(0.4));
    let variant =
        ModelVariant::new(ComplicationKey::Medical, small_scheme("small"), stub.clone()).unwrap();
    let registry = ModelRegistry::from_variants([variant]);

    let raw = RawInput::new().with("DM", "maybe").with("Albumin", 4.0);
    let err = score(
        &registry,
        &[ComplicationKey::Medical],
        &raw,
        &ScoringOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(&err, RiskError::InvalidInput { variable, .. } if variable == "DM"));
    assert!(err.is_user_error());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_model_is_reported_before_input_is_checked() {
    let registry = ModelRegistry::from_variants([stub_variant(
        ComplicationKey::Medical,
        Stub::new(&["DM", "Albumin"]).probability(0.4),
    )]);
    let err = score(
        &registry,
        &[ComplicationKey::Medical, ComplicationKey::Serious],
        &RawInput::new(),
        &ScoringOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RiskError::ModelLoad {
            key: ComplicationKey::Serious,
            ..
        }
    ));
}

/// Reports the first code as a probability so tests can see what it was fed.
#[derive(Debug)]
struct FirstCode {
    names: Vec<String>,
}

impl FirstCode {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl Classifier for FirstCode {
    fn feature_names(&self) -> &[String] {
        &self.names
    }

    fn predict(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(features.codes().next().unwrap_or(0) > 5)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<f64>, ClassifierError> {
        Ok(features.codes().next().map(|code| code as f64 / 10.0))
    }
}

#[test]
fn reused_scheme_name_with_other_columns_gets_its_own_vector() {
    let ordinal = stub_variant(
        ComplicationKey::Medical,
        Stub::new(&["DM", "Albumin"]).probability(0.2),
    );
    let one_hot_scheme = EncodingScheme::new(
        "small",
        vec![
            ColumnSpec::new(
                "DM",
                Encoding::Indicator {
                    level: "Yes".into(),
                    levels: vec!["Yes".into(), "No".into()],
                },
            )
            .with_column("DM_Yes"),
        ],
    );
    let one_hot = ModelVariant::new(
        ComplicationKey::Surgical,
        one_hot_scheme,
        Arc::new(FirstCode::new(&["DM_Yes"])),
    )
    .unwrap();
    let registry = ModelRegistry::from_variants([ordinal, one_hot]);

    let report = score(
        &registry,
        &[ComplicationKey::Medical, ComplicationKey::Surgical],
        &input(),
        &ScoringOptions::default(),
    )
    .unwrap();
    assert_eq!(report.get(ComplicationKey::Medical).unwrap().probability, Some(0.2));
    assert_eq!(report.get(ComplicationKey::Surgical).unwrap().probability, Some(0.1));
}

#[test]
fn reused_scheme_name_with_other_rules_is_encoded_per_model() {
    let albumin = |encoding: Encoding| {
        EncodingScheme::new("shared", vec![ColumnSpec::new("Albumin", encoding)])
    };
    let ordinal = ModelVariant::new(
        ComplicationKey::Medical,
        albumin(Encoding::OrdinalRange {
            low: 3.5,
            high: 5.49,
        }),
        Arc::new(FirstCode::new(&["Albumin"])),
    )
    .unwrap();
    let flagged = ModelVariant::new(
        ComplicationKey::Surgical,
        albumin(Encoding::AbnormalFlag {
            below: Some(3.5),
            above: None,
        }),
        Arc::new(FirstCode::new(&["Albumin"])),
    )
    .unwrap();
    let registry = ModelRegistry::from_variants([ordinal, flagged]);

    let report = score(
        &registry,
        &[ComplicationKey::Medical, ComplicationKey::Surgical],
        &RawInput::new().with("Albumin", 3.2),
        &ScoringOptions::default(),
    )
    .unwrap();
    // 3.2 is below range: code 2 under the ordinal rule, flag 1 under the binary one.
    assert_eq!(report.get(ComplicationKey::Medical).unwrap().probability, Some(0.2));
    assert_eq!(report.get(ComplicationKey::Surgical).unwrap().probability, Some(0.1));
}

#[test]
fn labels_can_be_turned_off() {
    let registry = ModelRegistry::from_variants([
        stub_variant(ComplicationKey::Medical, Stub::new(&["DM", "Albumin"]).probability(0.7)),
        stub_variant(ComplicationKey::Serious, Stub::new(&["DM", "Albumin"])),
    ]);
    let report = score(
        &registry,
        &[ComplicationKey::Medical, ComplicationKey::Serious],
        &input(),
        &ScoringOptions { want_labels: false },
    )
    .unwrap();
    let medical = report.get(ComplicationKey::Medical).unwrap();
    assert_eq!(medical.label, None);
    assert_eq!(medical.display(), Some(DisplayValue::Probability(0.7)));
    let serious = report.get(ComplicationKey::Serious).unwrap();
    assert_eq!(serious.display(), Some(DisplayValue::Label(true)));
}

#[test]
fn empty_request_gives_empty_report() {
    let registry = ModelRegistry::from_variants([]);
    let report = score(&registry, &[], &RawInput::new(), &ScoringOptions::default()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn checked_in_models_score_a_full_form() {
    let registry = fixtures_registry();
    let report = score(
        &registry,
        &ComplicationKey::ALL,
        &form_input(),
        &ScoringOptions::default(),
    )
    .unwrap();

    assert_eq!(report.keys().collect::<Vec<_>>(), ComplicationKey::ALL);
    for (key, result) in report.iter() {
        assert!(result.label.is_some(), "{key}");
        if key == ComplicationKey::Serious {
            assert_eq!(result.probability, None);
        } else {
            let p = result.probability.unwrap();
            assert!(p > 0.0 && p < 0.5, "{key}: {p}");
        }
    }
}

#[test]
fn checked_in_models_reject_unknown_asa() {
    let registry = fixtures_registry();
    let mut raw = form_input();
    raw.insert("ASA", "VI");
    let err = score(
        &registry,
        &ComplicationKey::ALL,
        &raw,
        &ScoringOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(&err, RiskError::InvalidInput { variable, .. } if variable == "ASA"));
}

#[test]
fn higher_risk_profile_raises_medical_probability() {
    let registry = fixtures_registry();
    let baseline = score(
        &registry,
        &[ComplicationKey::Medical],
        &form_input(),
        &ScoringOptions::default(),
    )
    .unwrap();

    let mut raw = form_input();
    raw.insert("ASA", "IV");
    raw.insert("FHS", "Dependent");
    raw.insert("Albumin", 2.9);
    let elevated = score(
        &registry,
        &[ComplicationKey::Medical],
        &raw,
        &ScoringOptions::default(),
    )
    .unwrap();

    let p = |report: &postop_model::PredictionReport| {
        report
            .get(ComplicationKey::Medical)
            .and_then(|r| r.probability)
            .unwrap()
    };
    assert!(p(&elevated) > p(&baseline));
}

proptest! {
    #[test]
    fn any_failing_variant_fails_the_whole_batch(count in 1usize..=4, failing in 0usize..4) {
        let failing = failing % count;
        let keys = &ComplicationKey::ALL[..count];
        let variants: Vec<ModelVariant> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let stub = Stub::new(&["DM", "Albumin"]).probability(0.3);
                stub_variant(*key, if index == failing { stub.failing() } else { stub })
            })
            .collect();
        let features = normalize(&input(), &small_scheme("small")).unwrap();
        let invocations: Vec<Invocation<'_>> = variants
            .iter()
            .map(|variant| Invocation::new(variant, &features))
            .collect();

        let err = Orchestrator::default().invoke_all(&invocations).unwrap_err();
        prop_assert_eq!(err.key(), Some(keys[failing]));
    }
}
