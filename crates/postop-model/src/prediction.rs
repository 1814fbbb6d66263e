//! Per-complication prediction results.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::complication::ComplicationKey;

/// Output of one classifier for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Positive-class probability in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    /// Thresholded class: complication predicted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<bool>,
}

/// What the presentation layer should show for a result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayValue {
    Probability(f64),
    Label(bool),
}

impl PredictionResult {
    pub fn new(probability: Option<f64>, label: Option<bool>) -> Self {
        Self { probability, label }
    }

    /// Probability when present, otherwise the label.
    pub fn display(&self) -> Option<DisplayValue> {
        self.probability
            .map(DisplayValue::Probability)
            .or(self.label.map(DisplayValue::Label))
    }

    /// "Yes" / "No" for the predicted label.
    pub fn label_text(&self) -> Option<&'static str> {
        self.label.map(|yes| if yes { "Yes" } else { "No" })
    }
}

/// Results of one submission, in the order complications were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionReport {
    results: Vec<(ComplicationKey, PredictionResult)>,
}

impl PredictionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result; a repeated key replaces the earlier value in place.
    pub fn insert(&mut self, key: ComplicationKey, result: PredictionResult) {
        if let Some(slot) = self.results.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = result;
        } else {
            self.results.push((key, result));
        }
    }

    pub fn get(&self, key: ComplicationKey) -> Option<&PredictionResult> {
        self.results
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, result)| result)
    }

    pub fn keys(&self) -> impl Iterator<Item = ComplicationKey> + '_ {
        self.results.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComplicationKey, &PredictionResult)> {
        self.results.iter().map(|(key, result)| (*key, result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Serialize for PredictionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (key, result) in &self.results {
            map.serialize_entry(key.as_str(), result)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_probability() {
        let both = PredictionResult::new(Some(0.12), Some(false));
        assert_eq!(both.display(), Some(DisplayValue::Probability(0.12)));

        let label_only = PredictionResult::new(None, Some(true));
        assert_eq!(label_only.display(), Some(DisplayValue::Label(true)));
        assert_eq!(label_only.label_text(), Some("Yes"));

        assert_eq!(PredictionResult::new(None, None).display(), None);
    }

    #[test]
    fn report_preserves_request_order() {
        let mut report = PredictionReport::new();
        report.insert(ComplicationKey::Serious, PredictionResult::new(Some(0.1), None));
        report.insert(ComplicationKey::Medical, PredictionResult::new(Some(0.2), None));
        report.insert(ComplicationKey::Serious, PredictionResult::new(Some(0.3), None));

        assert_eq!(
            report.keys().collect::<Vec<_>>(),
            [ComplicationKey::Serious, ComplicationKey::Medical]
        );
        assert_eq!(
            report.get(ComplicationKey::Serious).unwrap().probability,
            Some(0.3)
        );
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"seriousComp":{"probability":0.3},"medicalComp":{"probability":0.2}}"#
        );
    }
}
