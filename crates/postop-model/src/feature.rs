//! Ordered, integer-coded model input.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Normalized feature vector passed to a classifier.
///
/// Entries keep insertion order; that order is the contract with the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureVector {
    entries: Vec<(String, i64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, code: i64) {
        self.entries.push((name.into(), code));
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, code)| *code)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(_, code)| *code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, code)| (name.as_str(), *code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when names and order match `expected` exactly.
    pub fn matches_order<S: AsRef<str>>(&self, expected: &[S]) -> bool {
        self.entries.len() == expected.len()
            && self
                .entries
                .iter()
                .zip(expected)
                .all(|((name, _), want)| name == want.as_ref())
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, code)| (name.into(), code))
                .collect(),
        }
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, code) in &self.entries {
            map.serialize_entry(name, code)?;
        }
        map.end()
    }
}
