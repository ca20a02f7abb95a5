//! URL feature extraction: raw string → named heuristic scores → ordered vector.

mod heuristics;
mod parts;
mod pipeline;
mod schema;

pub use heuristics::{LEGITIMATE, PHISHING, SHORTENERS, SUSPICIOUS, SUSPICIOUS_TOKENS};
pub use parts::{DomainParts, UrlParts};
pub use pipeline::{extract, vectorize, FeatureExtractor};
pub use schema::{Feature, FeatureSchema, Signal};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heuristic name → score for one URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, i8>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i8) -> Option<i8> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<i8> {
        self.0.get(name).copied()
    }

    pub fn feature(&self, feature: Feature) -> Option<i8> {
        self.get(feature.name())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, i8)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries in canonical training order; names outside the vocabulary are skipped
    pub fn canonical(&self) -> Vec<(Feature, i8)> {
        Feature::ALL
            .iter()
            .filter_map(|&f| self.feature(f).map(|v| (f, v)))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, i8)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (S, i8)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_object() {
        let map: FeatureMap = [("HTTPS", 1i8), ("UsingIP", -1)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"HTTPS":1,"UsingIP":-1}"#);
        let back: FeatureMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn canonical_view_follows_training_order() {
        let map: FeatureMap = [("StatsReport", 1i8), ("UsingIP", -1), ("Custom", 0)]
            .into_iter()
            .collect();
        assert_eq!(
            map.canonical(),
            vec![(Feature::UsingIp, -1), (Feature::StatsReport, 1)]
        );
    }
}
