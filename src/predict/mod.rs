//! Prediction results and the adapter that produces them.

mod adapter;

pub use adapter::{predict, predict_from_path, PredictionAdapter};

use crate::features::FeatureMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Estimated probability of the benign class. `Unavailable` is distinct from any
/// probability: the classifier simply cannot estimate one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Confidence {
    Probability(f64),
    Unavailable,
}

impl Confidence {
    pub fn value(self) -> Option<f64> {
        match self {
            Confidence::Probability(p) => Some(p),
            Confidence::Unavailable => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Confidence::Probability(_))
    }

    /// Percentage rounded to two decimals
    pub fn percent(self) -> Option<f64> {
        self.value().map(|p| (p * 10_000.0).round() / 100.0)
    }
}

impl From<Option<f64>> for Confidence {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(p) => Confidence::Probability(p),
            None => Confidence::Unavailable,
        }
    }
}

impl From<Confidence> for Option<f64> {
    fn from(c: Confidence) -> Self {
        c.value()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(p) => f.pad(&format!("{:.2}%", p)),
            None => f.pad("n/a"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Benign,
    Malicious,
}

impl Verdict {
    /// Training labels: benign = 1, malicious = 0 (originally -1)
    pub fn from_label(label: i64) -> Self {
        if label == crate::model::POSITIVE_CLASS {
            Verdict::Benign
        } else {
            Verdict::Malicious
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Benign => "benign",
            Verdict::Malicious => "malicious",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Verdict::Benign => "URL looks safe",
            Verdict::Malicious => "URL looks unsafe",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.description())
    }
}

/// One scoring event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub scan_id: Uuid,
    pub url: String,
    pub label: i64,
    pub verdict: Verdict,
    pub confidence: Confidence,
    /// Human-readable signals, independent of scaling and column order
    pub features: FeatureMap,
    pub model: String,
    pub ts: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_serializes_as_nullable_number() {
        assert_eq!(
            serde_json::to_string(&Confidence::Probability(0.25)).unwrap(),
            "0.25"
        );
        assert_eq!(serde_json::to_string(&Confidence::Unavailable).unwrap(), "null");
        let c: Confidence = serde_json::from_str("null").unwrap();
        assert_eq!(c, Confidence::Unavailable);
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(Confidence::Probability(0.123456).percent(), Some(12.35));
        assert_eq!(Confidence::Unavailable.percent(), None);
        assert_eq!(Confidence::Unavailable.to_string(), "n/a");
    }

    #[test]
    fn verdict_from_label() {
        assert_eq!(Verdict::from_label(1), Verdict::Benign);
        assert_eq!(Verdict::from_label(0), Verdict::Malicious);
    }
}
