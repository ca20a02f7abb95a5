//! Binds extracted features to a model bundle: align → vectorize → scale → classify.

use super::{Confidence, Prediction, Verdict};
use crate::error::{BundleContractError, PredictResult};
use crate::features::{vectorize, FeatureExtractor, FeatureMap};
use crate::model::{Classifier, ModelBundle, POSITIVE_CLASS};
use chrono::Utc;
use ndarray::{Array1, ArrayView1};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Holds a shared, immutable bundle; cheap to clone and safe to call from many threads.
#[derive(Debug, Clone)]
pub struct PredictionAdapter {
    bundle: Arc<ModelBundle>,
    extractor: FeatureExtractor,
}

impl PredictionAdapter {
    pub fn new(bundle: Arc<ModelBundle>) -> Self {
        Self {
            bundle,
            extractor: FeatureExtractor::default(),
        }
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn bundle(&self) -> &Arc<ModelBundle> {
        &self.bundle
    }

    /// Feature vector in the bundle's order, scaled when the bundle carries a scaler.
    pub fn prepare(&self, features: &FeatureMap) -> Array1<f64> {
        let raw = Array1::from(vectorize(features, &self.bundle.schema().names()));
        match self.bundle.scaler() {
            Some(scaler) => scaler.transform(raw.view()),
            None => raw,
        }
    }

    /// Score one URL. An empty or malformed URL is still scored, on default feature
    /// values, rather than rejected.
    pub fn predict(&self, url: &str) -> Result<Prediction, BundleContractError> {
        let features = self.extractor.extract(url);
        let row = self.prepare(&features);
        let classifier = self.bundle.classifier();

        let label = classifier.predict(row.view())?;
        let confidence = confidence(classifier, row.view());
        let verdict = Verdict::from_label(label);

        let prediction = Prediction {
            scan_id: Uuid::new_v4(),
            url: url.to_string(),
            label,
            verdict,
            confidence,
            features,
            model: self.bundle.name().to_string(),
            ts: Utc::now(),
        };
        info!(
            scan_id = %prediction.scan_id,
            model = %prediction.model,
            label,
            confidence = ?confidence.value(),
            verdict = ?verdict,
            "url scored"
        );
        Ok(prediction)
    }
}

/// Probability of the positive class, when the classifier can estimate one.
fn confidence(classifier: &dyn Classifier, row: ArrayView1<'_, f64>) -> Confidence {
    let Some(probabilistic) = classifier.as_probabilistic() else {
        debug!(classifier = classifier.kind(), "no probability estimates");
        return Confidence::Unavailable;
    };
    let Some(index) = classifier.classes().iter().position(|&c| c == POSITIVE_CLASS) else {
        warn!(
            classes = ?classifier.classes(),
            positive = POSITIVE_CLASS,
            "positive class missing from classifier classes"
        );
        return Confidence::Unavailable;
    };
    match probabilistic.predict_proba(row) {
        Ok(proba) => match proba.get(index) {
            Some(&p) => Confidence::Probability(p.clamp(0.0, 1.0)),
            None => {
                warn!(index, len = proba.len(), "probability vector shorter than classes");
                Confidence::Unavailable
            }
        },
        Err(e) => {
            warn!(error = %e, "probability estimation failed");
            Confidence::Unavailable
        }
    }
}

/// Score `url` against an already loaded bundle.
pub fn predict(url: &str, bundle: Arc<ModelBundle>) -> PredictResult<Prediction> {
    PredictionAdapter::new(bundle).predict(url).map_err(Into::into)
}

/// Load the bundle at `path` and score `url`. Prefer loading once and reusing a
/// [`PredictionAdapter`] when scoring more than one URL.
pub fn predict_from_path(url: &str, path: &Path) -> PredictResult<Prediction> {
    let bundle = ModelBundle::load(path)?;
    predict(url, Arc::new(bundle))
}
