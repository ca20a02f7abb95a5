//! ONNX Runtime classifier. Input: [1, n_features] f32. Outputs: label i64[1] and,
//! when exported with ZipMap disabled, probabilities f32[1, n_classes].

use super::{Classifier, ProbabilisticClassifier};
use crate::error::BundleContractError;
use ndarray::{ArrayView1, Axis, CowArray};
use ort::{Environment, GraphOptimizationLevel, OrtError, Session, SessionBuilder, Value};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxSpec {
    /// Model file, relative to the bundle
    pub path: PathBuf,
    pub classes: Vec<i64>,
    /// Whether the graph's second output carries class probabilities
    #[serde(default = "default_probabilities")]
    pub probabilities: bool,
}

fn default_probabilities() -> bool {
    true
}

pub struct OnnxClassifier {
    session: Session,
    classes: Vec<i64>,
    probabilities: bool,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("classes", &self.classes)
            .field("probabilities", &self.probabilities)
            .finish()
    }
}

fn inference(e: OrtError) -> BundleContractError {
    BundleContractError::Inference(e.to_string())
}

impl OnnxClassifier {
    pub fn load(path: &Path, classes: Vec<i64>, probabilities: bool) -> Result<Self, OrtError> {
        let environment = Environment::builder()
            .with_name("urlguard")
            .build()?
            .into_arc();
        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .with_model_from_file(path)?;
        tracing::debug!(path = %path.display(), outputs = session.outputs.len(), "ONNX classifier loaded");
        Ok(Self {
            session,
            classes,
            probabilities,
        })
    }

    fn run(&self, row: ArrayView1<'_, f64>) -> Result<(i64, Option<Vec<f64>>), BundleContractError> {
        let input = row.mapv(|v| v as f32).insert_axis(Axis(0)).into_dyn();
        let array = CowArray::from(input);
        let value = Value::from_array(self.session.allocator(), &array).map_err(inference)?;
        let outputs = self.session.run(vec![value]).map_err(inference)?;

        let label_out = outputs
            .first()
            .ok_or_else(|| BundleContractError::Inference("model produced no outputs".into()))?;
        let labels = label_out.try_extract::<i64>().map_err(inference)?;
        let label = labels
            .view()
            .iter()
            .next()
            .copied()
            .ok_or_else(|| BundleContractError::Inference("empty label output".into()))?;

        let proba = match outputs.get(1) {
            Some(out) if self.probabilities => {
                let tensor = out.try_extract::<f32>().map_err(inference)?;
                let values: Vec<f64> = tensor.view().iter().map(|&p| f64::from(p)).collect();
                Some(values)
            }
            _ => None,
        };
        Ok((label, proba))
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError> {
        self.run(row).map(|(label, _)| label)
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        if self.probabilities {
            Some(self)
        } else {
            None
        }
    }
}

impl ProbabilisticClassifier for OnnxClassifier {
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, BundleContractError> {
        match self.run(row)? {
            (_, Some(p)) if p.len() == self.classes.len() => Ok(p),
            (_, Some(p)) => Err(BundleContractError::DimensionMismatch {
                component: "onnx probabilities",
                expected: self.classes.len(),
                actual: p.len(),
            }),
            (_, None) => Err(BundleContractError::Inference(
                "model has no probability output".into(),
            )),
        }
    }
}
