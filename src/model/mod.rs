//! Classifiers loaded from a model bundle, behind capability traits.
//!
//! Every classifier can predict a label. Those that can also estimate class
//! probabilities expose it through [`Classifier::as_probabilistic`].

mod bundle;
mod forest;
mod knn;
mod linear;
#[cfg(feature = "onnx")]
mod onnx;
mod scaler;

pub use bundle::{BundleSpec, ClassifierSpec, ModelBundle};
pub use forest::{DecisionTree, ForestSpec, RandomForest, TreeSpec};
pub use knn::{KNeighbors, KnnSpec};
pub use linear::{LinearSpec, LinearSvc, LogisticRegression};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxSpec};
pub use scaler::{ScalerSpec, StandardScaler};

use crate::error::BundleContractError;
use ndarray::ArrayView1;
use std::fmt;

/// Label the training pipeline assigns to benign URLs
pub const POSITIVE_CLASS: i64 = 1;

/// Basic capability: single-row label prediction.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Short identifier of the algorithm
    fn kind(&self) -> &'static str;

    /// Class labels in the order probabilities are reported
    fn classes(&self) -> &[i64];

    /// Input width, when the classifier records it
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError>;

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        None
    }
}

/// Probability capability.
pub trait ProbabilisticClassifier: Classifier {
    /// One probability per entry of [`Classifier::classes`]
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, BundleContractError>;
}

/// Label with the highest probability; ties go to the earlier class.
pub(crate) fn argmax_class(classes: &[i64], proba: &[f64]) -> Result<i64, BundleContractError> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &p) in proba.iter().enumerate() {
        match best {
            Some((_, bp)) if p <= bp => {}
            _ => best = Some((i, p)),
        }
    }
    best.and_then(|(i, _)| classes.get(i).copied())
        .ok_or_else(|| BundleContractError::Inference("empty probability vector".into()))
}

pub(crate) fn check_width(
    component: &'static str,
    expected: usize,
    row: ArrayView1<'_, f64>,
) -> Result<(), BundleContractError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(BundleContractError::DimensionMismatch {
            component,
            expected,
            actual: row.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_tie() {
        assert_eq!(argmax_class(&[0, 1], &[0.5, 0.5]).unwrap(), 0);
        assert_eq!(argmax_class(&[0, 1], &[0.2, 0.8]).unwrap(), 1);
        assert!(argmax_class(&[0, 1], &[]).is_err());
    }
}
