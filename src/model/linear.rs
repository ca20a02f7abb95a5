//! Linear models: logistic regression (probabilistic) and linear SVM (label only).

use super::{argmax_class, check_width, Classifier, ProbabilisticClassifier};
use crate::error::BundleContractError;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// `coef` is `[n_rows][n_features]`; binary models have one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSpec {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

#[derive(Debug, Clone)]
struct LinearModel {
    classes: Vec<i64>,
    coef: Array2<f64>,
    intercept: Array1<f64>,
}

impl LinearModel {
    fn from_spec(spec: LinearSpec) -> Result<Self, BundleContractError> {
        let rows = spec.coef.len();
        let width = spec.coef.first().map(Vec::len).unwrap_or(0);
        if spec.classes.len() < 2 {
            return Err(BundleContractError::UnusableClassifier(
                "linear model needs at least two classes".into(),
            ));
        }
        let expected_rows = if spec.classes.len() == 2 { 1 } else { spec.classes.len() };
        if rows != expected_rows || width == 0 {
            return Err(BundleContractError::UnusableClassifier(format!(
                "coefficient matrix is {}x{}, expected {} rows for {} classes",
                rows,
                width,
                expected_rows,
                spec.classes.len()
            )));
        }
        if spec.intercept.len() != rows {
            return Err(BundleContractError::UnusableClassifier(format!(
                "{} intercepts for {} coefficient rows",
                spec.intercept.len(),
                rows
            )));
        }
        if spec.coef.iter().any(|r| r.len() != width) {
            return Err(BundleContractError::UnusableClassifier(
                "ragged coefficient matrix".into(),
            ));
        }
        let flat: Vec<f64> = spec.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((rows, width), flat)
            .map_err(|e| BundleContractError::UnusableClassifier(e.to_string()))?;
        Ok(Self {
            classes: spec.classes,
            coef,
            intercept: Array1::from(spec.intercept),
        })
    }

    fn width(&self) -> usize {
        self.coef.ncols()
    }

    fn decision(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, BundleContractError> {
        check_width("linear model", self.width(), row)?;
        Ok(self.coef.dot(&row) + &self.intercept)
    }

    /// sklearn convention: binary uses the sign of the single score, otherwise argmax
    fn label(&self, scores: &Array1<f64>) -> Result<i64, BundleContractError> {
        if self.classes.len() == 2 {
            Ok(if scores[0] > 0.0 { self.classes[1] } else { self.classes[0] })
        } else {
            argmax_class(&self.classes, scores.as_slice().unwrap_or(&[]))
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &Array1<f64>) -> Vec<f64> {
    let max = scores.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let exp: Vec<f64> = scores.iter().map(|&v| (v - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|v| v / sum).collect()
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    model: LinearModel,
}

impl LogisticRegression {
    pub fn from_spec(spec: LinearSpec) -> Result<Self, BundleContractError> {
        Ok(Self {
            model: LinearModel::from_spec(spec)?,
        })
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn classes(&self) -> &[i64] {
        &self.model.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.model.width())
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError> {
        let scores = self.model.decision(row)?;
        self.model.label(&scores)
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, BundleContractError> {
        let scores = self.model.decision(row)?;
        if self.model.classes.len() == 2 {
            let p = sigmoid(scores[0]);
            Ok(vec![1.0 - p, p])
        } else {
            Ok(softmax(&scores))
        }
    }
}

/// Linear SVM; exposes no probability estimates.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    model: LinearModel,
}

impl LinearSvc {
    pub fn from_spec(spec: LinearSpec) -> Result<Self, BundleContractError> {
        Ok(Self {
            model: LinearModel::from_spec(spec)?,
        })
    }
}

impl Classifier for LinearSvc {
    fn kind(&self) -> &'static str {
        "linear_svc"
    }

    fn classes(&self) -> &[i64] {
        &self.model.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.model.width())
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError> {
        let scores = self.model.decision(row)?;
        self.model.label(&scores)
    }
}
