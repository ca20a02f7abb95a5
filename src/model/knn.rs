//! k-nearest neighbours with uniform weights and Euclidean distance.

use super::{argmax_class, check_width, Classifier, ProbabilisticClassifier};
use crate::error::BundleContractError;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnSpec {
    pub classes: Vec<i64>,
    pub n_neighbors: usize,
    /// Training rows, already scaled
    pub points: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct KNeighbors {
    classes: Vec<i64>,
    k: usize,
    points: Array2<f64>,
    /// Index into `classes` per training row
    labels: Vec<usize>,
}

impl KNeighbors {
    pub fn from_spec(spec: KnnSpec) -> Result<Self, BundleContractError> {
        let bad = |msg: String| BundleContractError::UnusableClassifier(msg);
        if spec.classes.is_empty() {
            return Err(bad("no classes".into()));
        }
        if spec.points.is_empty() || spec.points.len() != spec.labels.len() {
            return Err(bad(format!(
                "{} training points for {} labels",
                spec.points.len(),
                spec.labels.len()
            )));
        }
        if spec.n_neighbors == 0 || spec.n_neighbors > spec.points.len() {
            return Err(bad(format!(
                "n_neighbors = {} with {} training points",
                spec.n_neighbors,
                spec.points.len()
            )));
        }
        let width = spec.points[0].len();
        if width == 0 || spec.points.iter().any(|p| p.len() != width) {
            return Err(bad("training points differ in width".into()));
        }
        let labels = spec
            .labels
            .iter()
            .map(|l| {
                spec.classes
                    .iter()
                    .position(|c| c == l)
                    .ok_or_else(|| bad(format!("label {} is not a declared class", l)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows = spec.points.len();
        let flat: Vec<f64> = spec.points.into_iter().flatten().collect();
        let points = Array2::from_shape_vec((rows, width), flat).map_err(|e| bad(e.to_string()))?;
        Ok(Self {
            classes: spec.classes,
            k: spec.n_neighbors,
            points,
            labels,
        })
    }
}

impl Classifier for KNeighbors {
    fn kind(&self) -> &'static str {
        "k_neighbors"
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.points.ncols())
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError> {
        let proba = self.predict_proba(row)?;
        argmax_class(&self.classes, &proba)
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for KNeighbors {
    /// Fraction of the k nearest training rows voting for each class
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, BundleContractError> {
        check_width("k-neighbors", self.points.ncols(), row)?;
        let mut dist: Vec<(f64, usize)> = self
            .points
            .axis_iter(Axis(0))
            .zip(&self.labels)
            .map(|(p, &label)| {
                let d: f64 = p.iter().zip(row.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                (d, label)
            })
            .collect();
        dist.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut votes = vec![0.0; self.classes.len()];
        for &(_, label) in dist.iter().take(self.k) {
            votes[label] += 1.0;
        }
        let k = self.k as f64;
        Ok(votes.into_iter().map(|v| v / k).collect())
    }
}
