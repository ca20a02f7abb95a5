//! Standardization fitted at training time: `(x - mean) / scale`.

use crate::error::BundleContractError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Serialized scaler parameters; either part may be absent (`with_mean=False` etc.)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalerSpec {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new(mean: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Result<Self, BundleContractError> {
        if let (Some(m), Some(s)) = (&mean, &scale) {
            if m.len() != s.len() {
                return Err(BundleContractError::DimensionMismatch {
                    component: "scaler scale",
                    expected: m.len(),
                    actual: s.len(),
                });
            }
        }
        // constant columns were fitted with zero variance; dividing by 1 leaves them centred
        let scale = scale.map(|s| {
            s.into_iter()
                .map(|v| if v == 0.0 || !v.is_finite() { 1.0 } else { v })
                .collect::<Array1<f64>>()
        });
        Ok(Self {
            mean: mean.map(Array1::from),
            scale,
        })
    }

    pub fn from_spec(spec: ScalerSpec) -> Result<Self, BundleContractError> {
        Self::new(spec.mean, spec.scale)
    }

    /// Width the scaler was fitted on, when it carries any parameters
    pub fn n_features(&self) -> Option<usize> {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(|a| a.len())
    }

    /// Transform a single row. The caller guarantees the width via bundle validation.
    pub fn transform(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        let mut out = row.to_owned();
        if let Some(mean) = &self.mean {
            out -= mean;
        }
        if let Some(scale) = &self.scale {
            out /= scale;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardizes_row() {
        let s = StandardScaler::new(Some(vec![1.0, 0.0]), Some(vec![2.0, 0.5])).unwrap();
        let out = s.transform(array![3.0, -1.0].view());
        assert_eq!(out, array![1.0, -2.0]);
        assert_eq!(s.n_features(), Some(2));
    }

    #[test]
    fn zero_scale_is_treated_as_one() {
        let s = StandardScaler::new(Some(vec![1.0]), Some(vec![0.0])).unwrap();
        assert_eq!(s.transform(array![1.0].view()), array![0.0]);
    }

    #[test]
    fn mean_only() {
        let s = StandardScaler::new(Some(vec![0.5, 0.5]), None).unwrap();
        assert_eq!(s.transform(array![1.0, 0.0].view()), array![0.5, -0.5]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(StandardScaler::new(Some(vec![0.0, 0.0]), Some(vec![1.0])).is_err());
    }
}
