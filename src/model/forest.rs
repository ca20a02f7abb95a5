//! Random forest over decision trees in sklearn's flat array layout.

use super::{argmax_class, check_width, Classifier, ProbabilisticClassifier};
use crate::error::BundleContractError;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Marker sklearn stores in `children_left`/`children_right` for leaves
const LEAF: i64 = -1;

/// One fitted tree. `value[node]` holds per-class counts (or fractions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSpec {
    pub classes: Vec<i64>,
    pub n_features: usize,
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: usize,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Normalized class distribution per leaf
    leaves: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn from_spec(
        spec: TreeSpec,
        n_classes: usize,
        n_features: usize,
    ) -> Result<Self, BundleContractError> {
        let n = spec.children_left.len();
        let bad = |msg: String| BundleContractError::UnusableClassifier(msg);
        if n == 0 {
            return Err(bad("tree has no nodes".into()));
        }
        if spec.children_right.len() != n
            || spec.feature.len() != n
            || spec.threshold.len() != n
            || spec.value.len() != n
        {
            return Err(bad("tree arrays differ in length".into()));
        }
        let index = |v: i64, bound: usize, what: &str| -> Result<usize, BundleContractError> {
            usize::try_from(v)
                .ok()
                .filter(|&i| i < bound)
                .ok_or_else(|| bad(format!("{} {} out of range", what, v)))
        };

        let mut nodes = Vec::with_capacity(n);
        let mut leaves = Vec::new();
        for i in 0..n {
            let left = spec.children_left[i];
            let right = spec.children_right[i];
            if left == LEAF || right == LEAF {
                let counts = &spec.value[i];
                if counts.len() != n_classes {
                    return Err(bad(format!(
                        "leaf {} has {} class values, expected {}",
                        i,
                        counts.len(),
                        n_classes
                    )));
                }
                let total: f64 = counts.iter().sum();
                let dist = if total > 0.0 {
                    counts.iter().map(|c| c / total).collect()
                } else {
                    vec![1.0 / n_classes as f64; n_classes]
                };
                nodes.push(Node::Leaf {
                    value: leaves.len(),
                });
                leaves.push(dist);
            } else {
                let left = index(left, n, "child")?;
                let right = index(right, n, "child")?;
                // sklearn numbers children after their parent; this also rules out cycles
                if left <= i || right <= i {
                    return Err(bad(format!("node {} points backwards", i)));
                }
                nodes.push(Node::Split {
                    feature: index(spec.feature[i], n_features, "feature")?,
                    threshold: spec.threshold[i],
                    left,
                    right,
                });
            }
        }
        Ok(Self { nodes, leaves })
    }

    fn leaf(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[feature] <= threshold { left } else { right };
                }
                Node::Leaf { value } => return &self.leaves[value],
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    classes: Vec<i64>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn from_spec(spec: ForestSpec) -> Result<Self, BundleContractError> {
        if spec.classes.is_empty() {
            return Err(BundleContractError::UnusableClassifier(
                "forest declares no classes".into(),
            ));
        }
        if spec.trees.is_empty() {
            return Err(BundleContractError::UnusableClassifier(
                "forest has no trees".into(),
            ));
        }
        let n_classes = spec.classes.len();
        let trees = spec
            .trees
            .into_iter()
            .map(|t| DecisionTree::from_spec(t, n_classes, spec.n_features))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            classes: spec.classes,
            n_features: spec.n_features,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> Result<i64, BundleContractError> {
        let proba = self.predict_proba(row)?;
        argmax_class(&self.classes, &proba)
    }

    fn as_probabilistic(&self) -> Option<&dyn ProbabilisticClassifier> {
        Some(self)
    }
}

impl ProbabilisticClassifier for RandomForest {
    /// Mean of the trees' leaf distributions
    fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Result<Vec<f64>, BundleContractError> {
        check_width("random forest", self.n_features, row)?;
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.leaf(row)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|a| a / n).collect())
    }
}
