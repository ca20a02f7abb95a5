//! Model bundle: classifier + optional scaler + optional training feature order,
//! loaded from a JSON document and validated against the feature vocabulary.

use super::{
    Classifier, ForestSpec, KNeighbors, KnnSpec, LinearSpec, LinearSvc, LogisticRegression,
    RandomForest, ScalerSpec, StandardScaler,
};
use crate::error::{BundleContractError, LoadError, PredictError};
use crate::features::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk layout, keyed like the training artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<serde_json::Value>,
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression(LinearSpec),
    LinearSvc(LinearSpec),
    RandomForest(ForestSpec),
    KNeighbors(KnnSpec),
    #[cfg(feature = "onnx")]
    Onnx(super::OnnxSpec),
}

impl ClassifierSpec {
    /// Instantiate the classifier. `base_dir` resolves relative model file paths.
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn build(self, base_dir: &Path) -> Result<Box<dyn Classifier>, PredictError> {
        let classifier: Box<dyn Classifier> = match self {
            ClassifierSpec::LogisticRegression(s) => Box::new(LogisticRegression::from_spec(s)?),
            ClassifierSpec::LinearSvc(s) => Box::new(LinearSvc::from_spec(s)?),
            ClassifierSpec::RandomForest(s) => Box::new(RandomForest::from_spec(s)?),
            ClassifierSpec::KNeighbors(s) => Box::new(KNeighbors::from_spec(s)?),
            #[cfg(feature = "onnx")]
            ClassifierSpec::Onnx(s) => {
                let path = base_dir.join(&s.path);
                let c = super::OnnxClassifier::load(&path, s.classes, s.probabilities)
                    .map_err(|source| LoadError::Onnx { path, source })?;
                Box::new(c)
            }
        };
        if classifier.classes().is_empty() {
            return Err(BundleContractError::UnusableClassifier("no classes".into()).into());
        }
        Ok(classifier)
    }
}

/// Immutable after load; share it behind an `Arc` across concurrent predictions.
#[derive(Debug)]
pub struct ModelBundle {
    name: String,
    classifier: Box<dyn Classifier>,
    scaler: Option<StandardScaler>,
    schema: FeatureSchema,
    declared_order: bool,
}

impl ModelBundle {
    /// Assemble a bundle, checking every component agrees on the input width.
    /// Without a declared order the canonical 30-feature order governs.
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: Option<StandardScaler>,
        schema: Option<FeatureSchema>,
    ) -> Result<Self, BundleContractError> {
        let declared_order = schema.is_some();
        let schema = schema.unwrap_or_default();
        if let Some(n) = scaler.as_ref().and_then(|s| s.n_features()) {
            if n != schema.len() {
                return Err(BundleContractError::DimensionMismatch {
                    component: "scaler",
                    expected: n,
                    actual: schema.len(),
                });
            }
        }
        if let Some(n) = classifier.n_features() {
            if n != schema.len() {
                return Err(BundleContractError::DimensionMismatch {
                    component: "classifier",
                    expected: n,
                    actual: schema.len(),
                });
            }
        }
        Ok(Self {
            name: classifier.kind().to_string(),
            classifier,
            scaler,
            schema,
            declared_order,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Read and validate a bundle file. I/O and JSON failures are [`LoadError`]s;
    /// a readable bundle that breaks the feature contract is a [`BundleContractError`].
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let data = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut spec: BundleSpec =
            serde_json::from_str(&data).map_err(|source| LoadError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        if spec.name.is_none() {
            spec.name = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        }
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let bundle = Self::from_spec(spec, base_dir)?;
        tracing::info!(
            path = %path.display(),
            name = %bundle.name,
            classifier = bundle.classifier.kind(),
            features = bundle.schema.len(),
            declared_order = bundle.declared_order,
            scaler = bundle.scaler.is_some(),
            "model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn from_spec(spec: BundleSpec, base_dir: &Path) -> Result<Self, PredictError> {
        let model = match spec.model {
            None | Some(serde_json::Value::Null) => {
                return Err(BundleContractError::MissingClassifier.into())
            }
            Some(v) => v,
        };
        let classifier_spec: ClassifierSpec = serde_json::from_value(model)
            .map_err(|e| BundleContractError::UnusableClassifier(e.to_string()))?;
        let schema = spec
            .features
            .as_deref()
            .map(|names| FeatureSchema::from_names(names))
            .transpose()?;
        let scaler = spec.scaler.map(StandardScaler::from_spec).transpose()?;
        let classifier = classifier_spec.build(base_dir)?;
        let bundle = Self::new(classifier, scaler, schema)?;
        Ok(match spec.name {
            Some(name) => bundle.with_name(name),
            None => bundle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Governing feature order for vectorization
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Whether the order came from the bundle rather than the canonical default
    pub fn has_declared_order(&self) -> bool {
        self.declared_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lr_model(width: usize) -> serde_json::Value {
        let coef = vec![0.1; width];
        json!({
            "kind": "logistic_regression",
            "classes": [0, 1],
            "coef": [coef],
            "intercept": [0.0]
        })
    }

    fn spec(value: serde_json::Value) -> BundleSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn canonical_order_when_none_declared() {
        let b = ModelBundle::from_spec(spec(json!({ "model": lr_model(30) })), Path::new("."))
            .unwrap();
        assert_eq!(b.schema().len(), 30);
        assert!(!b.has_declared_order());
        assert!(b.scaler().is_none());
        assert_eq!(b.name(), "logistic_regression");
    }

    #[test]
    fn declared_order_and_name() {
        let b = ModelBundle::from_spec(
            spec(json!({
                "name": "LogReg",
                "model": lr_model(2),
                "scaler": { "mean": [0.0, 0.0], "scale": [1.0, 1.0] },
                "features": ["HTTPS", "UsingIP"]
            })),
            Path::new("."),
        )
        .unwrap();
        assert!(b.has_declared_order());
        assert_eq!(b.schema().names(), vec!["HTTPS", "UsingIP"]);
        assert_eq!(b.name(), "LogReg");
    }

    #[test]
    fn missing_classifier() {
        let err = ModelBundle::from_spec(spec(json!({ "features": null })), Path::new("."))
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Contract(BundleContractError::MissingClassifier)
        ));
    }

    #[test]
    fn unknown_classifier_kind() {
        let err = ModelBundle::from_spec(
            spec(json!({ "model": { "kind": "gradient_boosting" } })),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Contract(BundleContractError::UnusableClassifier(_))
        ));
    }

    #[test]
    fn unknown_feature_name_fails_fast() {
        let err = ModelBundle::from_spec(
            spec(json!({ "model": lr_model(2), "features": ["HTTPS", "Entropy"] })),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Contract(BundleContractError::UnknownFeature(_))
        ));
    }

    #[test]
    fn width_disagreements() {
        let err = ModelBundle::from_spec(spec(json!({ "model": lr_model(5) })), Path::new("."))
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Contract(BundleContractError::DimensionMismatch {
                component: "classifier",
                ..
            })
        ));
        let err = ModelBundle::from_spec(
            spec(json!({
                "model": lr_model(30),
                "scaler": { "mean": [0.0], "scale": [1.0] }
            })),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Contract(BundleContractError::DimensionMismatch {
                component: "scaler",
                ..
            })
        ));
    }
}
