//! Error kinds surfaced to callers. Feature extraction never fails; everything here
//! concerns the model bundle or the history store.

use std::path::PathBuf;
use thiserror::Error;

/// The bundle could not be located or deserialized.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read model bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot deserialize model bundle {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "onnx")]
    #[error("cannot load ONNX classifier {path}: {source}")]
    Onnx {
        path: PathBuf,
        #[source]
        source: ort::OrtError,
    },
}

/// The bundle was readable but does not satisfy the contract with the extractor.
#[derive(Error, Debug)]
pub enum BundleContractError {
    #[error("model bundle has no classifier")]
    MissingClassifier,

    #[error("unusable classifier: {0}")]
    UnusableClassifier(String),

    #[error("unknown feature in bundle order: {0}")]
    UnknownFeature(String),

    #[error("feature listed twice in bundle order: {0}")]
    DuplicateFeature(String),

    #[error("bundle declares an empty feature order")]
    EmptyFeatureOrder,

    #[error("{component} expects {expected} features, bundle order has {actual}")]
    DimensionMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("classifier inference failed: {0}")]
    Inference(String),
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Contract(#[from] BundleContractError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload encryption failed")]
    Crypto,

    #[error("stored payload is corrupt: {0}")]
    Encoding(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<aes_gcm::Error> for StoreError {
    fn from(_: aes_gcm::Error) -> Self {
        StoreError::Crypto
    }
}

impl From<base64::DecodeError> for StoreError {
    fn from(e: base64::DecodeError) -> Self {
        StoreError::Encoding(e.to_string())
    }
}

pub type PredictResult<T> = Result<T, PredictError>;
