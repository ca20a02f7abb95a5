//! urlguard: offline URL phishing scorer.
//!
//! Modular structure:
//! - [`features`]: URL heuristics → feature mapping → ordered vector
//! - [`model`]: Model bundle loading and classifiers
//! - [`predict`]: Prediction adapter: label + confidence
//! - [`storage`]: Encrypted scoring history
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod predict;
pub mod storage;

pub use config::GuardConfig;
pub use error::{BundleContractError, LoadError, PredictError, StoreError};
pub use features::{extract, vectorize, Feature, FeatureExtractor, FeatureMap, FeatureSchema};
pub use logging::StructuredLogger;
pub use model::ModelBundle;
pub use predict::{predict, predict_from_path, Confidence, Prediction, PredictionAdapter, Verdict};
pub use storage::HistoryStore;
