//! Scorer configuration. Only the binary reads it; the core takes a URL and a bundle.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Data directory (history database)
    pub data_dir: PathBuf,
    /// Path to the JSON model bundle
    pub model_path: PathBuf,
    /// Feature extraction parameters
    pub features: FeaturesConfig,
    /// Scoring history
    pub history: HistoryConfig,
    /// Batch scoring
    pub batch: BatchConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// URLs shorter than this are "short" (LongURL = 1)
    pub long_url_short: usize,
    /// URLs longer than this are "long" (LongURL = -1)
    pub long_url_medium: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Records per history page
    pub page_size: usize,
    /// Environment variable holding the store secret
    pub secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Upper bound on URLs scored concurrently
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("urlguard"))
            .unwrap_or_else(|| PathBuf::from(".urlguard"));
        Self {
            data_dir,
            model_path: PathBuf::from("models/rf_model.json"),
            features: FeaturesConfig::default(),
            history: HistoryConfig::default(),
            batch: BatchConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            long_url_short: 54,
            long_url_medium: 75,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: 10,
            secret_env: "URLGUARD_HISTORY_SECRET".to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl GuardConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<GuardConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults")
                }
            }
        }
        Self::default()
    }

    /// Path of the history database inside the data directory
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }
}
