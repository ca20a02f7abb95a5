//! Subscriber setup. Diagnostics always go to stderr; stdout carries scoring results.

use crate::config::LogConfig;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber once; later calls are no-ops.
    /// `RUST_LOG` wins over `config.level`.
    pub fn init(config: &LogConfig) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| Self::filter_for(&config.level));
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init()
        };
        if installed.is_ok() {
            tracing::debug!(level = %config.level, json = config.json, "logging ready");
        }
    }

    /// Directive filter for a configured level; an unparsable one means `info`
    pub fn filter_for(level: &str) -> EnvFilter {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Scoring results as ndjson on `w`, outside tracing
    pub fn emit_json(value: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(value).map_err(std::io::Error::from)?;
        writeln!(w, "{}", line)
    }
}
