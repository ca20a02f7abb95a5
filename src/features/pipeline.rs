//! Feature extraction pipeline: URL → parsed parts → heuristic scores → vector.

use super::heuristics;
use super::{Feature, FeatureMap, Signal, UrlParts};
use crate::config::FeaturesConfig;

/// Stateless extractor; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Score every known heuristic. Never fails: a URL that does not parse degrades
    /// each heuristic to its default.
    pub fn extract(&self, url: &str) -> FeatureMap {
        let parts = UrlParts::parse(url);
        let map: FeatureMap = Feature::ALL
            .iter()
            .map(|&f| (f.name(), self.evaluate(f, &parts)))
            .collect();
        tracing::trace!(
            url_len = url.len(),
            parsed = parts.scheme().is_some(),
            "extracted url features"
        );
        map
    }

    /// Score a single heuristic
    pub fn evaluate(&self, feature: Feature, url: &UrlParts<'_>) -> i8 {
        if let Signal::Offline(value) = feature.signal() {
            return value;
        }
        match feature {
            Feature::UsingIp => heuristics::using_ip(url),
            Feature::LongUrl => heuristics::long_url(
                url,
                self.config.long_url_short,
                self.config.long_url_medium,
            ),
            Feature::ShortUrl => heuristics::short_url(url),
            Feature::SymbolAt => heuristics::symbol_at(url),
            Feature::Redirecting => heuristics::double_slash_redirect(url),
            Feature::PrefixSuffix => heuristics::prefix_suffix(url),
            Feature::SubDomains => heuristics::sub_domains(url),
            Feature::Https => heuristics::https(url),
            Feature::NonStdPort => heuristics::non_std_port(url),
            Feature::HttpsDomainUrl => heuristics::https_in_host(url),
            Feature::InfoEmail => heuristics::info_email(url),
            Feature::AbnormalUrl => heuristics::abnormal_url(url),
            // offline signals handled above
            _ => heuristics::SUSPICIOUS,
        }
    }
}

/// Extract with default thresholds
pub fn extract(url: &str) -> FeatureMap {
    FeatureExtractor::default().extract(url)
}

/// Flatten a mapping into `order`; names missing from the mapping become 0.
pub fn vectorize<S: AsRef<str>>(map: &FeatureMap, order: &[S]) -> Vec<f64> {
    order
        .iter()
        .map(|name| map.get(name.as_ref()).map(f64::from).unwrap_or(0.0))
        .collect()
}
