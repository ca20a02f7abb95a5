//! Typed feature vocabulary and the ordered schema a trained model expects.

use crate::error::BundleContractError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One heuristic signal. Declaration order is the canonical training order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    UsingIp,
    LongUrl,
    ShortUrl,
    SymbolAt,
    Redirecting,
    PrefixSuffix,
    SubDomains,
    Https,
    DomainRegLen,
    Favicon,
    NonStdPort,
    HttpsDomainUrl,
    RequestUrl,
    AnchorUrl,
    LinksInScriptTags,
    ServerFormHandler,
    InfoEmail,
    AbnormalUrl,
    WebsiteForwarding,
    StatusBarCust,
    DisableRightClick,
    UsingPopupWindow,
    IframeRedirection,
    AgeOfDomain,
    DnsRecording,
    WebsiteTraffic,
    PageRank,
    GoogleIndex,
    LinksPointingToPage,
    StatsReport,
}

/// How a feature's value is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Computed from the URL string
    Computed,
    /// Needs page content, WHOIS, DNS or ranking data; always reported as the given value
    Offline(i8),
}

impl Feature {
    pub const COUNT: usize = 30;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::UsingIp,
        Feature::LongUrl,
        Feature::ShortUrl,
        Feature::SymbolAt,
        Feature::Redirecting,
        Feature::PrefixSuffix,
        Feature::SubDomains,
        Feature::Https,
        Feature::DomainRegLen,
        Feature::Favicon,
        Feature::NonStdPort,
        Feature::HttpsDomainUrl,
        Feature::RequestUrl,
        Feature::AnchorUrl,
        Feature::LinksInScriptTags,
        Feature::ServerFormHandler,
        Feature::InfoEmail,
        Feature::AbnormalUrl,
        Feature::WebsiteForwarding,
        Feature::StatusBarCust,
        Feature::DisableRightClick,
        Feature::UsingPopupWindow,
        Feature::IframeRedirection,
        Feature::AgeOfDomain,
        Feature::DnsRecording,
        Feature::WebsiteTraffic,
        Feature::PageRank,
        Feature::GoogleIndex,
        Feature::LinksPointingToPage,
        Feature::StatsReport,
    ];

    /// Column name used by the training dataset
    pub const fn name(self) -> &'static str {
        match self {
            Feature::UsingIp => "UsingIP",
            Feature::LongUrl => "LongURL",
            Feature::ShortUrl => "ShortURL",
            Feature::SymbolAt => "Symbol@",
            Feature::Redirecting => "Redirecting//",
            Feature::PrefixSuffix => "PrefixSuffix-",
            Feature::SubDomains => "SubDomains",
            Feature::Https => "HTTPS",
            Feature::DomainRegLen => "DomainRegLen",
            Feature::Favicon => "Favicon",
            Feature::NonStdPort => "NonStdPort",
            Feature::HttpsDomainUrl => "HTTPSDomainURL",
            Feature::RequestUrl => "RequestURL",
            Feature::AnchorUrl => "AnchorURL",
            Feature::LinksInScriptTags => "LinksInScriptTags",
            Feature::ServerFormHandler => "ServerFormHandler",
            Feature::InfoEmail => "InfoEmail",
            Feature::AbnormalUrl => "AbnormalURL",
            Feature::WebsiteForwarding => "WebsiteForwarding",
            Feature::StatusBarCust => "StatusBarCust",
            Feature::DisableRightClick => "DisableRightClick",
            Feature::UsingPopupWindow => "UsingPopupWindow",
            Feature::IframeRedirection => "IframeRedirection",
            Feature::AgeOfDomain => "AgeofDomain",
            Feature::DnsRecording => "DNSRecording",
            Feature::WebsiteTraffic => "WebsiteTraffic",
            Feature::PageRank => "PageRank",
            Feature::GoogleIndex => "GoogleIndex",
            Feature::LinksPointingToPage => "LinksPointingToPage",
            Feature::StatsReport => "StatsReport",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub const fn signal(self) -> Signal {
        match self {
            Feature::DomainRegLen
            | Feature::Favicon
            | Feature::RequestUrl
            | Feature::ServerFormHandler
            | Feature::StatusBarCust
            | Feature::DisableRightClick
            | Feature::UsingPopupWindow
            | Feature::IframeRedirection
            | Feature::AgeOfDomain
            | Feature::DnsRecording
            | Feature::GoogleIndex
            | Feature::LinksPointingToPage
            | Feature::StatsReport => Signal::Offline(1),
            Feature::AnchorUrl
            | Feature::LinksInScriptTags
            | Feature::WebsiteForwarding
            | Feature::WebsiteTraffic
            | Feature::PageRank => Signal::Offline(0),
            _ => Signal::Computed,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered feature layout a classifier was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// The 30-name order used when a bundle records none
    pub fn canonical() -> Self {
        Self {
            features: Feature::ALL.to_vec(),
        }
    }

    /// Validate a bundle's declared column order. Unknown or repeated names are rejected
    /// instead of being zero-filled at prediction time.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, BundleContractError> {
        if names.is_empty() {
            return Err(BundleContractError::EmptyFeatureOrder);
        }
        let mut seen = HashSet::with_capacity(names.len());
        let mut features = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let feature = Feature::from_name(name)
                .ok_or_else(|| BundleContractError::UnknownFeature(name.to_string()))?;
            if !seen.insert(feature) {
                return Err(BundleContractError::DuplicateFeature(name.to_string()));
            }
            features.push(feature);
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Serialize for FeatureSchema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.features.iter().map(|f| f.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_are_unique() {
        let names: HashSet<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Feature::COUNT);
        for f in Feature::ALL {
            assert_eq!(Feature::from_name(f.name()), Some(f));
        }
        assert_eq!(Feature::from_name("usingip"), None);
    }

    #[test]
    fn canonical_order_matches_training_columns() {
        let schema = FeatureSchema::canonical();
        assert_eq!(schema.len(), 30);
        assert_eq!(schema.names()[0], "UsingIP");
        assert_eq!(schema.names()[3], "Symbol@");
        assert_eq!(schema.names()[29], "StatsReport");
    }

    #[test]
    fn declared_order_is_preserved() {
        let schema = FeatureSchema::from_names(&["HTTPS", "UsingIP"]).unwrap();
        assert_eq!(schema.features(), &[Feature::Https, Feature::UsingIp]);
    }

    #[test]
    fn rejects_unknown_and_duplicate_names() {
        assert!(matches!(
            FeatureSchema::from_names(&["UsingIP", "Entropy"]),
            Err(BundleContractError::UnknownFeature(n)) if n == "Entropy"
        ));
        assert!(matches!(
            FeatureSchema::from_names(&["HTTPS", "HTTPS"]),
            Err(BundleContractError::DuplicateFeature(_))
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            FeatureSchema::from_names(&empty),
            Err(BundleContractError::EmptyFeatureOrder)
        ));
    }

    #[test]
    fn offline_signals_split_into_safe_and_neutral() {
        let safe = Feature::ALL
            .iter()
            .filter(|f| f.signal() == Signal::Offline(1))
            .count();
        let neutral = Feature::ALL
            .iter()
            .filter(|f| f.signal() == Signal::Offline(0))
            .count();
        assert_eq!(safe, 13);
        assert_eq!(neutral, 5);
    }
}
