//! Individual URL heuristics. Scores follow the phishing-dataset convention:
//! 1 looks legitimate, 0 is suspicious or unknown, -1 looks like phishing.
//! Every function is total; unparseable input yields the documented default.

use super::parts::UrlParts;
use regex::Regex;
use std::sync::OnceLock;

pub const LEGITIMATE: i8 = 1;
pub const SUSPICIOUS: i8 = 0;
pub const PHISHING: i8 = -1;

/// Known URL shortening services
pub const SHORTENERS: &[&str] = &[
    "bit.ly",
    "goo.gl",
    "tinyurl.com",
    "ow.ly",
    "t.co",
    "bitly.com",
    "buff.ly",
    "adf.ly",
    "is.gd",
    "soo.gd",
    "s2r.co",
    "tiny.cc",
];

/// Tokens typical of credential-harvesting pages
pub const SUSPICIOUS_TOKENS: &[&str] = &[
    "login", "verify", "update", "secure", "confirm", "account", "bank", "password",
];

static DOTTED_QUAD: OnceLock<Regex> = OnceLock::new();

fn dotted_quad_re() -> &'static Regex {
    DOTTED_QUAD.get_or_init(|| {
        Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("static dotted-quad pattern")
    })
}

fn flag(phishing: bool) -> i8 {
    if phishing {
        PHISHING
    } else {
        LEGITIMATE
    }
}

/// UsingIP: dotted-quad host under any scheme, behind userinfo, or with no scheme at all
pub fn using_ip(url: &UrlParts<'_>) -> i8 {
    match url.loose_host() {
        Some(host) => flag(dotted_quad_re().is_match(host)),
        None => LEGITIMATE,
    }
}

/// LongURL: character length against the short/medium thresholds
pub fn long_url(url: &UrlParts<'_>, short: usize, medium: usize) -> i8 {
    let len = url.raw().chars().count();
    if len < short {
        LEGITIMATE
    } else if len <= medium {
        SUSPICIOUS
    } else {
        PHISHING
    }
}

pub fn short_url(url: &UrlParts<'_>) -> i8 {
    match url.host() {
        Some(host) => flag(SHORTENERS.contains(&host)),
        None => LEGITIMATE,
    }
}

pub fn symbol_at(url: &UrlParts<'_>) -> i8 {
    flag(url.raw().contains('@'))
}

/// Redirecting//: a `//` past the scheme delimiter (character index > 6)
pub fn double_slash_redirect(url: &UrlParts<'_>) -> i8 {
    let raw = url.raw();
    match raw.rfind("//") {
        Some(at) => flag(raw[..at].chars().count() > 6),
        None => LEGITIMATE,
    }
}

/// PrefixSuffix-: dash inside the registrable domain label
pub fn prefix_suffix(url: &UrlParts<'_>) -> i8 {
    match url.domain() {
        Some(d) => flag(d.label.contains('-')),
        None => LEGITIMATE,
    }
}

pub fn sub_domains(url: &UrlParts<'_>) -> i8 {
    match url.domain().map(|d| d.subdomain_labels()) {
        Some(0) => LEGITIMATE,
        Some(1) => SUSPICIOUS,
        Some(_) => PHISHING,
        None => SUSPICIOUS,
    }
}

pub fn https(url: &UrlParts<'_>) -> i8 {
    match url.scheme() {
        Some("https") => LEGITIMATE,
        Some("http") => SUSPICIOUS,
        _ => PHISHING,
    }
}

pub fn non_std_port(url: &UrlParts<'_>) -> i8 {
    match url.port() {
        Some(port) => flag(port != 80 && port != 443),
        None => LEGITIMATE,
    }
}

/// HTTPSDomainURL: "https" spelled into the host to fake a secure look
pub fn https_in_host(url: &UrlParts<'_>) -> i8 {
    match url.host() {
        Some(host) => flag(host.contains("https")),
        None => LEGITIMATE,
    }
}

pub fn info_email(url: &UrlParts<'_>) -> i8 {
    flag(url.raw().contains("mailto:"))
}

pub fn abnormal_url(url: &UrlParts<'_>) -> i8 {
    let lowered = url.raw().to_lowercase();
    flag(SUSPICIOUS_TOKENS.iter().any(|t| lowered.contains(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(s: &str) -> UrlParts<'_> {
        UrlParts::parse(s)
    }

    #[test]
    fn ip_hosts() {
        assert_eq!(using_ip(&parts("http://192.168.1.1/x")), PHISHING);
        assert_eq!(using_ip(&parts("10.0.0.1:8080")), PHISHING);
        assert_eq!(using_ip(&parts("https://8.8.8.8")), PHISHING);
        assert_eq!(using_ip(&parts("http://192.168.1.1.example.com/")), LEGITIMATE);
        assert_eq!(using_ip(&parts("http://example.com/192.168.1.1")), LEGITIMATE);
        assert_eq!(using_ip(&parts("")), LEGITIMATE);
    }

    #[test]
    fn ip_hosts_behind_userinfo_or_uppercase_scheme() {
        assert_eq!(using_ip(&parts("http://user@192.168.1.1/")), PHISHING);
        assert_eq!(using_ip(&parts("HTTP://192.168.1.1/")), PHISHING);
        assert_eq!(using_ip(&parts("ftp://10.1.2.3:21/pub")), PHISHING);
        assert_eq!(using_ip(&parts("http://192.168.1.1@example.com/")), LEGITIMATE);
    }

    #[test]
    fn length_bands() {
        let short = "http://a.io/";
        let medium = format!("http://a.io/{}", "x".repeat(54 - 12));
        let long = format!("http://a.io/{}", "x".repeat(80));
        assert_eq!(long_url(&parts(short), 54, 75), LEGITIMATE);
        assert_eq!(medium.len(), 54);
        assert_eq!(long_url(&parts(&medium), 54, 75), SUSPICIOUS);
        assert_eq!(long_url(&parts(&long), 54, 75), PHISHING);
    }

    #[test]
    fn length_counts_characters() {
        let url = format!("http://a.io/{}", "é".repeat(45));
        assert_eq!(long_url(&parts(&url), 54, 75), SUSPICIOUS);
    }

    #[test]
    fn shorteners() {
        assert_eq!(short_url(&parts("http://bit.ly/abc")), PHISHING);
        assert_eq!(short_url(&parts("https://T.CO:443/x")), PHISHING);
        assert_eq!(short_url(&parts("https://bit.ly.example.com/")), LEGITIMATE);
        // no scheme: host cannot be parsed
        assert_eq!(short_url(&parts("bit.ly/abc")), LEGITIMATE);
    }

    #[test]
    fn double_slash_position() {
        assert_eq!(double_slash_redirect(&parts("https://example.com/a")), LEGITIMATE);
        assert_eq!(double_slash_redirect(&parts("http://example.com//evil.com")), PHISHING);
        assert_eq!(double_slash_redirect(&parts("no slashes")), LEGITIMATE);
    }

    #[test]
    fn dash_in_registrable_label() {
        assert_eq!(prefix_suffix(&parts("https://pay-pal.com/")), PHISHING);
        assert_eq!(prefix_suffix(&parts("https://my-shop.example.com/")), LEGITIMATE);
        assert_eq!(prefix_suffix(&parts("")), LEGITIMATE);
    }

    #[test]
    fn subdomain_counts() {
        assert_eq!(sub_domains(&parts("https://example.com")), LEGITIMATE);
        assert_eq!(sub_domains(&parts("https://www.example.com")), SUSPICIOUS);
        assert_eq!(sub_domains(&parts("https://sub.sub2.example.com")), PHISHING);
        assert_eq!(sub_domains(&parts("")), SUSPICIOUS);
    }

    #[test]
    fn schemes() {
        assert_eq!(https(&parts("https://x.com")), LEGITIMATE);
        assert_eq!(https(&parts("HTTP://x.com")), SUSPICIOUS);
        assert_eq!(https(&parts("ftp://x.com")), PHISHING);
        assert_eq!(https(&parts("x.com")), PHISHING);
    }

    #[test]
    fn ports() {
        assert_eq!(non_std_port(&parts("http://x.com:8080/")), PHISHING);
        assert_eq!(non_std_port(&parts("https://x.com:80/")), LEGITIMATE);
        assert_eq!(non_std_port(&parts("http://x.com:443/")), LEGITIMATE);
        assert_eq!(non_std_port(&parts("http://x.com/")), LEGITIMATE);
        assert_eq!(non_std_port(&parts("http://x.com:99999/")), PHISHING);
    }

    #[test]
    fn explicit_default_port_of_other_schemes() {
        assert_eq!(non_std_port(&parts("ftp://files.example.com:21/")), PHISHING);
        assert_eq!(non_std_port(&parts("https://example.com:443/")), LEGITIMATE);
    }

    #[test]
    fn schemed_urls_that_fail_strict_parsing() {
        let bad_port = parts("https://example.com:99999/");
        assert_eq!(https(&bad_port), LEGITIMATE);

        let spoof = parts("http://https-paypal.com:99999/");
        assert_eq!(https(&spoof), SUSPICIOUS);
        assert_eq!(https_in_host(&spoof), PHISHING);
        assert_eq!(non_std_port(&spoof), PHISHING);

        let bad_octet = parts("http://1.2.3.256/");
        assert_eq!(https(&bad_octet), SUSPICIOUS);
        assert_eq!(using_ip(&bad_octet), PHISHING);

        assert_eq!(short_url(&parts("http://bit.ly:99999/abc")), PHISHING);
    }

    #[test]
    fn private_suffix_hosts() {
        let blog = parts("https://login-secure.blogspot.com/");
        assert_eq!(prefix_suffix(&blog), LEGITIMATE);
        assert_eq!(sub_domains(&blog), SUSPICIOUS);
        assert_eq!(sub_domains(&parts("https://a.b.github.io/")), PHISHING);
    }

    #[test]
    fn https_token_in_host_only() {
        assert_eq!(https_in_host(&parts("http://https-secure.com/")), PHISHING);
        assert_eq!(https_in_host(&parts("https://example.com/https")), LEGITIMATE);
    }

    #[test]
    fn token_rules() {
        assert_eq!(symbol_at(&parts("http://a@b.com")), PHISHING);
        assert_eq!(info_email(&parts("mailto:x@y.com")), PHISHING);
        assert_eq!(abnormal_url(&parts("http://x.com/LOGIN")), PHISHING);
        assert_eq!(abnormal_url(&parts("http://x.com/home")), LEGITIMATE);
    }
}
