//! Best-effort views of a raw URL string. Nothing here fails: every accessor returns
//! `None` when the corresponding part cannot be recovered.

use std::net::IpAddr;
use url::Url;

/// Registrable-domain split of a host, e.g. `a.b.example.co.uk` →
/// (`a.b`, `example`, `co.uk`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainParts<'a> {
    pub subdomain: &'a str,
    pub label: &'a str,
    pub suffix: &'a str,
}

impl DomainParts<'_> {
    pub fn subdomain_labels(&self) -> usize {
        if self.subdomain.is_empty() {
            0
        } else {
            self.subdomain.split('.').count()
        }
    }
}

#[derive(Debug, Clone)]
pub struct UrlParts<'a> {
    raw: &'a str,
    parsed: Option<Url>,
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u32>,
    loose_host: Option<String>,
}

impl<'a> UrlParts<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let parsed = Url::parse(raw).ok();
        let lowered = raw.trim().to_lowercase();
        let start = authority_start(&lowered);
        let scheme = parsed.as_ref().map(|u| u.scheme().to_string()).or_else(|| {
            start
                .and_then(|i| lowered[..i].strip_suffix("://"))
                .map(str::to_string)
        });
        let (authority, explicit) = match start {
            Some(i) => (netloc(&lowered[i..]), true),
            None => (netloc(&lowered), false),
        };
        let (host, port) = split_host_port(authority);
        let host = host.trim().trim_end_matches('.');
        let host = (!host.is_empty()).then(|| host.to_string());
        let port = port.and_then(parse_port);
        Self {
            raw,
            parsed,
            scheme,
            host: if explicit { host.clone() } else { None },
            port: if explicit { port } else { None },
            loose_host: host,
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Lower-cased scheme. Falls back to the raw `scheme://` prefix when the
    /// string does not parse strictly (bad port, bad IPv4 octet).
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Whether the string parsed as an absolute URL
    pub fn is_strict(&self) -> bool {
        self.parsed.is_some()
    }

    /// Host of the `scheme://` or `//` authority, lower-cased, without userinfo or port
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Port written in the authority, default ports included (`ftp://x:21`)
    pub fn port(&self) -> Option<u32> {
        self.port
    }

    /// Host recovered leniently, also for strings without a scheme (`bit.ly/x`)
    pub fn loose_host(&self) -> Option<&str> {
        self.loose_host.as_deref()
    }

    /// Split the lenient host on the ICANN part of the public suffix list.
    /// IP literals are their own label; an unlisted TLD leaves the suffix empty.
    pub fn domain(&self) -> Option<DomainParts<'_>> {
        let host = self.loose_host.as_deref()?;
        if host.parse::<IpAddr>().is_ok() {
            return Some(DomainParts {
                subdomain: "",
                label: host,
                suffix: "",
            });
        }
        let suffix = icann_suffix(host);
        let head = match suffix {
            Some(suffix) => host.strip_suffix(suffix)?.strip_suffix('.')?,
            None => host,
        };
        let (subdomain, label) = head.rsplit_once('.').unwrap_or(("", head));
        if label.is_empty() {
            return None;
        }
        Some(DomainParts {
            subdomain,
            label,
            suffix: suffix.unwrap_or(""),
        })
    }
}

/// ICANN suffix of `host`. Private rules (`blogspot.com`, `github.io`) are skipped
/// by retrying on their parent suffix.
fn icann_suffix(host: &str) -> Option<&str> {
    let mut rest = host;
    loop {
        let suffix = psl::suffix(rest.as_bytes())?;
        let text = std::str::from_utf8(suffix.as_bytes()).ok()?;
        match suffix.typ() {
            Some(psl::Type::Icann) => return Some(text),
            Some(psl::Type::Private) => rest = text.split_once('.')?.1,
            None => return None,
        }
    }
}

/// Characters allowed in a scheme before `://`
fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

/// Offset of the authority when the string starts with `scheme://` or `//`
fn authority_start(url: &str) -> Option<usize> {
    if url.starts_with("//") {
        return Some(2);
    }
    let at = url.find("://")?;
    let scheme = &url[..at];
    let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme.chars().all(is_scheme_char);
    valid.then_some(at + 3)
}

fn netloc(rest: &str) -> &str {
    rest.split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or("")
}

/// Host and port text of a netloc, after dropping userinfo
fn split_host_port(netloc: &str) -> (&str, Option<&str>) {
    let host_port = netloc.rsplit('@').next().unwrap_or("");
    if let Some(v6) = host_port.strip_prefix('[') {
        match v6.split_once(']') {
            Some((host, rest)) => (host, rest.strip_prefix(':')),
            None => (v6, None),
        }
    } else {
        match host_port.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    }
}

/// Up to five digits; out-of-range values such as 99999 are still ports here
fn parse_port(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 5 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parts() {
        let p = UrlParts::parse("HTTPS://User@Example.COM:8443/a?b#c");
        assert_eq!(p.scheme(), Some("https"));
        assert_eq!(p.host(), Some("example.com"));
        assert_eq!(p.port(), Some(8443));
    }

    #[test]
    fn explicit_default_port_is_kept() {
        assert_eq!(UrlParts::parse("http://example.com:80/").port(), Some(80));
        assert_eq!(UrlParts::parse("ftp://files.example.com:21/").port(), Some(21));
        assert_eq!(UrlParts::parse("http://example.com/").port(), None);
        assert_eq!(UrlParts::parse("http://example.com:/").port(), None);
    }

    #[test]
    fn schemed_url_that_fails_strict_parsing() {
        let p = UrlParts::parse("HTTPS://Pay-Https.example.com:99999/login");
        assert!(!p.is_strict());
        assert_eq!(p.scheme(), Some("https"));
        assert_eq!(p.host(), Some("pay-https.example.com"));
        assert_eq!(p.port(), Some(99999));

        let p = UrlParts::parse("http://1.2.3.256/");
        assert!(!p.is_strict());
        assert_eq!(p.scheme(), Some("http"));
        assert_eq!(p.host(), Some("1.2.3.256"));
    }

    #[test]
    fn schemeless_input_has_loose_host_only() {
        let p = UrlParts::parse("bit.ly/abc");
        assert_eq!(p.scheme(), None);
        assert_eq!(p.host(), None);
        assert_eq!(p.port(), None);
        assert_eq!(p.loose_host(), Some("bit.ly"));

        let p = UrlParts::parse("10.0.0.1:8080");
        assert_eq!(p.port(), None);
        assert_eq!(p.loose_host(), Some("10.0.0.1"));
    }

    #[test]
    fn loose_host_strips_userinfo_port_and_path() {
        let loose = |s: &str| UrlParts::parse(s).loose_host().map(str::to_string);
        assert_eq!(
            loose("ftp://me:pw@Files.Example.org:2121/x").as_deref(),
            Some("files.example.org")
        );
        assert_eq!(loose("//cdn.example.net/a").as_deref(), Some("cdn.example.net"));
        assert_eq!(loose("http://[::1]:8080/").as_deref(), Some("::1"));
        assert_eq!(UrlParts::parse("http://[::1]:8080/").port(), Some(8080));
        assert_eq!(loose(""), None);
        assert_eq!(loose("http:///path"), None);
    }

    #[test]
    fn domain_split_uses_public_suffix_list() {
        let p = UrlParts::parse("https://a.b.example.co.uk/x");
        let d = p.domain().unwrap();
        assert_eq!(d.subdomain, "a.b");
        assert_eq!(d.label, "example");
        assert_eq!(d.suffix, "co.uk");
        assert_eq!(d.subdomain_labels(), 2);
    }

    #[test]
    fn private_suffixes_are_not_registrable() {
        let p = UrlParts::parse("https://login-secure.blogspot.com/");
        let d = p.domain().unwrap();
        assert_eq!((d.subdomain, d.label, d.suffix), ("login-secure", "blogspot", "com"));

        let p = UrlParts::parse("https://a.b.github.io/");
        let d = p.domain().unwrap();
        assert_eq!((d.subdomain, d.label, d.suffix), ("a.b", "github", "io"));
        assert_eq!(d.subdomain_labels(), 2);

        let p = UrlParts::parse("http://my-app.herokuapp.com");
        assert_eq!(p.domain().unwrap().label, "herokuapp");
    }

    #[test]
    fn unlisted_tld_keeps_last_label() {
        let p = UrlParts::parse("http://intranet.corp.zzinvalid/");
        let d = p.domain().unwrap();
        assert_eq!((d.subdomain, d.label, d.suffix), ("intranet.corp", "zzinvalid", ""));
        assert!(UrlParts::parse("http://co.uk/").domain().is_none());
    }

    #[test]
    fn ip_host_has_no_subdomain() {
        let p = UrlParts::parse("http://10.0.0.1/login");
        let d = p.domain().unwrap();
        assert_eq!(d.subdomain_labels(), 0);
        assert_eq!(d.label, "10.0.0.1");
    }

    #[test]
    fn empty_input_has_nothing() {
        let p = UrlParts::parse("");
        assert_eq!(p.scheme(), None);
        assert_eq!(p.host(), None);
        assert!(p.domain().is_none());
    }
}
