//! Domain name normalization and validation
//!
//! Pure helpers shared by the host resolver and the provisioning
//! workflow. Every operator-supplied domain passes through `clean` and
//! `is_valid` before any external provider call is made.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Normalize a domain string: lowercase, strip a leading scheme, a leading
/// `www.`, a single trailing slash, and surrounding whitespace.
///
/// Total and idempotent: `clean(clean(d)) == clean(d)` for any input.
///
/// ```
/// use brokerforge_common::domain::clean;
/// assert_eq!(clean("https://www.Example.COM/"), "example.com");
/// ```
pub fn clean(domain: &str) -> String {
    let mut d = domain.trim().to_lowercase();
    if let Some(rest) = d.strip_prefix("https://") {
        d = rest.to_string();
    } else if let Some(rest) = d.strip_prefix("http://") {
        d = rest.to_string();
    }
    if let Some(rest) = d.strip_prefix("www.") {
        d = rest.to_string();
    }
    if let Some(rest) = d.strip_suffix('/') {
        d = rest.to_string();
    }
    d.trim().to_string()
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Labels of 1-63 chars from [a-z0-9-], no leading/trailing hyphen,
        // at least one dot, final label alphabetic-led.
        Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z][a-z0-9-]{0,61}[a-z0-9]$")
            .expect("domain regex is valid")
    })
}

/// Check whether a (pre-normalized) string is a conventional DNS hostname.
///
/// ```
/// use brokerforge_common::domain::is_valid;
/// assert!(is_valid("example.com"));
/// assert!(is_valid("sub.example.com"));
/// assert!(!is_valid("invalid domain"));
/// ```
pub fn is_valid(domain: &str) -> bool {
    domain_regex().is_match(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_scheme_www_and_slash() {
        assert_eq!(clean("https://www.Example.COM/"), "example.com");
        assert_eq!(clean("HTTP://EXAMPLE.COM"), "example.com");
        assert_eq!(clean("  example.com  "), "example.com");
        assert_eq!(clean("example.com"), "example.com");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in [
            "https://www.Example.COM/",
            "http://foo.bar/",
            "WWW.ACME.EXAMPLE",
            "already.clean.example",
            "",
            "   ",
            "not a domain at all",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once, "clean not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_clean_strips_only_one_www() {
        // www.www.example.com is a legitimate (if odd) host
        assert_eq!(clean("www.www.example.com"), "www.example.com");
    }

    #[test]
    fn test_valid_domains() {
        assert!(is_valid("example.com"));
        assert!(is_valid("sub.example.com"));
        assert!(is_valid("imobiliaria-prime.com.br"));
        assert!(is_valid("a.co"));
    }

    #[test]
    fn test_invalid_domains() {
        assert!(!is_valid("invalid domain"));
        assert!(!is_valid("no-dots"));
        assert!(!is_valid("-leading.example.com"));
        assert!(!is_valid("trailing-.example.com"));
        assert!(!is_valid("example.123"));
        assert!(!is_valid(""));
        assert!(!is_valid("UPPER.example.com"));
    }

    #[test]
    fn test_label_length_limit() {
        let long_label = "a".repeat(64);
        assert!(!is_valid(&format!("{}.example.com", long_label)));
        let max_label = "a".repeat(63);
        assert!(is_valid(&format!("{}.example.com", max_label)));
    }
}
