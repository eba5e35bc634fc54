//! Canonical public URL computation
//!
//! Deterministic over a tenant snapshot: no I/O, no re-verification.
//! The zone status carried in the snapshot is the source of truth for
//! whether a custom domain is safe to present publicly.

use crate::tenancy::directory::TenantSnapshot;

/// Compute the canonical base URL for a tenant's content.
///
/// The custom domain wins only when the tenant prefers it, one is set,
/// and its DNS zone is active; otherwise the subdomain-path form under
/// the request origin is used.
pub fn canonical_base(tenant: &TenantSnapshot, origin: &str) -> String {
    if tenant.prefer_custom_domain_for_canonical && tenant.custom_domain_active {
        if let Some(ref custom) = tenant.custom_domain {
            return format!("https://{}", custom);
        }
    }

    let origin = origin.trim_end_matches('/');
    format!("{}/{}", origin, tenant.slug)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tenant(prefer: bool, custom: Option<&str>, zone_active: bool) -> TenantSnapshot {
        TenantSnapshot {
            id: Uuid::new_v4(),
            slug: "acme".into(),
            custom_domain: custom.map(String::from),
            custom_domain_active: zone_active,
            prefer_custom_domain_for_canonical: prefer,
            is_active: true,
        }
    }

    #[test]
    fn test_prefers_active_custom_domain() {
        let t = tenant(true, Some("acme.example"), true);
        assert_eq!(canonical_base(&t, "https://saas.test"), "https://acme.example");
    }

    #[test]
    fn test_falls_back_when_preference_off() {
        let t = tenant(false, Some("acme.example"), true);
        assert_eq!(canonical_base(&t, "https://saas.test"), "https://saas.test/acme");
    }

    #[test]
    fn test_falls_back_when_zone_not_active() {
        // A pending zone must never surface its domain publicly
        let t = tenant(true, Some("acme.example"), false);
        assert_eq!(canonical_base(&t, "https://saas.test"), "https://saas.test/acme");
    }

    #[test]
    fn test_falls_back_without_custom_domain() {
        let t = tenant(true, None, false);
        assert_eq!(canonical_base(&t, "https://saas.test"), "https://saas.test/acme");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let t = tenant(false, None, false);
        assert_eq!(canonical_base(&t, "https://saas.test/"), "https://saas.test/acme");
    }

    #[test]
    fn test_deterministic_for_same_snapshot() {
        let t = tenant(true, Some("acme.example"), true);
        let a = canonical_base(&t, "https://saas.test");
        let b = canonical_base(&t, "https://saas.test");
        assert_eq!(a, b);
    }
}
