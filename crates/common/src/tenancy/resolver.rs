//! Host resolution
//!
//! Classifies an inbound request host as the platform's own surface, a
//! tenant subdomain, or a tenant custom domain, and looks up the owning
//! tenant. Runs synchronously inside every public request path, so each
//! directory call carries its own short timeout.

use crate::domain;
use crate::errors::{AppError, Result};
use crate::tenancy::directory::{TenantDirectory, TenantSnapshot};
use crate::RESERVED_SLUGS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// How a host matched a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Subdomain,
    CustomDomain,
}

/// Outcome of resolving a request host
///
/// `NotFound` is a legitimate outcome (render "site not found"); a
/// directory failure is surfaced as `AppError::LookupFailed` instead so
/// callers can render a transient-error page, never "not found".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResolution {
    /// The platform's own marketing/admin surface, never a tenant
    Platform,
    /// A tenant storefront
    Tenant {
        tenant_id: Uuid,
        match_kind: MatchKind,
        matched: String,
        snapshot: TenantSnapshot,
    },
    /// No tenant matches this host
    NotFound,
}

/// Host resolver, shared across request handlers
#[derive(Clone)]
pub struct HostResolver {
    directory: Arc<dyn TenantDirectory>,
    base_domain: String,
    lookup_timeout: Duration,
}

impl HostResolver {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        base_domain: impl Into<String>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            base_domain: domain::clean(&base_domain.into()),
            lookup_timeout,
        }
    }

    /// Resolve a request host to its owning tenant
    ///
    /// Order matters: the base domain and its subdomains are checked
    /// before the host is treated as a candidate custom domain, so a
    /// custom domain ending in the base domain string can never hijack
    /// subdomain routing.
    pub async fn resolve(&self, host: &str) -> Result<HostResolution> {
        let host = domain::clean(host);
        let base = &self.base_domain;

        if host.is_empty() {
            return Ok(HostResolution::NotFound);
        }

        // clean() already stripped a leading "www.", so the bare form
        // covers www.{base} as well.
        if host == *base {
            return Ok(HostResolution::Platform);
        }

        if let Some(slug) = host.strip_suffix(&format!(".{}", base)) {
            // Reserved words win before any directory row could shadow them
            if RESERVED_SLUGS.contains(&slug) {
                return Ok(HostResolution::NotFound);
            }

            return match self.guarded(self.directory.find_by_slug(slug)).await? {
                Some(snapshot) => Ok(HostResolution::Tenant {
                    tenant_id: snapshot.id,
                    match_kind: MatchKind::Subdomain,
                    matched: slug.to_string(),
                    snapshot,
                }),
                None => Ok(HostResolution::NotFound),
            };
        }

        match self.guarded(self.directory.find_by_custom_domain(&host)).await? {
            Some(snapshot) => Ok(HostResolution::Tenant {
                tenant_id: snapshot.id,
                match_kind: MatchKind::CustomDomain,
                matched: host,
                snapshot,
            }),
            None => Ok(HostResolution::NotFound),
        }
    }

    /// Run a directory lookup under the resolver's timeout budget.
    /// Both a timeout and a directory error surface as LookupFailed.
    async fn guarded<F>(&self, lookup: F) -> Result<Option<TenantSnapshot>>
    where
        F: std::future::Future<Output = Result<Option<TenantSnapshot>>>,
    {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(e)) => Err(AppError::LookupFailed {
                message: e.to_string(),
            }),
            Err(_) => Err(AppError::LookupFailed {
                message: format!(
                    "directory lookup exceeded {}ms budget",
                    self.lookup_timeout.as_millis()
                ),
            }),
        }
    }
}
