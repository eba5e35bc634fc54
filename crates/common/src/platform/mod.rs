//! Hosting-platform domain bindings
//!
//! The platform attaches custom domains to the running application and
//! issues TLS certificates for them. Its domain API is full-replace,
//! not incremental: the binder always reads the latest list and writes
//! back the complete desired set so unrelated tenants' domains are
//! never clobbered.

mod digitalocean;

pub use digitalocean::DigitalOceanApps;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Binding role of a domain on the platform app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainKind {
    Primary,
    Alias,
}

/// One entry in the platform app's domain list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDomain {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    /// The DNS zone the domain belongs to
    pub zone: String,
    #[serde(default)]
    pub wildcard: bool,
}

impl PlatformDomain {
    pub fn primary(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            kind: DomainKind::Primary,
            zone: domain.to_string(),
            wildcard: false,
        }
    }

    pub fn alias(domain: &str, zone: &str) -> Self {
        Self {
            domain: domain.to_string(),
            kind: DomainKind::Alias,
            zone: zone.to_string(),
            wildcard: false,
        }
    }
}

/// TLS certificate state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateState {
    Issued,
    Pending,
    Unknown,
}

/// Informational binding status for the operator UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingStatus {
    pub domain: String,
    pub bound: bool,
    pub kind: Option<DomainKind>,
    pub certificate: CertificateState,
}

impl BindingStatus {
    pub fn absent(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            bound: false,
            kind: None,
            certificate: CertificateState::Unknown,
        }
    }
}

/// Hosting-platform API surface this core consumes
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Fetch the app's current domain list
    async fn fetch_domains(&self) -> Result<Vec<PlatformDomain>>;

    /// Replace the app's domain list wholesale
    async fn replace_domains(&self, domains: &[PlatformDomain]) -> Result<()>;

    /// Fetch binding and certificate state for one domain
    async fn domain_status(&self, domain: &str) -> Result<Option<BindingStatus>>;
}

/// Outcome of a bind call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindOutcome {
    /// Both the primary and the www alias were already present
    AlreadyBound,
    /// The missing entries were added
    Bound,
}

/// Registers verified domains (and their www aliases) with the platform
#[derive(Clone)]
pub struct PlatformBinder {
    api: Arc<dyn PlatformApi>,
}

impl PlatformBinder {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self { api }
    }

    /// Idempotently bind `domain` and `www.domain` to the platform app.
    ///
    /// No mutating call is made when both entries already exist.
    pub async fn bind(&self, domain: &str) -> Result<BindOutcome> {
        let current = self.api.fetch_domains().await?;

        let www = format!("www.{}", domain);
        let has_primary = current.iter().any(|d| d.domain == domain);
        let has_alias = current.iter().any(|d| d.domain == www);

        if has_primary && has_alias {
            info!(domain, "Domain already bound to platform app");
            return Ok(BindOutcome::AlreadyBound);
        }

        // Full-replace API: carry every existing entry forward and append
        // only what is missing.
        let mut desired = current;
        if !has_primary {
            desired.push(PlatformDomain::primary(domain));
        }
        if !has_alias {
            desired.push(PlatformDomain::alias(&www, domain));
        }

        self.api.replace_domains(&desired).await?;
        info!(domain, www = %www, "Domain bound to platform app, certificate issuance pending");
        Ok(BindOutcome::Bound)
    }

    /// Informational binding/certificate state for one domain
    pub async fn status(&self, domain: &str) -> Result<BindingStatus> {
        match self.api.domain_status(domain).await? {
            Some(status) => Ok(status),
            None => Ok(BindingStatus::absent(domain)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::Mutex;

    struct FakePlatform {
        domains: Mutex<Vec<PlatformDomain>>,
        replace_calls: Mutex<u32>,
    }

    impl FakePlatform {
        fn with(domains: Vec<PlatformDomain>) -> Arc<Self> {
            Arc::new(Self {
                domains: Mutex::new(domains),
                replace_calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl PlatformApi for FakePlatform {
        async fn fetch_domains(&self) -> Result<Vec<PlatformDomain>> {
            Ok(self.domains.lock().unwrap().clone())
        }

        async fn replace_domains(&self, domains: &[PlatformDomain]) -> Result<()> {
            *self.replace_calls.lock().unwrap() += 1;
            *self.domains.lock().unwrap() = domains.to_vec();
            Ok(())
        }

        async fn domain_status(&self, domain: &str) -> Result<Option<BindingStatus>> {
            let found = self
                .domains
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.domain == domain)
                .map(|d| BindingStatus {
                    domain: d.domain.clone(),
                    bound: true,
                    kind: Some(d.kind),
                    certificate: CertificateState::Pending,
                });
            Ok(found)
        }
    }

    #[tokio::test]
    async fn test_bind_adds_primary_and_alias() {
        let platform = FakePlatform::with(vec![PlatformDomain::primary("other.example")]);
        let binder = PlatformBinder::new(platform.clone());

        let outcome = binder.bind("acme.example").await.unwrap();
        assert_eq!(outcome, BindOutcome::Bound);

        let domains = platform.domains.lock().unwrap();
        assert_eq!(domains.len(), 3);
        // Unrelated tenant's domain survives the read-modify-write
        assert!(domains.iter().any(|d| d.domain == "other.example"));
        assert!(domains
            .iter()
            .any(|d| d.domain == "acme.example" && d.kind == DomainKind::Primary));
        assert!(domains
            .iter()
            .any(|d| d.domain == "www.acme.example"
                && d.kind == DomainKind::Alias
                && d.zone == "acme.example"));
    }

    #[tokio::test]
    async fn test_bind_is_idempotent() {
        let platform = FakePlatform::with(vec![
            PlatformDomain::primary("acme.example"),
            PlatformDomain::alias("www.acme.example", "acme.example"),
        ]);
        let binder = PlatformBinder::new(platform.clone());

        let outcome = binder.bind("acme.example").await.unwrap();
        assert_eq!(outcome, BindOutcome::AlreadyBound);
        assert_eq!(*platform.replace_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bind_fills_in_missing_alias() {
        let platform = FakePlatform::with(vec![PlatformDomain::primary("acme.example")]);
        let binder = PlatformBinder::new(platform.clone());

        let outcome = binder.bind("acme.example").await.unwrap();
        assert_eq!(outcome, BindOutcome::Bound);

        let domains = platform.domains.lock().unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(
            domains.iter().filter(|d| d.domain == "acme.example").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_status_absent_domain() {
        let platform = FakePlatform::with(vec![]);
        let binder = PlatformBinder::new(platform);

        let status = binder.status("ghost.example").await.unwrap();
        assert!(!status.bound);
        assert_eq!(status.certificate, CertificateState::Unknown);
    }

    struct FailingPlatform;

    #[async_trait]
    impl PlatformApi for FailingPlatform {
        async fn fetch_domains(&self) -> Result<Vec<PlatformDomain>> {
            Err(AppError::platform("api down"))
        }
        async fn replace_domains(&self, _: &[PlatformDomain]) -> Result<()> {
            Err(AppError::platform("api down"))
        }
        async fn domain_status(&self, _: &str) -> Result<Option<BindingStatus>> {
            Err(AppError::platform("api down"))
        }
    }

    #[tokio::test]
    async fn test_bind_propagates_provider_failure() {
        let binder = PlatformBinder::new(Arc::new(FailingPlatform));
        let err = binder.bind("acme.example").await.unwrap_err();
        assert!(matches!(err, AppError::ProviderUnavailable { .. }));
    }
}
