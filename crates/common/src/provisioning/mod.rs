//! Custom-domain provisioning orchestration
//!
//! Sequences the DNS zone manager and the platform binder for the
//! workflow an operator triggers when adding (or removing) a custom
//! domain. Every entry point is idempotent and driven by an external
//! poller; the orchestrator never schedules its own retries.

mod state;

pub use state::{advance, ZoneTransition};

use crate::db::models::{DnsRecord, DnsZone, ZoneStatus};
use crate::db::{NewDnsRecord, NewZone};
use crate::dns::{DnsProvider, NsResolver, RecordSpec, RecordType};
use crate::domain;
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::platform::{BindOutcome, BindingStatus, PlatformBinder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Persistence seam for zones and their records
///
/// The repository implements this against Postgres; tests use an
/// in-memory store. `insert` and `remove` are transactional with the
/// tenant's `custom_domain` column — the local database is the
/// durability boundary, external provider calls are not.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Whether the tenant row exists at all (active or not)
    async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool>;

    async fn find_by_domain(&self, domain: &str) -> Result<Option<DnsZone>>;

    async fn find_by_id(&self, zone_id: Uuid) -> Result<Option<DnsZone>>;

    async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Option<DnsZone>>;

    /// Persist a new pending zone and set the tenant's custom domain
    async fn insert(&self, zone: NewZone) -> Result<DnsZone>;

    /// Apply a verification transition; must keep `activated_at` stable
    /// once set and stamp `last_checked_at`
    async fn record_check(&self, zone_id: Uuid, transition: &ZoneTransition) -> Result<DnsZone>;

    /// Delete the zone and its records, clearing the tenant's custom
    /// domain in the same transaction; returns the removed zone
    async fn remove(&self, tenant_id: Uuid) -> Result<DnsZone>;

    async fn insert_record(&self, record: NewDnsRecord) -> Result<DnsRecord>;
}

/// Policy knobs for the orchestrator, taken from configuration
#[derive(Debug, Clone)]
pub struct ProvisionerSettings {
    /// CNAME target for the bootstrap records of a fresh zone
    pub base_domain: String,
    /// Suffix identifying the provider's own nameservers
    pub nameserver_suffix: String,
    /// Give-up threshold for NXDOMAIN verification attempts
    pub max_verification_attempts: i32,
    /// TTL applied to bootstrap records
    pub record_ttl_secs: i32,
}

/// One DNS setup step returned to the operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRecord {
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: i32,
}

/// Returned from a successful domain submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReceipt {
    pub zone_id: Uuid,
    pub domain: String,
    pub status: ZoneStatus,
    /// Nameservers the operator must configure at their registrar
    pub nameservers: Vec<String>,
    pub setup_records: Vec<SetupRecord>,
}

/// Returned from a verification poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOutcome {
    pub domain: String,
    pub status: ZoneStatus,
    pub attempts: i32,
    pub nameservers_seen: Vec<String>,
    /// Present when this poll reached the platform binder
    pub bound: Option<BindOutcome>,
}

/// Drives the add/verify/remove custom-domain workflow
#[derive(Clone)]
pub struct Provisioner {
    zones: Arc<dyn ZoneStore>,
    dns: Arc<dyn DnsProvider>,
    ns_resolver: Arc<dyn NsResolver>,
    binder: PlatformBinder,
    settings: ProvisionerSettings,
}

impl Provisioner {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        dns: Arc<dyn DnsProvider>,
        ns_resolver: Arc<dyn NsResolver>,
        binder: PlatformBinder,
        settings: ProvisionerSettings,
    ) -> Self {
        Self {
            zones,
            dns,
            ns_resolver,
            binder,
            settings,
        }
    }

    /// Submit a domain for provisioning.
    ///
    /// Validation and duplicate checks run before any external call, so
    /// bad operator input has zero external side effects. Returns setup
    /// instructions immediately; propagation is observed via `poll`.
    pub async fn submit(&self, tenant_id: Uuid, raw_domain: &str) -> Result<ProvisionReceipt> {
        let domain = domain::clean(raw_domain);
        if !domain::is_valid(&domain) {
            return Err(AppError::InvalidFormat { domain });
        }

        // The tenant must exist before the provider-side zone does;
        // otherwise the zone is orphaned at the provider and the domain
        // is taken there with no local row to clean up.
        if !self.zones.tenant_exists(tenant_id).await? {
            return Err(AppError::TenantNotFound {
                id: tenant_id.to_string(),
            });
        }

        if self.zones.find_by_domain(&domain).await?.is_some() {
            return Err(AppError::DuplicateDomain { domain });
        }
        // Double-submit guard: one zone per tenant
        if self.zones.find_by_tenant(tenant_id).await?.is_some() {
            return Err(AppError::DuplicateDomain { domain });
        }

        let created = self.dns.create_zone(&domain).await?;
        metrics::record_zone_event("created");

        // Bootstrap records so www and wildcard hosts route to the
        // storefront once the zone is authoritative. Best-effort: the
        // zone itself is what matters here.
        let target = format!("{}.", self.settings.base_domain);
        for name in ["www", "*"] {
            let record = RecordSpec {
                record_type: RecordType::Cname,
                name: name.to_string(),
                value: target.clone(),
                priority: None,
                ttl: self.settings.record_ttl_secs,
            };
            if let Err(e) = self.dns.add_record(&domain, &record).await {
                warn!(domain = %domain, name, error = %e, "Bootstrap record creation failed");
            }
        }

        let zone = self
            .zones
            .insert(NewZone {
                tenant_id,
                domain: domain.clone(),
                nameservers: created.nameservers.clone(),
            })
            .await?;

        info!(domain = %domain, zone_id = %zone.id, "DNS zone created, awaiting nameserver propagation");

        let setup_records = created
            .nameservers
            .iter()
            .map(|ns| SetupRecord {
                record_type: "NS".to_string(),
                name: "@".to_string(),
                value: ns.clone(),
                ttl: self.settings.record_ttl_secs,
            })
            .collect();

        Ok(ProvisionReceipt {
            zone_id: zone.id,
            domain,
            status: zone.zone_status(),
            nameservers: created.nameservers,
            setup_records,
        })
    }

    /// One verification poll for a zone.
    ///
    /// Idempotent and safe under racing calls: the underlying transition
    /// is monotonic and an already-active zone only re-checks its
    /// platform binding.
    pub async fn poll(&self, raw_domain: &str) -> Result<PollOutcome> {
        let domain = domain::clean(raw_domain);
        let zone = self
            .zones
            .find_by_domain(&domain)
            .await?
            .ok_or_else(|| AppError::ZoneNotFound { domain: domain.clone() })?;

        match zone.zone_status() {
            ZoneStatus::Failed => Ok(PollOutcome {
                domain,
                status: ZoneStatus::Failed,
                attempts: zone.verification_attempts,
                nameservers_seen: Vec::new(),
                bound: None,
            }),
            ZoneStatus::Active => {
                // Re-assert the platform binding; heals a bind that
                // failed on the activating poll.
                let bound = self.binder.bind(&zone.domain).await?;
                Ok(PollOutcome {
                    domain,
                    status: ZoneStatus::Active,
                    attempts: zone.verification_attempts,
                    nameservers_seen: zone.nameserver_list(),
                    bound: Some(bound),
                })
            }
            ZoneStatus::Pending | ZoneStatus::Verifying => {
                let observation = self.ns_resolver.lookup_ns(&zone.domain).await?;
                let transition = advance(
                    zone.zone_status(),
                    zone.verification_attempts,
                    &observation,
                    &self.settings.nameserver_suffix,
                    self.settings.max_verification_attempts,
                );

                let zone = self.zones.record_check(zone.id, &transition).await?;

                let bound = if transition.status == ZoneStatus::Active {
                    if transition.newly_activated {
                        metrics::record_zone_event("activated");
                        info!(domain = %zone.domain, "Nameservers detected, zone active");
                    }
                    Some(self.binder.bind(&zone.domain).await?)
                } else {
                    if transition.status == ZoneStatus::Failed {
                        metrics::record_zone_event("failed");
                        warn!(
                            domain = %zone.domain,
                            attempts = transition.attempts,
                            "Zone verification gave up without nameserver delegation"
                        );
                    }
                    None
                };

                Ok(PollOutcome {
                    domain,
                    status: transition.status,
                    attempts: transition.attempts,
                    nameservers_seen: transition.nameservers_seen,
                    bound,
                })
            }
        }
    }

    /// Remove a tenant's custom domain.
    ///
    /// The provider-side delete is best-effort; the local removal and
    /// the `custom_domain` clear always go through so the tenant is
    /// never left pointing at a dead zone.
    pub async fn remove(&self, tenant_id: Uuid) -> Result<()> {
        let zone = self
            .zones
            .find_by_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::ZoneNotFound {
                domain: format!("tenant {}", tenant_id),
            })?;

        if let Err(e) = self.dns.delete_zone(&zone.domain).await {
            warn!(domain = %zone.domain, error = %e, "Provider zone delete failed, removing local state anyway");
        }

        let removed = self.zones.remove(tenant_id).await?;
        metrics::record_zone_event("deleted");

        // Platform policy: the binding stays until an operator removes it
        // by hand, since pulling domains from the shared app can disturb
        // other tenants mid-propagation.
        info!(
            domain = %removed.domain,
            tenant_id = %tenant_id,
            "Custom domain removed; platform binding left in place for manual cleanup"
        );

        Ok(())
    }

    /// Add a custom record to an active zone
    pub async fn add_record(&self, zone_id: Uuid, spec: RecordSpec) -> Result<DnsRecord> {
        spec.validate()?;

        let zone = self
            .zones
            .find_by_id(zone_id)
            .await?
            .ok_or_else(|| AppError::ZoneNotFound {
                domain: zone_id.to_string(),
            })?;

        if zone.zone_status() != ZoneStatus::Active {
            return Err(AppError::ZoneNotActive {
                domain: zone.domain,
            });
        }

        self.dns.add_record(&zone.domain, &spec).await?;

        self.zones
            .insert_record(NewDnsRecord {
                zone_id,
                record_type: spec.record_type.as_str().to_string(),
                name: spec.name,
                value: spec.value,
                priority: spec.priority,
                ttl: spec.ttl,
            })
            .await
    }

    /// Platform binding / certificate state for one domain
    pub async fn binding_status(&self, raw_domain: &str) -> Result<BindingStatus> {
        self.binder.status(&domain::clean(raw_domain)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DnsZone;
    use crate::dns::{CreatedZone, NsLookup, ProviderRecord};
    use crate::platform::{PlatformApi, PlatformDomain};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // In-memory fakes
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MemoryZoneStore {
        zones: Mutex<HashMap<Uuid, DnsZone>>,
        records: Mutex<Vec<DnsRecord>>,
        custom_domains: Mutex<HashMap<Uuid, Option<String>>>,
        /// Tenants with no row; everyone else is assumed to exist
        missing_tenants: Mutex<Vec<Uuid>>,
    }

    impl MemoryZoneStore {
        fn custom_domain(&self, tenant_id: Uuid) -> Option<String> {
            self.custom_domains
                .lock()
                .unwrap()
                .get(&tenant_id)
                .cloned()
                .flatten()
        }

        fn zone(&self, zone_id: Uuid) -> DnsZone {
            self.zones.lock().unwrap().get(&zone_id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl ZoneStore for MemoryZoneStore {
        async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool> {
            Ok(!self.missing_tenants.lock().unwrap().contains(&tenant_id))
        }

        async fn find_by_domain(&self, domain: &str) -> Result<Option<DnsZone>> {
            Ok(self
                .zones
                .lock()
                .unwrap()
                .values()
                .find(|z| z.domain == domain)
                .cloned())
        }

        async fn find_by_id(&self, zone_id: Uuid) -> Result<Option<DnsZone>> {
            Ok(self.zones.lock().unwrap().get(&zone_id).cloned())
        }

        async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Option<DnsZone>> {
            Ok(self
                .zones
                .lock()
                .unwrap()
                .values()
                .find(|z| z.tenant_id == tenant_id)
                .cloned())
        }

        async fn insert(&self, zone: NewZone) -> Result<DnsZone> {
            let now = chrono::Utc::now();
            let model = DnsZone {
                id: Uuid::new_v4(),
                tenant_id: zone.tenant_id,
                domain: zone.domain.clone(),
                status: String::from(ZoneStatus::Pending),
                nameservers: serde_json::json!(zone.nameservers),
                verification_attempts: 0,
                activated_at: None,
                last_checked_at: None,
                created_at: now.into(),
                updated_at: now.into(),
            };
            self.zones.lock().unwrap().insert(model.id, model.clone());
            self.custom_domains
                .lock()
                .unwrap()
                .insert(zone.tenant_id, Some(zone.domain));
            Ok(model)
        }

        async fn record_check(&self, zone_id: Uuid, transition: &ZoneTransition) -> Result<DnsZone> {
            let mut zones = self.zones.lock().unwrap();
            let zone = zones.get_mut(&zone_id).unwrap();
            let now = chrono::Utc::now();
            zone.status = String::from(transition.status);
            zone.verification_attempts = transition.attempts;
            if transition.newly_activated && zone.activated_at.is_none() {
                zone.activated_at = Some(now.into());
            }
            zone.last_checked_at = Some(now.into());
            zone.updated_at = now.into();
            Ok(zone.clone())
        }

        async fn remove(&self, tenant_id: Uuid) -> Result<DnsZone> {
            let mut zones = self.zones.lock().unwrap();
            let id = zones
                .values()
                .find(|z| z.tenant_id == tenant_id)
                .map(|z| z.id)
                .ok_or_else(|| AppError::ZoneNotFound {
                    domain: format!("tenant {}", tenant_id),
                })?;
            let removed = zones.remove(&id).unwrap();
            self.records.lock().unwrap().retain(|r| r.zone_id != id);
            self.custom_domains.lock().unwrap().insert(tenant_id, None);
            Ok(removed)
        }

        async fn insert_record(&self, record: NewDnsRecord) -> Result<DnsRecord> {
            let model = DnsRecord {
                id: Uuid::new_v4(),
                zone_id: record.zone_id,
                record_type: record.record_type,
                name: record.name,
                value: record.value,
                priority: record.priority,
                ttl: record.ttl,
                created_at: chrono::Utc::now().into(),
            };
            self.records.lock().unwrap().push(model.clone());
            Ok(model)
        }
    }

    #[derive(Default)]
    struct FakeDns {
        create_calls: Mutex<u32>,
        delete_calls: Mutex<u32>,
        fail_delete: bool,
        fail_create: bool,
    }

    #[async_trait]
    impl DnsProvider for FakeDns {
        async fn create_zone(&self, _domain: &str) -> Result<CreatedZone> {
            *self.create_calls.lock().unwrap() += 1;
            if self.fail_create {
                return Err(AppError::dns_provider("zone create rejected"));
            }
            Ok(CreatedZone {
                nameservers: vec![
                    "ns1.digitalocean.com".into(),
                    "ns2.digitalocean.com".into(),
                    "ns3.digitalocean.com".into(),
                ],
            })
        }

        async fn delete_zone(&self, _domain: &str) -> Result<()> {
            *self.delete_calls.lock().unwrap() += 1;
            if self.fail_delete {
                return Err(AppError::dns_provider("delete refused"));
            }
            Ok(())
        }

        async fn add_record(&self, _domain: &str, record: &RecordSpec) -> Result<ProviderRecord> {
            Ok(ProviderRecord {
                id: Some(1),
                record_type: record.record_type.as_str().to_string(),
                name: record.name.clone(),
                value: record.value.clone(),
                ttl: record.ttl,
            })
        }

        async fn list_records(&self, _domain: &str) -> Result<Vec<ProviderRecord>> {
            Ok(Vec::new())
        }
    }

    struct ScriptedNs {
        answers: Mutex<Vec<NsLookup>>,
    }

    impl ScriptedNs {
        fn new(answers: Vec<NsLookup>) -> Self {
            Self {
                answers: Mutex::new(answers),
            }
        }
    }

    #[async_trait]
    impl NsResolver for ScriptedNs {
        async fn lookup_ns(&self, _domain: &str) -> Result<NsLookup> {
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                return Ok(NsLookup::NotFound);
            }
            Ok(answers.remove(0))
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        domains: Mutex<Vec<PlatformDomain>>,
    }

    #[async_trait]
    impl PlatformApi for FakePlatform {
        async fn fetch_domains(&self) -> Result<Vec<PlatformDomain>> {
            Ok(self.domains.lock().unwrap().clone())
        }
        async fn replace_domains(&self, domains: &[PlatformDomain]) -> Result<()> {
            *self.domains.lock().unwrap() = domains.to_vec();
            Ok(())
        }
        async fn domain_status(&self, _: &str) -> Result<Option<BindingStatus>> {
            Ok(None)
        }
    }

    fn settings() -> ProvisionerSettings {
        ProvisionerSettings {
            base_domain: "saas.test".into(),
            nameserver_suffix: "digitalocean.com".into(),
            max_verification_attempts: 288,
            record_ttl_secs: 3600,
        }
    }

    struct Harness {
        provisioner: Provisioner,
        store: Arc<MemoryZoneStore>,
        dns: Arc<FakeDns>,
        platform: Arc<FakePlatform>,
    }

    fn harness(dns: FakeDns, answers: Vec<NsLookup>) -> Harness {
        let store = Arc::new(MemoryZoneStore::default());
        let dns = Arc::new(dns);
        let platform = Arc::new(FakePlatform::default());
        let provisioner = Provisioner::new(
            store.clone(),
            dns.clone(),
            Arc::new(ScriptedNs::new(answers)),
            PlatformBinder::new(platform.clone()),
            settings(),
        );
        Harness {
            provisioner,
            store,
            dns,
            platform,
        }
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_rejects_invalid_format_without_external_calls() {
        let h = harness(FakeDns::default(), vec![]);
        let err = h
            .provisioner
            .submit(Uuid::new_v4(), "not a domain")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
        assert_eq!(*h.dns.create_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_submit_for_missing_tenant_makes_no_external_call() {
        // A zone created for a tenant that has no row would be orphaned
        // at the provider, so the tenant check runs first.
        let h = harness(FakeDns::default(), vec![]);
        let tenant_id = Uuid::new_v4();
        h.store.missing_tenants.lock().unwrap().push(tenant_id);

        let err = h
            .provisioner
            .submit(tenant_id, "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TenantNotFound { .. }));
        assert_eq!(*h.dns.create_calls.lock().unwrap(), 0);
        assert!(h.store.zones.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_normalizes_before_validating() {
        let h = harness(FakeDns::default(), vec![]);
        let receipt = h
            .provisioner
            .submit(Uuid::new_v4(), "www.Example.COM/")
            .await
            .unwrap();
        assert_eq!(receipt.domain, "example.com");
        assert_eq!(receipt.status, ZoneStatus::Pending);
        assert_eq!(receipt.nameservers.len(), 3);
        assert!(receipt.setup_records.iter().all(|r| r.record_type == "NS"));
    }

    #[tokio::test]
    async fn test_submit_sets_tenant_custom_domain() {
        let h = harness(FakeDns::default(), vec![]);
        let tenant_id = Uuid::new_v4();
        h.provisioner.submit(tenant_id, "example.com").await.unwrap();
        assert_eq!(h.store.custom_domain(tenant_id), Some("example.com".into()));
    }

    #[tokio::test]
    async fn test_duplicate_domain_makes_no_external_call() {
        let h = harness(FakeDns::default(), vec![]);
        h.provisioner
            .submit(Uuid::new_v4(), "example.com")
            .await
            .unwrap();
        assert_eq!(*h.dns.create_calls.lock().unwrap(), 1);

        let err = h
            .provisioner
            .submit(Uuid::new_v4(), "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateDomain { .. }));
        // Second attempt never reached the provider
        assert_eq!(*h.dns.create_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_double_submit_same_tenant_rejected() {
        let h = harness(FakeDns::default(), vec![]);
        let tenant_id = Uuid::new_v4();
        h.provisioner.submit(tenant_id, "one.example").await.unwrap();
        let err = h
            .provisioner
            .submit(tenant_id, "two.example")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateDomain { .. }));
    }

    #[tokio::test]
    async fn test_failed_zone_create_persists_nothing() {
        let dns = FakeDns {
            fail_create: true,
            ..Default::default()
        };
        let h = harness(dns, vec![]);
        let tenant_id = Uuid::new_v4();
        let err = h
            .provisioner
            .submit(tenant_id, "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProviderUnavailable { .. }));
        assert!(h.store.zones.lock().unwrap().is_empty());
        assert_eq!(h.store.custom_domain(tenant_id), None);
    }

    #[tokio::test]
    async fn test_end_to_end_provisioning_flow() {
        // submit -> NXDOMAIN -> provider NS visible -> active + bound
        let h = harness(
            FakeDns::default(),
            vec![
                NsLookup::NotFound,
                NsLookup::Nameservers(vec!["ns1.digitalocean.com".into()]),
            ],
        );
        let tenant_id = Uuid::new_v4();

        let receipt = h
            .provisioner
            .submit(tenant_id, "www.Example.COM/")
            .await
            .unwrap();
        assert_eq!(receipt.domain, "example.com");
        assert_eq!(receipt.status, ZoneStatus::Pending);

        // First poll: still propagating
        let first = h.provisioner.poll("example.com").await.unwrap();
        assert_eq!(first.status, ZoneStatus::Verifying);
        assert_eq!(first.attempts, 1);
        assert!(first.bound.is_none());

        // Second poll: delegation visible, zone activates and binds
        let second = h.provisioner.poll("example.com").await.unwrap();
        assert_eq!(second.status, ZoneStatus::Active);
        assert_eq!(second.attempts, 2);
        assert_eq!(second.bound, Some(BindOutcome::Bound));

        let zone = h.store.zone(receipt.zone_id);
        assert!(zone.activated_at.is_some());

        let bound = h.platform.domains.lock().unwrap();
        assert!(bound.iter().any(|d| d.domain == "example.com"));
        assert!(bound.iter().any(|d| d.domain == "www.example.com"));
    }

    #[tokio::test]
    async fn test_poll_after_active_is_idempotent() {
        let h = harness(
            FakeDns::default(),
            vec![NsLookup::Nameservers(vec!["ns1.digitalocean.com".into()])],
        );
        let tenant_id = Uuid::new_v4();
        let receipt = h.provisioner.submit(tenant_id, "example.com").await.unwrap();

        let first = h.provisioner.poll("example.com").await.unwrap();
        assert_eq!(first.status, ZoneStatus::Active);
        let activated_at = h.store.zone(receipt.zone_id).activated_at;

        // Scripted answers are exhausted: further lookups would report
        // NXDOMAIN, but an active zone never consults the resolver.
        for _ in 0..3 {
            let again = h.provisioner.poll("example.com").await.unwrap();
            assert_eq!(again.status, ZoneStatus::Active);
            assert_eq!(again.bound, Some(BindOutcome::AlreadyBound));
        }
        assert_eq!(h.store.zone(receipt.zone_id).activated_at, activated_at);
    }

    #[tokio::test]
    async fn test_poll_unknown_domain() {
        let h = harness(FakeDns::default(), vec![]);
        let err = h.provisioner.poll("ghost.example").await.unwrap_err();
        assert!(matches!(err, AppError::ZoneNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_clears_custom_domain_even_when_provider_fails() {
        let dns = FakeDns {
            fail_delete: true,
            ..Default::default()
        };
        let h = harness(dns, vec![]);
        let tenant_id = Uuid::new_v4();
        h.provisioner.submit(tenant_id, "example.com").await.unwrap();

        h.provisioner.remove(tenant_id).await.unwrap();

        assert_eq!(h.store.custom_domain(tenant_id), None);
        assert!(h.store.zones.lock().unwrap().is_empty());
        assert_eq!(*h.dns.delete_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_record_requires_active_zone() {
        let h = harness(FakeDns::default(), vec![]);
        let receipt = h
            .provisioner
            .submit(Uuid::new_v4(), "example.com")
            .await
            .unwrap();

        let spec = RecordSpec {
            record_type: RecordType::Txt,
            name: "@".into(),
            value: "v=spf1 -all".into(),
            priority: None,
            ttl: 3600,
        };
        let err = h
            .provisioner
            .add_record(receipt.zone_id, spec)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ZoneNotActive { .. }));
    }

    #[tokio::test]
    async fn test_add_record_on_active_zone() {
        let h = harness(
            FakeDns::default(),
            vec![NsLookup::Nameservers(vec!["ns1.digitalocean.com".into()])],
        );
        let receipt = h
            .provisioner
            .submit(Uuid::new_v4(), "example.com")
            .await
            .unwrap();
        h.provisioner.poll("example.com").await.unwrap();

        let spec = RecordSpec {
            record_type: RecordType::Mx,
            name: "@".into(),
            value: "mail.example.com".into(),
            priority: Some(10),
            ttl: 3600,
        };
        let record = h.provisioner.add_record(receipt.zone_id, spec).await.unwrap();
        assert_eq!(record.record_type, "MX");
        assert_eq!(record.priority, Some(10));
        assert_eq!(h.store.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_give_up_threshold_marks_zone_failed() {
        let store = Arc::new(MemoryZoneStore::default());
        let dns = Arc::new(FakeDns::default());
        let platform = Arc::new(FakePlatform::default());
        let provisioner = Provisioner::new(
            store.clone(),
            dns,
            Arc::new(ScriptedNs::new(vec![NsLookup::NotFound, NsLookup::NotFound])),
            PlatformBinder::new(platform),
            ProvisionerSettings {
                max_verification_attempts: 2,
                ..settings()
            },
        );

        provisioner.submit(Uuid::new_v4(), "example.com").await.unwrap();

        let first = provisioner.poll("example.com").await.unwrap();
        assert_eq!(first.status, ZoneStatus::Verifying);
        let second = provisioner.poll("example.com").await.unwrap();
        assert_eq!(second.status, ZoneStatus::Failed);

        // Terminal: further polls do not consult the resolver
        let third = provisioner.poll("example.com").await.unwrap();
        assert_eq!(third.status, ZoneStatus::Failed);
        assert_eq!(third.attempts, 2);
    }
}
