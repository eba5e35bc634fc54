//! Repository pattern for database operations
//!
//! Postgres-backed implementation of the tenant directory and the zone
//! store. Reads go to the replica pool, writes to the primary; the
//! multi-row operations (zone insert, zone removal) run in transactions
//! so the tenant's `custom_domain` column never drifts from its zone row.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::provisioning::{ZoneStore, ZoneTransition};
use crate::tenancy::{TenantDirectory, TenantSnapshot};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Input for creating a pending zone
#[derive(Debug, Clone)]
pub struct NewZone {
    pub tenant_id: Uuid,
    pub domain: String,
    pub nameservers: Vec<String>,
}

/// Input for persisting a provider-created record
#[derive(Debug, Clone)]
pub struct NewDnsRecord {
    pub zone_id: Uuid,
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub priority: Option<i32>,
    pub ttl: i32,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    async fn active_zone_for(&self, tenant_id: Uuid) -> Result<bool> {
        let zone = DnsZoneEntity::find()
            .filter(DnsZoneColumn::TenantId.eq(tenant_id))
            .one(self.read_conn())
            .await?;
        Ok(zone
            .map(|z| z.zone_status() == ZoneStatus::Active)
            .unwrap_or(false))
    }

    /// Build a directory snapshot, resolving whether the custom domain's
    /// zone is live
    async fn snapshot(&self, tenant: Tenant) -> Result<TenantSnapshot> {
        let custom_domain_active = if tenant.custom_domain.is_some() {
            self.active_zone_for(tenant.id).await?
        } else {
            false
        };

        Ok(TenantSnapshot {
            id: tenant.id,
            slug: tenant.slug,
            custom_domain: tenant.custom_domain,
            custom_domain_active,
            prefer_custom_domain_for_canonical: tenant.prefer_custom_domain_for_canonical,
            is_active: tenant.is_active,
        })
    }
}

#[async_trait]
impl TenantDirectory for Repository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<TenantSnapshot>> {
        let tenant = TenantEntity::find()
            .filter(TenantColumn::Slug.eq(slug))
            .filter(TenantColumn::IsActive.eq(true))
            .one(self.read_conn())
            .await?;

        match tenant {
            Some(tenant) => Ok(Some(self.snapshot(tenant).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<TenantSnapshot>> {
        let tenant = TenantEntity::find()
            .filter(TenantColumn::CustomDomain.eq(domain))
            .filter(TenantColumn::IsActive.eq(true))
            .one(self.read_conn())
            .await?;

        // A custom domain only routes once its zone went active; until
        // then the host cannot legitimately reach us anyway.
        match tenant {
            Some(tenant) => {
                let snapshot = self.snapshot(tenant).await?;
                if snapshot.custom_domain_active {
                    Ok(Some(snapshot))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ZoneStore for Repository {
    async fn tenant_exists(&self, tenant_id: Uuid) -> Result<bool> {
        Ok(TenantEntity::find_by_id(tenant_id)
            .one(self.read_conn())
            .await?
            .is_some())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<DnsZone>> {
        Ok(DnsZoneEntity::find()
            .filter(DnsZoneColumn::Domain.eq(domain))
            .one(self.read_conn())
            .await?)
    }

    async fn find_by_id(&self, zone_id: Uuid) -> Result<Option<DnsZone>> {
        Ok(DnsZoneEntity::find_by_id(zone_id)
            .one(self.read_conn())
            .await?)
    }

    async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Option<DnsZone>> {
        Ok(DnsZoneEntity::find()
            .filter(DnsZoneColumn::TenantId.eq(tenant_id))
            .one(self.read_conn())
            .await?)
    }

    async fn insert(&self, zone: NewZone) -> Result<DnsZone> {
        let txn = self.write_conn().begin().await?;

        let tenant = TenantEntity::find_by_id(zone.tenant_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::TenantNotFound {
                id: zone.tenant_id.to_string(),
            })?;

        let now = chrono::Utc::now();
        let model = DnsZoneActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(zone.tenant_id),
            domain: Set(zone.domain.clone()),
            status: Set(String::from(ZoneStatus::Pending)),
            nameservers: Set(serde_json::json!(zone.nameservers)),
            verification_attempts: Set(0),
            activated_at: Set(None),
            last_checked_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let inserted = model.insert(&txn).await?;

        let mut tenant: TenantActiveModel = tenant.into();
        tenant.custom_domain = Set(Some(zone.domain));
        tenant.updated_at = Set(now.into());
        tenant.update(&txn).await?;

        txn.commit().await?;
        Ok(inserted)
    }

    async fn record_check(&self, zone_id: Uuid, transition: &ZoneTransition) -> Result<DnsZone> {
        let zone = DnsZoneEntity::find_by_id(zone_id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ZoneNotFound {
                domain: zone_id.to_string(),
            })?;

        let now = chrono::Utc::now();
        let first_activation = transition.newly_activated && zone.activated_at.is_none();

        let mut model: DnsZoneActiveModel = zone.into();
        model.status = Set(String::from(transition.status));
        model.verification_attempts = Set(transition.attempts);
        if first_activation {
            model.activated_at = Set(Some(now.into()));
        }
        model.last_checked_at = Set(Some(now.into()));
        model.updated_at = Set(now.into());

        Ok(model.update(self.write_conn()).await?)
    }

    async fn remove(&self, tenant_id: Uuid) -> Result<DnsZone> {
        let txn = self.write_conn().begin().await?;

        let zone = DnsZoneEntity::find()
            .filter(DnsZoneColumn::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::ZoneNotFound {
                domain: format!("tenant {}", tenant_id),
            })?;

        DnsRecordEntity::delete_many()
            .filter(DnsRecordColumn::ZoneId.eq(zone.id))
            .exec(&txn)
            .await?;

        DnsZoneEntity::delete_by_id(zone.id).exec(&txn).await?;

        if let Some(tenant) = TenantEntity::find_by_id(tenant_id).one(&txn).await? {
            let mut tenant: TenantActiveModel = tenant.into();
            tenant.custom_domain = Set(None);
            tenant.updated_at = Set(chrono::Utc::now().into());
            tenant.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(zone)
    }

    async fn insert_record(&self, record: NewDnsRecord) -> Result<DnsRecord> {
        let model = DnsRecordActiveModel {
            id: Set(Uuid::new_v4()),
            zone_id: Set(record.zone_id),
            record_type: Set(record.record_type),
            name: Set(record.name),
            value: Set(record.value),
            priority: Set(record.priority),
            ttl: Set(record.ttl),
            created_at: Set(chrono::Utc::now().into()),
        };
        Ok(model.insert(self.write_conn()).await?)
    }
}
