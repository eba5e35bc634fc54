//! DNS zone entity for custom-domain provisioning

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Zone lifecycle status
///
/// Transitions are monotonic: pending -> verifying -> active | failed.
/// An active zone never regresses; only explicit deletion removes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    Pending,
    Verifying,
    Active,
    Failed,
}

impl From<String> for ZoneStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => ZoneStatus::Pending,
            "verifying" => ZoneStatus::Verifying,
            "active" => ZoneStatus::Active,
            "failed" => ZoneStatus::Failed,
            _ => ZoneStatus::Pending,
        }
    }
}

impl From<ZoneStatus> for String {
    fn from(status: ZoneStatus) -> Self {
        match status {
            ZoneStatus::Pending => "pending".to_string(),
            ZoneStatus::Verifying => "verifying".to_string(),
            ZoneStatus::Active => "active".to_string(),
            ZoneStatus::Failed => "failed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dns_zones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// At most one zone per tenant
    #[sea_orm(unique)]
    pub tenant_id: Uuid,

    /// Normalized domain; unique across all tenants
    #[sea_orm(column_type = "Text", unique)]
    pub domain: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    /// Nameservers assigned by the DNS provider, in order
    pub nameservers: Json,

    pub verification_attempts: i32,

    /// Stamped once, on the first successful nameserver detection
    pub activated_at: Option<DateTimeWithTimeZone>,

    pub last_checked_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the zone status as an enum
    pub fn zone_status(&self) -> ZoneStatus {
        ZoneStatus::from(self.status.clone())
    }

    /// Check if the zone is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.zone_status(), ZoneStatus::Active | ZoneStatus::Failed)
    }

    /// Provider-assigned nameservers as a string list
    pub fn nameserver_list(&self) -> Vec<String> {
        serde_json::from_value(self.nameservers.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,

    #[sea_orm(has_many = "super::dns_record::Entity")]
    DnsRecords,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::dns_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DnsRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
