//! Tenant (broker storefront) entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Reserved-subdomain identifier; immutable and never reused
    #[sea_orm(column_type = "Text", unique)]
    pub slug: String,

    /// At most one active custom domain per tenant
    #[sea_orm(column_type = "Text", nullable, unique)]
    pub custom_domain: Option<String>,

    /// Prefer the custom domain when computing the canonical public URL
    pub prefer_custom_domain_for_canonical: bool,

    /// Deactivated tenants are unresolvable from the public path
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::dns_zone::Entity")]
    DnsZone,
}

impl Related<super::dns_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DnsZone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
