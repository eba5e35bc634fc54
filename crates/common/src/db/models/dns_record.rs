//! Custom DNS record entity
//!
//! Records a tenant added to their zone (MX for email, TXT for SPF/DKIM,
//! extra subdomains). Only permitted once the zone is active.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dns_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub zone_id: Uuid,

    /// One of A, AAAA, CNAME, MX, TXT
    #[sea_orm(column_type = "Text")]
    pub record_type: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub value: String,

    /// Required for MX records, absent otherwise
    pub priority: Option<i32>,

    pub ttl: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dns_zone::Entity",
        from = "Column::ZoneId",
        to = "super::dns_zone::Column::Id"
    )]
    DnsZone,
}

impl Related<super::dns_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DnsZone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
