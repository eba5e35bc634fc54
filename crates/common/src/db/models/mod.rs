//! SeaORM entity models
//!
//! Database entities for BrokerForge

mod dns_record;
mod dns_zone;
mod tenant;

pub use tenant::{
    Entity as TenantEntity,
    Model as Tenant,
    ActiveModel as TenantActiveModel,
    Column as TenantColumn,
};

pub use dns_zone::{
    Entity as DnsZoneEntity,
    Model as DnsZone,
    ActiveModel as DnsZoneActiveModel,
    Column as DnsZoneColumn,
    ZoneStatus,
};

pub use dns_record::{
    Entity as DnsRecordEntity,
    Model as DnsRecord,
    ActiveModel as DnsRecordActiveModel,
    Column as DnsRecordColumn,
};
