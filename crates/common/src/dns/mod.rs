//! DNS provider abstraction
//!
//! Provides a unified interface for the external DNS provider (zone and
//! record management) and for the public resolver used to observe
//! nameserver propagation. Production implementations talk to the
//! DigitalOcean Domains API and Google public DNS; tests use in-memory
//! fakes.

mod digitalocean;
mod lookup;

pub use digitalocean::DigitalOceanDns;
pub use lookup::GoogleDnsResolver;

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported custom DNS record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            other => Err(AppError::Validation {
                message: format!("Unsupported record type: {}", other),
                field: Some("record_type".into()),
            }),
        }
    }
}

/// A DNS record to create within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    pub record_type: RecordType,
    pub name: String,
    pub value: String,
    /// Required for MX records
    pub priority: Option<i32>,
    pub ttl: i32,
}

impl RecordSpec {
    /// Validate provider-independent constraints
    pub fn validate(&self) -> Result<()> {
        if self.record_type == RecordType::Mx && self.priority.is_none() {
            return Err(AppError::Validation {
                message: "Priority is required for MX records".into(),
                field: Some("priority".into()),
            });
        }
        Ok(())
    }
}

/// Result of creating a zone at the provider
#[derive(Debug, Clone)]
pub struct CreatedZone {
    /// Nameservers the registrar must be pointed at, in order
    pub nameservers: Vec<String>,
}

/// A record as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: Option<i64>,
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: i32,
}

/// External DNS provider (zone lifecycle + records)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Create an authoritative zone for the domain
    async fn create_zone(&self, domain: &str) -> Result<CreatedZone>;

    /// Delete the zone; callers treat failure as non-fatal
    async fn delete_zone(&self, domain: &str) -> Result<()>;

    /// Add a record to an existing zone
    async fn add_record(&self, domain: &str, record: &RecordSpec) -> Result<ProviderRecord>;

    /// List the records in a zone
    async fn list_records(&self, domain: &str) -> Result<Vec<ProviderRecord>>;
}

/// Outcome of an NS lookup against a public resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsLookup {
    /// NXDOMAIN-equivalent: the registrar delegation is not visible yet
    NotFound,
    /// The nameserver hostnames currently answering for the domain
    Nameservers(Vec<String>),
}

/// Public resolver used to observe nameserver propagation
#[async_trait]
pub trait NsResolver: Send + Sync {
    async fn lookup_ns(&self, domain: &str) -> Result<NsLookup>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parsing() {
        assert_eq!("mx".parse::<RecordType>().unwrap(), RecordType::Mx);
        assert_eq!("TXT".parse::<RecordType>().unwrap(), RecordType::Txt);
        assert!("SRV".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_mx_requires_priority() {
        let record = RecordSpec {
            record_type: RecordType::Mx,
            name: "@".into(),
            value: "mail.example.com".into(),
            priority: None,
            ttl: 3600,
        };
        assert!(record.validate().is_err());

        let record = RecordSpec {
            priority: Some(10),
            ..record
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_non_mx_needs_no_priority() {
        let record = RecordSpec {
            record_type: RecordType::Txt,
            name: "@".into(),
            value: "v=spf1 -all".into(),
            priority: None,
            ttl: 3600,
        };
        assert!(record.validate().is_ok());
    }
}
