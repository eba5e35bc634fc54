//! DigitalOcean Domains API client

use super::{CreatedZone, DnsProvider, ProviderRecord, RecordSpec, RecordType};
use crate::config::DnsConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

/// Run a provider call and record its latency and outcome
async fn timed<T>(operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let start = Instant::now();
    let result = fut.await;
    metrics::record_provider_call(start.elapsed().as_secs_f64(), "dns", operation, result.is_ok());
    result
}

/// Nameservers DigitalOcean assigns to every hosted zone
const ASSIGNED_NAMESERVERS: [&str; 3] = [
    "ns1.digitalocean.com",
    "ns2.digitalocean.com",
    "ns3.digitalocean.com",
];

/// DNS provider backed by the DigitalOcean Domains API v2
pub struct DigitalOceanDns {
    client: reqwest::Client,
    api_token: String,
    api_base: String,
    app_ip: String,
}

#[derive(Serialize)]
struct CreateDomainRequest<'a> {
    name: &'a str,
    ip_address: &'a str,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    ttl: i32,
}

#[derive(Deserialize)]
struct DomainRecordEnvelope {
    domain_record: DomainRecord,
}

#[derive(Deserialize)]
struct DomainRecordsEnvelope {
    domain_records: Vec<DomainRecord>,
}

#[derive(Deserialize)]
struct DomainRecord {
    id: Option<i64>,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    data: String,
    #[serde(default)]
    ttl: i32,
}

impl DigitalOceanDns {
    /// Create a client from the DNS configuration section
    pub fn from_config(config: &DnsConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| AppError::Configuration {
            message: "dns.api_token is required for the DigitalOcean DNS client".into(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app_ip: config.app_ip.clone(),
        })
    }

    async fn check(&self, response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::dns_provider(format!("{} failed: {} {}", action, status, body)))
    }
}

#[async_trait]
impl DnsProvider for DigitalOceanDns {
    async fn create_zone(&self, domain: &str) -> Result<CreatedZone> {
        timed("create_zone", async {
            let url = format!("{}/domains", self.api_base);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_token)
                .json(&CreateDomainRequest {
                    name: domain,
                    ip_address: &self.app_ip,
                })
                .send()
                .await
                .map_err(|e| AppError::dns_provider(format!("create zone request failed: {}", e)))?;

            self.check(response, "create zone").await?;

            Ok(CreatedZone {
                nameservers: ASSIGNED_NAMESERVERS.iter().map(|s| s.to_string()).collect(),
            })
        })
        .await
    }

    async fn delete_zone(&self, domain: &str) -> Result<()> {
        timed("delete_zone", async {
            let url = format!("{}/domains/{}", self.api_base, domain);
            let response = self
                .client
                .delete(&url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| AppError::dns_provider(format!("delete zone request failed: {}", e)))?;

            // A zone already gone at the provider is not an error here
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(());
            }
            self.check(response, "delete zone").await?;
            Ok(())
        })
        .await
    }

    async fn add_record(&self, domain: &str, record: &RecordSpec) -> Result<ProviderRecord> {
        record.validate()?;

        timed("add_record", async {
            let url = format!("{}/domains/{}/records", self.api_base, domain);
            let priority = match record.record_type {
                RecordType::Mx => record.priority,
                _ => None,
            };
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_token)
                .json(&CreateRecordRequest {
                    record_type: record.record_type.as_str(),
                    name: &record.name,
                    data: &record.value,
                    priority,
                    ttl: record.ttl,
                })
                .send()
                .await
                .map_err(|e| AppError::dns_provider(format!("add record request failed: {}", e)))?;

            let response = self.check(response, "add record").await?;
            let envelope: DomainRecordEnvelope = response
                .json()
                .await
                .map_err(|e| AppError::dns_provider(format!("add record response invalid: {}", e)))?;

            Ok(ProviderRecord {
                id: envelope.domain_record.id,
                record_type: envelope.domain_record.record_type,
                name: envelope.domain_record.name,
                value: envelope.domain_record.data,
                ttl: envelope.domain_record.ttl,
            })
        })
        .await
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<ProviderRecord>> {
        timed("list_records", async {
            let url = format!("{}/domains/{}/records", self.api_base, domain);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(|e| AppError::dns_provider(format!("list records request failed: {}", e)))?;

            let response = self.check(response, "list records").await?;
            let envelope: DomainRecordsEnvelope = response
                .json()
                .await
                .map_err(|e| AppError::dns_provider(format!("list records response invalid: {}", e)))?;

            Ok(envelope
                .domain_records
                .into_iter()
                .map(|r| ProviderRecord {
                    id: r.id,
                    record_type: r.record_type,
                    name: r.name,
                    value: r.data,
                    ttl: r.ttl,
                })
                .collect())
        })
        .await
    }
}
