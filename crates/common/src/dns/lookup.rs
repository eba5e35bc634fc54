//! NS propagation lookups via a DNS-over-HTTPS resolver
//!
//! Uses the Google public DNS JSON API. The resolver is external and
//! shared, so a transient failure here is a ProviderUnavailable, never
//! a verdict about the zone itself.

use super::{NsLookup, NsResolver};
use crate::config::DnsConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// RCODE 3 (NXDOMAIN) in the JSON API's Status field
const STATUS_NXDOMAIN: i32 = 3;

/// NS resolver backed by https://dns.google/resolve
pub struct GoogleDnsResolver {
    client: reqwest::Client,
    lookup_url: String,
}

#[derive(Deserialize)]
struct DnsJsonResponse {
    #[serde(rename = "Status")]
    status: i32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsJsonAnswer>,
}

#[derive(Deserialize)]
struct DnsJsonAnswer {
    data: Option<String>,
}

impl GoogleDnsResolver {
    pub fn from_config(config: &DnsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            lookup_url: config.ns_lookup_url.clone(),
        })
    }
}

#[async_trait]
impl NsResolver for GoogleDnsResolver {
    async fn lookup_ns(&self, domain: &str) -> Result<NsLookup> {
        let response = self
            .client
            .get(&self.lookup_url)
            .query(&[("name", domain), ("type", "NS")])
            .send()
            .await
            .map_err(|e| AppError::dns_provider(format!("NS lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::dns_provider(format!("NS lookup failed: {}", status)));
        }

        let parsed: DnsJsonResponse = response
            .json()
            .await
            .map_err(|e| AppError::dns_provider(format!("NS lookup response invalid: {}", e)))?;

        if parsed.status == STATUS_NXDOMAIN {
            return Ok(NsLookup::NotFound);
        }

        let nameservers: Vec<String> = parsed
            .answer
            .into_iter()
            .filter_map(|a| a.data)
            .map(|ns| ns.trim_end_matches('.').to_lowercase())
            .collect();

        Ok(NsLookup::Nameservers(nameservers))
    }
}
