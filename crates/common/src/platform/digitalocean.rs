//! DigitalOcean App Platform client

use super::{BindingStatus, CertificateState, DomainKind, PlatformApi, PlatformDomain};
use crate::config::PlatformConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};

/// Run a provider call and record its latency and outcome
async fn timed<T>(operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let start = Instant::now();
    let result = fut.await;
    metrics::record_provider_call(
        start.elapsed().as_secs_f64(),
        "platform",
        operation,
        result.is_ok(),
    );
    result
}

/// Platform API backed by the DigitalOcean App Platform
///
/// The app spec is fetched and pushed as a whole; this client only ever
/// rewrites the `domains` list inside it.
pub struct DigitalOceanApps {
    client: reqwest::Client,
    api_token: String,
    api_base: String,
    app_id: String,
}

#[derive(Deserialize)]
struct AppDomainSpec {
    domain: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    zone: Option<String>,
    #[serde(default)]
    wildcard: bool,
    certificate_id: Option<String>,
    phase: Option<String>,
}

impl DigitalOceanApps {
    /// Create a client from the platform configuration section
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let api_token = config.api_token.clone().ok_or_else(|| AppError::Configuration {
            message: "platform.api_token is required for the App Platform client".into(),
        })?;
        let app_id = config.app_id.clone().ok_or_else(|| AppError::Configuration {
            message: "platform.app_id is required for the App Platform client".into(),
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
            app_id,
        })
    }

    async fn fetch_app(&self) -> Result<Value> {
        let url = format!("{}/apps/{}", self.api_base, self.app_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| AppError::platform(format!("fetch app request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::platform(format!("fetch app failed: {} {}", status, body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::platform(format!("fetch app response invalid: {}", e)))
    }

    fn parse_domains(app: &Value) -> Vec<AppDomainSpec> {
        app.pointer("/app/spec/domains")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    fn to_platform_domain(spec: &AppDomainSpec) -> PlatformDomain {
        let kind = match spec.kind.as_deref() {
            Some("ALIAS") => DomainKind::Alias,
            _ => DomainKind::Primary,
        };
        PlatformDomain {
            domain: spec.domain.clone(),
            kind,
            zone: spec.zone.clone().unwrap_or_else(|| spec.domain.clone()),
            wildcard: spec.wildcard,
        }
    }
}

#[async_trait]
impl PlatformApi for DigitalOceanApps {
    async fn fetch_domains(&self) -> Result<Vec<PlatformDomain>> {
        timed("fetch_domains", async {
            let app = self.fetch_app().await?;
            Ok(Self::parse_domains(&app)
                .iter()
                .map(Self::to_platform_domain)
                .collect())
        })
        .await
    }

    async fn replace_domains(&self, domains: &[PlatformDomain]) -> Result<()> {
        timed("replace_domains", async {
            // Read-modify-write against the latest spec: the PUT replaces the
            // entire app spec, so everything except `domains` is carried over
            // verbatim.
            let app = self.fetch_app().await?;
            let mut spec = app
                .pointer("/app/spec")
                .cloned()
                .ok_or_else(|| AppError::platform("app response has no spec".to_string()))?;

            spec["domains"] = serde_json::to_value(domains)?;

            let url = format!("{}/apps/{}", self.api_base, self.app_id);
            let response = self
                .client
                .put(&url)
                .bearer_auth(&self.api_token)
                .json(&serde_json::json!({ "spec": spec }))
                .send()
                .await
                .map_err(|e| AppError::platform(format!("update app request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::CONFLICT {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::BindingConflict { message: body });
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::platform(format!("update app failed: {} {}", status, body)));
            }

            Ok(())
        })
        .await
    }

    async fn domain_status(&self, domain: &str) -> Result<Option<BindingStatus>> {
        let app = timed("domain_status", self.fetch_app()).await?;
        let found = Self::parse_domains(&app)
            .into_iter()
            .find(|d| d.domain == domain);

        Ok(found.map(|spec| {
            let certificate = match (spec.certificate_id.as_deref(), spec.phase.as_deref()) {
                (Some(_), Some("ACTIVE")) => CertificateState::Issued,
                (Some(_), _) => CertificateState::Pending,
                (None, Some("CONFIGURING")) | (None, Some("PENDING")) => CertificateState::Pending,
                _ => CertificateState::Unknown,
            };
            let kind = Some(Self::to_platform_domain(&spec).kind);
            BindingStatus {
                domain: spec.domain,
                bound: true,
                kind,
                certificate,
            }
        }))
    }
}
