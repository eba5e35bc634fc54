//! Custom-domain provisioning handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use brokerforge_common::{
    db::models::ZoneStatus,
    dns::{RecordSpec, RecordType},
    errors::{AppError, Result},
    platform::BindingStatus,
    provisioning::{PollOutcome, ProvisionReceipt, ZoneStore},
};

/// Request to provision a custom domain for a tenant
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitDomainRequest {
    pub tenant_id: Uuid,

    #[validate(length(min = 1, max = 253))]
    pub domain: String,
}

/// Request to add a record to an active zone
#[derive(Debug, Deserialize, Validate)]
pub struct AddRecordRequest {
    #[validate(length(min = 1, max = 10))]
    pub record_type: String,

    #[validate(length(min = 1, max = 253))]
    pub name: String,

    #[validate(length(min = 1, max = 4096))]
    pub value: String,

    pub priority: Option<i32>,

    /// Defaults to the configured record TTL
    pub ttl: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub record_type: String,
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub ttl: i32,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct DomainStatusResponse {
    pub domain: String,
    pub status: ZoneStatus,
    pub verification_attempts: i32,
    pub nameservers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<String>,
    pub binding: BindingStatus,
}

/// Submit a domain for provisioning
///
/// Returns 202: the zone exists but the registrar-side nameserver
/// change still has to propagate before anything routes.
pub async fn submit_domain(
    State(state): State<AppState>,
    Json(request): Json<SubmitDomainRequest>,
) -> Result<(StatusCode, Json<ProvisionReceipt>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let receipt = state
        .provisioner
        .submit(request.tenant_id, &request.domain)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

/// Run one verification poll for a domain
pub async fn verify_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<PollOutcome>> {
    let outcome = state.provisioner.poll(&domain).await?;
    Ok(Json(outcome))
}

/// Zone and platform-binding state for one domain
pub async fn domain_status(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<DomainStatusResponse>> {
    let domain = brokerforge_common::domain::clean(&domain);

    let zone = state
        .repo
        .find_by_domain(&domain)
        .await?
        .ok_or_else(|| AppError::ZoneNotFound {
            domain: domain.clone(),
        })?;

    let binding = state.provisioner.binding_status(&domain).await?;

    Ok(Json(DomainStatusResponse {
        domain,
        status: zone.zone_status(),
        verification_attempts: zone.verification_attempts,
        nameservers: zone.nameserver_list(),
        activated_at: zone.activated_at.map(|dt| dt.to_rfc3339()),
        last_checked_at: zone.last_checked_at.map(|dt| dt.to_rfc3339()),
        binding,
    }))
}

/// Remove a tenant's custom domain
pub async fn remove_domain(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.provisioner.remove(tenant_id).await?;

    tracing::info!(tenant_id = %tenant_id, "Custom domain removed");

    Ok(StatusCode::NO_CONTENT)
}

/// Add a custom record to an active zone
pub async fn add_record(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
    Json(request): Json<AddRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let record_type: RecordType = request.record_type.parse()?;
    let spec = RecordSpec {
        record_type,
        name: request.name,
        value: request.value,
        priority: request.priority,
        ttl: request.ttl.unwrap_or(state.config.dns.record_ttl_secs),
    };

    let record = state.provisioner.add_record(zone_id, spec).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            id: record.id,
            zone_id: record.zone_id,
            record_type: record.record_type,
            name: record.name,
            value: record.value,
            priority: record.priority,
            ttl: record.ttl,
            created_at: record.created_at.to_rfc3339(),
        }),
    ))
}
