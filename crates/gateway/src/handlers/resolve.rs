//! Host resolution handler
//!
//! Consulted by the storefront edge on every request, so the response
//! is small and the handler does nothing beyond the resolver call and
//! canonical URL computation.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use brokerforge_common::{
    errors::Result,
    metrics,
    tenancy::{canonical_base, HostResolution, MatchKind},
};

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    /// Raw Host header value from the edge
    pub host: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub host: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<ResolvedTenant>,
}

#[derive(Debug, Serialize)]
pub struct ResolvedTenant {
    pub tenant_id: Uuid,
    pub slug: String,
    pub match_kind: MatchKind,
    /// The slug or domain string that matched
    pub matched: String,
    /// Where this tenant's content should canonically live
    pub canonical_base: String,
}

/// Resolve a request host to its owning tenant
///
/// A directory outage propagates as 503, distinct from the legitimate
/// `not_found` outcome in the 200 body.
pub async fn resolve_host(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>> {
    let start = std::time::Instant::now();

    let resolution = state.resolver.resolve(&query.host).await.map_err(|e| {
        metrics::record_resolution(start.elapsed().as_secs_f64(), "error");
        e
    })?;

    let origin = format!("https://{}", state.config.tenancy.base_domain);

    let (outcome, tenant) = match resolution {
        HostResolution::Platform => ("platform", None),
        HostResolution::NotFound => ("not_found", None),
        HostResolution::Tenant {
            tenant_id,
            match_kind,
            matched,
            snapshot,
        } => {
            let canonical = canonical_base(&snapshot, &origin);
            (
                "tenant",
                Some(ResolvedTenant {
                    tenant_id,
                    slug: snapshot.slug,
                    match_kind,
                    matched,
                    canonical_base: canonical,
                }),
            )
        }
    };

    metrics::record_resolution(start.elapsed().as_secs_f64(), outcome);

    Ok(Json(ResolveResponse {
        host: query.host,
        outcome: outcome.to_string(),
        tenant,
    }))
}
