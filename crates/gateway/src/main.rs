//! BrokerForge Gateway
//!
//! The entry point for tenant resolution and custom-domain provisioning.
//! Handles:
//! - Host-to-tenant resolution for the storefront edge
//! - Custom-domain submission, verification polling, and removal
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, post},
    Router,
};
use brokerforge_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    dns::{DigitalOceanDns, GoogleDnsResolver},
    metrics,
    platform::{DigitalOceanApps, PlatformBinder},
    provisioning::{Provisioner, ProvisionerSettings, ZoneStore},
    tenancy::{CachedDirectory, HostResolver, TenantDirectory},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub repo: Repository,
    pub resolver: HostResolver,
    pub provisioner: Arc<Provisioner>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting BrokerForge Gateway v{}", brokerforge_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(format!(
                    "{}_provider_call_duration_seconds",
                    metrics::METRICS_PREFIX
                )),
                metrics::PROVIDER_BUCKETS,
            )?
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .with_http_listener(SocketAddr::from((
                [0, 0, 0, 0],
                config.observability.metrics_port,
            )))
            .install()?;
        info!(port = config.observability.metrics_port, "Prometheus exporter listening");
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db.clone());

    // Tenant directory, with a Redis read-through cache when configured
    let directory: Arc<dyn TenantDirectory> = match config.redis.url {
        Some(ref url) => {
            info!("Connecting to Redis for directory caching...");
            let cache = brokerforge_common::cache::Cache::new(
                brokerforge_common::cache::CacheConfig {
                    url: url.clone(),
                    default_ttl_secs: config.redis.default_ttl_secs,
                    ..Default::default()
                },
            )
            .await?;
            Arc::new(CachedDirectory::new(
                Arc::new(repo.clone()),
                Arc::new(cache),
                config.tenancy.directory_cache_ttl_secs,
            ))
        }
        None => Arc::new(repo.clone()),
    };

    let resolver = HostResolver::new(
        directory,
        config.tenancy.base_domain.clone(),
        config.lookup_timeout(),
    );

    // Provider clients; missing credentials fail here, not on the first
    // operator request.
    let dns = DigitalOceanDns::from_config(&config.dns)?;
    let ns_resolver = GoogleDnsResolver::from_config(&config.dns)?;
    let platform = DigitalOceanApps::from_config(&config.platform)?;

    let zones: Arc<dyn ZoneStore> = Arc::new(repo.clone());
    let provisioner = Arc::new(Provisioner::new(
        zones,
        Arc::new(dns),
        Arc::new(ns_resolver),
        PlatformBinder::new(Arc::new(platform)),
        ProvisionerSettings {
            base_domain: config.tenancy.base_domain.clone(),
            nameserver_suffix: config.dns.nameserver_suffix.clone(),
            max_verification_attempts: config.dns.max_verification_attempts,
            record_ttl_secs: config.dns.record_ttl_secs,
        },
    ));

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        repo,
        resolver,
        provisioner,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Host resolution (edge hot path)
        .route("/resolve", get(handlers::resolve::resolve_host))
        // Custom-domain provisioning
        .route("/domains", post(handlers::domains::submit_domain))
        .route("/domains/{domain}/verify", post(handlers::domains::verify_domain))
        .route("/domains/{domain}/status", get(handlers::domains::domain_status))
        .route(
            "/tenants/{tenant_id}/domain",
            delete(handlers::domains::remove_domain),
        )
        // Custom records on active zones
        .route("/zones/{zone_id}/records", post(handlers::domains::add_record));

    let mut router = Router::new().nest("/v2", api_routes);

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        router = router.layer(axum::middleware::from_fn(move |request, next| {
            let limiter = limiter.clone();
            async move { middleware::rate_limit::rate_limit_middleware(request, next, limiter).await }
        }));
    }

    // Compose the app
    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
