//! BrokerForge Common Library
//!
//! Shared code for the BrokerForge services including:
//! - Database models and repository patterns
//! - Domain normalization and validation
//! - Tenant directory, host resolution, and canonical URLs
//! - DNS provider and hosting-platform client abstractions
//! - Provisioning orchestration
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod db;
pub mod dns;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod platform;
pub mod provisioning;
pub mod tenancy;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use tenancy::{HostResolution, HostResolver, TenantDirectory, TenantSnapshot};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subdomain labels that can never belong to a tenant
pub const RESERVED_SLUGS: &[&str] = &["admin"];
