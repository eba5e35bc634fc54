//! Configuration management for BrokerForge services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    pub redis: RedisConfig,

    /// Tenancy / host resolution configuration
    pub tenancy: TenancyConfig,

    /// DNS provider configuration
    pub dns: DnsConfig,

    /// Hosting-platform configuration
    pub platform: PlatformConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL (optional; directory caching is disabled without it)
    pub url: Option<String>,

    /// Default TTL in seconds
    #[serde(default = "default_redis_ttl")]
    pub default_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenancyConfig {
    /// The platform's own public domain; `{slug}.{base_domain}` hosts
    /// tenant storefronts and the bare/`www.` forms are the platform surface
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// Budget for a single directory lookup inside the request path.
    /// A timeout surfaces as LookupFailed, never NotFound.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// TTL for cached directory lookups
    #[serde(default = "default_directory_cache_ttl")]
    pub directory_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// DNS provider API token
    pub api_token: Option<String>,

    /// DNS provider API base URL
    #[serde(default = "default_dns_api_base")]
    pub api_base: String,

    /// IP address assigned to the apex A record of new zones
    #[serde(default = "default_app_ip")]
    pub app_ip: String,

    /// Suffix identifying the provider's own nameservers in NS answers
    #[serde(default = "default_nameserver_suffix")]
    pub nameserver_suffix: String,

    /// Public DNS-over-HTTPS resolver used for NS propagation checks
    #[serde(default = "default_ns_lookup_url")]
    pub ns_lookup_url: String,

    /// Verification attempts before a zone is marked failed
    /// (288 polls at the 5-minute cadence is roughly 24 hours)
    #[serde(default = "default_max_verification_attempts")]
    pub max_verification_attempts: i32,

    /// TTL for records created in new zones
    #[serde(default = "default_record_ttl")]
    pub record_ttl_secs: i32,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    /// Hosting-platform API token
    pub api_token: Option<String>,

    /// Identifier of the app the domains are bound to
    pub app_id: Option<String>,

    /// Hosting-platform API base URL
    #[serde(default = "default_platform_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 50 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_redis_ttl() -> u64 { 300 }
fn default_base_domain() -> String { "brokerforge.site".to_string() }
fn default_lookup_timeout_ms() -> u64 { 800 }
fn default_directory_cache_ttl() -> u64 { 60 }
fn default_dns_api_base() -> String { "https://api.digitalocean.com/v2".to_string() }
fn default_app_ip() -> String { "162.159.140.98".to_string() }
fn default_nameserver_suffix() -> String { "digitalocean.com".to_string() }
fn default_ns_lookup_url() -> String { "https://dns.google/resolve".to_string() }
fn default_max_verification_attempts() -> i32 { 288 }
fn default_record_ttl() -> i32 { 3600 }
fn default_provider_timeout() -> u64 { 15 }
fn default_platform_api_base() -> String { "https://api.digitalocean.com/v2".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "brokerforge".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__TENANCY__BASE_DOMAIN=brokerforge.site
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get the directory lookup budget as Duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.tenancy.lookup_timeout_ms)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/brokerforge".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            redis: RedisConfig {
                url: None,
                default_ttl_secs: default_redis_ttl(),
            },
            tenancy: TenancyConfig {
                base_domain: default_base_domain(),
                lookup_timeout_ms: default_lookup_timeout_ms(),
                directory_cache_ttl_secs: default_directory_cache_ttl(),
            },
            dns: DnsConfig {
                api_token: None,
                api_base: default_dns_api_base(),
                app_ip: default_app_ip(),
                nameserver_suffix: default_nameserver_suffix(),
                ns_lookup_url: default_ns_lookup_url(),
                max_verification_attempts: default_max_verification_attempts(),
                record_ttl_secs: default_record_ttl(),
                timeout_secs: default_provider_timeout(),
            },
            platform: PlatformConfig {
                api_token: None,
                app_id: None,
                api_base: default_platform_api_base(),
                timeout_secs: default_provider_timeout(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: default_rate_limit(),
                burst: default_burst(),
                enabled: default_enabled(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tenancy.base_domain, "brokerforge.site");
        assert_eq!(config.dns.max_verification_attempts, 288);
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/brokerforge");
    }

    #[test]
    fn test_lookup_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.lookup_timeout(), Duration::from_millis(800));
    }
}
