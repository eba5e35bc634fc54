//! Error types for BrokerForge services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! The provisioning taxonomy keeps two distinctions sharp:
//! `NotFound` (a legitimate "no tenant matches" outcome) is never folded
//! into `LookupFailed` (the directory could not be consulted), and
//! validation errors are raised before any external provider call.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    NotFound,
    TenantNotFound,
    ZoneNotFound,

    // Conflict errors (5xxx)
    DuplicateDomain,
    BindingConflict,
    ZoneNotActive,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    LookupFailed,
    ProviderUnavailable,
    CacheError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1002,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::TenantNotFound => 4002,
            ErrorCode::ZoneNotFound => 4003,

            // Conflicts (5xxx)
            ErrorCode::DuplicateDomain => 5001,
            ErrorCode::BindingConflict => 5002,
            ErrorCode::ZoneNotActive => 5003,

            // Rate limits (6xxx)
            ErrorCode::RateLimited => 6001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // External (8xxx)
            ErrorCode::LookupFailed => 8001,
            ErrorCode::ProviderUnavailable => 8002,
            ErrorCode::CacheError => 8003,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid domain format: {domain}")]
    InvalidFormat { domain: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Tenant not found: {id}")]
    TenantNotFound { id: String },

    #[error("DNS zone not found: {domain}")]
    ZoneNotFound { domain: String },

    // Conflict errors
    #[error("Domain already in use by another tenant: {domain}")]
    DuplicateDomain { domain: String },

    #[error("Domain binding conflict: {message}")]
    BindingConflict { message: String },

    #[error("DNS zone is not active yet: {domain}")]
    ZoneNotActive { domain: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Tenant directory lookup failed: {message}")]
    LookupFailed { message: String },

    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Cache error: {message}")]
    CacheError { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a DNS provider failure
    pub fn dns_provider(message: impl Into<String>) -> Self {
        AppError::ProviderUnavailable {
            provider: "dns".to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a hosting-platform failure
    pub fn platform(message: impl Into<String>) -> Self {
        AppError::ProviderUnavailable {
            provider: "platform".to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::TenantNotFound { .. } => ErrorCode::TenantNotFound,
            AppError::ZoneNotFound { .. } => ErrorCode::ZoneNotFound,
            AppError::DuplicateDomain { .. } => ErrorCode::DuplicateDomain,
            AppError::BindingConflict { .. } => ErrorCode::BindingConflict,
            AppError::ZoneNotActive { .. } => ErrorCode::ZoneNotActive,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::LookupFailed { .. } => ErrorCode::LookupFailed,
            AppError::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            AppError::CacheError { .. } => ErrorCode::CacheError,
            AppError::HttpClient(_) => ErrorCode::ProviderUnavailable,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } | AppError::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            AppError::NotFound { .. }
            | AppError::TenantNotFound { .. }
            | AppError::ZoneNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::DuplicateDomain { .. }
            | AppError::BindingConflict { .. }
            | AppError::ZoneNotActive { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::ProviderUnavailable { .. } | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }

            // 503 Service Unavailable
            AppError::LookupFailed { .. }
            | AppError::CacheError { .. }
            | AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: None,
                request_id: None, // Should be filled by middleware
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::DuplicateDomain {
            domain: "acme.example".into(),
        };
        assert_eq!(err.code(), ErrorCode::DuplicateDomain);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_lookup_failed_is_not_not_found() {
        let lookup = AppError::LookupFailed {
            message: "directory timeout".into(),
        };
        let missing = AppError::NotFound {
            resource_type: "tenant".into(),
            id: "acme".into(),
        };
        assert_ne!(lookup.status_code(), missing.status_code());
        assert_eq!(lookup.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::InvalidFormat {
            domain: "not a domain".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_provider_error() {
        let err = AppError::dns_provider("api timeout");
        assert_eq!(err.code(), ErrorCode::ProviderUnavailable);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());
    }
}
