//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Gateway URL must use HTTPS in production")]
    GatewayUrlMustBeHttps,

    #[error("Invalid gateway timeout")]
    InvalidGatewayTimeout,

    #[error("Ledger currency must be a three-letter code")]
    InvalidCurrency,

    #[error("Deposit address must not contain whitespace")]
    InvalidDepositAddress,

    #[error("Admin API token is too short")]
    AdminTokenTooShort,

    #[error("User identity is unverified: set a Telegram bot token or explicitly trust X-User-Id")]
    UserIdentityUnverified,
}
