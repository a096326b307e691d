//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `PAYLEDGER` prefix and
//! `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use payledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod gateway;
mod ledger;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use ledger::LedgerConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment gateway configuration (NOWPayments)
    pub gateway: GatewayConfig,

    /// Balance ledger settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Admin and end user authentication
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYLEDGER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYLEDGER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYLEDGER__GATEWAY__IPN_SECRET=...` -> `gateway.ipn_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYLEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate(&self.server.environment)?;
        self.ledger.validate()?;
        self.auth.validate(&self.server.environment)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("PAYLEDGER__DATABASE__URL", "postgresql://test@localhost/test"),
        ("PAYLEDGER__GATEWAY__API_KEY", "np-key"),
        ("PAYLEDGER__GATEWAY__IPN_SECRET", "ipn-secret"),
        ("PAYLEDGER__GATEWAY__IPN_CALLBACK_URL", "https://pay.example.com/api/payments/ipn"),
        ("PAYLEDGER__AUTH__ADMIN_API_TOKEN", "dev-admin-token"),
    ];

    const OPTIONAL: &[&str] = &[
        "PAYLEDGER__SERVER__PORT",
        "PAYLEDGER__SERVER__ENVIRONMENT",
        "PAYLEDGER__GATEWAY__CANONICAL_SIGNATURE_FALLBACK",
        "PAYLEDGER__LEDGER__CURRENCY",
        "PAYLEDGER__LEDGER__DEPOSIT_ADDRESS",
        "PAYLEDGER__LEDGER__DEPOSIT_NETWORK",
        "PAYLEDGER__AUTH__TELEGRAM_BOT_TOKEN",
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        for key in OPTIONAL {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.gateway.api_key, "np-key");
        assert_eq!(config.ledger.currency, "KZT");
        assert!(config.gateway.canonical_signature_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYLEDGER__SERVER__PORT", "3000");
        env::set_var("PAYLEDGER__GATEWAY__CANONICAL_SIGNATURE_FALLBACK", "false");
        env::set_var("PAYLEDGER__LEDGER__CURRENCY", "USD");
        env::set_var("PAYLEDGER__LEDGER__DEPOSIT_ADDRESS", "TXyz123");
        env::set_var("PAYLEDGER__LEDGER__DEPOSIT_NETWORK", "USDT ERC20");
        env::set_var("PAYLEDGER__AUTH__TELEGRAM_BOT_TOKEN", "123:bot");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.gateway.canonical_signature_fallback);
        assert_eq!(config.ledger.currency, "USD");
        assert_eq!(config.ledger.deposit_address, "TXyz123");
        assert_eq!(config.ledger.deposit_network, "USDT ERC20");
        assert!(config.auth.telegram_bot_token().is_some());
        assert_eq!(config.auth.init_data_max_age().as_secs(), 86_400);
    }

    #[test]
    fn test_production_rejects_short_admin_token() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYLEDGER__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.environment, Environment::Production);
        assert_eq!(config.validate(), Err(ValidationError::AdminTokenTooShort));
    }

    #[test]
    fn test_missing_gateway_section_fails_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("PAYLEDGER__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
