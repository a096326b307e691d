//! Authentication configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum admin token length outside development.
const MIN_PRODUCTION_TOKEN_LEN: usize = 32;

/// Admin and end user authentication
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on every admin route
    pub admin_api_token: String,

    /// Telegram bot token; when set, users are identified by signed
    /// WebApp initData instead of `X-User-Id`
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Maximum initData age in seconds (0 disables the check)
    #[serde(default = "default_init_data_max_age")]
    pub init_data_max_age_secs: u64,

    /// Accept a bare `X-User-Id` outside development
    #[serde(default)]
    pub trust_user_id_header: bool,
}

impl AuthConfig {
    pub fn admin_token(&self) -> SecretString {
        SecretString::new(self.admin_api_token.clone())
    }

    /// Bot token for initData verification, if configured.
    pub fn telegram_bot_token(&self) -> Option<SecretString> {
        let token = self.telegram_bot_token.trim();
        (!token.is_empty()).then(|| SecretString::new(token.to_string()))
    }

    pub fn init_data_max_age(&self) -> Duration {
        Duration::from_secs(self.init_data_max_age_secs)
    }

    /// Validate authentication configuration
    ///
    /// Staging and production require a token of at least 32 characters,
    /// and verified user identity unless `trust_user_id_header` is set.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.admin_api_token.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYLEDGER__AUTH__ADMIN_API_TOKEN"));
        }
        if *environment != Environment::Development
            && self.admin_api_token.len() < MIN_PRODUCTION_TOKEN_LEN
        {
            return Err(ValidationError::AdminTokenTooShort);
        }
        if *environment != Environment::Development
            && self.telegram_bot_token().is_none()
            && !self.trust_user_id_header
        {
            return Err(ValidationError::UserIdentityUnverified);
        }
        Ok(())
    }
}

fn default_init_data_max_age() -> u64 {
    86_400
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").finish_non_exhaustive()
    }
}
