//! Payment gateway configuration (NOWPayments)

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// NOWPayments API and IPN settings
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Shared IPN secret. IPN verification fails closed while unset.
    pub ipn_secret: Option<String>,

    /// Callback URL registered on every invoice
    pub ipn_callback_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Also accept signatures over the canonical (sorted-key) body
    #[serde(default = "default_canonical_fallback")]
    pub canonical_signature_fallback: bool,
}

impl GatewayConfig {
    pub fn api_key(&self) -> SecretString {
        SecretString::new(self.api_key.clone())
    }

    pub fn ipn_secret(&self) -> Option<SecretString> {
        self.ipn_secret
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SecretString::new(s.clone()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYLEDGER__GATEWAY__API_KEY"));
        }
        if self.ipn_callback_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYLEDGER__GATEWAY__IPN_CALLBACK_URL",
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        if *environment == Environment::Production {
            if self.ipn_secret().is_none() {
                return Err(ValidationError::MissingRequired("PAYLEDGER__GATEWAY__IPN_SECRET"));
            }
            if !self.api_base_url.starts_with("https://") {
                return Err(ValidationError::GatewayUrlMustBeHttps);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_base_url", &self.api_base_url)
            .field("ipn_secret_set", &self.ipn_secret().is_some())
            .field("ipn_callback_url", &self.ipn_callback_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("canonical_signature_fallback", &self.canonical_signature_fallback)
            .finish_non_exhaustive()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            ipn_secret: None,
            ipn_callback_url: String::new(),
            timeout_secs: default_timeout(),
            canonical_signature_fallback: default_canonical_fallback(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.nowpayments.io/v1".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_canonical_fallback() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn valid() -> GatewayConfig {
        GatewayConfig {
            api_key: "np-key".to_string(),
            ipn_secret: Some("ipn-secret".to_string()),
            ipn_callback_url: "https://pay.example.com/api/payments/ipn".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.api_base_url, "https://api.nowpayments.io/v1");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert!(config.canonical_signature_fallback);
    }

    #[test]
    fn test_missing_api_key() {
        let config = GatewayConfig {
            api_key: " ".to_string(),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("PAYLEDGER__GATEWAY__API_KEY"))
        );
    }

    #[test]
    fn test_blank_ipn_secret_counts_as_unset() {
        let config = GatewayConfig {
            ipn_secret: Some("   ".to_string()),
            ..valid()
        };
        assert!(config.ipn_secret().is_none());
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::MissingRequired("PAYLEDGER__GATEWAY__IPN_SECRET"))
        );
    }

    #[test]
    fn test_production_requires_https() {
        let config = GatewayConfig {
            api_base_url: "http://sandbox.local/v1".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::GatewayUrlMustBeHttps)
        );
    }

    #[test]
    fn test_secrets_exposed_only_through_accessors() {
        let config = valid();
        assert_eq!(config.api_key().expose_secret(), "np-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("np-key"));
        assert!(!debug.contains("ipn-secret"));
    }
}
