//! Balance ledger configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Ledger display settings
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency code shown next to formatted balances
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Static crypto address for manual top-ups (blank shows a placeholder)
    #[serde(default)]
    pub deposit_address: String,

    /// Network label shown next to the deposit address
    #[serde(default = "default_deposit_network")]
    pub deposit_network: String,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let valid = self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.deposit_address.trim().chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidDepositAddress);
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            deposit_address: String::new(),
            deposit_network: default_deposit_network(),
        }
    }
}

fn default_currency() -> String {
    "KZT".to_string()
}

fn default_deposit_network() -> String {
    "USDT TRC20".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_currency() {
        assert_eq!(LedgerConfig::default().currency, "KZT");
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_lowercase_or_long_codes() {
        for bad in ["kzt", "USDT", ""] {
            let config = LedgerConfig {
                currency: bad.to_string(),
                ..LedgerConfig::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency), "{bad}");
        }
    }

    #[test]
    fn test_deposit_defaults() {
        let config = LedgerConfig::default();
        assert!(config.deposit_address.is_empty());
        assert_eq!(config.deposit_network, "USDT TRC20");
    }

    #[test]
    fn test_rejects_address_with_inner_whitespace() {
        let config = LedgerConfig {
            deposit_address: "TXyz 123".to_string(),
            ..LedgerConfig::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDepositAddress));

        let padded = LedgerConfig {
            deposit_address: " TXyz123 ".to_string(),
            ..LedgerConfig::default()
        };
        assert!(padded.validate().is_ok());
    }
}
