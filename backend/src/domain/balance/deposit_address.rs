//! Static crypto deposit address shown to users topping up manually.

/// Returned while no address is configured, so clients can tell.
pub const UNSET_DEPOSIT_ADDRESS: &str = "TBD_SET_DEPOSIT_ADDRESS";

pub const DEFAULT_DEPOSIT_NETWORK: &str = "USDT TRC20";

/// Where users send funds before filing a deposit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositAddress {
    pub address: String,
    pub network_label: String,
}

impl DepositAddress {
    /// Blank inputs fall back to the placeholder address and default network.
    pub fn new(address: &str, network_label: &str) -> Self {
        let address = match address.trim() {
            "" => UNSET_DEPOSIT_ADDRESS,
            a => a,
        };
        let network_label = match network_label.trim() {
            "" => DEFAULT_DEPOSIT_NETWORK,
            n => n,
        };
        Self {
            address: address.to_string(),
            network_label: network_label.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.address != UNSET_DEPOSIT_ADDRESS
    }

    /// Text to encode in the QR code.
    pub fn qr_payload(&self) -> &str {
        &self.address
    }
}

impl Default for DepositAddress {
    fn default() -> Self {
        Self::new("", "")
    }
}
