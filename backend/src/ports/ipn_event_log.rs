//! IpnEventLog port - append-only audit of every parseable IPN delivery.
//!
//! Appends commit on their own, before and independent of reconciliation,
//! so a forged or failing callback still leaves a trace.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{IpnEvent, NewIpnEvent};

#[async_trait]
pub trait IpnEventLog: Send + Sync {
    async fn append(&self, event: NewIpnEvent) -> Result<IpnEvent, DomainError>;

    /// Most recent events first.
    async fn recent(&self, limit: u32) -> Result<Vec<IpnEvent>, DomainError>;
}
