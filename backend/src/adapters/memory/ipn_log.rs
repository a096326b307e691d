//! In-memory IPN audit log.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, IpnEventId};
use crate::domain::payment::{IpnEvent, NewIpnEvent};
use crate::ports::IpnEventLog;

/// Append-only event list. Independent of [`super::InMemoryStore`] so a
/// rolled-back unit of work never takes audit rows with it.
#[derive(Clone, Default)]
pub struct InMemoryIpnEventLog {
    events: Arc<RwLock<Vec<IpnEvent>>>,
}

impl InMemoryIpnEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// All events, oldest first.
    pub async fn all(&self) -> Vec<IpnEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl IpnEventLog for InMemoryIpnEventLog {
    async fn append(&self, event: NewIpnEvent) -> Result<IpnEvent, DomainError> {
        let mut events = self.events.write().await;
        let event = event.into_event(IpnEventId::new(events.len() as i64 + 1));
        events.push(event.clone());
        Ok(event)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<IpnEvent>, DomainError> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
