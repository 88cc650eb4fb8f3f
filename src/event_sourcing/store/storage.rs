use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::event_sourcing::core::EventDescriptor;

// ============================================================================
// Event Storage Contract
// ============================================================================
//
// Pluggable persistence for event descriptors. The store layered on top
// guarantees version checking and ordering; adapters only need to keep
// descriptors per aggregate in append order.
//
// ============================================================================

#[async_trait]
pub trait EventStorage: Send + Sync {
    async fn contains(&self, aggregate_id: &str) -> Result<bool>;

    /// Append one descriptor to the aggregate's log.
    async fn append(&self, descriptor: EventDescriptor) -> Result<bool>;

    /// All descriptors for an aggregate, ascending version order.
    async fn find(&self, aggregate_id: &str) -> Result<Vec<EventDescriptor>>;

    /// Identifiers of every aggregate with at least one stored event.
    async fn find_identities(&self) -> Result<HashSet<String>>;

    /// Purge all stored descriptors. Test/reset use only.
    async fn clear(&self) -> Result<()>;
}

/// In-memory reference adapter. Keeps each aggregate's descriptors in append
/// order behind a single lock.
#[derive(Default)]
pub struct MemoryEventStorage {
    logs: RwLock<HashMap<String, Vec<EventDescriptor>>>,
}

impl MemoryEventStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStorage for MemoryEventStorage {
    async fn contains(&self, aggregate_id: &str) -> Result<bool> {
        Ok(self.logs.read().await.contains_key(aggregate_id))
    }

    async fn append(&self, descriptor: EventDescriptor) -> Result<bool> {
        let mut logs = self.logs.write().await;
        logs.entry(descriptor.aggregate_id.clone())
            .or_default()
            .push(descriptor);
        Ok(true)
    }

    async fn find(&self, aggregate_id: &str) -> Result<Vec<EventDescriptor>> {
        Ok(self
            .logs
            .read()
            .await
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_identities(&self) -> Result<HashSet<String>> {
        Ok(self.logs.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.logs.write().await.clear();
        Ok(())
    }
}
