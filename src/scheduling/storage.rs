use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// Schedule Storage Contract
// ============================================================================

/// One persisted deferred delivery: the event plus its absolute due time,
/// keyed by a unique token.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScheduledEvent<E> {
    pub token: String,
    pub event: E,
    pub due_at: DateTime<Utc>,
}

#[async_trait]
pub trait ScheduleStorage<E: DomainEvent>: Send + Sync {
    /// Every persisted entry, fired or cancelled ones excluded.
    async fn find_all(&self) -> Result<Vec<ScheduledEvent<E>>>;

    async fn add(&self, entry: ScheduledEvent<E>) -> Result<()>;

    /// Remove by token. Unknown tokens are a no-op.
    async fn remove(&self, token: &str) -> Result<()>;
}

/// In-memory reference adapter.
#[derive(Default)]
pub struct MemoryScheduleStorage<E> {
    entries: RwLock<HashMap<String, ScheduledEvent<E>>>,
}

impl<E> MemoryScheduleStorage<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<E: DomainEvent> ScheduleStorage<E> for MemoryScheduleStorage<E> {
    async fn find_all(&self) -> Result<Vec<ScheduledEvent<E>>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn add(&self, entry: ScheduledEvent<E>) -> Result<()> {
        self.entries.write().await.insert(entry.token.clone(), entry);
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.entries.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct TickEvent {
        id: String,
    }

    impl DomainEvent for TickEvent {
        fn kind(&self) -> &'static str {
            "Tick"
        }

        fn aggregate_id(&self) -> &str {
            &self.id
        }
    }

    #[tokio::test]
    async fn added_entries_are_listed_until_removed() {
        let storage = MemoryScheduleStorage::new();
        storage
            .add(ScheduledEvent {
                token: "tok-1".to_string(),
                event: TickEvent {
                    id: "t1".to_string(),
                },
                due_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(storage.find_all().await.unwrap().len(), 1);

        storage.remove("tok-1").await.unwrap();
        assert!(storage.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_an_unknown_token_is_a_no_op() {
        let storage: MemoryScheduleStorage<TickEvent> = MemoryScheduleStorage::new();
        storage.remove("missing").await.unwrap();
    }
}
