use std::sync::Arc;

use crate::serialization::Serializer;

use super::core::AggregateRoot;
use super::store::{EventStore, EventStoreError};

// ============================================================================
// Event Sourcing Repository
// ============================================================================
//
// Loads aggregates by replaying their stored history and persists their
// uncommitted changes through the event store. Aggregate instances are owned
// by the caller and never persisted directly.
//
// ============================================================================

pub struct EventSourcingRepository<A: AggregateRoot, S: Serializer> {
    event_store: Arc<EventStore<A::Event, S>>,
}

impl<A: AggregateRoot, S: Serializer> EventSourcingRepository<A, S> {
    pub fn new(event_store: Arc<EventStore<A::Event, S>>) -> Self {
        Self { event_store }
    }

    /// Reconstruct the aggregate's current state by folding its stored
    /// events, in ascending version order, through the aggregate's own
    /// event-application logic.
    pub async fn find_by_id(&self, aggregate_id: &str) -> Result<A, EventStoreError> {
        let events = self
            .event_store
            .get_events_for_aggregate(aggregate_id)
            .await?;

        let mut aggregate = A::default();
        for event in &events {
            aggregate.replay(event);
        }

        Ok(aggregate)
    }

    /// Persist the aggregate's uncommitted changes, expecting the stored
    /// version to equal the aggregate's version before these changes were
    /// buffered. On success the buffer is cleared and the aggregate's
    /// version advances past the newly persisted events.
    pub async fn store(&self, aggregate: &mut A) -> Result<(), EventStoreError> {
        let expected_version = aggregate.version();

        self.event_store
            .save(
                aggregate.id(),
                A::aggregate_type(),
                aggregate.uncommitted_changes(),
                expected_version,
            )
            .await?;

        aggregate.mark_changes_committed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{TodoCommand, TodoEvent, TodoItem};
    use crate::event_handling::SimpleEventBus;
    use crate::event_sourcing::store::MemoryEventStorage;
    use crate::serialization::JsonSerializer;

    fn repository() -> (
        EventSourcingRepository<TodoItem, JsonSerializer>,
        Arc<EventStore<TodoEvent>>,
    ) {
        let bus = Arc::new(SimpleEventBus::new());
        let storage = Arc::new(MemoryEventStorage::new());
        let store = Arc::new(EventStore::new(bus, storage));
        (EventSourcingRepository::new(store.clone()), store)
    }

    fn create(id: &str) -> TodoCommand {
        TodoCommand::Create {
            id: id.to_string(),
            description: "buy milk".to_string(),
            expire_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn stored_aggregate_is_reconstructed_by_replay() {
        let (repository, _) = repository();

        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();
        repository.store(&mut item).await.unwrap();

        let loaded: TodoItem = repository.find_by_id("t1").await.unwrap();

        assert_eq!(loaded.id(), "t1");
        assert_eq!(loaded.version(), 1);
        assert!(!loaded.is_done());
        assert!(loaded.uncommitted_changes().is_empty());
    }

    #[tokio::test]
    async fn store_commits_the_buffer_and_advances_the_version() {
        let (repository, _) = repository();

        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();
        assert_eq!(item.version(), 0);

        repository.store(&mut item).await.unwrap();

        assert_eq!(item.version(), 1);
        assert!(item.uncommitted_changes().is_empty());
    }

    #[tokio::test]
    async fn successive_stores_use_the_advanced_version() {
        let (repository, _) = repository();

        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();
        repository.store(&mut item).await.unwrap();

        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();
        repository.store(&mut item).await.unwrap();

        let loaded: TodoItem = repository.find_by_id("t1").await.unwrap();
        assert_eq!(loaded.version(), 2);
        assert!(loaded.is_done());
    }

    #[tokio::test]
    async fn missing_aggregate_propagates_not_found() {
        let (repository, _) = repository();

        let result = repository.find_by_id("missing").await;

        assert!(matches!(
            result,
            Err(EventStoreError::AggregateNotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn stale_aggregate_store_surfaces_concurrency_conflict() {
        let (repository, _) = repository();

        let mut first = TodoItem::default();
        first.execute(&create("t1")).unwrap();
        repository.store(&mut first).await.unwrap();

        // A second writer loaded at version 1 and lost the race.
        let mut winner: TodoItem = repository.find_by_id("t1").await.unwrap();
        let mut loser: TodoItem = repository.find_by_id("t1").await.unwrap();

        winner
            .execute(&TodoCommand::MarkAsDone {
                id: "t1".to_string(),
            })
            .unwrap();
        repository.store(&mut winner).await.unwrap();

        loser
            .execute(&TodoCommand::Expire {
                id: "t1".to_string(),
            })
            .unwrap();
        let result = repository.store(&mut loser).await;

        assert!(matches!(result, Err(EventStoreError::Concurrency { .. })));
        // The losing aggregate keeps its buffer so the caller can reload and retry.
        assert_eq!(loser.uncommitted_changes().len(), 1);
    }
}
