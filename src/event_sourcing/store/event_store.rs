use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::event_handling::EventBus;
use crate::event_sourcing::core::{DomainEvent, EventDescriptor};
use crate::serialization::{JsonSerializer, SerializationError, Serializer};

use super::storage::EventStorage;

// ============================================================================
// Event Store - Append-Only Log with Optimistic Concurrency
// ============================================================================
//
// Single source of truth for every aggregate's history. Responsibilities:
//
// 1. Append events with version checking (optimistic concurrency)
// 2. Load event history in ascending version order
// 3. Publish appended events to the event bus, in order
//
// The log is authoritative: a publication failure does not roll back the
// append. Subscribers must tolerate at-least-once delivery.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    #[error("concurrency conflict: expected version {expected}, but current is {current}")]
    Concurrency { expected: u64, current: u64 },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("event storage failure: {0}")]
    Storage(anyhow::Error),
}

/// Generic event store over a pluggable [`EventStorage`] backend.
///
/// Concurrent `save` calls for one aggregate id are serialized through a
/// per-aggregate mutex, so the read-check-append sequence is exclusive even
/// when the backend has no atomic compare-and-append primitive.
pub struct EventStore<E: DomainEvent, S: Serializer = JsonSerializer> {
    event_bus: Arc<dyn EventBus<E>>,
    storage: Arc<dyn EventStorage>,
    serializer: S,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(event_bus: Arc<dyn EventBus<E>>, storage: Arc<dyn EventStorage>) -> Self {
        Self::with_serializer(event_bus, storage, JsonSerializer)
    }
}

impl<E: DomainEvent, S: Serializer> EventStore<E, S> {
    pub fn with_serializer(
        event_bus: Arc<dyn EventBus<E>>,
        storage: Arc<dyn EventStorage>,
        serializer: S,
    ) -> Self {
        Self {
            event_bus,
            storage,
            serializer,
            write_locks: Mutex::new(HashMap::new()),
            _phantom: PhantomData,
        }
    }

    /// Identifiers of every aggregate with at least one stored event.
    pub async fn get_aggregate_ids(&self) -> Result<HashSet<String>, EventStoreError> {
        self.storage
            .find_identities()
            .await
            .map_err(EventStoreError::Storage)
    }

    /// Full event history for an aggregate, ascending version order.
    pub async fn get_events_for_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<E>, EventStoreError> {
        let contains = self
            .storage
            .contains(aggregate_id)
            .await
            .map_err(EventStoreError::Storage)?;
        if !contains {
            return Err(EventStoreError::AggregateNotFound(aggregate_id.to_string()));
        }

        let descriptors = self
            .storage
            .find(aggregate_id)
            .await
            .map_err(EventStoreError::Storage)?;

        let mut events = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            events.push(self.serializer.deserialize(&descriptor.payload)?);
        }

        tracing::debug!(
            aggregate_id = aggregate_id,
            event_count = events.len(),
            "Loaded events for aggregate"
        );
        Ok(events)
    }

    /// Append `events` for the aggregate, assigning versions
    /// `expected_version + 1 ..= expected_version + events.len()`, then
    /// publish each to the event bus in the same order.
    ///
    /// Fails with [`EventStoreError::Concurrency`] and performs no writes if
    /// the stored version no longer matches `expected_version`.
    pub async fn save(
        &self,
        aggregate_id: &str,
        aggregate_type: &str,
        events: &[E],
        expected_version: u64,
    ) -> Result<(), EventStoreError> {
        let lock = self.write_lock_for(aggregate_id).await;
        let version = {
            // Exclusive section: the read-check-append sequence must not
            // interleave with another writer for this aggregate. Publication
            // happens outside so listeners may issue follow-up saves.
            let _guard = lock.lock().await;

            let descriptors = self
                .storage
                .find(aggregate_id)
                .await
                .map_err(EventStoreError::Storage)?;
            let current_version = descriptors.last().map(|d| d.version).unwrap_or(0);

            if current_version != expected_version {
                return Err(EventStoreError::Concurrency {
                    expected: expected_version,
                    current: current_version,
                });
            }

            let mut version = expected_version;
            for event in events {
                version += 1;
                let payload = self.serializer.serialize(event)?;
                let descriptor = EventDescriptor::record(
                    aggregate_id,
                    aggregate_type,
                    event.kind(),
                    payload,
                    version,
                );
                self.storage
                    .append(descriptor)
                    .await
                    .map_err(EventStoreError::Storage)?;
            }
            version
        };

        tracing::info!(
            aggregate_id = aggregate_id,
            aggregate_type = aggregate_type,
            new_version = version,
            event_count = events.len(),
            "✅ Appended events to event store"
        );

        for event in events {
            if !self.event_bus.publish(event).await {
                tracing::warn!(
                    aggregate_id = aggregate_id,
                    event_kind = event.kind(),
                    "Appended event was not delivered to any listener"
                );
            }
        }

        Ok(())
    }

    /// Purge all stored descriptors. Test/reset use only.
    pub async fn clear(&self) -> Result<(), EventStoreError> {
        self.storage.clear().await.map_err(EventStoreError::Storage)
    }

    async fn write_lock_for(&self, aggregate_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks
            .entry(aggregate_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
