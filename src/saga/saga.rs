use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::event_sourcing::core::DomainEvent;
use crate::serialization::{SerializationError, Serializer};

use super::association::AssociationValues;

// ============================================================================
// Saga Contract and Factory
// ============================================================================
//
// A saga is a long-lived process entity correlated across multiple events via
// shared business-key values. Saga variants for one event family are tagged
// types persisted as serialized snapshots; an inactive saga is terminal and
// is removed from storage on its next commit.
//
// ============================================================================

/// Contract every saga variant implements.
///
/// Runtime collaborators a saga holds (scheduler, bus) must be marked
/// `#[serde(skip)]`; the [`SagaFactory::hydrate`] hook reinjects them after a
/// snapshot is deserialized.
#[async_trait]
pub trait Saga: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Event: DomainEvent;

    fn id(&self) -> &str;

    /// Type tag stored with the snapshot and matched by `find`.
    fn saga_type(&self) -> &'static str;

    fn association_values(&self) -> &AssociationValues;

    /// Apply a correlated event. The saga's own logic decides when its
    /// workflow is complete and flips it inactive.
    async fn on(&mut self, event: &Self::Event) -> anyhow::Result<()>;

    fn is_active(&self) -> bool;
}

/// Creates saga instances and decides the creation policy.
pub trait SagaFactory<S: Saga>: Send + Sync {
    /// Creation policy: may a new saga of `saga_type` be started for this
    /// event when no existing saga matched?
    fn starts_on(&self, saga_type: &str, event: &S::Event) -> bool;

    /// Construct a new saga instance carrying the resolved association
    /// values.
    fn create(
        &self,
        saga_type: &str,
        id: String,
        association_values: AssociationValues,
    ) -> anyhow::Result<S>;

    /// Reinject runtime collaborators into a freshly deserialized saga.
    fn hydrate(&self, saga: &mut S) {
        let _ = saga;
    }
}

/// Serializes saga snapshots, running the factory's hydrate hook on load.
pub struct SagaSerializer<S: Saga, Ser: Serializer> {
    serializer: Ser,
    factory: Arc<dyn SagaFactory<S>>,
}

impl<S: Saga, Ser: Serializer> SagaSerializer<S, Ser> {
    pub fn new(serializer: Ser, factory: Arc<dyn SagaFactory<S>>) -> Self {
        Self {
            serializer,
            factory,
        }
    }

    pub fn serialize(&self, saga: &S) -> Result<String, SerializationError> {
        self.serializer.serialize(saga)
    }

    pub fn deserialize(&self, data: &str) -> Result<S, SerializationError> {
        let mut saga: S = self.serializer.deserialize(data)?;
        self.factory.hydrate(&mut saga);
        Ok(saga)
    }
}
