use std::sync::Arc;

use anyhow::Result;

use crate::serialization::Serializer;

use super::association::{descriptor_from_value, descriptor_from_values, AssociationValue};
use super::saga::{Saga, SagaSerializer};
use super::storage::SagaStorage;

// ============================================================================
// Saga Repository
// ============================================================================
//
// Persists saga snapshots indexed by their association values. The snapshot
// and the index are written and removed as one unit; an inactive saga is
// removed on commit and never resurrected.
//
// ============================================================================

pub struct SagaRepository<S: Saga, Ser: Serializer> {
    storage: Arc<dyn SagaStorage>,
    serializer: SagaSerializer<S, Ser>,
}

impl<S: Saga, Ser: Serializer> SagaRepository<S, Ser> {
    pub fn new(storage: Arc<dyn SagaStorage>, serializer: SagaSerializer<S, Ser>) -> Self {
        Self {
            storage,
            serializer,
        }
    }

    /// Persist a newly created saga. No-op unless the saga is still active.
    pub async fn add(&self, saga: &S) -> Result<()> {
        if !saga.is_active() {
            return Ok(());
        }

        self.storage
            .insert(
                saga.saga_type(),
                saga.id(),
                &descriptor_from_values(saga.association_values()),
                &self.serializer.serialize(saga)?,
            )
            .await?;

        tracing::debug!(saga_id = saga.id(), saga_type = saga.saga_type(), "Saga added");
        Ok(())
    }

    /// Persist the saga's current state, or remove it if its workflow has
    /// completed.
    pub async fn commit(&self, saga: &S) -> Result<()> {
        if !saga.is_active() {
            self.storage.remove(saga.id()).await?;
            tracing::debug!(
                saga_id = saga.id(),
                saga_type = saga.saga_type(),
                "Terminal saga removed"
            );
            return Ok(());
        }

        self.storage
            .update(
                saga.saga_type(),
                saga.id(),
                &descriptor_from_values(saga.association_values()),
                &self.serializer.serialize(saga)?,
            )
            .await
    }

    /// Ids of stored sagas of `saga_type` associated with the given value.
    pub async fn find(
        &self,
        saga_type: &str,
        association_value: &AssociationValue,
    ) -> Result<Vec<String>> {
        self.storage
            .find(saga_type, &descriptor_from_value(association_value))
            .await
    }

    /// Deserialize the stored snapshot for `id`, if present.
    pub async fn load(&self, id: &str) -> Result<Option<S>> {
        let Some(data) = self.storage.find_by_id(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.serializer.deserialize(&data)?))
    }
}
