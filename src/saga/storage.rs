use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::association::AssociationValueDescriptor;

// ============================================================================
// Saga Storage Contract
// ============================================================================
//
// A saga's serialized snapshot and its association index entries are one
// unit: written and removed together.
//
// ============================================================================

#[async_trait]
pub trait SagaStorage: Send + Sync {
    /// Insert a new saga row keyed by (saga_type, id).
    async fn insert(
        &self,
        saga_type: &str,
        id: &str,
        associations: &AssociationValueDescriptor,
        data: &str,
    ) -> Result<()>;

    /// Update the row's association index and snapshot; inserts if absent.
    async fn update(
        &self,
        saga_type: &str,
        id: &str,
        associations: &AssociationValueDescriptor,
        data: &str,
    ) -> Result<()>;

    /// Remove the row and its index entries. Unknown ids are a no-op.
    async fn remove(&self, id: &str) -> Result<()>;

    /// The serialized snapshot for a saga id, if stored.
    async fn find_by_id(&self, id: &str) -> Result<Option<String>>;

    /// Ids of sagas whose stored type equals `saga_type` and whose index
    /// matches every (key, value) pair of the descriptor.
    async fn find(
        &self,
        saga_type: &str,
        associations: &AssociationValueDescriptor,
    ) -> Result<Vec<String>>;
}

#[derive(Clone, Debug)]
struct SagaRecord {
    saga_type: String,
    associations: AssociationValueDescriptor,
    data: String,
}

#[derive(Default)]
struct Inner {
    sagas: HashMap<String, SagaRecord>,
    // field -> value -> saga ids
    index: HashMap<String, HashMap<String, Vec<String>>>,
}

impl Inner {
    fn associate(&mut self, id: &str, associations: &AssociationValueDescriptor) {
        for (field, value) in associations {
            let ids = self
                .index
                .entry(field.clone())
                .or_default()
                .entry(value.clone())
                .or_default();
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
    }
}

/// In-memory reference adapter keeping snapshots and the association index in
/// step under one lock.
#[derive(Default)]
pub struct MemorySagaStorage {
    inner: RwLock<Inner>,
}

impl MemorySagaStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SagaStorage for MemorySagaStorage {
    async fn insert(
        &self,
        saga_type: &str,
        id: &str,
        associations: &AssociationValueDescriptor,
        data: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.sagas.insert(
            id.to_string(),
            SagaRecord {
                saga_type: saga_type.to_string(),
                associations: associations.clone(),
                data: data.to_string(),
            },
        );
        inner.associate(id, associations);
        Ok(())
    }

    async fn update(
        &self,
        saga_type: &str,
        id: &str,
        associations: &AssociationValueDescriptor,
        data: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.sagas.get_mut(id) {
            None => {
                inner.sagas.insert(
                    id.to_string(),
                    SagaRecord {
                        saga_type: saga_type.to_string(),
                        associations: associations.clone(),
                        data: data.to_string(),
                    },
                );
            }
            Some(record) => {
                record.associations = associations.clone();
                record.data = data.to_string();
            }
        }
        inner.associate(id, associations);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.sagas.remove(id).is_none() {
            return Ok(());
        }
        for by_value in inner.index.values_mut() {
            for ids in by_value.values_mut() {
                ids.retain(|stored| stored != id);
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.sagas.get(id).map(|record| record.data.clone()))
    }

    async fn find(
        &self,
        saga_type: &str,
        associations: &AssociationValueDescriptor,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut found: Vec<String> = Vec::new();

        for (field, value) in associations {
            let Some(by_value) = inner.index.get(field) else {
                return Ok(Vec::new());
            };
            if let Some(ids) = by_value.get(value) {
                for id in ids {
                    if !found.iter().any(|existing| existing == id) {
                        found.push(id.clone());
                    }
                }
            }
        }

        found.retain(|id| {
            inner
                .sagas
                .get(id)
                .map(|record| record.saga_type == saga_type)
                .unwrap_or(false)
        });
        Ok(found)
    }
}
