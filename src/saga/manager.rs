use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::event_handling::EventListener;
use crate::event_sourcing::core::DomainEvent;
use crate::serialization::Serializer;

use super::repository::SagaRepository;
use super::resolver::AssociationValueResolver;
use super::saga::{Saga, SagaFactory};

// ============================================================================
// Saga Manager - Correlation-Based Dispatch
// ============================================================================
//
// Routes each published event to the saga instances correlated with it, or
// starts a new saga when none match and the variant's creation policy allows
// starting on that event. Saga lifecycle: absent -> active (persisted) ->
// inactive/terminal (removed on next commit, never resurrected).
//
// ============================================================================

pub struct SimpleSagaManager<S: Saga, Ser: Serializer> {
    saga_types: Vec<&'static str>,
    repository: SagaRepository<S, Ser>,
    resolver: Arc<dyn AssociationValueResolver<S::Event>>,
    factory: Arc<dyn SagaFactory<S>>,
}

impl<S: Saga, Ser: Serializer> SimpleSagaManager<S, Ser> {
    pub fn new(
        saga_types: Vec<&'static str>,
        repository: SagaRepository<S, Ser>,
        resolver: Arc<dyn AssociationValueResolver<S::Event>>,
        factory: Arc<dyn SagaFactory<S>>,
    ) -> Self {
        Self {
            saga_types,
            repository,
            resolver,
            factory,
        }
    }

    /// Dispatch one event: resolve candidate association values, route to
    /// every matched saga per registered type, and fall back to the creation
    /// policy when a type has no match.
    pub async fn on(&self, event: &S::Event) -> anyhow::Result<()> {
        let candidate_values = self.resolver.extract_association_values(event);

        for saga_type in &self.saga_types {
            let mut saga_ids: Vec<String> = Vec::new();
            for value in &candidate_values {
                for id in self.repository.find(saga_type, value).await? {
                    if !saga_ids.iter().any(|existing| *existing == id) {
                        saga_ids.push(id);
                    }
                }
            }

            if !saga_ids.is_empty() {
                for saga_id in saga_ids {
                    let Some(mut saga) = self.repository.load(&saga_id).await? else {
                        tracing::warn!(
                            saga_id = %saga_id,
                            saga_type = saga_type,
                            "Indexed saga has no stored snapshot; skipping"
                        );
                        continue;
                    };
                    saga.on(event).await?;
                    self.repository.commit(&saga).await?;
                }
                continue;
            }

            if self.factory.starts_on(saga_type, event) {
                let saga_id = Uuid::new_v4().to_string();
                let mut saga =
                    self.factory
                        .create(saga_type, saga_id.clone(), candidate_values.clone())?;
                saga.on(event).await?;
                self.repository.add(&saga).await?;
                tracing::debug!(
                    saga_id = %saga_id,
                    saga_type = saga_type,
                    event_kind = event.kind(),
                    "Started new saga"
                );
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<S, Ser> EventListener<S::Event> for SimpleSagaManager<S, Ser>
where
    S: Saga,
    Ser: Serializer + 'static,
{
    async fn on_event(&self, event: &S::Event) -> anyhow::Result<()> {
        self.on(event).await
    }
}
