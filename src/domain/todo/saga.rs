use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::saga::{AssociationValues, Saga, SagaFactory};
use crate::scheduling::{ScheduleToken, SimpleEventScheduler, TimeUnit};

use super::events::{TodoEvent, TodoExpired};

// ============================================================================
// To-Do Expiration Saga
// ============================================================================
//
// Starts when an item is created, schedules an `Expired` delivery for the
// item's expiry delay, and completes when the item is either marked done
// (cancelling the schedule) or expires.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TodoExpirationSaga {
    id: String,
    association_values: AssociationValues,
    active: bool,
    expire_token: Option<ScheduleToken>,
    #[serde(skip)]
    scheduler: Option<SimpleEventScheduler<TodoEvent>>,
}

#[async_trait]
impl Saga for TodoExpirationSaga {
    type Event = TodoEvent;

    fn id(&self) -> &str {
        &self.id
    }

    fn saga_type(&self) -> &'static str {
        "TodoExpirationSaga"
    }

    fn association_values(&self) -> &AssociationValues {
        &self.association_values
    }

    async fn on(&mut self, event: &TodoEvent) -> anyhow::Result<()> {
        match event {
            TodoEvent::Created(e) => {
                let scheduler = self
                    .scheduler
                    .as_ref()
                    .context("expiration saga used without a scheduler")?;
                let token = scheduler
                    .schedule_after(
                        e.expire_seconds,
                        TodoEvent::Expired(TodoExpired { id: e.id.clone() }),
                        TimeUnit::Seconds,
                    )
                    .await?;
                self.expire_token = Some(token);
            }

            TodoEvent::MarkedAsDone(_) => {
                if let Some(token) = self.expire_token.take() {
                    let scheduler = self
                        .scheduler
                        .as_ref()
                        .context("expiration saga used without a scheduler")?;
                    scheduler.cancel_schedule(&token).await?;
                }
                self.active = false;
            }

            TodoEvent::Expired(_) => {
                self.expire_token = None;
                self.active = false;
            }
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Builds expiration sagas and reinjects the scheduler after deserialization.
pub struct TodoSagaFactory {
    scheduler: SimpleEventScheduler<TodoEvent>,
}

impl TodoSagaFactory {
    pub const SAGA_TYPES: &'static [&'static str] = &["TodoExpirationSaga"];

    pub fn new(scheduler: SimpleEventScheduler<TodoEvent>) -> Self {
        Self { scheduler }
    }
}

impl SagaFactory<TodoExpirationSaga> for TodoSagaFactory {
    fn starts_on(&self, _saga_type: &str, event: &TodoEvent) -> bool {
        matches!(event, TodoEvent::Created(_))
    }

    fn create(
        &self,
        _saga_type: &str,
        id: String,
        association_values: AssociationValues,
    ) -> anyhow::Result<TodoExpirationSaga> {
        Ok(TodoExpirationSaga {
            id,
            association_values,
            active: true,
            expire_token: None,
            scheduler: Some(self.scheduler.clone()),
        })
    }

    fn hydrate(&self, saga: &mut TodoExpirationSaga) {
        saga.scheduler = Some(self.scheduler.clone());
    }
}
