use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::event_handling::EventBus;
use crate::event_sourcing::core::DomainEvent;

use super::storage::{ScheduleStorage, ScheduledEvent};

// ============================================================================
// Event Scheduler - Crash-Resilient Deferred Delivery
// ============================================================================
//
// Every schedule is persisted before a timer is armed, so pending deliveries
// survive a restart. In-memory timers only cover delays within the platform's
// representable maximum; the periodic reconciliation pass arms whatever has
// come into range and recovers entries left pending after a restart.
//
// Entry lifecycle: pending (persisted) -> armed (timer counting down) ->
// fired (removed, event published) or cancelled (removed, nothing published).
//
// ============================================================================

/// Largest delay a single in-memory timer may cover, in milliseconds.
const MAX_TIMER_MS: i64 = 2_147_483_647;

/// Reconciliation period, in milliseconds.
const REFRESH_INTERVAL_MS: u64 = 864_000_000;

/// Handle for cancelling a scheduled delivery.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScheduleToken(String);

impl ScheduleToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    fn to_millis(self, amount: i64) -> i64 {
        match self {
            TimeUnit::Hours => amount * 3_600_000,
            TimeUnit::Minutes => amount * 60_000,
            TimeUnit::Seconds => amount * 1_000,
            TimeUnit::Milliseconds => amount,
        }
    }
}

struct Inner<E: DomainEvent> {
    storage: Arc<dyn ScheduleStorage<E>>,
    event_bus: Arc<dyn EventBus<E>>,
    armed: Mutex<HashMap<String, JoinHandle<()>>>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

/// Schedules future event publication through the event bus.
///
/// `Clone` is cheap; all internal state is `Arc`-wrapped, and clones share
/// one timer table.
#[derive(Clone)]
pub struct SimpleEventScheduler<E: DomainEvent> {
    inner: Arc<Inner<E>>,
}

impl<E: DomainEvent> std::fmt::Debug for SimpleEventScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleEventScheduler").finish_non_exhaustive()
    }
}

impl<E: DomainEvent> SimpleEventScheduler<E> {
    pub fn new(storage: Arc<dyn ScheduleStorage<E>>, event_bus: Arc<dyn EventBus<E>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                event_bus,
                armed: Mutex::new(HashMap::new()),
                refresh: Mutex::new(None),
            }),
        }
    }

    /// Arm timers for persisted entries now within range and start the
    /// periodic reconciliation pass. Call once after construction; safe to
    /// call again (the previous reconciliation timer is replaced).
    pub async fn schedule(&self) {
        arm_stored_events(&self.inner).await;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(REFRESH_INTERVAL_MS)).await;
                tracing::debug!("Schedule reconciliation pass");
                arm_stored_events(&inner).await;
            }
        });

        if let Some(previous) = self.inner.refresh.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Schedule publication at an absolute time.
    pub async fn schedule_at(&self, due_at: DateTime<Utc>, event: E) -> Result<ScheduleToken> {
        let delay_ms = (due_at - Utc::now()).num_milliseconds();
        self.schedule_after(delay_ms, event, TimeUnit::Milliseconds)
            .await
    }

    /// Schedule publication `delay` units from now. A delay in the past
    /// publishes immediately.
    pub async fn schedule_after(
        &self,
        delay: i64,
        event: E,
        unit: TimeUnit,
    ) -> Result<ScheduleToken> {
        let delay_ms = unit.to_millis(delay);
        let token = ScheduleToken::new(Uuid::new_v4().to_string());
        let entry = ScheduledEvent {
            token: token.token().to_string(),
            event,
            due_at: Utc::now() + chrono::Duration::milliseconds(delay_ms),
        };

        self.inner.storage.add(entry.clone()).await?;

        if delay_ms < 0 {
            self.inner.on_timeout(entry).await;
        } else if delay_ms < MAX_TIMER_MS {
            arm(&self.inner, entry, delay_ms as u64).await;
        } else {
            tracing::debug!(
                token = token.token(),
                delay_ms = delay_ms,
                "Delay exceeds single-timer range; left pending for reconciliation"
            );
        }

        Ok(token)
    }

    /// Cancel a scheduled delivery. Idempotent: unknown or already-fired
    /// tokens are a no-op, never an error.
    pub async fn cancel_schedule(&self, token: &ScheduleToken) -> Result<()> {
        self.inner.storage.remove(token.token()).await?;

        if let Some(handle) = self.inner.armed.lock().await.remove(token.token()) {
            handle.abort();
            tracing::debug!(token = token.token(), "Disarmed scheduled event");
        }
        Ok(())
    }

    /// Stop the periodic reconciliation timer. Pending persisted entries are
    /// untouched; they survive restart.
    pub async fn destroy(&self) {
        if let Some(handle) = self.inner.refresh.lock().await.take() {
            handle.abort();
        }
    }
}

impl<E: DomainEvent> Inner<E> {
    /// A timer fired: drop the timer tracking and the persisted entry, then
    /// publish. Cleanup happens first so a duplicate fire cannot redeliver
    /// the same entry.
    async fn on_timeout(&self, entry: ScheduledEvent<E>) {
        self.armed.lock().await.remove(&entry.token);

        if let Err(error) = self.storage.remove(&entry.token).await {
            tracing::error!(
                token = %entry.token,
                error = %error,
                "Failed to remove fired schedule entry"
            );
        }

        if !self.event_bus.publish(&entry.event).await {
            tracing::warn!(
                token = %entry.token,
                event_kind = entry.event.kind(),
                "Scheduled event was not delivered to any listener"
            );
        }
        tracing::debug!(token = %entry.token, "Scheduled event fired");
    }
}

async fn arm_stored_events<E: DomainEvent>(inner: &Arc<Inner<E>>) {
    let entries = match inner.storage.find_all().await {
        Ok(entries) => entries,
        Err(error) => {
            tracing::error!(error = %error, "Failed to scan schedule storage");
            return;
        }
    };

    for entry in entries {
        let already_armed = inner.armed.lock().await.contains_key(&entry.token);
        if already_armed {
            continue;
        }

        let remaining_ms = (entry.due_at - Utc::now()).num_milliseconds();
        if remaining_ms < MAX_TIMER_MS {
            arm(inner, entry, remaining_ms.max(0) as u64).await;
        }
    }
}

/// Spawn the countdown task. The armed-table lock is held across the insert
/// so a zero-delay fire cannot observe the table before its handle is in it.
async fn arm<E: DomainEvent>(inner: &Arc<Inner<E>>, entry: ScheduledEvent<E>, delay_ms: u64) {
    let mut armed = inner.armed.lock().await;
    let token = entry.token.clone();
    let task_inner = Arc::clone(inner);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        task_inner.on_timeout(entry).await;
    });
    armed.insert(token, handle);
}

#[cfg(test)]
mod tests {
    use super::super::storage::MemoryScheduleStorage;
    use super::*;
    use crate::event_handling::{EventListener, SimpleEventBus};
    use async_trait::async_trait;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct ReminderDue {
        id: String,
    }

    impl DomainEvent for ReminderDue {
        fn kind(&self) -> &'static str {
            "ReminderDue"
        }

        fn aggregate_id(&self) -> &str {
            &self.id
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ReminderDue>>,
    }

    #[async_trait]
    impl EventListener<ReminderDue> for Recorder {
        async fn on_event(&self, event: &ReminderDue) -> anyhow::Result<()> {
            self.seen.lock().await.push(event.clone());
            Ok(())
        }
    }

    async fn scheduler() -> (
        SimpleEventScheduler<ReminderDue>,
        Arc<Recorder>,
        Arc<MemoryScheduleStorage<ReminderDue>>,
    ) {
        let bus = Arc::new(SimpleEventBus::new());
        let storage = Arc::new(MemoryScheduleStorage::new());
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(recorder.clone(), None).await.unwrap();
        let scheduler = SimpleEventScheduler::new(storage.clone(), bus);
        (scheduler, recorder, storage)
    }

    fn reminder(id: &str) -> ReminderDue {
        ReminderDue { id: id.to_string() }
    }

    #[tokio::test(start_paused = true)]
    async fn past_due_time_publishes_immediately() {
        let (scheduler, recorder, storage) = scheduler().await;

        scheduler
            .schedule_after(-5, reminder("r1"), TimeUnit::Seconds)
            .await
            .unwrap();

        assert_eq!(recorder.seen.lock().await.len(), 1);
        assert!(storage.find_all().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn future_delivery_fires_after_the_delay() {
        let (scheduler, recorder, storage) = scheduler().await;

        scheduler
            .schedule_after(50, reminder("r1"), TimeUnit::Milliseconds)
            .await
            .unwrap();

        assert!(recorder.seen.lock().await.is_empty());
        assert_eq!(storage.find_all().await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(*recorder.seen.lock().await, vec![reminder("r1")]);
        assert!(storage.find_all().await.unwrap().is_empty());
        assert!(scheduler.inner.armed.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_delivery_never_fires() {
        let (scheduler, recorder, storage) = scheduler().await;

        let token = scheduler
            .schedule_after(50, reminder("r1"), TimeUnit::Milliseconds)
            .await
            .unwrap();
        scheduler.cancel_schedule(&token).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(recorder.seen.lock().await.is_empty());
        assert!(storage.find_all().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_an_unknown_token_is_a_no_op() {
        let (scheduler, _, storage) = scheduler().await;
        scheduler
            .schedule_after(50, reminder("r1"), TimeUnit::Milliseconds)
            .await
            .unwrap();

        scheduler
            .cancel_schedule(&ScheduleToken::new("unknown"))
            .await
            .unwrap();

        assert_eq!(storage.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_after_the_fire_is_harmless() {
        let (scheduler, recorder, _) = scheduler().await;

        let token = scheduler
            .schedule_after(10, reminder("r1"), TimeUnit::Milliseconds)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        scheduler.cancel_schedule(&token).await.unwrap();

        assert_eq!(recorder.seen.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconciliation_arms_entries_recovered_from_storage() {
        let (scheduler, recorder, storage) = scheduler().await;

        // Entry persisted by a previous process, never armed here.
        storage
            .add(ScheduledEvent {
                token: "restored".to_string(),
                event: reminder("r1"),
                due_at: Utc::now() + chrono::Duration::milliseconds(40),
            })
            .await
            .unwrap();

        scheduler.schedule().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(*recorder.seen.lock().await, vec![reminder("r1")]);
        assert!(storage.find_all().await.unwrap().is_empty());

        scheduler.destroy().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overdue_recovered_entries_fire_right_away() {
        let (scheduler, recorder, storage) = scheduler().await;

        storage
            .add(ScheduledEvent {
                token: "overdue".to_string(),
                event: reminder("r1"),
                due_at: Utc::now() - chrono::Duration::seconds(30),
            })
            .await
            .unwrap();

        scheduler.schedule().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(recorder.seen.lock().await.len(), 1);
        scheduler.destroy().await;
    }

    #[tokio::test(start_paused = true)]
    async fn delays_beyond_timer_range_stay_pending() {
        let (scheduler, recorder, storage) = scheduler().await;

        scheduler
            .schedule_after(MAX_TIMER_MS + 1, reminder("r1"), TimeUnit::Milliseconds)
            .await
            .unwrap();

        assert!(scheduler.inner.armed.lock().await.is_empty());
        assert_eq!(storage.find_all().await.unwrap().len(), 1);
        assert!(recorder.seen.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_at_converts_to_a_relative_delay() {
        let (scheduler, recorder, _) = scheduler().await;

        scheduler
            .schedule_at(Utc::now() - chrono::Duration::seconds(1), reminder("r1"))
            .await
            .unwrap();

        assert_eq!(recorder.seen.lock().await.len(), 1);
    }

    #[test]
    fn time_units_convert_to_milliseconds() {
        assert_eq!(TimeUnit::Hours.to_millis(2), 7_200_000);
        assert_eq!(TimeUnit::Minutes.to_millis(2), 120_000);
        assert_eq!(TimeUnit::Seconds.to_millis(2), 2_000);
        assert_eq!(TimeUnit::Milliseconds.to_millis(2), 2);
    }
}
