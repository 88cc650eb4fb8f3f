use super::event::DomainEvent;

// ============================================================================
// Aggregate Root Contract
// ============================================================================
//
// State is derived from events, never stored directly. Command handling
// validates against current state and emits events; event application is the
// only way state changes. Aggregate instances are transient: only their
// emitted events are ever persisted.
//
// ============================================================================

/// Buffer of not-yet-persisted events plus the durable-event count.
///
/// `version` counts events already made durable for this aggregate; it is
/// also the expected-version value for the next save. Buffering an event does
/// not advance the version. The version advances either while replaying
/// history or when the buffer is committed after a successful save.
#[derive(Debug, Clone)]
pub struct ChangeLog<E> {
    version: u64,
    uncommitted: Vec<E>,
}

impl<E> Default for ChangeLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ChangeLog<E> {
    pub fn new() -> Self {
        Self {
            version: 0,
            uncommitted: Vec::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn uncommitted(&self) -> &[E] {
        &self.uncommitted
    }

    /// Buffer a freshly emitted event.
    pub fn record(&mut self, event: E) {
        self.uncommitted.push(event);
    }

    /// Account for one replayed (already durable) event.
    pub fn advance(&mut self) {
        self.version += 1;
    }

    /// Clear the buffer and advance the version past the persisted events.
    /// Call exactly once, after persistence succeeded.
    pub fn commit(&mut self) {
        self.version += self.uncommitted.len() as u64;
        self.uncommitted.clear();
    }
}

/// Contract every event-sourced aggregate implements.
///
/// Implementors embed a [`ChangeLog`] and expose it through `changes` /
/// `changes_mut`; the buffering and replay mechanics are provided on top of
/// it. `handle` and `when` carry the domain logic:
///
/// - `handle` validates a command against current state and returns the
///   events to emit. It must be idempotent with respect to already-applied
///   terminal states: a command that would not change observable state
///   returns zero events rather than re-emitting.
/// - `when` is the pure state transition for one event.
pub trait AggregateRoot: Default + Send + Sync {
    type Event: DomainEvent;
    type Command;
    type Error: std::error::Error + Send + Sync + 'static;

    fn aggregate_type() -> &'static str;

    fn id(&self) -> &str;

    fn changes(&self) -> &ChangeLog<Self::Event>;

    fn changes_mut(&mut self) -> &mut ChangeLog<Self::Event>;

    /// Validate a command against current state and emit resulting events.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// State transition for a single event.
    fn when(&mut self, event: &Self::Event);

    /// Apply a new event: transition state and buffer it for persistence.
    fn apply(&mut self, event: Self::Event) {
        self.when(&event);
        self.changes_mut().record(event);
    }

    /// Replay one already-durable event while hydrating from history.
    fn replay(&mut self, event: &Self::Event) {
        self.when(event);
        self.changes_mut().advance();
    }

    /// Count of events already durable for this aggregate.
    fn version(&self) -> u64 {
        self.changes().version()
    }

    fn uncommitted_changes(&self) -> &[Self::Event] {
        self.changes().uncommitted()
    }

    /// Clear the uncommitted buffer once persistence succeeded.
    fn mark_changes_committed(&mut self) {
        self.changes_mut().commit();
    }

    /// Handle a command and apply every emitted event.
    fn execute(&mut self, command: &Self::Command) -> Result<(), Self::Error> {
        for event in self.handle(command)? {
            self.apply(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{TodoCommand, TodoItem};

    #[test]
    fn buffered_events_do_not_advance_version() {
        let mut item = TodoItem::default();
        item.execute(&TodoCommand::Create {
            id: "t1".to_string(),
            description: "buy milk".to_string(),
            expire_seconds: 3600,
        })
        .unwrap();

        assert_eq!(item.version(), 0);
        assert_eq!(item.uncommitted_changes().len(), 1);
    }

    #[test]
    fn commit_advances_version_and_clears_buffer() {
        let mut item = TodoItem::default();
        item.execute(&TodoCommand::Create {
            id: "t1".to_string(),
            description: "buy milk".to_string(),
            expire_seconds: 3600,
        })
        .unwrap();
        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();

        item.mark_changes_committed();

        assert_eq!(item.version(), 2);
        assert!(item.uncommitted_changes().is_empty());
    }

    #[test]
    fn replay_reproduces_state_built_by_commands() {
        let mut original = TodoItem::default();
        original
            .execute(&TodoCommand::Create {
                id: "t1".to_string(),
                description: "buy milk".to_string(),
                expire_seconds: 3600,
            })
            .unwrap();
        original
            .execute(&TodoCommand::MarkAsDone {
                id: "t1".to_string(),
            })
            .unwrap();

        let history: Vec<_> = original.uncommitted_changes().to_vec();

        let mut replayed = TodoItem::default();
        for event in &history {
            replayed.replay(event);
        }

        assert_eq!(replayed.id(), original.id());
        assert!(replayed.is_done());
        assert_eq!(replayed.version(), history.len() as u64);
        assert!(replayed.uncommitted_changes().is_empty());
    }
}
