use crate::event_sourcing::core::{AggregateRoot, ChangeLog};

use super::commands::TodoCommand;
use super::errors::TodoError;
use super::events::{TodoCreated, TodoEvent, TodoExpired, TodoMarkedAsDone};

// ============================================================================
// To-Do Item Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Default)]
pub struct TodoItem {
    id: String,
    description: String,
    expire_seconds: i64,
    done: bool,
    initialized: bool,
    changes: ChangeLog<TodoEvent>,
}

impl TodoItem {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expire_seconds(&self) -> i64 {
        self.expire_seconds
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl AggregateRoot for TodoItem {
    type Event = TodoEvent;
    type Command = TodoCommand;
    type Error = TodoError;

    fn aggregate_type() -> &'static str {
        "TodoItem"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn changes(&self) -> &ChangeLog<TodoEvent> {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut ChangeLog<TodoEvent> {
        &mut self.changes
    }

    fn handle(&self, command: &TodoCommand) -> Result<Vec<TodoEvent>, TodoError> {
        match command {
            TodoCommand::Create {
                id,
                description,
                expire_seconds,
            } => {
                if self.initialized {
                    return Err(TodoError::AlreadyExists);
                }
                Ok(vec![TodoEvent::Created(TodoCreated {
                    id: id.clone(),
                    description: description.clone(),
                    expire_seconds: *expire_seconds,
                })])
            }

            TodoCommand::MarkAsDone { id } => {
                if !self.initialized {
                    return Err(TodoError::NotInitialized);
                }
                // Already done: nothing observable changes, emit nothing.
                if self.done {
                    return Ok(vec![]);
                }
                Ok(vec![TodoEvent::MarkedAsDone(TodoMarkedAsDone {
                    id: id.clone(),
                })])
            }

            TodoCommand::Expire { id } => {
                if !self.initialized {
                    return Err(TodoError::NotInitialized);
                }
                if self.done {
                    return Ok(vec![]);
                }
                Ok(vec![TodoEvent::Expired(TodoExpired { id: id.clone() })])
            }
        }
    }

    fn when(&mut self, event: &TodoEvent) {
        match event {
            TodoEvent::Created(e) => {
                self.id = e.id.clone();
                self.description = e.description.clone();
                self.expire_seconds = e.expire_seconds;
                self.done = false;
                self.initialized = true;
            }
            TodoEvent::MarkedAsDone(_) => {
                self.done = true;
            }
            TodoEvent::Expired(_) => {
                self.done = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(id: &str) -> TodoCommand {
        TodoCommand::Create {
            id: id.to_string(),
            description: "buy milk".to_string(),
            expire_seconds: 3600,
        }
    }

    #[test]
    fn create_applies_the_created_event() {
        let mut item = TodoItem::default();

        item.execute(&create("t1")).unwrap();

        assert_eq!(item.id(), "t1");
        assert_eq!(item.description(), "buy milk");
        assert_eq!(item.expire_seconds(), 3600);
        assert!(!item.is_done());
        assert_eq!(item.uncommitted_changes().len(), 1);
    }

    #[test]
    fn create_twice_is_rejected() {
        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();

        let result = item.execute(&create("t1"));

        assert!(matches!(result, Err(TodoError::AlreadyExists)));
    }

    #[test]
    fn mark_as_done_is_applied_once() {
        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();

        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();

        assert!(item.is_done());
        assert_eq!(item.uncommitted_changes().len(), 2);
    }

    #[test]
    fn marking_a_done_item_emits_no_new_event() {
        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();
        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();

        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();

        assert_eq!(item.uncommitted_changes().len(), 2);
    }

    #[test]
    fn expiring_a_done_item_emits_no_new_event() {
        let mut item = TodoItem::default();
        item.execute(&create("t1")).unwrap();
        item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        })
        .unwrap();

        item.execute(&TodoCommand::Expire {
            id: "t1".to_string(),
        })
        .unwrap();

        assert_eq!(item.uncommitted_changes().len(), 2);
        assert!(item.is_done());
    }

    #[test]
    fn commands_against_an_uninitialized_item_are_rejected() {
        let mut item = TodoItem::default();

        let result = item.execute(&TodoCommand::MarkAsDone {
            id: "t1".to_string(),
        });

        assert!(matches!(result, Err(TodoError::NotInitialized)));
    }
}
