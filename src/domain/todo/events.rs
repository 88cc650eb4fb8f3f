use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// To-Do Events
// ============================================================================

/// Union type for all to-do item events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum TodoEvent {
    Created(TodoCreated),
    MarkedAsDone(TodoMarkedAsDone),
    Expired(TodoExpired),
}

impl DomainEvent for TodoEvent {
    fn kind(&self) -> &'static str {
        match self {
            TodoEvent::Created(_) => "TodoCreated",
            TodoEvent::MarkedAsDone(_) => "TodoMarkedAsDone",
            TodoEvent::Expired(_) => "TodoExpired",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            TodoEvent::Created(e) => &e.id,
            TodoEvent::MarkedAsDone(e) => &e.id,
            TodoEvent::Expired(e) => &e.id,
        }
    }
}

/// To-do item created - initial event in the item lifecycle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TodoCreated {
    pub id: String,
    pub description: String,
    pub expire_seconds: i64,
}

/// Item marked as done by its owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TodoMarkedAsDone {
    pub id: String,
}

/// Item expired without being done.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TodoExpired {
    pub id: String,
}
