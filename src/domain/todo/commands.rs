use crate::command_handling::Command;

// ============================================================================
// To-Do Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum TodoCommand {
    Create {
        id: String,
        description: String,
        expire_seconds: i64,
    },
    MarkAsDone {
        id: String,
    },
    Expire {
        id: String,
    },
}

impl Command for TodoCommand {
    fn kind(&self) -> &'static str {
        match self {
            TodoCommand::Create { .. } => "CreateTodo",
            TodoCommand::MarkAsDone { .. } => "MarkTodoAsDone",
            TodoCommand::Expire { .. } => "ExpireTodo",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            TodoCommand::Create { id, .. }
            | TodoCommand::MarkAsDone { id }
            | TodoCommand::Expire { id } => id,
        }
    }
}
