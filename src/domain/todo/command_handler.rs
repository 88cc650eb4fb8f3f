use async_trait::async_trait;

use crate::command_handling::{Command, CommandHandler};
use crate::event_sourcing::core::AggregateRoot;
use crate::event_sourcing::repository::EventSourcingRepository;
use crate::serialization::JsonSerializer;

use super::aggregate::TodoItem;
use super::commands::TodoCommand;

// ============================================================================
// To-Do Command Handler
// ============================================================================
//
// Orchestrates: Command -> Aggregate -> Events -> Event Store
//
// ============================================================================

pub struct TodoCommandHandler {
    repository: EventSourcingRepository<TodoItem, JsonSerializer>,
}

impl TodoCommandHandler {
    pub const COMMAND_KINDS: &'static [&'static str] =
        &["CreateTodo", "MarkTodoAsDone", "ExpireTodo"];

    pub fn new(repository: EventSourcingRepository<TodoItem, JsonSerializer>) -> Self {
        Self { repository }
    }

    /// Load (or start) the aggregate, run the command, persist the result.
    pub async fn handle(&self, command: &TodoCommand) -> anyhow::Result<()> {
        let mut item = match command {
            TodoCommand::Create { .. } => TodoItem::default(),
            _ => self.repository.find_by_id(command.aggregate_id()).await?,
        };

        item.execute(command)?;
        self.repository.store(&mut item).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<TodoCommand> for TodoCommandHandler {
    async fn handle(&self, command: &TodoCommand) -> anyhow::Result<()> {
        TodoCommandHandler::handle(self, command).await
    }
}
