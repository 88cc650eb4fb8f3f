use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

// ============================================================================
// Command Handling - Explicit Kind → Handler Registry
// ============================================================================
//
// Commands carry an explicit kind discriminant. The bus maps each kind to
// exactly one handler; the table is validated while it is built, so a
// misconfigured handler fails at wiring time, never at first dispatch.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandHandlingError {
    #[error("no handler registered for command kind `{0}`")]
    UnsupportedCommand(String),

    #[error("a handler for command kind `{0}` is already registered")]
    DuplicateHandler(String),

    #[error("a command handler must register at least one command kind")]
    NoCommandKinds,
}

/// Contract every command family must satisfy.
pub trait Command: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Identifier of the aggregate this command targets.
    fn aggregate_id(&self) -> &str;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: &C) -> anyhow::Result<()>;
}

/// In-process command bus with one handler per command kind.
pub struct SimpleCommandBus<C: Command> {
    handlers: HashMap<String, Arc<dyn CommandHandler<C>>>,
}

impl<C: Command> SimpleCommandBus<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for the given command kinds. Fails eagerly if the
    /// kind list is empty or a kind already has a handler.
    pub fn register(
        &mut self,
        kinds: &[&str],
        handler: Arc<dyn CommandHandler<C>>,
    ) -> Result<(), CommandHandlingError> {
        if kinds.is_empty() {
            return Err(CommandHandlingError::NoCommandKinds);
        }
        for kind in kinds {
            if self.handlers.contains_key(*kind) {
                return Err(CommandHandlingError::DuplicateHandler((*kind).to_string()));
            }
        }
        for kind in kinds {
            self.handlers.insert((*kind).to_string(), handler.clone());
        }
        Ok(())
    }

    /// Route the command to its registered handler.
    pub async fn dispatch(&self, command: &C) -> anyhow::Result<()> {
        let handler = self
            .handlers
            .get(command.kind())
            .ok_or_else(|| CommandHandlingError::UnsupportedCommand(command.kind().to_string()))?;

        tracing::debug!(
            command_kind = command.kind(),
            aggregate_id = command.aggregate_id(),
            "Dispatching command"
        );
        handler.handle(command).await
    }
}

impl<C: Command> Default for SimpleCommandBus<C> {
    fn default() -> Self {
        Self::new()
    }
}
