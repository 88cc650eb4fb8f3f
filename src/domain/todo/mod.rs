// ============================================================================
// To-Do Domain - Illustrative Client of the Core
// ============================================================================
//
// A minimal aggregate plus the saga that watches its deadline. Shows the
// intended wiring: command bus -> command handler -> repository -> event
// store -> event bus -> saga manager -> scheduler.
//
// ============================================================================

pub mod aggregate;
pub mod command_handler;
pub mod commands;
pub mod errors;
pub mod events;
pub mod saga;

pub use aggregate::TodoItem;
pub use command_handler::TodoCommandHandler;
pub use commands::TodoCommand;
pub use errors::TodoError;
pub use events::{TodoCreated, TodoEvent, TodoExpired, TodoMarkedAsDone};
pub use saga::{TodoExpirationSaga, TodoSagaFactory};
