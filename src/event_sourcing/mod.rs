// ============================================================================
// Event Sourcing Infrastructure
// ============================================================================
//
// Generic, reusable event sourcing infrastructure. Domain-specific code is
// in src/domain/.
//
// ============================================================================

pub mod core;
pub mod repository;
pub mod store;

pub use core::{AggregateRoot, ChangeLog, DomainEvent, EventDescriptor};
pub use repository::EventSourcingRepository;
pub use store::{EventStorage, EventStore, EventStoreError, MemoryEventStorage};
