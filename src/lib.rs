//! Building blocks for event-sourced, saga-orchestrated applications.
//!
//! The crate keeps each aggregate's history as an append-only,
//! version-checked event log, reconstructs aggregate state by replay, routes
//! published events to long-lived sagas via shared business-key values, and
//! delivers deferred events durably across restarts.
//!
//! Storage backends are pluggable contracts ([`event_sourcing::EventStorage`],
//! [`saga::SagaStorage`], [`scheduling::ScheduleStorage`]); the bundled
//! in-memory implementations are reference adapters.

pub mod command_handling;
pub mod domain;
pub mod event_handling;
pub mod event_sourcing;
pub mod saga;
pub mod scheduling;
pub mod serialization;

pub use command_handling::{Command, CommandHandler, CommandHandlingError, SimpleCommandBus};
pub use event_handling::{
    EventBus, EventHandler, EventHandlingError, EventListener, RoutingEventListener,
    SimpleEventBus, SubscriptionError,
};
pub use event_sourcing::{
    AggregateRoot, ChangeLog, DomainEvent, EventDescriptor, EventSourcingRepository, EventStorage,
    EventStore, EventStoreError, MemoryEventStorage,
};
pub use saga::{
    AssociationValue, AssociationValueDescriptor, AssociationValueResolver, AssociationValues,
    MemorySagaStorage, Saga, SagaFactory, SagaRepository, SagaSerializer, SagaStorage,
    SimpleAssociationValueResolver, SimpleSagaManager,
};
pub use scheduling::{
    MemoryScheduleStorage, ScheduleStorage, ScheduleToken, ScheduledEvent, SimpleEventScheduler,
    TimeUnit,
};
pub use serialization::{JsonSerializer, SerializationError, Serializer};
