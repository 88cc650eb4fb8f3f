// ============================================================================
// Event Sourcing Core - Generic Infrastructure Abstractions
// ============================================================================
//
// Generic, reusable contracts that work with any domain aggregate. No
// domain-specific code lives here.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::{AggregateRoot, ChangeLog};
pub use event::{DomainEvent, EventDescriptor};
