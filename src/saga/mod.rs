// ============================================================================
// Saga Correlation Subsystem
// ============================================================================
//
// Correlates published events to long-lived saga processes via shared
// business-key values: the association value model, saga storage and
// repository, resolver, and the dispatching manager.
//
// ============================================================================

pub mod association;
pub mod manager;
pub mod repository;
pub mod resolver;
pub mod saga;
pub mod storage;

pub use association::{
    descriptor_from_value, descriptor_from_values, AssociationValue, AssociationValueDescriptor,
    AssociationValues,
};
pub use manager::SimpleSagaManager;
pub use repository::SagaRepository;
pub use resolver::{AssociationValueResolver, SimpleAssociationValueResolver};
pub use saga::{Saga, SagaFactory, SagaSerializer};
pub use storage::{MemorySagaStorage, SagaStorage};
