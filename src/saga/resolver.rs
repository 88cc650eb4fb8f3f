use crate::event_sourcing::core::DomainEvent;

use super::association::{AssociationValue, AssociationValues};

// ============================================================================
// Association Value Resolution
// ============================================================================

/// Extracts candidate correlation keys from an incoming event.
///
/// A resolver must be deterministic: the same event always yields the same
/// association values.
pub trait AssociationValueResolver<E: DomainEvent>: Send + Sync {
    fn extract_association_values(&self, event: &E) -> AssociationValues;
}

/// Default strategy: a single association value keyed `"id"`, carrying the
/// event's identifier attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAssociationValueResolver;

impl<E: DomainEvent> AssociationValueResolver<E> for SimpleAssociationValueResolver {
    fn extract_association_values(&self, event: &E) -> AssociationValues {
        AssociationValues::new([AssociationValue::new("id", event.aggregate_id())])
    }
}
