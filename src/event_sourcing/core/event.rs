use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Events and the Persisted Event Descriptor
// ============================================================================
//
// A domain event is a fact that has already happened. Events for one
// aggregate family are modelled as a tagged union carrying an explicit kind
// discriminant; the library never inspects types at runtime.
//
// ============================================================================

/// Contract every domain event family must satisfy.
///
/// `kind` is the fully-qualified type tag recorded in storage and used for
/// subscription filtering; `aggregate_id` is the identifier attribute that
/// links the event to its aggregate and drives default saga correlation.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn kind(&self) -> &'static str;

    fn aggregate_id(&self) -> &str;
}

/// The persisted, serialized representation of one domain event.
///
/// For a fixed `aggregate_id`, stored versions form a strictly increasing,
/// gapless sequence starting at 1.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventDescriptor {
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub event_name: String,
    pub payload: String,
    pub version: u64,
}

impl EventDescriptor {
    pub fn record(
        aggregate_id: &str,
        aggregate_type: &str,
        event_name: &str,
        payload: String,
        version: u64,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.to_string(),
            aggregate_type: aggregate_type.to_string(),
            event_name: event_name.to_string(),
            payload,
            version,
        }
    }
}
