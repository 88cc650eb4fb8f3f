use serde::de::DeserializeOwned;
use serde::Serialize;

// ============================================================================
// Serialization - Payload Encoding for Stored Events and Saga Snapshots
// ============================================================================
//
// Everything the library persists (event payloads, saga snapshots, scheduled
// events in durable adapters) goes through this contract, so a backend can
// swap the encoding without touching the stores.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deserialize payload: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Encodes values to strings and back.
///
/// Deserialization hydrates only the fields the target type declares; unknown
/// fields in the stored payload are silently discarded.
pub trait Serializer: Send + Sync {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, SerializationError>;

    fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Result<T, SerializationError>;
}

/// JSON serializer backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize>(&self, value: &T) -> Result<String, SerializationError> {
        serde_json::to_string(value).map_err(SerializationError::Serialize)
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Result<T, SerializationError> {
        serde_json::from_str(data).map_err(SerializationError::Deserialize)
    }
}
