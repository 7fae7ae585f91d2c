/// Job and artifact identifiers are UUID v4 strings.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Free-form JSON object used for payloads, metadata, and results.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Allocate a fresh opaque identifier.
pub fn new_id() -> EntityId {
    uuid::Uuid::new_v4().to_string()
}
