/// All entity primary keys are UUIDs (v7 for rows created by this service).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque key/value payload used for template substitution.
pub type Payload = serde_json::Map<String, serde_json::Value>;
