//! Audit logging constants and detail redaction.

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types written by the notification pipeline.
pub mod action_types {
    pub const NOTIFICATION_SKIPPED_QUIET_HOURS: &str = "notification.skipped_quiet_hours";
    pub const NOTIFICATION_DELIVERED: &str = "notification.delivered";
    pub const NOTIFICATION_SCHEDULER_RUN: &str = "notification.scheduler_run";
}

/// Entity type recorded on notification audit entries.
pub const ENTITY_NOTIFICATION: &str = "notification";

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Key fragments whose values are masked before an audit entry is stored.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
];

/// Recursively replace the value of any key containing one of
/// [`SENSITIVE_FIELDS`] (case-insensitive) with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_secrets_are_masked() {
        let input = json!({
            "count": 2,
            "payload": { "reset_token": "abc", "name": "Ana" },
            "results": [{ "authToken": "xyz", "channel": "whatsapp" }]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["count"], 2);
        assert_eq!(out["payload"]["reset_token"], "[REDACTED]");
        assert_eq!(out["payload"]["name"], "Ana");
        assert_eq!(out["results"][0]["authToken"], "[REDACTED]");
        assert_eq!(out["results"][0]["channel"], "whatsapp");
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact_sensitive_fields(&json!("plain")), json!("plain"));
    }
}
