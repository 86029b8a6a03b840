//! JSON Schema of the state file.

use crate::config::PersistedState;

const SCHEMA_ID: &str =
    "https://raw.githubusercontent.com/motiondesk/motiondesk/main/motiondesk-state.schema.json";

/// Generates the JSON Schema of the MotionDesk state file.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(PersistedState);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Pretty-printed form of [`generate_schema`].
#[must_use]
pub fn generate_schema_json() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
