//! Value serialization
//!
//! Logical values are JSON. Decoding never fails: text that is not valid
//! JSON (for example a plain string written by an older client) comes back
//! as a JSON string holding the raw text.

use serde_json::Value;

use crate::error::Result;

/// Encode a logical value as JSON text
pub fn serialize(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode JSON text, falling back to the raw string on malformed input
pub fn deserialize(text: &str) -> Value {
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(error = %e, "value is not JSON, returning raw string");
            Value::String(text.to_string())
        }
    }
}
