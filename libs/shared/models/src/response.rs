use serde::Serialize;
use serde_json::{json, Value};

/// `{"success": true, "message": ..., "data": ...}`
pub fn success<T: Serialize>(message: &str, data: T) -> Value {
    json!({
        "success": true,
        "message": message,
        "data": data
    })
}

/// Success envelope without a payload.
pub fn message(message: &str) -> Value {
    json!({
        "success": true,
        "message": message
    })
}
