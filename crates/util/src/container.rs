use serde_json::Value;

/// Check if a value is a container: an object or an array.
///
/// Only containers get their own overlay node; everything else is stored
/// and returned as-is.
pub fn is_container(val: &Value) -> bool {
    matches!(val, Value::Object(_) | Value::Array(_))
}
