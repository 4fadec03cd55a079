use serde_json::Value;

use crate::util::parse_index;

/// Look up a single key inside a container.
///
/// Objects are indexed by key, arrays by a canonical index (see
/// [`parse_index`]). Primitives have no keys.
pub fn get_key<'a>(val: &'a Value, key: &str) -> Option<&'a Value> {
    match val {
        Value::Object(map) => map.get(key),
        Value::Array(arr) => arr.get(parse_index(key)?),
        _ => None,
    }
}

/// Mutable variant of [`get_key`].
pub fn get_key_mut<'a>(val: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match val {
        Value::Object(map) => map.get_mut(key),
        Value::Array(arr) => arr.get_mut(parse_index(key)?),
        _ => None,
    }
}

/// Check if a container owns `key`.
pub fn has_key(val: &Value, key: &str) -> bool {
    get_key(val, key).is_some()
}

/// The own keys of a container, in order: object keys as stored, array
/// indices as decimal strings. Primitives have none.
pub fn own_keys(val: &Value) -> Vec<String> {
    match val {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(arr) => (0..arr.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Get a value from a JSON document by path segments.
///
/// Returns `None` if any step is missing.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(val, |current, step| get_key(current, step))
}
