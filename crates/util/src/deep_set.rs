//! Path-creating writes into nested JSON containers.

use json_overlay_path::{get_key_mut, is_index, parse_index};
use serde_json::{Map, Value};

use crate::container::is_container;

/// How many `null`s a single write may pad an array with.
///
/// A write further past the end of an array is not applied, like an object
/// key written into an array.
pub const MAX_ARRAY_PADDING: usize = 1 << 16;

/// Writes `value` at `path` inside `root`, creating intermediate containers.
///
/// Whenever a step is missing or holds a primitive, a fresh container
/// replaces it: an array if the next segment looks like an index, an object
/// otherwise. Existing containers are kept as they are. Writing past the end
/// of an array pads it with `null`, up to [`MAX_ARRAY_PADDING`] slots.
///
/// Returns `false` if the write cannot be expressed: `root` is a primitive,
/// the path is empty, a segment addressing an array is not a canonical index,
/// or the index lies too far past the end.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use json_overlay_util::deep_set;
///
/// let mut doc = json!({});
/// assert!(deep_set(&mut doc, &["a".into(), "0".into(), "b".into()], json!(1)));
/// assert_eq!(doc, json!({"a": [{"b": 1}]}));
/// ```
pub fn deep_set(root: &mut Value, path: &[String], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    if !is_container(root) {
        return false;
    }
    let mut current = root;
    for (i, key) in parents.iter().enumerate() {
        let next_is_index = is_index(&path[i + 1]);
        let needs_container = get_key_mut(current, key).map_or(true, |v| !is_container(v));
        if needs_container {
            let fresh = if next_is_index {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
            if !put(current, key, fresh) {
                return false;
            }
        }
        current = match get_key_mut(current, key) {
            Some(next) => next,
            None => return false,
        };
    }
    put(current, last, value)
}

/// Removes the value at `path` inside `root`, returning it.
///
/// Object entries are deleted; array elements become `null` so that the
/// remaining indices do not shift.
pub fn deep_remove(root: &mut Value, path: &[String]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    let mut current = root;
    for key in parents {
        current = get_key_mut(current, key)?;
    }
    match current {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(arr) => {
            let slot = arr.get_mut(parse_index(last)?)?;
            Some(std::mem::replace(slot, Value::Null))
        }
        _ => None,
    }
}

/// Writes a single key into a container, padding arrays as needed.
fn put(container: &mut Value, key: &str, value: Value) -> bool {
    match container {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            true
        }
        Value::Array(arr) => {
            let Some(idx) = parse_index(key) else {
                return false;
            };
            if idx >= arr.len() {
                let Some(len) = idx.checked_add(1) else {
                    return false;
                };
                if idx - arr.len() > MAX_ARRAY_PADDING {
                    return false;
                }
                arr.resize(len, Value::Null);
            }
            arr[idx] = value;
            true
        }
        _ => false,
    }
}
