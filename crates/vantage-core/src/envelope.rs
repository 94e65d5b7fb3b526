//! Locating the scene description inside a fetched payload
//!
//! Remote payloads may wrap the scene description in arbitrary metadata:
//! nested under other keys, inside arrays, or even serialized as a JSON
//! string. The description itself is recognised by its shape:
//!
//! ```json
//! { "metadata": { "type": "Object", ... }, "object": { ... }, ... }
//! ```

use serde_json::Value;

/// Nesting limit for the scan, including levels reached through
/// string-encoded JSON
const MAX_SCAN_DEPTH: usize = 64;

/// Check whether a value is an Object-format scene description
pub fn is_scene_description(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let declared_type = object
        .get("metadata")
        .and_then(|m| m.get("type"))
        .and_then(Value::as_str);
    declared_type.is_some_and(|t| t.eq_ignore_ascii_case("object"))
        && object.get("object").is_some_and(Value::is_object)
}

/// Find the first scene description in document order, the payload root
/// included
pub fn find_scene_description(payload: &Value) -> Option<Value> {
    scan(payload, 0)
}

fn scan(value: &Value, depth: usize) -> Option<Value> {
    if depth > MAX_SCAN_DEPTH {
        return None;
    }
    if is_scene_description(value) {
        return Some(value.clone());
    }
    match value {
        Value::Object(map) => map.values().find_map(|v| scan(v, depth + 1)),
        Value::Array(items) => items.iter().find_map(|v| scan(v, depth + 1)),
        Value::String(text) => {
            let trimmed = text.trim_start();
            if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
                return None;
            }
            let nested: Value = serde_json::from_str(text).ok()?;
            scan(&nested, depth + 1)
        }
        _ => None,
    }
}
