//! Field-by-field layering of settings documents.
//!
//! Later layers override earlier ones. Sections are merged key by key, so a
//! user file that sets only `Configuration.dir` keeps every other default.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// - Objects merge recursively
/// - A null overlay keeps the base (null means "not set")
/// - Anything else replaces the base outright
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over layers, lowest priority first.
pub fn deep_merge_all(layers: impl IntoIterator<Item = Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
