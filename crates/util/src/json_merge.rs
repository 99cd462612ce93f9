//! Recursive merging of JSON trees.
//!
//! Used to layer user overrides (step maps, formatter files) over the
//! built-in tables. Mappings merge key by key; every other value kind,
//! including sequences, is replaced wholesale by the overlay.

use serde_json::Value;

/// Merges `overlay` into `base` in place; the overlay wins on every collision.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
