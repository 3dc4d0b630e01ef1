//! Request and response payload reshaping shared by resource clients.

use serde_json::{Map, Value, json};

/// Move id arrays into `[{"id": ...}]` reference groups.
///
/// For every `(source, target)` pair, an array at `source` is removed and
/// written to `target` as a list of `{"id": id}` objects. Missing or non-array
/// sources are left alone.
pub fn expand_id_groups(payload: &mut Map<String, Value>, groups: &[(&str, &str)]) {
    for (source, target) in groups {
        let Some(Value::Array(ids)) = payload.get(*source) else {
            continue;
        };
        let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        payload.remove(*source);
        payload.insert((*target).to_string(), Value::Array(refs));
    }
}

/// Collapse `[{"id": ..., ...}]` reference groups into plain id arrays.
///
/// The inverse of [`expand_id_groups`] for inbound records. Objects without an
/// `id` are skipped.
pub fn flatten_id_groups(record: &mut Map<String, Value>, groups: &[(&str, &str)]) {
    for (source, target) in groups {
        let Some(Value::Array(refs)) = record.get(*source) else {
            continue;
        };
        let ids: Vec<Value> = refs.iter().filter_map(|r| r.get("id").cloned()).collect();
        record.remove(*source);
        record.insert((*target).to_string(), Value::Array(ids));
    }
}

/// Replace booleans at `keys` with `"true"` / `"false"`.
pub fn stringify_booleans(payload: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(&Value::Bool(b)) = payload.get(*key) {
            payload.insert((*key).to_string(), Value::String(b.to_string()));
        }
    }
}
