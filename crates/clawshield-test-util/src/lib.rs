//! Shared test utilities for the clawshield workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`).

use serde_json::Value;

pub const VERSION_PLACEHOLDER: &str = "__VERSION__";
pub const ROOT_PLACEHOLDER: &str = "__ROOT__";

/// Normalize non-deterministic report fields for golden-file comparison.
///
/// `meta.tool_version` becomes `"__VERSION__"` when the root looks like an
/// audit report (has `meta`, `facts` and `findings`). When `root` is given,
/// every string containing it has that prefix replaced by `"__ROOT__"`, at
/// any depth, so fact sources and `policy_path` do not depend on where the
/// fixtures live.
pub fn normalize_nondeterministic(mut value: Value, root: Option<&str>) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_report =
            obj.contains_key("meta") && obj.contains_key("facts") && obj.contains_key("findings");
        if is_report
            && let Some(meta) = obj.get_mut("meta").and_then(Value::as_object_mut)
            && meta.contains_key("tool_version")
        {
            meta.insert(
                "tool_version".to_string(),
                Value::String(VERSION_PLACEHOLDER.to_string()),
            );
        }
    }
    if let Some(root) = root.filter(|r| !r.is_empty()) {
        replace_root_recursive(&mut value, root);
    }
    value
}

fn replace_root_recursive(value: &mut Value, root: &str) {
    match value {
        Value::String(s) if s.contains(root) => {
            *s = s.replace(root, ROOT_PLACEHOLDER);
        }
        Value::Array(items) => {
            for item in items {
                replace_root_recursive(item, root);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                replace_root_recursive(v, root);
            }
        }
        _ => {}
    }
}
