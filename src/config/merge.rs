//! Configuration merge logic
//!
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values; `overlay` wins on conflicts.
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

        // arrays and scalars are replaced wholesale
        (_, overlay) => overlay,
    }
}

/// Merge config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_override_keeps_siblings() {
        let base = json!({
            "timeouts": {"connect_seconds": 30, "read_seconds": 30}
        });
        let overlay = json!({
            "timeouts": {"read_seconds": 5}
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["timeouts"]["read_seconds"], 5);
        assert_eq!(result["timeouts"]["connect_seconds"], 30);
    }

    #[test]
    fn test_array_replace() {
        let base = json!({"tags": ["a", "b", "c"]});
        let overlay = json!({"tags": ["x"]});
        let result = deep_merge(base, overlay);

        assert_eq!(result["tags"], json!(["x"]));
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"endpoint": "", "application_id": ""});
        let file = json!({"endpoint": "https://file.example.com", "application_id": "from-file"});
        let cli = json!({"endpoint": "https://cli.example.com"});

        let result = merge_layers(vec![builtin, file, cli]);

        assert_eq!(result["endpoint"], "https://cli.example.com");
        assert_eq!(result["application_id"], "from-file");
    }
}
