use serde_json::{Map, Value};

const MAX_DEPTH: usize = 64;

const ALWAYS_STRIPPED: &[&str] = &["$schema", "title", "examples", "additionalProperties"];

/// Normalizes a JSON-Schema-shaped tool parameter schema by removing fields
/// no upstream provider accepts universally. Idempotent: `clean(clean(x)) == clean(x)`.
/// Recursion is bounded so a pathologically deep schema cannot blow the stack;
/// past [`MAX_DEPTH`] the remaining subtree is passed through unchanged.
pub fn clean_schema(schema: &Value) -> Value {
    clean_at_depth(schema, 0)
}

fn clean_at_depth(value: &Value, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return value.clone();
    }

    match value {
        Value::Object(map) => Value::Object(clean_object(map, depth)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| clean_at_depth(item, depth)).collect())
        }
        other => other.clone(),
    }
}

fn clean_object(map: &Map<String, Value>, depth: usize) -> Map<String, Value> {
    let is_string_type = map
        .get("type")
        .and_then(Value::as_str)
        .map(|t| t == "string")
        .unwrap_or(false);

    let mut out = Map::new();
    for (key, value) in map {
        if ALWAYS_STRIPPED.contains(&key.as_str()) {
            continue;
        }
        if key == "format" && is_string_type {
            continue;
        }
        let cleaned = match key.as_str() {
            "properties" => {
                if let Value::Object(props) = value {
                    let mut cleaned_props = Map::new();
                    for (prop_name, prop_schema) in props {
                        cleaned_props
                            .insert(prop_name.clone(), clean_at_depth(prop_schema, depth + 1));
                    }
                    Value::Object(cleaned_props)
                } else {
                    value.clone()
                }
            }
            "items" => clean_at_depth(value, depth + 1),
            _ => value.clone(),
        };
        out.insert(key.clone(), cleaned);
    }
    out
}
