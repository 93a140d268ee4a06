//! Convert JSON entries into property maps a graph node can hold.
//!
//! Nested objects become underscore-joined keys, arrays of scalars are kept,
//! and any array holding objects, arrays or nulls is stored as its JSON text.
//! Two paths that flatten to the same key are an error.

use crate::error::{KgError, KgResult};
use agentgraph_graph::Properties;
use serde_json::{Map, Value};

/// Flatten an entry's fields, skipping the keys in `exclude`.
pub fn flatten_entry(entry: &Map<String, Value>, exclude: &[&str]) -> KgResult<Properties> {
    let mut out = Properties::new();
    for (key, value) in entry {
        if exclude.contains(&key.as_str()) {
            continue;
        }
        flatten_into(&mut out, key, value)?;
    }
    Ok(out)
}

fn flatten_into(out: &mut Properties, key: &str, value: &Value) -> KgResult<()> {
    let flat = match value {
        Value::Object(inner) => {
            for (k, v) in inner {
                flatten_into(out, &format!("{}_{}", key, k), v)?;
            }
            return Ok(());
        }
        Value::Null => return Ok(()),
        Value::Array(items) if !items.iter().all(is_scalar) => Value::String(value.to_string()),
        other => other.clone(),
    };
    if out.insert(key.to_string(), flat).is_some() {
        return Err(KgError::field(key, "defined twice after flattening nested keys"));
    }
    Ok(())
}

fn is_scalar(v: &Value) -> bool {
    matches!(v, Value::Bool(_) | Value::Number(_) | Value::String(_))
}
