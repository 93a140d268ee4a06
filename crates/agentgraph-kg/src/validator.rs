//! Structural checks run before a document touches the graph.

use serde_json::{Map, Value};

/// Accept or reject a document. See [`check`] for the reason behind a rejection.
pub fn validate(doc: &Value) -> bool {
    check(doc).is_ok()
}

/// The first structural problem found, if any.
///
/// A document needs `domain` or `name`. Agents and capabilities need `name`
/// and `description`; relationships need `from`, `to` and `type`. A null
/// value counts as missing.
pub fn check(doc: &Value) -> Result<(), String> {
    let obj = doc
        .as_object()
        .ok_or_else(|| "document is not a JSON object".to_string())?;

    if !has(obj, "domain") && !has(obj, "name") {
        return Err("document has neither `domain` nor `name`".into());
    }
    entries(obj, "agents", &["name", "description"])?;
    entries(obj, "capabilities", &["name", "description"])?;
    entries(obj, "relationships", &["from", "to", "type"])?;
    Ok(())
}

fn has(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).is_some_and(|v| !v.is_null())
}

fn entries(obj: &Map<String, Value>, section: &str, required: &[&str]) -> Result<(), String> {
    let items = match obj.get(section) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(format!("`{}` is not an array", section)),
    };
    for (i, item) in items.iter().enumerate() {
        let entry = item
            .as_object()
            .ok_or_else(|| format!("{}[{}] is not an object", section, i))?;
        if let Some(missing) = required.iter().find(|k| !has(entry, k)) {
            return Err(format!("{}[{}] is missing `{}`", section, i, missing));
        }
    }
    Ok(())
}
