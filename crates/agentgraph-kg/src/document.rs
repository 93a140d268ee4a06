//! Raw and parsed knowledge-graph documents.

use crate::error::{KgError, KgResult};
use serde_json::Value;

/// Suffixes stripped from a source name to derive a domain, tried in order.
const DOMAIN_SUFFIXES: &[&str] = &["_KG.json", ".json"];

/// A document as read from its source, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File name or path the text came from.
    pub source: String,
    pub text: String,
}

impl RawDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    pub fn parse_json(&self) -> KgResult<Value> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

/// A validated document ready to be materialized.
#[derive(Debug, Clone)]
pub struct KnowledgeGraphDocument {
    pub source: String,
    pub domain: String,
    pub description: String,
    /// The document exactly as it was read.
    pub content: String,
    pub body: Value,
}

impl KnowledgeGraphDocument {
    pub fn new(raw: &RawDocument, body: Value) -> KgResult<Self> {
        let domain = resolve_domain(&body, &raw.source)?;
        let description = match body.get("description") {
            None | Some(Value::Null) => format!("Agentic Knowledge Graph for {}", domain),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Ok(Self {
            source: raw.source.clone(),
            domain,
            description,
            content: raw.text.clone(),
            body,
        })
    }

    /// Entries of a top-level array section; empty when absent.
    pub fn section(&self, key: &str) -> &[Value] {
        self.body
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// `domain`, then `name`, then the source file name without its `_KG.json` suffix.
pub fn resolve_domain(body: &Value, source: &str) -> KgResult<String> {
    for key in ["domain", "name"] {
        match body.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if !s.trim().is_empty() => return Ok(s.clone()),
            Some(Value::String(_)) => continue,
            Some(_) => return Err(KgError::field(key, "must be a string")),
        }
    }
    Ok(domain_from_source(source))
}

pub fn domain_from_source(source: &str) -> String {
    let file = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source);
    DOMAIN_SUFFIXES
        .iter()
        .find_map(|suffix| file.strip_suffix(suffix))
        .unwrap_or(file)
        .to_string()
}
