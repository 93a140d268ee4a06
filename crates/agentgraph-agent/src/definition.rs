//! Agent definitions as read from knowledge-graph records.
//!
//! A record names exactly one execution strategy. Fields are checked in a
//! fixed order and the first one present wins:
//!
//! | strategy         | fields                                      |
//! |------------------|---------------------------------------------|
//! | `ClassRef`       | `class`                                     |
//! | `Script`         | `agent_code`, `groovyScript`, `script`      |
//! | `PromptTemplate` | `llmPrompt`, `llm_prompt`, `llmLogic`       |
//! | `LegacyLiteral`  | `literalResponse`                           |
//!
//! Blank strings count as absent.

use crate::error::{AgentError, AgentResult};
use serde::Serialize;
use serde_json::{Map, Value};

pub const CLASS_FIELDS: &[&str] = &["class"];
/// `script` is accepted after the two names stored agent records use.
pub const SCRIPT_FIELDS: &[&str] = &["agent_code", "groovyScript", "script"];
pub const PROMPT_FIELDS: &[&str] = &["llmPrompt", "llm_prompt", "llmLogic"];
pub const LITERAL_FIELDS: &[&str] = &["literalResponse"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStrategy {
    ClassRef { qualified_name: String },
    Script { body: String },
    PromptTemplate { text: String },
    LegacyLiteral { text: String },
}

impl ExecutionStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClassRef { .. } => "class",
            Self::Script { .. } => "script",
            Self::PromptTemplate { .. } => "prompt",
            Self::LegacyLiteral { .. } => "literal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capabilities: Vec<String>,
    pub blockchain_integration: bool,
    pub strategy: ExecutionStrategy,
}

impl AgentDefinition {
    pub fn from_value(value: &Value) -> AgentResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            AgentError::InvalidDefinition("agent definition must be a JSON object".into())
        })?;

        let strategy = if let Some(name) = first_text(obj, CLASS_FIELDS)? {
            ExecutionStrategy::ClassRef {
                qualified_name: name,
            }
        } else if let Some(body) = first_text(obj, SCRIPT_FIELDS)? {
            ExecutionStrategy::Script { body }
        } else if let Some(text) = first_text(obj, PROMPT_FIELDS)? {
            ExecutionStrategy::PromptTemplate { text }
        } else if let Some(text) = first_text(obj, LITERAL_FIELDS)? {
            ExecutionStrategy::LegacyLiteral { text }
        } else {
            return Err(AgentError::InvalidDefinition(format!(
                "{} declares no execution strategy",
                label(obj)
            )));
        };

        Ok(Self {
            name: text_field(obj, "name"),
            description: text_field(obj, "description"),
            capabilities: capability_names(obj.get("capabilities"))?,
            blockchain_integration: ["blockchain_integration", "blockchainIntegration"]
                .iter()
                .filter_map(|k| obj.get(*k))
                .any(truthy),
            strategy,
        })
    }

    /// Name for logs and outcome records.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

fn first_text(obj: &Map<String, Value>, fields: &[&str]) -> AgentResult<Option<String>> {
    for field in fields {
        match obj.get(*field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(Value::String(s)) => return Ok(Some(s.clone())),
            Some(other) => {
                return Err(AgentError::InvalidDefinition(format!(
                    "field `{}` of {} must be a string, got {}",
                    field,
                    label(obj),
                    type_name(other)
                )))
            }
        }
    }
    Ok(None)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Capability names declared under `capabilities`: bare names, or objects
/// carrying a string `name`. Absent or null means none; anything else is an
/// invalid definition.
pub fn capability_names(value: Option<&Value>) -> AgentResult<Vec<String>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(AgentError::InvalidDefinition(format!(
                "field `capabilities` must be an array, got {}",
                type_name(other)
            )))
        }
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Object(o) => o
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    AgentError::InvalidDefinition("capability object has no string `name`".into())
                }),
            other => Err(AgentError::InvalidDefinition(format!(
                "capability entries must be names or objects, got {}",
                type_name(other)
            ))),
        })
        .collect()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn label(obj: &Map<String, Value>) -> String {
    match obj.get("name").and_then(Value::as_str) {
        Some(name) => format!("agent {:?}", name),
        None => "agent".to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
