//! Agent authoring: the LLM drafts a definition, reviews it, and the
//! approved draft is stored as an `Agent` node.

use crate::conversation::strip_code_fences;
use crate::error::{KgError, KgResult};
use crate::pipeline::{AGENT_LABEL, CAPABILITY_LABEL, HAS_CAPABILITY};
use agentgraph_agent::definition::capability_names;
use agentgraph_graph::{GraphHandle, GraphTransaction, Properties};
use agentgraph_llm::LlmProvider;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const SECURITY_FLAGS: &[&str] = &[
    "security_input_validation",
    "security_resource_monitoring",
    "security_output_validation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentKind {
    #[default]
    Llm,
    Script,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Llm => "llm",
            AgentKind::Script => "script",
        }
    }

    /// Property the definition's strategy payload is stored under.
    fn payload_key(self) -> &'static str {
        match self {
            AgentKind::Llm => "llm_prompt",
            AgentKind::Script => "agent_code",
        }
    }

    fn payload_hint(self) -> &'static str {
        match self {
            AgentKind::Llm => "an `llm_prompt` field holding the prompt template",
            AgentKind::Script => {
                "an `agent_code` field holding a Rhai script \
                 that evaluates to `|input| ...`"
            }
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = KgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "llm" | "prompt" => Ok(AgentKind::Llm),
            "script" | "rhai" => Ok(AgentKind::Script),
            other => Err(KgError::field("type", format!("unknown agent type `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthoringOutcome {
    pub message: String,
    /// Properties of the stored or inspected agent.
    pub agent: Option<Properties>,
}

impl AuthoringOutcome {
    fn new(message: impl Into<String>, agent: Option<Properties>) -> Self {
        Self {
            message: message.into(),
            agent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Review {
    valid: bool,
    feedback: String,
}

pub struct AgentAuthor {
    llm: Arc<dyn LlmProvider>,
    graph: GraphHandle,
    model_hint: String,
}

impl AgentAuthor {
    pub fn new(llm: Arc<dyn LlmProvider>, graph: GraphHandle) -> Self {
        Self {
            llm,
            graph,
            model_hint: String::new(),
        }
    }

    pub fn with_model_hint(mut self, hint: impl Into<String>) -> Self {
        self.model_hint = hint.into();
        self
    }

    pub async fn create_from_description(
        &self,
        description: &str,
        kind: AgentKind,
    ) -> AuthoringOutcome {
        match self.try_create(description, kind).await {
            Ok(Ok(agent)) => {
                let name = agent
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                info!(agent = %name, kind = %kind, "agent authored");
                AuthoringOutcome::new(format!("Successfully created agent: {}", name), Some(agent))
            }
            Ok(Err(feedback)) => {
                warn!(feedback = %feedback, "authored agent rejected by review");
                AuthoringOutcome::new(format!("Agent validation failed: {}", feedback), None)
            }
            Err(e) => {
                warn!(error = %e, "agent authoring failed");
                AuthoringOutcome::new(format!("Error creating agent: {}", e), None)
            }
        }
    }

    /// Outer error: something broke. Inner error: the review said no.
    async fn try_create(
        &self,
        description: &str,
        kind: AgentKind,
    ) -> KgResult<Result<Properties, String>> {
        let draft = self.llm.query(&draft_prompt(description, kind), &self.model_hint).await?;
        let definition = parse_object(draft.text())?;

        let review = self
            .review(&Value::Object(definition.clone()).to_string())
            .await?;
        if !review.valid {
            return Ok(Err(review.feedback));
        }

        let (props, capabilities) = agent_properties(&definition, kind)?;
        self.persist(props.clone(), &capabilities)?;
        Ok(Ok(props))
    }

    /// Ask the LLM to review an agent already stored in the graph.
    pub async fn validate_agent(&self, name: &str) -> AuthoringOutcome {
        let Some(node) = self
            .graph
            .find_by_name(name)
            .into_iter()
            .find(|n| n.has_label(AGENT_LABEL))
        else {
            return AuthoringOutcome::new(format!("Agent not found: {}", name), None);
        };
        let agent = node.properties;
        match self.review(&Value::Object(agent.clone()).to_string()).await {
            Ok(review) if review.valid => {
                AuthoringOutcome::new("Agent validation successful", Some(agent))
            }
            Ok(review) => AuthoringOutcome::new(
                format!("Agent validation failed: {}", review.feedback),
                Some(agent),
            ),
            Err(e) => {
                warn!(agent = name, error = %e, "agent validation failed");
                AuthoringOutcome::new(format!("Error validating agent: {}", e), None)
            }
        }
    }

    async fn review(&self, definition: &str) -> KgResult<Review> {
        let reply = self.llm.query(&review_prompt(definition), &self.model_hint).await?;
        parse_review(reply.text())
    }

    fn persist(&self, props: Properties, capabilities: &[String]) -> KgResult<()> {
        let mut tx = self.graph.begin()?;
        store_agent(tx.as_mut(), props, capabilities)?;
        tx.commit()?;
        Ok(())
    }
}

fn draft_prompt(description: &str, kind: AgentKind) -> String {
    format!(
        "Create an agent definition based on this description: '{}'\n\
         The agent should be of type: {}\n\
         Include:\n\
         - A clear name and category\n\
         - Detailed description\n\
         - Required capabilities (a list of names)\n\
         - Effectiveness threshold (a number between 0 and 1)\n\
         - Ethics guidelines\n\
         - {}\n\
         Format as a single JSON object.",
        description,
        kind,
        kind.payload_hint()
    )
}

fn review_prompt(definition: &str) -> String {
    format!(
        "Validate this agent definition for security and effectiveness:\n{}\n\
         Check:\n\
         1. Security vulnerabilities\n\
         2. Ethical compliance\n\
         3. Performance implications\n\
         4. Resource usage\n\
         5. Code/prompt safety\n\
         Return JSON with 'valid' (boolean) and 'feedback' (string) fields.",
        definition
    )
}

fn parse_object(reply: &str) -> KgResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(&strip_code_fences(reply))? {
        Value::Object(map) => Ok(map),
        other => Err(KgError::Invalid(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn parse_review(reply: &str) -> KgResult<Review> {
    let map = parse_object(reply)?;
    let valid = map
        .get("valid")
        .and_then(Value::as_bool)
        .ok_or_else(|| KgError::field("valid", "must be a boolean"))?;
    let feedback = match map.get("feedback") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    Ok(Review { valid, feedback })
}

fn required_text(def: &Map<String, Value>, key: &str) -> KgResult<String> {
    match def.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(KgError::field(key, "missing or not a string")),
    }
}

/// Node properties for an approved definition, plus the capability names it declares.
fn agent_properties(
    def: &Map<String, Value>,
    kind: AgentKind,
) -> KgResult<(Properties, Vec<String>)> {
    let mut props = Properties::new();
    props.insert("name".into(), Value::String(required_text(def, "name")?));
    props.insert("description".into(), Value::String(required_text(def, "description")?));
    props.insert("agent_type".into(), Value::String(kind.as_str().into()));
    for key in ["category", "ethics_guidelines"] {
        if let Some(Value::String(s)) = def.get(key) {
            props.insert(key.into(), Value::String(s.clone()));
        }
    }
    if let Some(threshold) = def.get("effectiveness_threshold").and_then(Value::as_f64) {
        props.insert("effectiveness_threshold".into(), Value::from(threshold));
    }
    let payload = kind.payload_key();
    props.insert(payload.into(), Value::String(required_text(def, payload)?));
    for flag in SECURITY_FLAGS {
        props.insert((*flag).into(), Value::Bool(true));
    }
    props.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));

    let capabilities = capability_names(def.get("capabilities"))?;
    Ok((props, capabilities))
}

fn store_agent<'t>(
    tx: &mut (dyn GraphTransaction + 't),
    props: Properties,
    capabilities: &[String],
) -> KgResult<()> {
    let agent = tx.create_node(&[AGENT_LABEL], props)?;
    for name in capabilities {
        let cap = tx.merge_node(
            CAPABILITY_LABEL,
            "name",
            Value::String(name.clone()),
            Properties::new(),
        )?;
        tx.create_edge(agent, cap, HAS_CAPABILITY, Properties::new())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parsing() {
        assert_eq!("LLM".parse::<AgentKind>().unwrap(), AgentKind::Llm);
        assert_eq!("rhai".parse::<AgentKind>().unwrap(), AgentKind::Script);
        assert!("groovy".parse::<AgentKind>().is_err());
    }

    #[test]
    fn review_reply_parsing() {
        let reply = "```json\n{\"valid\": false, \"feedback\": \"too broad\"}\n```";
        let review = parse_review(reply).unwrap();
        assert_eq!(
            review,
            Review {
                valid: false,
                feedback: "too broad".into()
            }
        );
        assert!(parse_review(r#"{"feedback": "x"}"#).is_err());
    }

    #[test]
    fn script_payload_is_required_for_script_kind() {
        let def = json!({"name": "A", "description": "d", "llm_prompt": "p"});
        let def = def.as_object().unwrap();
        assert!(agent_properties(def, AgentKind::Llm).is_ok());
        assert!(agent_properties(def, AgentKind::Script).is_err());
    }

    #[test]
    fn properties_carry_security_flags() {
        let def = json!({
            "name": "A",
            "description": "d",
            "category": "ops",
            "effectiveness_threshold": 0.9,
            "llm_prompt": "p",
            "capabilities": ["x", {"name": "y"}]
        });
        let (props, caps) = agent_properties(def.as_object().unwrap(), AgentKind::Llm).unwrap();
        assert_eq!(caps, vec!["x", "y"]);
        assert_eq!(props["agent_type"], json!("llm"));
        assert_eq!(props["security_output_validation"], json!(true));
        assert_eq!(props["effectiveness_threshold"], json!(0.9));
    }

    #[test]
    fn malformed_capabilities_reject_the_draft() {
        let def = json!({"name": "A", "description": "d", "llm_prompt": "p", "capabilities": [7]});
        let err = agent_properties(def.as_object().unwrap(), AgentKind::Llm).unwrap_err();
        assert!(matches!(err, KgError::Agent(_)), "{}", err);
    }
}
