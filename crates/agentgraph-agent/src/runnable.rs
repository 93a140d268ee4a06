//! The runnable agent contract and the prompt/literal adapters.

use crate::error::AgentResult;
use agentgraph_llm::LlmProvider;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Placeholder prefix used when the backend returns nothing.
pub const EMPTY_RESPONSE_PREFIX: &str = "Simulated LLM response (empty): ";

/// A unit that turns an input into a candidate solution.
#[async_trait::async_trait]
pub trait RunnableAgent: Send + Sync {
    /// Short tag for the strategy behind this agent.
    fn kind(&self) -> &'static str;

    async fn generate_candidate(&self, input: &Value) -> AgentResult<Value>;
}

/// True for null and for empty strings, arrays and objects.
pub fn is_empty_input(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Template plus `" Input: "` and the rendered input when there is any input.
pub fn render_prompt(template: &str, input: &Value) -> String {
    if is_empty_input(input) {
        return template.to_string();
    }
    let rendered = match input {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{} Input: {}", template, rendered)
}

/// Forwards a rendered prompt to the completion backend.
pub struct PromptAgent {
    template: String,
    model_hint: String,
    llm: Arc<dyn LlmProvider>,
}

impl PromptAgent {
    pub fn new(template: impl Into<String>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            template: template.into(),
            model_hint: String::new(),
            llm,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_hint = model.into();
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

#[async_trait::async_trait]
impl RunnableAgent for PromptAgent {
    fn kind(&self) -> &'static str {
        "prompt"
    }

    async fn generate_candidate(&self, input: &Value) -> AgentResult<Value> {
        let prompt = render_prompt(&self.template, input);
        debug!(provider = self.llm.name(), len = prompt.len(), "prompt agent querying");
        let result = self.llm.query(&prompt, &self.model_hint).await?;
        let text = result.into_text();
        if text.trim().is_empty() {
            return Ok(Value::String(format!("{}{}", EMPTY_RESPONSE_PREFIX, prompt)));
        }
        Ok(Value::String(text))
    }
}

/// Returns a fixed string regardless of input.
pub struct LiteralAgent {
    text: String,
}

impl LiteralAgent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait::async_trait]
impl RunnableAgent for LiteralAgent {
    fn kind(&self) -> &'static str {
        "literal"
    }

    async fn generate_candidate(&self, _input: &Value) -> AgentResult<Value> {
        Ok(Value::String(self.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_only_non_empty_input() {
        assert_eq!(render_prompt("Solve:", &json!(null)), "Solve:");
        assert_eq!(render_prompt("Solve:", &json!([])), "Solve:");
        assert_eq!(render_prompt("Solve:", &json!("")), "Solve:");
        assert_eq!(render_prompt("Solve:", &json!("abc")), "Solve: Input: abc");
        assert_eq!(
            render_prompt("Solve:", &json!([[1, 2], [3, 4]])),
            "Solve: Input: [[1,2],[3,4]]"
        );
        assert_eq!(render_prompt("Solve:", &json!(0)), "Solve: Input: 0");
    }
}
