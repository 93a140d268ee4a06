//! Agent creation and execution errors

use agentgraph_graph::GraphError;
use agentgraph_llm::LlmError;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("invalid agent definition: {0}")]
    InvalidDefinition(String),

    #[error("agent class not found: {0}")]
    ClassNotFound(String),

    #[error("agent class {0} has no constructor taking a graph handle")]
    ConstructorMismatch(String),

    #[error("failed to instantiate {class}: {reason}")]
    InstantiationFailure { class: String, reason: String },

    #[error("script evaluation failed: {0}")]
    ScriptEvaluationFailure(String),

    #[error("candidate generation failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
