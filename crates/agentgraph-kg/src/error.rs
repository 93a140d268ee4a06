//! Knowledge-graph ingestion and authoring errors

use agentgraph_agent::AgentError;
use agentgraph_graph::GraphError;
use agentgraph_llm::LlmError;
use std::path::PathBuf;

pub type KgResult<T> = Result<T, KgError>;

#[derive(Debug, thiserror::Error)]
pub enum KgError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("field `{field}`: {reason}")]
    Field { field: String, reason: String },

    #[error("{0}")]
    Invalid(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl KgError {
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
