//! LLM provider trait

use crate::types::QueryResult;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited: no request permit within {waited_ms}ms")]
    RateLimited { waited_ms: u64 },

    #[error("giving up after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: Box<LlmError> },

    #[error("no completions returned")]
    EmptyCompletion,

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    /// True for errors the retry loop treats as a failed attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Http { .. } | LlmError::Network(_) | LlmError::RequestFailed(_)
        )
    }
}

/// Anything that turns a prompt into completion text.
///
/// Agents, domain creation and query generation all hold an
/// `Arc<dyn LlmProvider>` so tests can substitute a canned provider.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Complete `prompt`. An empty `model_hint` selects the configured default model.
    async fn query(&self, prompt: &str, model_hint: &str) -> LlmResult<QueryResult>;
}
