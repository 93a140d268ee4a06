//! agentgraph LLM - resilient completion client with simulation fallback

pub mod client;
pub mod provider;
pub mod transport;
pub mod types;

pub use client::{simulated_echo, LlmClient, MAX_ATTEMPTS};
pub use provider::{LlmError, LlmProvider, LlmResult};
pub use tokio_util::sync::CancellationToken;
pub use transport::{CompletionTransport, HttpTransport, TransportResponse};
pub use types::*;
