//! HTTP boundary for the completion client.

use crate::provider::LlmResult;
use crate::types::ChatRequest;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Raw status and body from one round-trip. Status handling belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> LlmResult<TransportResponse>;
}

/// POSTs JSON to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> LlmResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> LlmResult<TransportResponse> {
        debug!(url = %self.endpoint, model = %request.model, "posting completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
