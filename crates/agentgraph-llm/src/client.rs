//! Resilient completion client.
//!
//! Bounded concurrency through a shared permit pool, bounded retries with
//! linear back-off, and a deterministic echo when no backend is configured.

use crate::provider::{LlmError, LlmProvider, LlmResult};
use crate::transport::{CompletionTransport, HttpTransport};
use crate::types::{ChatRequest, ChatResponse, QueryResult};
use agentgraph_core::LlmSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Attempts per query, counting 429 responses.
pub const MAX_ATTEMPTS: u32 = 3;

const BACKOFF_UNIT: Duration = Duration::from_millis(1000);
const SIMULATED_PREFIX_CHARS: usize = 30;

/// Echo returned when no credential or endpoint is configured.
pub fn simulated_echo(prompt: &str) -> String {
    let head: String = prompt.chars().take(SIMULATED_PREFIX_CHARS).collect();
    format!("Simulated LLM response: {}...", head)
}

#[derive(Clone)]
pub struct LlmClient {
    settings: Arc<LlmSettings>,
    transport: Option<Arc<dyn CompletionTransport>>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("model", &self.settings.model)
            .field("live", &self.is_live())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl LlmClient {
    /// Build a client over HTTP. Without a key and endpoint the client runs in simulation mode.
    pub fn new(settings: LlmSettings) -> LlmResult<Self> {
        let transport: Option<Arc<dyn CompletionTransport>> =
            match (&settings.api_key, &settings.endpoint) {
                (Some(key), Some(endpoint)) => Some(Arc::new(HttpTransport::new(
                    endpoint.clone(),
                    key.clone(),
                    settings.timeout,
                )?)),
                _ => {
                    warn!("no LLM credential or endpoint configured, responses will be simulated");
                    None
                }
            };
        let permits = Arc::new(Semaphore::new(settings.max_concurrent));
        info!(model = %settings.model, live = transport.is_some(), "llm client initialized");
        Ok(Self {
            settings: Arc::new(settings),
            transport,
            permits,
        })
    }

    /// Build a client over an arbitrary transport.
    pub fn with_transport(settings: LlmSettings, transport: Arc<dyn CompletionTransport>) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent));
        Self {
            settings: Arc::new(settings),
            transport: Some(transport),
            permits,
        }
    }

    /// A client that never touches the network.
    pub fn simulated() -> Self {
        let settings = LlmSettings::default();
        let permits = Arc::new(Semaphore::new(settings.max_concurrent));
        Self {
            settings: Arc::new(settings),
            transport: None,
            permits,
        }
    }

    /// Share a permit pool with other clients.
    pub fn with_permit_pool(mut self, permits: Arc<Semaphore>) -> Self {
        self.permits = permits;
        self
    }

    pub fn permit_pool(&self) -> Arc<Semaphore> {
        self.permits.clone()
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    pub fn is_live(&self) -> bool {
        self.transport.is_some() && self.settings.is_live()
    }

    pub async fn query(&self, prompt: &str, model_hint: &str) -> LlmResult<QueryResult> {
        self.query_cancellable(prompt, model_hint, &CancellationToken::new())
            .await
    }

    /// Like [`query`](Self::query), but `cancel` aborts a pending permit
    /// wait, an in-flight request, or a back-off sleep with `Cancelled`.
    pub async fn query_cancellable(
        &self,
        prompt: &str,
        model_hint: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<QueryResult> {
        let transport = match &self.transport {
            Some(t) if self.settings.is_live() => t.clone(),
            _ => {
                info!("simulation mode, no request sent");
                return Ok(QueryResult::new(simulated_echo(prompt)));
            }
        };

        let model = if model_hint.trim().is_empty() {
            self.settings.model.as_str()
        } else {
            model_hint
        };
        let request = ChatRequest::single(
            model,
            prompt,
            self.settings.max_tokens,
            self.settings.temperature,
        );

        let mut last_error: Option<LlmError> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let outcome = {
                let _permit = self.acquire_permit(cancel).await?;
                debug!(attempt, model = %request.model, "sending completion request");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LlmError::Cancelled),
                    r = transport.send(&request) => r,
                }
            };

            match outcome {
                Ok(resp) if resp.status == 200 => {
                    debug!(attempt, "completion request succeeded");
                    return parse_completion(&resp.body);
                }
                Ok(resp) if resp.status == 429 => {
                    warn!(attempt, "rate limited by backend (429)");
                    if last_error.is_none() {
                        last_error = Some(LlmError::Http {
                            status: resp.status,
                            body: resp.body,
                        });
                    }
                }
                Ok(resp) => {
                    error!(attempt, status = resp.status, "completion request failed");
                    last_error = Some(LlmError::Http {
                        status: resp.status,
                        body: resp.body,
                    });
                }
                Err(e) if e.is_retryable() => {
                    error!(attempt, error = %e, "completion request failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            if attempt < MAX_ATTEMPTS {
                self.backoff(attempt, cancel).await?;
            }
        }

        error!(attempts = MAX_ATTEMPTS, "all completion attempts failed");
        Err(LlmError::ExhaustedRetries {
            attempts: MAX_ATTEMPTS,
            last: Box::new(
                last_error.unwrap_or_else(|| LlmError::RequestFailed("no attempt made".into())),
            ),
        })
    }

    async fn acquire_permit(&self, cancel: &CancellationToken) -> LlmResult<OwnedSemaphorePermit> {
        let wait = self.settings.timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LlmError::Cancelled),
            r = tokio::time::timeout(wait, self.permits.clone().acquire_owned()) => match r {
                Ok(Ok(permit)) => Ok(permit),
                Ok(Err(_)) => Err(LlmError::RequestFailed("permit pool closed".into())),
                Err(_) => {
                    warn!(waited_ms = wait.as_millis() as u64, "no request permit available");
                    Err(LlmError::RateLimited {
                        waited_ms: wait.as_millis() as u64,
                    })
                }
            },
        }
    }

    async fn backoff(&self, attempt: u32, cancel: &CancellationToken) -> LlmResult<()> {
        let delay = BACKOFF_UNIT * attempt;
        debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LlmError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn parse_completion(body: &str) -> LlmResult<QueryResult> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    let first = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyCompletion)?;
    Ok(QueryResult::new(first.into_text()))
}

#[async_trait::async_trait]
impl LlmProvider for LlmClient {
    fn name(&self) -> &str {
        if self.is_live() {
            "openai-compatible"
        } else {
            "simulated"
        }
    }

    async fn query(&self, prompt: &str, model_hint: &str) -> LlmResult<QueryResult> {
        LlmClient::query(self, prompt, model_hint).await
    }
}
