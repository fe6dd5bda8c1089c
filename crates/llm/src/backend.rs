//! Provider-specific chat-completion backend.
//!
//! Kept separate from [`crate::adapter`] the way the teacher splits
//! `LlmBackend` (provider wire format) from `LanguageModelAdapter` (core
//! trait bridge): the backend knows about HTTP/JSON and retries, the
//! adapter in `crate::adapter` narrows that down to
//! `univoice_core::LlmAdapter`'s two operations and strips any
//! provider "thinking" preface (spec §4.7).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "default-chat-model".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

pub struct GenerationResult {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Minimal chat message, independent of any provider's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Provider-specific chat completion backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<GenerationResult, LlmError>;

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError>;

    fn model_name(&self) -> &str;
}

/// HTTP chat-completions backend (Ollama-compatible `/api/chat` wire
/// format), used as the default reference implementation.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpChatBackend {
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{path}", self.config.endpoint)
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let mut req = self.client.post(self.api_url("/chat")).json(request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                LlmError::Network(format!("server error {status}: {body}"))
            } else {
                LlmError::Api(body)
            });
        }
        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmBackend for HttpChatBackend {
    async fn generate(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<GenerationResult, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            max_tokens,
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, ?backoff, "llm request failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.execute(&request).await {
                Ok(response) => {
                    return Ok(GenerationResult {
                        text: response.message.content,
                        finish_reason: if response.done {
                            FinishReason::Stop
                        } else {
                            FinishReason::Length
                        },
                    });
                }
                Err(e) if Self::is_retryable(&e) && attempt < self.config.max_retries => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or(LlmError::Network("exhausted retries".into())))
    }

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError> {
        // Reference backend has no true token stream; it resolves the full
        // completion and relays it as a single chunk. Concrete streaming
        // providers (SSE/NDJSON) replace this method; the adapter layer
        // above only requires that `tx` eventually receives the full text.
        let result = self.generate(messages, max_tokens).await?;
        let _ = tx.send(result.text.clone()).await;
        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    done: bool,
}
