//! Bridges an [`LlmBackend`] to the core [`LlmAdapter`] port.
//!
//! Mirrors `voice_agent_llm::adapter::LanguageModelAdapter`: the adapter is
//! the only place that knows how to turn the pipeline's two operations
//! (stream a translation, run a one-shot completion) into the backend's
//! chat-completion shape, and the only place responsible for stripping a
//! provider's chain-of-thought preface from its output (spec §4.7).

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;

use univoice_core::{Effort, Error, LlmAdapter, Result};

use crate::backend::{ChatMessage, LlmBackend};

/// Strip a leading `<think>...</think>` block some reasoning models prepend
/// to their output; the pipeline must only ever see the final answer.
fn strip_thinking_preface(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim_start();
        }
    }
    trimmed
}

pub struct LlmAdapterImpl<B: LlmBackend> {
    backend: Arc<B>,
}

impl<B: LlmBackend> LlmAdapterImpl<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    fn effort_to_temperature(effort: Effort) -> &'static str {
        match effort {
            Effort::Minimal => "minimal reasoning effort",
            Effort::Low => "low reasoning effort",
            Effort::High => "high reasoning effort",
        }
    }
}

#[async_trait]
impl<B: LlmBackend + 'static> LlmAdapter for LlmAdapterImpl<B> {
    fn translate_stream<'a>(
        &'a self,
        source_text: &'a str,
        source_language: &'a str,
        target_language: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>> {
        let backend = self.backend.clone();
        let messages = vec![
            ChatMessage {
                role: "system",
                content: format!(
                    "Translate the user's {source_language} text into {target_language}. \
                     Output only the translation, no commentary."
                ),
            },
            ChatMessage {
                role: "user",
                content: source_text.to_string(),
            },
        ];

        Box::pin(async_stream::stream! {
            let (tx, mut rx) = mpsc::channel::<String>(32);
            let task = tokio::spawn(async move {
                backend.generate_stream(&messages, 2048, tx).await
            });

            let mut prefix = String::new();
            while let Some(chunk) = rx.recv().await {
                prefix.push_str(&chunk);
                yield Ok(strip_thinking_preface(&prefix).to_string());
            }

            match task.await {
                Ok(Ok(result)) => {
                    yield Ok(strip_thinking_preface(&result.text).to_string());
                }
                Ok(Err(e)) => yield Err(Error::from(e)),
                Err(e) => yield Err(Error::Unknown(format!("llm task join error: {e}"))),
            }
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        max_output_tokens: u32,
        effort: Effort,
    ) -> Result<String> {
        let system = format!(
            "You are a concise assistant ({}). Target model: {model}.",
            Self::effort_to_temperature(effort)
        );
        let messages = vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt.to_string(),
            },
        ];
        let result = self
            .backend
            .generate(&messages, max_output_tokens)
            .await
            .map_err(Error::from)?;
        Ok(strip_thinking_preface(&result.text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use futures::StreamExt;

    struct MockBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(&self, _messages: &[ChatMessage], _max_tokens: u32) -> Result<GenerationResult, crate::error::LlmError> {
            Ok(GenerationResult {
                text: self.response.clone(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn generate_stream(
            &self,
            _messages: &[ChatMessage],
            _max_tokens: u32,
            tx: mpsc::Sender<String>,
        ) -> Result<GenerationResult, crate::error::LlmError> {
            for word in self.response.split_whitespace() {
                let _ = tx.send(format!("{word} ")).await;
            }
            Ok(GenerationResult {
                text: self.response.clone(),
                finish_reason: FinishReason::Stop,
            })
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn strips_thinking_preface() {
        let backend = MockBackend {
            response: "<think>reasoning...</think>Hello, world!".to_string(),
        };
        let adapter = LlmAdapterImpl::new(backend);
        let out = adapter.complete("hi", "mock-model", 100, Effort::Low).await.unwrap();
        assert_eq!(out, "Hello, world!");
    }

    #[tokio::test]
    async fn translate_stream_terminates_with_full_text() {
        let backend = MockBackend {
            response: "Bonjour le monde".to_string(),
        };
        let adapter = LlmAdapterImpl::new(backend);
        let mut stream = adapter.translate_stream("Hello world", "en", "fr");
        let mut last = String::new();
        while let Some(item) = stream.next().await {
            last = item.unwrap();
        }
        assert_eq!(last, "Bonjour le monde");
    }
}
