//! LLM adapter port (C7), spec §4.7.
//!
//! Two operations only: a streaming translation call and a non-streaming
//! `complete` used for summaries/vocabulary/reports. Shaped after
//! `voice_agent_core::traits::llm::LanguageModel` in the teacher crate,
//! narrowed to what the pipeline actually needs — the core must not
//! encode provider-specific parameters (spec §6).

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;

/// Reasoning-effort hint for `complete` (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effort {
    Minimal,
    Low,
    High,
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Stream a translation of `source_text`. Partial items are monotonic
    /// prefixes of the final translation; the stream's last item is the
    /// complete, chain-of-thought-stripped translation.
    fn translate_stream<'a>(
        &'a self,
        source_text: &'a str,
        source_language: &'a str,
        target_language: &'a str,
    ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

    /// Non-streaming completion for summaries, vocabulary, and final
    /// reports.
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        max_output_tokens: u32,
        effort: Effort,
    ) -> Result<String>;
}
