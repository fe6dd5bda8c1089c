//! ASR adapter port (C3), spec §4.3.
//!
//! The core never imports a provider SDK; concrete streaming STT services
//! implement this trait the way `IndicConformerStt`/`StreamingStt` implement
//! `voice_agent_core::traits::speech::SpeechToText` in the teacher crate.
//! Spec §4.3 describes the contract in terms of callbacks
//! (`on_transcript`/`on_error`/`on_connected`/`on_disconnected`); we express
//! the same contract as a single event stream, the idiomatic-Rust shape the
//! teacher already uses for `transcribe_stream` and that spec §9's design
//! notes recommend ("model translation streaming as a lazy, finite,
//! non-restartable sequence") — the same idiom just as naturally covers ASR
//! callbacks.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;
use crate::transcript::TranscriptSegment;

/// One PCM16 mono 16kHz audio frame (typically 20ms / 640 bytes), in order.
pub type AudioFrame = Vec<u8>;

/// Non-fatal/fatal error surfaced by the adapter (spec §4.3: `AsrError`).
#[derive(Debug, Clone, PartialEq)]
pub struct AsrError {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

/// Connection/session configuration passed to `connect`.
#[derive(Debug, Clone, Default)]
pub struct AsrConnectConfig {
    pub punctuation: bool,
    pub smart_formatting: bool,
}

/// Events the adapter may emit after `connect`. `UTTERANCE_END` and
/// `METADATA` from spec §4.3 are intentionally not modeled — the core
/// ignores them.
#[derive(Debug, Clone)]
pub enum AsrEvent {
    Connected,
    Disconnected,
    Transcript(TranscriptSegment),
    Error(AsrError),
}

/// Streaming ASR provider port.
///
/// Semantics the core relies on (spec §4.3): the provider emits both
/// interim (`is_final = false`) and final (`is_final = true`) segments; the
/// same logical utterance keeps the same `id` across interims. Disconnect is
/// surfaced via [`AsrEvent::Disconnected`] but never auto-reconnected by the
/// adapter — reconnection policy lives in the orchestrator (C12).
#[async_trait]
pub trait AsrAdapter: Send + Sync {
    /// Open the provider connection for `source_language`. May take a while
    /// to resolve; callers typically run this during the `starting` state.
    async fn connect(&mut self, source_language: &str, config: &AsrConnectConfig) -> Result<()>;

    /// Push one audio frame. Must not block; the adapter is responsible for
    /// buffering/backpressure internally.
    fn send_audio(&self, frame: &AudioFrame);

    /// Event stream for this connection. Each adapter instance yields
    /// exactly one stream; polling after `Disconnected` yields `None`.
    fn events(&self) -> Pin<Box<dyn Stream<Item = AsrEvent> + Send + '_>>;

    /// Close the underlying connection.
    async fn disconnect(&mut self);
}
