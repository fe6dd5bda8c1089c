//! Core data model, error types and adapter ports for the UniVoice pipeline.
//!
//! This crate provides the foundational types shared by every other crate:
//! - The pipeline's record types (`TranscriptSegment`, `CombinedSentence`,
//!   `TranslationRequest`/`Result`, `Paragraph`, `HistoryBlock`, `Summary`).
//! - The typed, discriminated `PipelineEvent`.
//! - Error types.
//! - The `AsrAdapter`/`LlmAdapter` ports external providers implement.
//! - Opaque id types (`CorrelationId`) and language-aware text measurement.

pub mod error;
pub mod event;
pub mod history;
pub mod ids;
pub mod paragraph;
pub mod sentence;
pub mod summary;
pub mod text;
pub mod traits;
pub mod transcript;
pub mod translation;

pub use error::{Error, Result};
pub use event::{PipelineEvent, PipelineEventKind, VocabularyItem};
pub use history::{HistoryBlock, HistorySentence, PLACEHOLDER_TARGET, TIMEOUT_MARKER};
pub use ids::{new_id, CorrelationId, Id};
pub use paragraph::Paragraph;
pub use sentence::CombinedSentence;
pub use summary::Summary;
pub use traits::{AsrAdapter, AsrConnectConfig, AsrError, AsrEvent, AudioFrame, Effort, LlmAdapter};
pub use transcript::TranscriptSegment;
pub use translation::{Priority, RequestKind, TranslationRequest, TranslationResult};
