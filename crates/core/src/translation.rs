//! Translation queue records (spec §3: `TranslationRequest`, `TranslationResult`).

use serde::{Deserialize, Serialize};

/// Priority band for the translation queue (C6). FIFO within a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Ordered so `High < Normal < Low` sorts high-priority first.
    High,
    Normal,
    Low,
}

/// What triggered this translation, and therefore how it is wired back into
/// history/paragraphs by the orchestrator (spec §3, §4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Realtime,
    History,
    Paragraph,
}

/// A request to translate `source_text`. Keyed by `segment_id`; enqueuing the
/// same `segment_id` twice is a no-op (spec §3, §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub segment_id: String,
    pub source_text: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp_ms: u64,
    pub priority: Priority,
    pub kind: RequestKind,
    pub attempts: u32,
}

impl TranslationRequest {
    pub fn new(
        segment_id: impl Into<String>,
        source_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        timestamp_ms: u64,
        priority: Priority,
        kind: RequestKind,
    ) -> Self {
        Self {
            segment_id: segment_id.into(),
            source_text: source_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            timestamp_ms,
            priority,
            kind,
            attempts: 0,
        }
    }
}

/// A (possibly intermediate) translation outcome. Intermediate results share
/// `segment_id` and have `is_final = false`; the terminal result has
/// `is_final = true` and the full `target_text` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub segment_id: String,
    pub source_text: String,
    pub target_text: String,
    pub first_paint_ms: Option<u64>,
    pub complete_ms: Option<u64>,
    pub is_final: bool,
}
