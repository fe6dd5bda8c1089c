//! ASR output record (spec §3: `TranscriptSegment`).

use serde::{Deserialize, Serialize};

/// One ASR-emitted transcript chunk; may be interim or final.
///
/// For a given `id`, the last `is_final = true` update wins; interim updates
/// share the `id` until finalization (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: String,
    pub text: String,
    pub timestamp_ms: u64,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub is_final: bool,
    /// ISO-639-1 source language code.
    pub language: String,
}

impl TranscriptSegment {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        timestamp_ms: u64,
        confidence: f32,
        is_final: bool,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp_ms,
            confidence: confidence.clamp(0.0, 1.0),
            is_final,
            language: language.into(),
        }
    }
}
