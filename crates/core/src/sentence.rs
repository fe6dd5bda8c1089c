//! Sentence-combiner output record (spec §3: `CombinedSentence`).

use serde::{Deserialize, Serialize};

use crate::text;

/// Produced by the sentence combiner (C5) when a trigger rule fires.
///
/// `segment_ids` is the exact ordered set consumed; `source_text` is the
/// joined, whitespace-normalized concatenation (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSentence {
    pub id: String,
    pub segment_ids: Vec<String>,
    pub source_text: String,
    pub source_language: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub segment_count: usize,
    pub avg_confidence: f32,
    pub word_count: usize,
}

impl CombinedSentence {
    /// Build a combined sentence from its constituent segments, computing
    /// the derived fields (`source_text`, `avg_confidence`, `word_count`).
    pub fn from_segments(
        id: impl Into<String>,
        segments: &[crate::TranscriptSegment],
        source_language: impl Into<String>,
    ) -> Self {
        let source_language = source_language.into();
        let source_text = text::join_normalized(segments.iter().map(|s| s.text.as_str()));
        let avg_confidence = if segments.is_empty() {
            0.0
        } else {
            segments.iter().map(|s| s.confidence).sum::<f32>() / segments.len() as f32
        };
        let word_count = text::word_count(&source_text, &source_language);
        Self {
            id: id.into(),
            segment_ids: segments.iter().map(|s| s.id.clone()).collect(),
            start_ms: segments.first().map(|s| s.timestamp_ms).unwrap_or(0),
            end_ms: segments.last().map(|s| s.timestamp_ms).unwrap_or(0),
            segment_count: segments.len(),
            source_text,
            source_language,
            avg_confidence,
            word_count,
        }
    }
}
