//! The typed, correlation-tagged event exposed by the `EventBus` (C1).
//!
//! Mirrors spec §6's discriminated union exactly; `#[serde(tag = "type")]`
//! gives external consumers (UI, persistence) the wire shape spec §6
//! describes without the core importing any of their types, the same
//! boundary discipline as `voice_agent_core::traits::pipeline::Frame` in the
//! teacher crate.

use serde::{Deserialize, Serialize};

use crate::ids::CorrelationId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PipelineEventKind {
    Asr {
        text: String,
        is_final: bool,
        segment_id: String,
        confidence: f32,
        language: String,
    },
    Translation {
        segment_id: String,
        source_text: String,
        target_text: String,
        is_final: bool,
    },
    CombinedSentence {
        combined_id: String,
        segment_ids: Vec<String>,
        source_text: String,
        timestamp: u64,
    },
    ParagraphComplete {
        paragraph_id: String,
        sentence_ids: Vec<String>,
        raw_text: String,
        cleaned_text: String,
        start_ms: u64,
        end_ms: u64,
        duration_ms: u64,
        word_count: usize,
    },
    ProgressiveSummary {
        source_text: String,
        target_text: String,
        source_language: String,
        target_language: String,
        word_count: usize,
        threshold: usize,
        start_ms: u64,
        end_ms: u64,
    },
    Vocabulary {
        items: Vec<VocabularyItem>,
        total_terms: usize,
    },
    FinalReport {
        report: String,
        total_word_count: usize,
        summary_count: usize,
        vocabulary_count: usize,
    },
    Status {
        state: String,
    },
    Error {
        code: String,
        message: String,
        recoverable: bool,
        details: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
}

/// Envelope every emitted event carries (spec §3: "Every event has
/// `{type, timestamp_ms, correlation_id, data}`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub timestamp_ms: u64,
    pub correlation_id: Option<CorrelationId>,
    #[serde(flatten)]
    pub data: PipelineEventKind,
}

impl PipelineEvent {
    pub fn new(
        timestamp_ms: u64,
        correlation_id: Option<CorrelationId>,
        data: PipelineEventKind,
    ) -> Self {
        Self {
            timestamp_ms,
            correlation_id,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spec §6 fixes the wire shape for UI consumers: a flat `{type, timestamp_ms,
    /// correlation_id, data...}` object, not a nested `data` field.
    #[test]
    fn serializes_to_the_flat_discriminated_wire_shape() {
        let event = PipelineEvent::new(
            1_000,
            None,
            PipelineEventKind::Translation {
                segment_id: "seg1".into(),
                source_text: "hello".into(),
                target_text: "こんにちは".into(),
                is_final: true,
            },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "translation");
        assert_eq!(value["timestamp_ms"], 1000);
        assert_eq!(value["segment_id"], "seg1");
        assert_eq!(value["target_text"], "こんにちは");
        assert!(value.get("data").is_none());
    }
}
