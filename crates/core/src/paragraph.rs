//! Paragraph builder output record (spec §3: `Paragraph`).

use serde::{Deserialize, Serialize};

use crate::text;

/// Produced by the paragraph builder (C9) when a boundary rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub sentence_ids: Vec<String>,
    pub raw_text: String,
    pub cleaned_text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub duration_ms: u64,
    pub word_count: usize,
}

impl Paragraph {
    pub fn from_sentences(
        id: impl Into<String>,
        sentences: &[crate::CombinedSentence],
        source_language: &str,
    ) -> Self {
        let raw_text = text::join_normalized(sentences.iter().map(|s| s.source_text.as_str()));
        let cleaned_text = text::clean_paragraph_text(&raw_text);
        let start_ms = sentences.first().map(|s| s.start_ms).unwrap_or(0);
        let end_ms = sentences.last().map(|s| s.end_ms).unwrap_or(start_ms);
        Self {
            id: id.into(),
            sentence_ids: sentences.iter().map(|s| s.id.clone()).collect(),
            word_count: text::word_count(&raw_text, source_language),
            duration_ms: end_ms.saturating_sub(start_ms),
            raw_text,
            cleaned_text,
            start_ms,
            end_ms,
        }
    }
}
