//! Maintains ordered, mutable history blocks for the UI (C10, spec §4.10).

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use univoice_core::{CombinedSentence, HistoryBlock, HistorySentence, Paragraph, PLACEHOLDER_TARGET};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct HistoryGrouper {
    blocks: Mutex<Vec<HistoryBlock>>,
}

impl HistoryGrouper {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(Vec::new()),
        }
    }

    /// Appends a one-sentence block with placeholder target text.
    pub fn add_sentence(&self, sentence: &CombinedSentence) -> String {
        let block_id = univoice_core::new_id();
        let mut blocks = self.blocks.lock();
        blocks.push(HistoryBlock {
            id: block_id.clone(),
            sentences: vec![HistorySentence {
                id: sentence.id.clone(),
                source_text: sentence.source_text.clone(),
                target_text: PLACEHOLDER_TARGET.to_string(),
                timestamp_ms: sentence.start_ms,
            }],
            created_at: now_ms(),
            is_paragraph: false,
            paragraph_id: None,
            total_height: None,
        });
        block_id
    }

    /// Appends a block with `is_paragraph=true`, empty target text.
    pub fn add_paragraph(&self, paragraph: &Paragraph) -> String {
        let block_id = univoice_core::new_id();
        let mut blocks = self.blocks.lock();
        blocks.push(HistoryBlock {
            id: block_id.clone(),
            sentences: vec![HistorySentence {
                id: paragraph.id.clone(),
                source_text: paragraph.raw_text.clone(),
                target_text: String::new(),
                timestamp_ms: paragraph.start_ms,
            }],
            created_at: now_ms(),
            is_paragraph: true,
            paragraph_id: Some(paragraph.id.clone()),
            total_height: None,
        });
        block_id
    }

    /// One-shot replace of a sentence's `target_text`, keyed by sentence id
    /// (not block id), if currently empty, placeholder, or timeout marker.
    pub fn update_sentence_translation(&self, sentence_id: &str, target_text: &str) -> bool {
        let mut blocks = self.blocks.lock();
        for block in blocks.iter_mut() {
            for s in block.sentences.iter_mut() {
                if s.id == sentence_id && HistoryBlock::is_upgradable(&s.target_text) {
                    s.target_text = target_text.to_string();
                    return true;
                }
            }
        }
        false
    }

    /// Same upgrade rule, keyed by `paragraph_id`.
    pub fn update_paragraph_translation(&self, paragraph_id: &str, target_text: &str) -> bool {
        let mut blocks = self.blocks.lock();
        for block in blocks.iter_mut() {
            if block.paragraph_id.as_deref() == Some(paragraph_id) {
                for s in block.sentences.iter_mut() {
                    if HistoryBlock::is_upgradable(&s.target_text) {
                        s.target_text = target_text.to_string();
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn snapshot(&self, limit: Option<usize>, offset: Option<usize>) -> Vec<HistoryBlock> {
        let blocks = self.blocks.lock();
        let offset = offset.unwrap_or(0);
        let iter = blocks.iter().skip(offset).cloned();
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    pub fn clear(&self) {
        self.blocks.lock().clear();
    }
}

impl Default for HistoryGrouper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(id: &str, text: &str) -> CombinedSentence {
        CombinedSentence {
            id: id.into(),
            segment_ids: vec![],
            source_text: text.into(),
            source_language: "en".into(),
            start_ms: 0,
            end_ms: 100,
            segment_count: 1,
            avg_confidence: 0.9,
            word_count: 2,
        }
    }

    #[test]
    fn placeholder_upgrades_exactly_once() {
        let grouper = HistoryGrouper::new();
        grouper.add_sentence(&sentence("s1", "Hello world"));
        assert!(grouper.update_sentence_translation("s1", univoice_core::TIMEOUT_MARKER));
        assert!(grouper.update_sentence_translation("s1", "\u{5b9f}\u{8a33}"));
        let snap = grouper.snapshot(None, None);
        assert_eq!(snap[0].sentences[0].target_text, "\u{5b9f}\u{8a33}");
    }

    #[test]
    fn realtime_translation_is_not_downgraded_by_placeholder() {
        let grouper = HistoryGrouper::new();
        grouper.add_sentence(&sentence("s1", "Hello world"));
        grouper.update_sentence_translation("s1", "real translation");
        assert!(!grouper.update_sentence_translation("s1", "translating…"));
        let snap = grouper.snapshot(None, None);
        assert_eq!(snap[0].sentences[0].target_text, "real translation");
    }
}
