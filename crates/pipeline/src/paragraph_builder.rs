//! Assembles sentences into 20-60s paragraphs (C9, spec §4.9). Same
//! accumulate-then-flush shape as `SentenceCombiner`, with wall-clock
//! boundary rules instead of segment-count ones.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

use univoice_core::{text, CombinedSentence, Paragraph};

#[derive(Debug, Clone)]
pub struct ParagraphConfig {
    pub min_ms: u64,
    pub target_min_ms: u64,
    pub target_max_ms: u64,
    pub hard_cap_ms: u64,
    pub silence_gap_ms: u64,
}

impl From<&univoice_config::ParagraphConfig> for ParagraphConfig {
    fn from(cfg: &univoice_config::ParagraphConfig) -> Self {
        Self {
            min_ms: cfg.min_ms,
            target_min_ms: cfg.target_min_ms,
            target_max_ms: cfg.target_max_ms,
            hard_cap_ms: cfg.hard_cap_ms,
            silence_gap_ms: cfg.silence_gap_ms,
        }
    }
}

struct Buffer {
    sentences: Vec<CombinedSentence>,
    started_at: Instant,
    last_arrival: Instant,
}

pub struct ParagraphBuilder {
    config: ParagraphConfig,
    buffer: Mutex<Option<Buffer>>,
}

impl ParagraphBuilder {
    pub fn new(config: ParagraphConfig) -> Self {
        Self {
            config,
            buffer: Mutex::new(None),
        }
    }

    /// Feed a completed sentence; returns `Some(Paragraph)` if the duration
    /// target or hard cap fires.
    pub fn add_sentence(&self, sentence: CombinedSentence) -> Option<Paragraph> {
        let mut guard = self.buffer.lock();
        let now = Instant::now();
        let buffer = guard.get_or_insert_with(|| Buffer {
            sentences: Vec::new(),
            started_at: now,
            last_arrival: now,
        });
        let ends_strong = text::ends_with_strong_terminator(&sentence.source_text);
        buffer.sentences.push(sentence);
        buffer.last_arrival = now;

        let elapsed = buffer.started_at.elapsed();
        if elapsed >= Duration::from_millis(self.config.hard_cap_ms) {
            return Some(Self::emit(guard));
        }
        if elapsed >= Duration::from_millis(self.config.target_min_ms)
            && elapsed <= Duration::from_millis(self.config.target_max_ms)
            && ends_strong
        {
            return Some(Self::emit(guard));
        }
        None
    }

    /// Periodic tick (≤ 500 ms, spec §5): fires rule 3, silence gap after the
    /// configured minimum duration.
    pub fn check_silence_gap(&self) -> Option<Paragraph> {
        let guard = self.buffer.lock();
        let buffer = guard.as_ref()?;
        let elapsed_since_start = buffer.started_at.elapsed();
        let elapsed_since_last = buffer.last_arrival.elapsed();
        if elapsed_since_start >= Duration::from_millis(self.config.min_ms)
            && elapsed_since_last >= Duration::from_millis(self.config.silence_gap_ms)
        {
            return Some(Self::emit(guard));
        }
        None
    }

    /// `stop()` flushes any partial paragraph that has reached the minimum duration.
    pub fn flush(&self) -> Option<Paragraph> {
        let guard = self.buffer.lock();
        let meets_minimum = guard
            .as_ref()
            .map(|b| b.started_at.elapsed() >= Duration::from_millis(self.config.min_ms))
            .unwrap_or(false);
        if meets_minimum {
            Some(Self::emit(guard))
        } else {
            None
        }
    }

    fn emit(mut guard: parking_lot::MutexGuard<Option<Buffer>>) -> Paragraph {
        let buffer = guard.take().expect("buffer present when emit is called");
        let language = buffer
            .sentences
            .first()
            .map(|s| s.source_language.clone())
            .unwrap_or_default();
        Paragraph::from_sentences(univoice_core::new_id(), &buffer.sentences, &language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(id: &str, text: &str, start_ms: u64, end_ms: u64) -> CombinedSentence {
        CombinedSentence {
            id: id.into(),
            segment_ids: vec![],
            source_text: text.into(),
            source_language: "en".into(),
            start_ms,
            end_ms,
            segment_count: 1,
            avg_confidence: 0.9,
            word_count: text.split_whitespace().count(),
        }
    }

    #[test]
    fn hard_cap_fires_regardless_of_terminator() {
        let builder = ParagraphBuilder::new(ParagraphConfig {
            min_ms: 0,
            target_min_ms: 20_000,
            target_max_ms: 60_000,
            hard_cap_ms: 0,
            silence_gap_ms: 2_000,
        });
        let paragraph = builder.add_sentence(sentence("s1", "no terminator here", 0, 100)).unwrap();
        assert_eq!(paragraph.sentence_ids, vec!["s1".to_string()]);
    }

    #[test]
    fn does_not_fire_before_target_window() {
        let builder = ParagraphBuilder::new(ParagraphConfig {
            min_ms: 10_000,
            target_min_ms: 20_000,
            target_max_ms: 60_000,
            hard_cap_ms: 60_000,
            silence_gap_ms: 2_000,
        });
        assert!(builder.add_sentence(sentence("s1", "Hello world.", 0, 100)).is_none());
    }
}
