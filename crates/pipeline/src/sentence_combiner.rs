//! Groups final ASR segments into sentence-bounded units (C5, spec §4.5).
//!
//! Same buffering shape as the teacher's `SentenceDetector`
//! (`processors/sentence_detector.rs`): a guarded buffer of pending pieces,
//! boundary detection on append, and an explicit flush. Boundary rules are
//! generalized from the teacher's terminator-only check to the spec's
//! four-rule tie-break using `univoice_core::text`.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

use univoice_core::{text, CombinedSentence, TranscriptSegment};

#[derive(Debug, Clone)]
pub struct SentenceCombinerConfig {
    pub max_segments: usize,
    pub timeout_ms: u64,
    pub min_segments: usize,
}

impl From<&univoice_config::SentenceCombinerConfig> for SentenceCombinerConfig {
    fn from(cfg: &univoice_config::SentenceCombinerConfig) -> Self {
        Self {
            max_segments: cfg.max_segments,
            timeout_ms: cfg.timeout_ms,
            min_segments: cfg.min_segments,
        }
    }
}

struct Buffer {
    segments: Vec<TranscriptSegment>,
    last_arrival: Instant,
    paused: bool,
}

pub struct SentenceCombiner {
    config: SentenceCombinerConfig,
    buffer: Mutex<Buffer>,
}

impl SentenceCombiner {
    pub fn new(config: SentenceCombinerConfig) -> Self {
        Self {
            config,
            buffer: Mutex::new(Buffer {
                segments: Vec::new(),
                last_arrival: Instant::now(),
                paused: false,
            }),
        }
    }

    /// Append a final segment; returns `Some(CombinedSentence)` if a trigger
    /// rule fires (strong terminator > size bound; silence timeout is
    /// checked separately via `check_silence_timeout`).
    pub fn add_segment(&self, segment: TranscriptSegment) -> Option<CombinedSentence> {
        let mut buffer = self.buffer.lock();
        buffer.last_arrival = Instant::now();
        let incomplete = text::ends_incomplete(&segment.text);
        buffer.segments.push(segment);

        let count = buffer.segments.len();
        let last_text = buffer.segments.last().map(|s| s.text.as_str()).unwrap_or("");

        let strong_terminator = !incomplete && text::ends_with_strong_terminator(last_text);
        if strong_terminator {
            return Some(Self::emit(&mut buffer));
        }
        if count >= self.config.max_segments {
            return Some(Self::emit(&mut buffer));
        }
        None
    }

    /// Called periodically by the orchestrator; fires rule 3 (silence
    /// timeout) if segments are pending and the silence timer isn't paused.
    pub fn check_silence_timeout(&self) -> Option<CombinedSentence> {
        let mut buffer = self.buffer.lock();
        if buffer.paused || buffer.segments.is_empty() {
            return None;
        }
        let elapsed = buffer.last_arrival.elapsed();
        if elapsed >= Duration::from_millis(self.config.timeout_ms) {
            return Some(Self::emit(&mut buffer));
        }
        None
    }

    /// `stop()` flushes any pending partial sentence regardless of rule
    /// thresholds.
    pub fn flush(&self) -> Option<CombinedSentence> {
        let mut buffer = self.buffer.lock();
        if buffer.segments.is_empty() {
            None
        } else {
            Some(Self::emit(&mut buffer))
        }
    }

    pub fn pause(&self) {
        self.buffer.lock().paused = true;
    }

    pub fn resume(&self) {
        let mut buffer = self.buffer.lock();
        buffer.paused = false;
        buffer.last_arrival = Instant::now();
    }

    fn emit(buffer: &mut Buffer) -> CombinedSentence {
        let segments = std::mem::take(&mut buffer.segments);
        let language = segments.first().map(|s| s.language.clone()).unwrap_or_default();
        CombinedSentence::from_segments(univoice_core::new_id(), &segments, language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, text: &str, ts: u64) -> TranscriptSegment {
        TranscriptSegment {
            id: id.into(),
            text: text.into(),
            timestamp_ms: ts,
            confidence: 0.9,
            is_final: true,
            language: "en".into(),
        }
    }

    fn combiner() -> SentenceCombiner {
        SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            timeout_ms: 2000,
            min_segments: 1,
        })
    }

    #[test]
    fn strong_terminator_emits_immediately() {
        let c = combiner();
        assert!(c.add_segment(seg("s1", "Hello", 0)).is_none());
        let sentence = c.add_segment(seg("s2", "world.", 800)).unwrap();
        assert_eq!(sentence.source_text, "Hello world.");
        assert_eq!(sentence.segment_count, 2);
    }

    #[test]
    fn size_bound_emits_at_max_segments() {
        let c = combiner();
        for i in 0..9 {
            assert!(c.add_segment(seg(&format!("s{i}"), "word", i as u64 * 80)).is_none());
        }
        let sentence = c.add_segment(seg("s9", "word", 900)).unwrap();
        assert_eq!(sentence.segment_count, 10);
    }

    #[test]
    fn strong_terminator_fires_before_min_segments() {
        let c = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            timeout_ms: 2000,
            min_segments: 3,
        });
        let sentence = c.add_segment(seg("s1", "Hello there.", 0)).unwrap();
        assert_eq!(sentence.segment_count, 1);
    }

    #[test]
    fn incomplete_end_suppresses_terminator_rule() {
        let c = combiner();
        assert!(c.add_segment(seg("s1", "I went to the store,", 0)).is_none());
    }

    #[test]
    fn silence_timeout_flushes_single_segment() {
        let c = SentenceCombiner::new(SentenceCombinerConfig {
            max_segments: 10,
            timeout_ms: 0,
            min_segments: 1,
        });
        c.add_segment(seg("s1", "Hello", 0));
        std::thread::sleep(Duration::from_millis(5));
        let sentence = c.check_silence_timeout().unwrap();
        assert_eq!(sentence.source_text, "Hello");
    }
}
