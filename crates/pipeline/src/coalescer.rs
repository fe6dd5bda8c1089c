//! Debounces high-frequency partial updates into stable UI frames (C4, spec
//! §4.4). Grounded on the teacher's `SentenceDetector` buffering discipline
//! (`processors/sentence_detector.rs`) — a `parking_lot::Mutex`-guarded
//! per-segment buffer plus a timer-driven force-flush — generalized from
//! sentence boundaries to the coalescer's debounce/force-commit rules.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use univoice_core::text;

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Source,
    Target,
}

#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    pub debounce_ms: u64,
    pub force_commit_ms: u64,
    pub stream_batcher_min_interval_ms: u64,
    pub stream_batcher_max_wait_ms: u64,
    pub stream_batcher_min_chars: usize,
}

impl CoalescerConfig {
    pub fn from_settings(cfg: &univoice_config::CoalescerConfig, batcher: &univoice_config::StreamBatcherConfig) -> Self {
        Self {
            debounce_ms: cfg.debounce_ms,
            force_commit_ms: cfg.force_commit_ms,
            stream_batcher_min_interval_ms: batcher.min_interval_ms,
            stream_batcher_max_wait_ms: batcher.max_wait_ms,
            stream_batcher_min_chars: batcher.min_chars,
        }
    }
}

struct SegmentState {
    last_text: String,
    last_emit: Instant,
    first_pending: Instant,
    last_emitted_len: usize,
}

/// Decision returned by `update`: whether the caller should emit `text` now.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Emit,
    Hold,
}

pub struct StreamCoalescer {
    config: CoalescerConfig,
    segments: Mutex<HashMap<(String, u8), SegmentState>>,
}

impl StreamCoalescer {
    pub fn new(config: CoalescerConfig) -> Self {
        Self {
            config,
            segments: Mutex::new(HashMap::new()),
        }
    }

    fn kind_tag(kind: Kind) -> u8 {
        match kind {
            Kind::Source => 0,
            Kind::Target => 1,
        }
    }

    fn mark_emit(state: &mut SegmentState, text: &str, now: Instant) {
        state.last_text = text.to_string();
        state.last_emit = now;
        state.first_pending = now;
        state.last_emitted_len = text.chars().count();
    }

    /// `update(text, segment_id, kind)`. Returns whether the caller should
    /// emit immediately (spec §4.4): growth is debounced, shrink/reset emits
    /// immediately, a strong terminator emits immediately, and a pending
    /// update older than the hold window is force-emitted. For
    /// `Kind::Target`, growth is additionally gated on the stream batcher's
    /// `min_chars` grown since the last emit, so a flush never fires on a
    /// trickle of new characters alone.
    pub fn update(&self, text: &str, segment_id: &str, kind: Kind) -> Decision {
        let key = (segment_id.to_string(), Self::kind_tag(kind));
        let now = Instant::now();
        let mut segments = self.segments.lock();

        let state = segments.entry(key).or_insert_with(|| SegmentState {
            last_text: String::new(),
            last_emit: now - Duration::from_millis(self.config.debounce_ms + 1),
            first_pending: now,
            last_emitted_len: 0,
        });

        let is_growth = text.starts_with(state.last_text.as_str()) && text.len() >= state.last_text.len();
        if !is_growth {
            Self::mark_emit(state, text, now);
            return Decision::Emit;
        }

        if text::ends_with_strong_terminator(text) {
            Self::mark_emit(state, text, now);
            return Decision::Emit;
        }

        let (interval_ms, hold_ms) = match kind {
            Kind::Source => (self.config.debounce_ms, self.config.force_commit_ms),
            Kind::Target => (self.config.stream_batcher_min_interval_ms, self.config.stream_batcher_max_wait_ms),
        };

        let since_first_pending = now.duration_since(state.first_pending).as_millis() as u64;
        if since_first_pending >= hold_ms {
            Self::mark_emit(state, text, now);
            return Decision::Emit;
        }

        let since_last_emit = now.duration_since(state.last_emit).as_millis() as u64;
        let chars_grown = text.chars().count().saturating_sub(state.last_emitted_len);
        let min_chars_met = match kind {
            Kind::Source => true,
            Kind::Target => chars_grown >= self.config.stream_batcher_min_chars,
        };

        if since_last_emit >= interval_ms && min_chars_met {
            Self::mark_emit(state, text, now);
            Decision::Emit
        } else {
            state.last_text = text.to_string();
            Decision::Hold
        }
    }

    /// Force-final: cancel any pending timer state (used by the orchestrator
    /// when a realtime translation terminates so the next update starts
    /// fresh).
    pub fn force_final(&self, segment_id: &str, kind: Kind) {
        let key = (segment_id.to_string(), Self::kind_tag(kind));
        self.segments.lock().remove(&key);
    }

    pub fn reset(&self, segment_id: &str, kind: Kind) {
        let key = (segment_id.to_string(), Self::kind_tag(kind));
        self.segments.lock().remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CoalescerConfig {
        CoalescerConfig {
            debounce_ms: 160,
            force_commit_ms: 1100,
            stream_batcher_min_interval_ms: 100,
            stream_batcher_max_wait_ms: 200,
            stream_batcher_min_chars: 2,
        }
    }

    #[test]
    fn first_update_emits() {
        let c = StreamCoalescer::new(cfg());
        assert_eq!(c.update("Hello", "seg1", Kind::Source), Decision::Emit);
    }

    #[test]
    fn rapid_growth_is_held() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hello", "seg1", Kind::Source);
        assert_eq!(c.update("Hello wo", "seg1", Kind::Source), Decision::Hold);
    }

    #[test]
    fn shrink_emits_immediately() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hello world", "seg1", Kind::Source);
        assert_eq!(c.update("Hello", "seg1", Kind::Source), Decision::Emit);
    }

    #[test]
    fn terminator_emits_immediately() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hello", "seg1", Kind::Source);
        assert_eq!(c.update("Hello world.", "seg1", Kind::Source), Decision::Emit);
    }

    #[test]
    fn target_growth_below_min_chars_is_held_even_past_min_interval() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hi", "seg1", Kind::Target);
        std::thread::sleep(Duration::from_millis(110));
        assert_eq!(c.update("Hix", "seg1", Kind::Target), Decision::Hold);
    }

    #[test]
    fn target_growth_past_min_chars_and_min_interval_emits() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hi", "seg1", Kind::Target);
        std::thread::sleep(Duration::from_millis(110));
        assert_eq!(c.update("Hi there", "seg1", Kind::Target), Decision::Emit);
    }

    #[test]
    fn target_max_wait_force_flushes_regardless_of_min_chars() {
        let c = StreamCoalescer::new(cfg());
        c.update("Hi", "seg1", Kind::Target);
        std::thread::sleep(Duration::from_millis(210));
        assert_eq!(c.update("Hix", "seg1", Kind::Target), Decision::Emit);
    }
}
