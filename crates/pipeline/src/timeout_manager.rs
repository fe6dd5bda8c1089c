//! Per-request dynamic timeout with timeout-marking (C8, spec §4.8).
//!
//! Grounded on the teacher's periodic-tick/timer style (`turn_detection::hybrid`
//! silence-timer bookkeeping): each `start_timeout` spawns a cancellable
//! `tokio::time::sleep` task; `clear_timeout` drops its `AbortHandle`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub default_ms: u64,
    pub max_ms: u64,
}

impl From<&univoice_config::TranslationTimeoutConfig> for TimeoutConfig {
    fn from(cfg: &univoice_config::TranslationTimeoutConfig) -> Self {
        Self {
            default_ms: cfg.default_ms,
            max_ms: cfg.max_ms,
        }
    }
}

impl TimeoutConfig {
    /// `base + 1000ms per 50 chars`, capped at `max_ms` (spec §4.8).
    pub fn dynamic_timeout_ms(&self, source_text: &str) -> u64 {
        let extra = (source_text.chars().count() as u64 / 50) * 1000;
        (self.default_ms + extra).min(self.max_ms)
    }
}

pub struct TranslationTimeoutManager {
    config: TimeoutConfig,
    timers: Mutex<HashMap<String, AbortHandle>>,
}

impl TranslationTimeoutManager {
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// `start_timeout(segment_id, source_text, on_timeout)`: computes the
    /// dynamic timeout and schedules `on_timeout(segment_id)` to fire on
    /// expiry, unless cleared first.
    pub fn start_timeout<F>(self: &Arc<Self>, segment_id: String, source_text: &str, on_timeout: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let timeout_ms = self.config.dynamic_timeout_ms(source_text);
        let this = self.clone();
        let id_for_task = segment_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            this.timers.lock().remove(&id_for_task);
            on_timeout(id_for_task);
        });
        let mut timers = self.timers.lock();
        if let Some(old) = timers.insert(segment_id, handle.abort_handle()) {
            old.abort();
        }
    }

    pub fn clear_timeout(&self, segment_id: &str) {
        if let Some(handle) = self.timers.lock().remove(segment_id) {
            handle.abort();
        }
    }

    pub fn clear_all(&self) {
        let mut timers = self.timers.lock();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn dynamic_timeout_adds_per_50_chars_and_caps() {
        let cfg = TimeoutConfig { default_ms: 7000, max_ms: 10_000 };
        assert_eq!(cfg.dynamic_timeout_ms(&"a".repeat(60)), 8000);
        assert_eq!(cfg.dynamic_timeout_ms(&"a".repeat(600)), 10_000);
    }

    #[tokio::test]
    async fn fires_on_timeout_when_not_cleared() {
        let mgr = Arc::new(TranslationTimeoutManager::new(TimeoutConfig { default_ms: 10, max_ms: 10 }));
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        mgr.start_timeout("s1".into(), "hi", move |_id| {
            fired2.store(true, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn clear_timeout_prevents_fire() {
        let mgr = Arc::new(TranslationTimeoutManager::new(TimeoutConfig { default_ms: 20, max_ms: 20 }));
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = fired.clone();
        mgr.start_timeout("s1".into(), "hi", move |_id| {
            fired2.store(true, Ordering::SeqCst);
        });
        mgr.clear_timeout("s1");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
