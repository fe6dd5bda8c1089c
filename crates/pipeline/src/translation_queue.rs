//! Bounded-concurrency priority queue with retries (C6, spec §4.6).
//!
//! No direct teacher precedent for a priority queue exists in the pack, so
//! this is built from spec first principles in the idiom the teacher uses
//! elsewhere for shared worker state: a `parking_lot::Mutex`-guarded `VecDeque`
//! plus a `tokio::sync::Semaphore` bounding concurrency, mirroring how
//! `TranslationQueueManager` would sit alongside `VoicePipeline`'s other
//! `Mutex`-guarded collaborators.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use univoice_core::{Error, Priority, Result, TranslationRequest, TranslationResult};

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct TranslationQueueConfig {
    pub max_queue_size: usize,
    pub max_concurrency: usize,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
}

impl From<&univoice_config::TranslationConfig> for TranslationQueueConfig {
    fn from(cfg: &univoice_config::TranslationConfig) -> Self {
        Self {
            max_queue_size: cfg.max_queue_size,
            max_concurrency: cfg.max_concurrency,
            request_timeout_ms: cfg.request_timeout_ms,
            max_retries: cfg.max_retries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Active,
    Queued,
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub active: usize,
    pub queued: usize,
    pub completed: u64,
    pub errors: u64,
    pub avg_processing_ms: f64,
}

/// Registered handler invoked with per-request timeout by `process_next`.
#[async_trait]
pub trait TranslationHandler: Send + Sync {
    async fn handle(&self, request: &TranslationRequest) -> Result<TranslationResult>;
}

/// Invoked when a request exhausts its retries.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle_error(&self, request: &TranslationRequest, error: &Error);
}

struct Inner {
    queue: VecDeque<TranslationRequest>,
    active_ids: HashSet<String>,
    queued_ids: HashSet<String>,
    completed: u64,
    errors: u64,
    total_processing_ms: u64,
}

pub struct TranslationQueueManager {
    config: TranslationQueueConfig,
    inner: Mutex<Inner>,
    semaphore: Arc<Semaphore>,
}

impl TranslationQueueManager {
    pub fn new(config: TranslationQueueConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                active_ids: HashSet::new(),
                queued_ids: HashSet::new(),
                completed: 0,
                errors: 0,
                total_processing_ms: 0,
            }),
            config,
            semaphore,
        }
    }

    /// Idempotent on `segment_id`; inserts per priority ordering (spec §4.6).
    pub fn enqueue(&self, request: TranslationRequest) -> std::result::Result<(), PipelineError> {
        let mut inner = self.inner.lock();
        if inner.active_ids.contains(&request.segment_id) || inner.queued_ids.contains(&request.segment_id) {
            tracing::warn!(segment_id = %request.segment_id, "duplicate enqueue ignored");
            return Ok(());
        }
        if inner.queue.len() >= self.config.max_queue_size {
            return Err(PipelineError::QueueFull(self.config.max_queue_size));
        }

        let insert_at = match request.priority {
            Priority::High => inner.queue.iter().take_while(|r| r.priority == Priority::High).count(),
            Priority::Normal => inner
                .queue
                .iter()
                .take_while(|r| r.priority == Priority::High || r.priority == Priority::Normal)
                .count(),
            Priority::Low => inner.queue.len(),
        };
        inner.queued_ids.insert(request.segment_id.clone());
        inner.queue.insert(insert_at, request);
        Ok(())
    }

    /// Re-insert at the head with incremented `attempts` (retry path).
    fn requeue_at_head(&self, mut request: TranslationRequest) {
        request.attempts += 1;
        let mut inner = self.inner.lock();
        inner.queued_ids.insert(request.segment_id.clone());
        inner.queue.push_front(request);
    }

    async fn retry_or_drop(&self, request: TranslationRequest, error: Error, error_handler: &Arc<dyn ErrorHandler>) {
        if request.attempts < self.config.max_retries {
            self.requeue_at_head(request);
        } else {
            self.inner.lock().errors += 1;
            error_handler.handle_error(&request, &error).await;
        }
    }

    fn pop_next(&self) -> Option<TranslationRequest> {
        let mut inner = self.inner.lock();
        let request = inner.queue.pop_front()?;
        inner.queued_ids.remove(&request.segment_id);
        inner.active_ids.insert(request.segment_id.clone());
        Some(request)
    }

    pub fn get_segment_status(&self, segment_id: &str) -> SegmentStatus {
        let inner = self.inner.lock();
        if inner.active_ids.contains(segment_id) {
            SegmentStatus::Active
        } else if inner.queued_ids.contains(segment_id) {
            SegmentStatus::Queued
        } else {
            SegmentStatus::NotFound
        }
    }

    pub fn get_status(&self) -> QueueStats {
        let inner = self.inner.lock();
        let avg = if inner.completed > 0 {
            inner.total_processing_ms as f64 / inner.completed as f64
        } else {
            0.0
        };
        QueueStats {
            active: inner.active_ids.len(),
            queued: inner.queue.len(),
            completed: inner.completed,
            errors: inner.errors,
            avg_processing_ms: avg,
        }
    }

    /// Drops queued items; active handlers are left to finish.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.queued_ids.clear();
    }

    /// Pulls one request (if any and a concurrency slot is free) and invokes
    /// `handler` with the per-request timeout. On failure, retries up to
    /// `max_retries` by requeueing at the head; after retries are exhausted,
    /// `error_handler` is invoked and the item is dropped. Schedules the next
    /// item asynchronously after every terminal outcome (self-recursing via
    /// `tokio::spawn`).
    pub fn process_next(
        self: &Arc<Self>,
        handler: Arc<dyn TranslationHandler>,
        error_handler: Arc<dyn ErrorHandler>,
    ) {
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            return;
        };
        let Some(request) = self.pop_next() else {
            drop(permit);
            return;
        };

        let this = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let started = Instant::now();
            let timeout = Duration::from_millis(this.config.request_timeout_ms);
            let outcome = tokio::time::timeout(timeout, handler.handle(&request)).await;

            let segment_id = request.segment_id.clone();
            match outcome {
                Ok(Ok(result)) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let mut inner = this.inner.lock();
                    inner.active_ids.remove(&segment_id);
                    inner.completed += 1;
                    inner.total_processing_ms += elapsed_ms;
                    drop(inner);
                    tracing::debug!(segment_id, elapsed_ms, "translation completed");
                    let _ = result;
                }
                Ok(Err(e)) => {
                    this.inner.lock().active_ids.remove(&segment_id);
                    this.retry_or_drop(request, e, &error_handler).await;
                }
                Err(_) => {
                    this.inner.lock().active_ids.remove(&segment_id);
                    let timeout_err = Error::TranslationTimeout(segment_id.clone());
                    this.retry_or_drop(request, timeout_err, &error_handler).await;
                }
            }

            this.process_next(handler, error_handler);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use univoice_core::RequestKind;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranslationHandler for CountingHandler {
        async fn handle(&self, request: &TranslationRequest) -> Result<TranslationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TranslationResult {
                segment_id: request.segment_id.clone(),
                source_text: request.source_text.clone(),
                target_text: "translated".into(),
                first_paint_ms: None,
                complete_ms: Some(0),
                is_final: true,
            })
        }
    }

    struct NoopErrorHandler;
    #[async_trait]
    impl ErrorHandler for NoopErrorHandler {
        async fn handle_error(&self, _request: &TranslationRequest, _error: &Error) {}
    }

    fn req(id: &str, priority: Priority) -> TranslationRequest {
        TranslationRequest::new(id, "hello", "en", "ja", 0, priority, RequestKind::Realtime)
    }

    #[test]
    fn duplicate_enqueue_is_noop() {
        let mgr = TranslationQueueManager::new(TranslationQueueConfig {
            max_queue_size: 10,
            max_concurrency: 1,
            request_timeout_ms: 1000,
            max_retries: 1,
        });
        mgr.enqueue(req("s1", Priority::Normal)).unwrap();
        mgr.enqueue(req("s1", Priority::Normal)).unwrap();
        assert_eq!(mgr.get_status().queued, 1);
    }

    #[test]
    fn priority_ordering_high_before_normal_before_low() {
        let mgr = TranslationQueueManager::new(TranslationQueueConfig {
            max_queue_size: 10,
            max_concurrency: 1,
            request_timeout_ms: 1000,
            max_retries: 1,
        });
        mgr.enqueue(req("low", Priority::Low)).unwrap();
        mgr.enqueue(req("normal", Priority::Normal)).unwrap();
        mgr.enqueue(req("high", Priority::High)).unwrap();
        let first = mgr.pop_next().unwrap();
        assert_eq!(first.segment_id, "high");
        let second = mgr.pop_next().unwrap();
        assert_eq!(second.segment_id, "normal");
        let third = mgr.pop_next().unwrap();
        assert_eq!(third.segment_id, "low");
    }

    #[test]
    fn queue_full_rejects_overflow() {
        let mgr = TranslationQueueManager::new(TranslationQueueConfig {
            max_queue_size: 1,
            max_concurrency: 1,
            request_timeout_ms: 1000,
            max_retries: 1,
        });
        mgr.enqueue(req("s1", Priority::Normal)).unwrap();
        let err = mgr.enqueue(req("s2", Priority::Normal)).unwrap_err();
        assert!(matches!(err, PipelineError::QueueFull(1)));
    }

    #[tokio::test]
    async fn concurrency_bounded_and_all_requests_complete() {
        let mgr = Arc::new(TranslationQueueManager::new(TranslationQueueConfig {
            max_queue_size: 10,
            max_concurrency: 3,
            request_timeout_ms: 1000,
            max_retries: 1,
        }));
        let calls = Arc::new(AtomicUsize::new(0));
        for i in 0..5 {
            mgr.enqueue(req(&format!("s{i}"), Priority::Normal)).unwrap();
        }
        for _ in 0..5 {
            let handler = Arc::new(CountingHandler { calls: calls.clone() });
            mgr.process_next(handler, Arc::new(NoopErrorHandler));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(mgr.get_status().completed, 5);
    }
}
