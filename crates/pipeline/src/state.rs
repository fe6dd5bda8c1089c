//! Finite state machine, correlation IDs, and activity timestamps (C2, spec
//! §4.2). Grounded on `VoicePipeline`'s `Mutex<PipelineState>` plus its
//! `pause`/`resume`/`state` accessors, generalized to the full adjacency map
//! and rolling-history bookkeeping the spec requires.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use univoice_core::CorrelationId;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Starting,
    Listening,
    Processing,
    Paused,
    Stopping,
    Error,
}

impl State {
    fn as_str(self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Starting => "starting",
            State::Listening => "listening",
            State::Processing => "processing",
            State::Paused => "paused",
            State::Stopping => "stopping",
            State::Error => "error",
        }
    }

    /// Fixed adjacency map (spec §4.2): `idle -> starting -> listening <-> processing
    /// -> stopping -> idle`; `paused` only from/to `listening`; `error` from any
    /// non-idle state, recoverable only to `idle`.
    fn can_transition_to(self, next: State) -> bool {
        use State::*;
        if next == Error {
            return self != Idle;
        }
        matches!(
            (self, next),
            (Idle, Starting)
                | (Starting, Listening)
                | (Listening, Processing)
                | (Processing, Listening)
                | (Listening, Stopping)
                | (Processing, Stopping)
                | (Stopping, Idle)
                | (Listening, Paused)
                | (Paused, Listening)
                | (Error, Idle)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub from: State,
    pub to: State,
    pub timestamp_ms: u64,
    pub reason: Option<String>,
}

const HISTORY_CAPACITY: usize = 32;

struct Inner {
    state: State,
    correlation: Option<CorrelationId>,
    start_time_ms: Option<u64>,
    last_activity_ms: u64,
    history: Vec<Transition>,
}

pub struct PipelineStateManager {
    inner: Mutex<Inner>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl PipelineStateManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Idle,
                correlation: None,
                start_time_ms: None,
                last_activity_ms: now_ms(),
                history: Vec::with_capacity(HISTORY_CAPACITY),
            }),
        }
    }

    pub fn get_state(&self) -> State {
        self.inner.lock().state
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        self.inner.lock().correlation.clone()
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        self.inner.lock().start_time_ms
    }

    pub fn history(&self) -> Vec<Transition> {
        self.inner.lock().history.clone()
    }

    pub fn set_state(
        &self,
        next: State,
        correlation: Option<CorrelationId>,
        reason: Option<String>,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock();
        let from = inner.state;
        if !from.can_transition_to(next) {
            return Err(PipelineError::InvalidStateTransition {
                from: from.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        let ts = now_ms();
        if next == State::Starting {
            inner.start_time_ms = Some(ts);
        }
        if let Some(c) = &correlation {
            inner.correlation = Some(c.clone());
        }
        if next == State::Idle {
            inner.correlation = None;
            inner.start_time_ms = None;
        }

        inner.state = next;
        inner.last_activity_ms = ts;
        if inner.history.len() == HISTORY_CAPACITY {
            inner.history.remove(0);
        }
        inner.history.push(Transition {
            from,
            to: next,
            timestamp_ms: ts,
            reason,
        });
        Ok(())
    }

    pub fn pause(&self) -> Result<(), PipelineError> {
        self.set_state(State::Paused, None, None)
    }

    pub fn resume(&self) -> Result<(), PipelineError> {
        self.set_state(State::Listening, None, None)
    }

    pub fn update_activity(&self) {
        self.inner.lock().last_activity_ms = now_ms();
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.inner.lock().last_activity_ms
    }
}

impl Default for PipelineStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_lifecycle_transitions() {
        let mgr = PipelineStateManager::new();
        mgr.set_state(State::Starting, Some(CorrelationId::new()), None).unwrap();
        mgr.set_state(State::Listening, None, None).unwrap();
        mgr.set_state(State::Processing, None, None).unwrap();
        mgr.set_state(State::Listening, None, None).unwrap();
        mgr.set_state(State::Stopping, None, None).unwrap();
        mgr.set_state(State::Idle, None, None).unwrap();
        assert_eq!(mgr.get_state(), State::Idle);
        assert!(mgr.correlation().is_none());
    }

    #[test]
    fn rejects_invalid_transition() {
        let mgr = PipelineStateManager::new();
        let err = mgr.set_state(State::Processing, None, None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStateTransition { .. }));
        assert_eq!(mgr.get_state(), State::Idle);
    }

    #[test]
    fn pause_resume_round_trip() {
        let mgr = PipelineStateManager::new();
        mgr.set_state(State::Starting, None, None).unwrap();
        mgr.set_state(State::Listening, None, None).unwrap();
        mgr.pause().unwrap();
        assert_eq!(mgr.get_state(), State::Paused);
        mgr.resume().unwrap();
        assert_eq!(mgr.get_state(), State::Listening);
    }

    #[test]
    fn error_reachable_from_any_non_idle_and_recovers_to_idle() {
        let mgr = PipelineStateManager::new();
        mgr.set_state(State::Starting, None, None).unwrap();
        mgr.set_state(State::Error, None, Some("asr stream failed".into())).unwrap();
        mgr.set_state(State::Idle, None, None).unwrap();
        assert_eq!(mgr.get_state(), State::Idle);
    }
}
