//! Typed, correlation-tagged pub/sub between the pipeline core and external
//! consumers (C1, spec §4.1).
//!
//! Grounded on the teacher's `VoicePipeline::event_tx`/`subscribe` pair
//! (`orchestrator.rs`): a `tokio::sync::broadcast` channel gives in-order,
//! non-blocking delivery per subscriber with no backpressure to the
//! publisher — a slow subscriber only risks lagging (and dropping old
//! events), it never stalls `publish`.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;

use univoice_core::{CorrelationId, PipelineEvent, PipelineEventKind};

const CHANNEL_CAPACITY: usize = 1024;

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn validate(kind: &PipelineEventKind) -> Result<(), String> {
    match kind {
        PipelineEventKind::Translation { segment_id, .. } if segment_id.is_empty() => {
            Err("translation event missing segment_id".to_string())
        }
        PipelineEventKind::CombinedSentence { combined_id, .. } if combined_id.is_empty() => {
            Err("combinedSentence event missing combined_id".to_string())
        }
        PipelineEventKind::ParagraphComplete { paragraph_id, .. } if paragraph_id.is_empty() => {
            Err("paragraphComplete event missing paragraph_id".to_string())
        }
        _ => Ok(()),
    }
}

pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, stamping it with the active correlation id. Invalid
    /// events are dropped and replaced with an `error{code=EVENT_VALIDATION_ERROR}`
    /// event instead (spec §4.1).
    pub fn publish(&self, kind: PipelineEventKind, correlation: Option<CorrelationId>) {
        if let Err(reason) = validate(&kind) {
            tracing::warn!(reason, "dropping invalid pipeline event");
            let error_event = PipelineEvent::new(
                now_ms(),
                correlation,
                PipelineEventKind::Error {
                    code: "EVENT_VALIDATION_ERROR".to_string(),
                    message: reason,
                    recoverable: true,
                    details: None,
                },
            );
            let _ = self.tx.send(error_event);
            return;
        }
        let _ = self.tx.send(PipelineEvent::new(now_ms(), correlation, kind));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order_to_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(PipelineEventKind::Status { state: "idle".into() }, None);
        bus.publish(PipelineEventKind::Status { state: "starting".into() }, None);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        match (first.data, second.data) {
            (PipelineEventKind::Status { state: a }, PipelineEventKind::Status { state: b }) => {
                assert_eq!(a, "idle");
                assert_eq!(b, "starting");
            }
            _ => panic!("unexpected event kinds"),
        }
    }

    #[tokio::test]
    async fn invalid_event_becomes_validation_error() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(
            PipelineEventKind::Translation {
                segment_id: String::new(),
                source_text: "x".into(),
                target_text: "y".into(),
                is_final: true,
            },
            None,
        );
        let event = rx.recv().await.unwrap();
        match event.data {
            PipelineEventKind::Error { code, .. } => assert_eq!(code, "EVENT_VALIDATION_ERROR"),
            other => panic!("expected error event, got {other:?}"),
        }
    }
}
