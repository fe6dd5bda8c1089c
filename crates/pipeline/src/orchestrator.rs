//! Wires C1-C11 into the public pipeline surface (C12, spec §4.12).
//!
//! Grounded on `VoicePipeline` in the teacher's `orchestrator.rs`: a single
//! struct holding every collaborator behind `Arc`, a `PipelineStateManager`
//! gate on public commands, `tokio::spawn` for the background timer/summary
//! workers, and `broadcast`-based `subscribe` for external consumers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot, Mutex as AsyncMutex};

use univoice_config::Settings;
use univoice_core::{
    AsrAdapter, AsrConnectConfig, AsrEvent, CorrelationId, Error, LlmAdapter, PipelineEvent,
    PipelineEventKind, Priority, RequestKind, Result, TranslationRequest, TranslationResult,
};

use crate::coalescer::{CoalescerConfig, Decision, Kind, StreamCoalescer};
use crate::error::PipelineError;
use crate::event_bus::EventBus;
use crate::history_grouper::HistoryGrouper;
use crate::paragraph_builder::{ParagraphBuilder, ParagraphConfig};
use crate::sentence_combiner::{SentenceCombiner, SentenceCombinerConfig};
use crate::state::{PipelineStateManager, State};
use crate::summarizer::{ProgressiveSummarizer, SummaryConfig};
use crate::timeout_manager::{TimeoutConfig, TranslationTimeoutManager};
use crate::translation_queue::{ErrorHandler, TranslationHandler, TranslationQueueConfig, TranslationQueueManager};

const SILENCE_TICK_MS: u64 = 250;

struct Languages {
    source: String,
    target: String,
}

/// Bridges queued `TranslationRequest`s to the configured `LlmAdapter`,
/// then fans both the streaming partials and the terminal result back out
/// to the event bus, history, and the segment's pending timeout (spec
/// §4.12: every realtime/paragraph translation clears the timeout and
/// upgrades history; wiring rule (c): the target channel force-finals on
/// the terminal chunk).
struct LlmTranslationHandler {
    llm: Arc<dyn LlmAdapter>,
    events: Arc<EventBus>,
    history: Arc<HistoryGrouper>,
    timeout_manager: Arc<TranslationTimeoutManager>,
    coalescer: Arc<StreamCoalescer>,
    state: Arc<PipelineStateManager>,
}

#[async_trait]
impl TranslationHandler for LlmTranslationHandler {
    async fn handle(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        let mut stream = self
            .llm
            .translate_stream(&request.source_text, &request.source_language, &request.target_language);
        let mut last = String::new();
        while let Some(chunk) = stream.next().await {
            last = chunk?;
            let decision = self.coalescer.update(&last, &request.segment_id, Kind::Target);
            if decision == Decision::Emit {
                self.events.publish(
                    PipelineEventKind::Translation {
                        segment_id: request.segment_id.clone(),
                        source_text: request.source_text.clone(),
                        target_text: last.clone(),
                        is_final: false,
                    },
                    self.state.correlation(),
                );
            }
        }
        self.coalescer.force_final(&request.segment_id, Kind::Target);

        self.timeout_manager.clear_timeout(&request.segment_id);
        match request.kind {
            RequestKind::Paragraph => {
                self.history.update_paragraph_translation(&request.segment_id, &last);
            }
            RequestKind::Realtime | RequestKind::History => {
                self.history.update_sentence_translation(&request.segment_id, &last);
            }
        }
        self.events.publish(
            PipelineEventKind::Translation {
                segment_id: request.segment_id.clone(),
                source_text: request.source_text.clone(),
                target_text: last.clone(),
                is_final: true,
            },
            self.state.correlation(),
        );

        Ok(TranslationResult {
            segment_id: request.segment_id.clone(),
            source_text: request.source_text.clone(),
            target_text: last,
            first_paint_ms: None,
            complete_ms: None,
            is_final: true,
        })
    }
}

/// Reports exhausted-retry translation failures onto the event bus (spec §7).
struct EventBusErrorHandler {
    events: Arc<EventBus>,
    state: Arc<PipelineStateManager>,
}

#[async_trait]
impl ErrorHandler for EventBusErrorHandler {
    async fn handle_error(&self, request: &TranslationRequest, error: &Error) {
        tracing::warn!(segment_id = %request.segment_id, %error, "translation failed after retries");
        self.events.publish(
            PipelineEventKind::Error {
                code: error.code().to_string(),
                message: error.to_string(),
                recoverable: error.recoverable(),
                details: Some(request.segment_id.clone()),
            },
            self.state.correlation(),
        );
    }
}

/// Coordinates every pipeline component behind the public command surface
/// (`start`/`stop`/`pause`/`resume`/`translate_user_text`/`update_languages`).
pub struct PipelineOrchestrator {
    settings: Settings,
    llm: Arc<dyn LlmAdapter>,
    asr: Arc<AsyncMutex<Box<dyn AsrAdapter>>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,

    state: Arc<PipelineStateManager>,
    events: Arc<EventBus>,
    coalescer: Arc<StreamCoalescer>,
    sentence_combiner: Arc<SentenceCombiner>,
    paragraph_builder: Arc<ParagraphBuilder>,
    translation_queue: Arc<TranslationQueueManager>,
    timeout_manager: Arc<TranslationTimeoutManager>,
    history: Arc<HistoryGrouper>,
    summarizer: Mutex<Option<Arc<ProgressiveSummarizer>>>,

    languages: Mutex<Languages>,
}

impl PipelineOrchestrator {
    pub fn new(settings: Settings, llm: Arc<dyn LlmAdapter>, asr: Box<dyn AsrAdapter>) -> Self {
        let languages = Languages {
            source: settings.source_language.clone(),
            target: settings.target_language.clone(),
        };
        Self {
            coalescer: Arc::new(StreamCoalescer::new(CoalescerConfig::from_settings(&settings.coalescer, &settings.stream_batcher))),
            sentence_combiner: Arc::new(SentenceCombiner::new(SentenceCombinerConfig::from(&settings.sentence_combiner))),
            paragraph_builder: Arc::new(ParagraphBuilder::new(ParagraphConfig::from(&settings.paragraph))),
            translation_queue: Arc::new(TranslationQueueManager::new(TranslationQueueConfig::from(&settings.translation))),
            timeout_manager: Arc::new(TranslationTimeoutManager::new(TimeoutConfig::from(&settings.translation_timeout))),
            history: Arc::new(HistoryGrouper::new()),
            summarizer: Mutex::new(None),
            state: Arc::new(PipelineStateManager::new()),
            events: Arc::new(EventBus::new()),
            asr: Arc::new(AsyncMutex::new(asr)),
            stop_tx: Mutex::new(None),
            languages: Mutex::new(languages),
            settings,
            llm,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> State {
        self.state.get_state()
    }

    /// Connects the ASR adapter for `(source_language, target_language)` and
    /// launches the silence-timer and translation-worker background tasks
    /// (spec §4.12).
    pub async fn start(self: &Arc<Self>, source_language: &str, target_language: &str) -> std::result::Result<(), PipelineError> {
        if self.state.get_state() != State::Idle {
            return Err(PipelineError::AlreadyRunning);
        }
        let correlation = CorrelationId::new();
        self.state.set_state(State::Starting, Some(correlation.clone()), None)?;
        *self.languages.lock() = Languages {
            source: source_language.to_string(),
            target: target_language.to_string(),
        };
        *self.summarizer.lock() = Some(Arc::new(ProgressiveSummarizer::new(
            SummaryConfig::from(&self.settings.summary),
            source_language.to_string(),
            target_language.to_string(),
        )));

        let config = AsrConnectConfig {
            punctuation: true,
            smart_formatting: true,
        };
        {
            let mut asr = self.asr.lock().await;
            asr.connect(source_language, &config).await.map_err(|e| {
                tracing::error!(error = %e, "ASR connect failed");
                let _ = self.state.set_state(State::Error, Some(correlation.clone()), Some(e.to_string()));
                PipelineError::NotRunning
            })?;
        }

        self.state.set_state(State::Listening, Some(correlation.clone()), None)?;
        self.events.publish(PipelineEventKind::Status { state: "listening".into() }, Some(correlation.clone()));

        let (stop_tx, stop_rx) = oneshot::channel();
        *self.stop_tx.lock() = Some(stop_tx);
        self.spawn_asr_listener(correlation.clone(), stop_rx);
        self.spawn_silence_ticker();
        self.spawn_summary_worker();
        Ok(())
    }

    pub async fn stop(self: &Arc<Self>) -> std::result::Result<(), PipelineError> {
        if self.state.get_state() == State::Idle {
            return Err(PipelineError::NotRunning);
        }
        let correlation = self.state.correlation();
        self.state.set_state(State::Stopping, None, None)?;
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
        self.timeout_manager.clear_all();
        self.translation_queue.clear();

        if let Some(sentence) = self.sentence_combiner.flush() {
            self.on_sentence(sentence);
        }
        if let Some(paragraph) = self.paragraph_builder.flush() {
            self.on_paragraph(paragraph);
        }

        self.state.set_state(State::Idle, None, None)?;
        self.events.publish(PipelineEventKind::Status { state: "idle".into() }, correlation);
        Ok(())
    }

    pub fn pause(&self) -> std::result::Result<(), PipelineError> {
        self.sentence_combiner.pause();
        self.state.pause()?;
        self.events.publish(PipelineEventKind::Status { state: "paused".into() }, self.state.correlation());
        Ok(())
    }

    pub fn resume(&self) -> std::result::Result<(), PipelineError> {
        self.sentence_combiner.resume();
        self.state.resume()?;
        self.events.publish(PipelineEventKind::Status { state: "listening".into() }, self.state.correlation());
        Ok(())
    }

    /// Updates the active language pair; rejected while running (spec §4.12).
    pub fn update_languages(&self, source_language: &str, target_language: &str) -> std::result::Result<(), PipelineError> {
        if self.state.get_state() != State::Idle {
            return Err(PipelineError::UpdateLanguagesWhileRunning);
        }
        *self.languages.lock() = Languages {
            source: source_language.to_string(),
            target: target_language.to_string(),
        };
        Ok(())
    }

    /// One-off user-requested translation (spec §4.12), bypassing the
    /// combiner/paragraph pipeline. Enqueued at `Priority::High`.
    pub fn translate_user_text(&self, text: &str, source_language: &str, target_language: &str) {
        let segment_id = univoice_core::new_id();
        let request = TranslationRequest::new(
            segment_id,
            text,
            source_language,
            target_language,
            crate::event_bus::now_ms(),
            Priority::High,
            RequestKind::Realtime,
        );
        self.enqueue_translation(request);
    }

    fn enqueue_translation(&self, request: TranslationRequest) {
        if let Err(e) = self.translation_queue.enqueue(request) {
            tracing::warn!(error = %e, "translation enqueue rejected");
            self.events.publish(
                PipelineEventKind::Error {
                    code: "QUEUE_FULL_ERROR".to_string(),
                    message: e.to_string(),
                    recoverable: true,
                    details: None,
                },
                self.state.correlation(),
            );
            return;
        }
        let handler = Arc::new(LlmTranslationHandler {
            llm: self.llm.clone(),
            events: self.events.clone(),
            history: self.history.clone(),
            timeout_manager: self.timeout_manager.clone(),
            coalescer: self.coalescer.clone(),
            state: self.state.clone(),
        });
        let error_handler = Arc::new(EventBusErrorHandler {
            events: self.events.clone(),
            state: self.state.clone(),
        });
        self.translation_queue.process_next(handler, error_handler);
    }

    fn on_sentence(self: &Arc<Self>, sentence: univoice_core::CombinedSentence) {
        self.events.publish(
            PipelineEventKind::CombinedSentence {
                combined_id: sentence.id.clone(),
                segment_ids: sentence.segment_ids.clone(),
                source_text: sentence.source_text.clone(),
                timestamp: sentence.start_ms,
            },
            self.state.correlation(),
        );

        let (source, target) = {
            let languages = self.languages.lock();
            (languages.source.clone(), languages.target.clone())
        };
        if self.settings.history.primary == univoice_config::HistoryPrimary::Sentence {
            self.history.add_sentence(&sentence);
        }
        if let Some(summarizer) = self.summarizer.lock().as_ref() {
            summarizer.add_sentence(sentence.clone());
        }

        self.timeout_manager.start_timeout(sentence.id.clone(), &sentence.source_text, {
            let this = self.clone();
            move |segment_id| this.on_translation_timeout(segment_id)
        });

        let request = TranslationRequest::new(
            sentence.id.clone(),
            sentence.source_text.clone(),
            source,
            target,
            sentence.start_ms,
            Priority::Normal,
            RequestKind::Realtime,
        );
        self.enqueue_translation(request);

        if let Some(paragraph) = self.paragraph_builder.add_sentence(sentence) {
            self.on_paragraph(paragraph);
        }
    }

    fn on_paragraph(&self, paragraph: univoice_core::Paragraph) {
        self.events.publish(
            PipelineEventKind::ParagraphComplete {
                paragraph_id: paragraph.id.clone(),
                sentence_ids: paragraph.sentence_ids.clone(),
                raw_text: paragraph.raw_text.clone(),
                cleaned_text: paragraph.cleaned_text.clone(),
                start_ms: paragraph.start_ms,
                end_ms: paragraph.end_ms,
                duration_ms: paragraph.duration_ms,
                word_count: paragraph.word_count,
            },
            self.state.correlation(),
        );
        if self.settings.history.primary == univoice_config::HistoryPrimary::Paragraph {
            self.history.add_paragraph(&paragraph);
        }

        let (source, target) = {
            let languages = self.languages.lock();
            (languages.source.clone(), languages.target.clone())
        };
        let request = TranslationRequest::new(
            paragraph.id,
            paragraph.cleaned_text,
            source,
            target,
            paragraph.start_ms,
            Priority::Low,
            RequestKind::Paragraph,
        );
        self.enqueue_translation(request);
    }

    fn on_translation_timeout(&self, segment_id: String) {
        tracing::warn!(segment_id, "translation timed out");
        self.history.update_sentence_translation(&segment_id, univoice_core::TIMEOUT_MARKER);
        self.events.publish(
            PipelineEventKind::Translation {
                segment_id,
                source_text: String::new(),
                target_text: univoice_core::TIMEOUT_MARKER.to_string(),
                is_final: true,
            },
            self.state.correlation(),
        );
    }

    /// Runs the ASR event stream to completion on a dedicated task, holding
    /// the adapter's async mutex for the whole session so `events()`'s
    /// `&self`-borrowed stream stays valid; `stop_rx` lets `stop()` cut the
    /// `select!` short without needing `&mut` access from another task.
    fn spawn_asr_listener(self: &Arc<Self>, correlation: CorrelationId, mut stop_rx: oneshot::Receiver<()>) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut asr = this.asr.lock().await;
            {
                let mut events = asr.events();
                loop {
                    tokio::select! {
                        event = events.next() => {
                            let Some(event) = event else { break };
                            this.state.update_activity();
                            match event {
                                AsrEvent::Connected => tracing::debug!("asr connected"),
                                AsrEvent::Disconnected => {
                                    tracing::warn!("asr disconnected");
                                    this.events.publish(
                                        PipelineEventKind::Error {
                                            code: "ASR_STREAM_ERROR".to_string(),
                                            message: "ASR connection closed".to_string(),
                                            recoverable: false,
                                            details: None,
                                        },
                                        Some(correlation.clone()),
                                    );
                                    break;
                                }
                                AsrEvent::Error(err) => {
                                    this.events.publish(
                                        PipelineEventKind::Error {
                                            code: "ASR_STREAM_ERROR".to_string(),
                                            message: err.message,
                                            recoverable: err.recoverable,
                                            details: None,
                                        },
                                        Some(correlation.clone()),
                                    );
                                }
                                AsrEvent::Transcript(segment) => this.on_transcript(segment),
                            }
                        }
                        _ = &mut stop_rx => break,
                    }
                }
            }
            asr.disconnect().await;
        });
    }

    fn on_transcript(self: &Arc<Self>, segment: univoice_core::TranscriptSegment) {
        let kind = Kind::Source;
        let decision = self.coalescer.update(&segment.text, &segment.id, kind);
        if decision == Decision::Emit {
            self.events.publish(
                PipelineEventKind::Asr {
                    text: segment.text.clone(),
                    is_final: segment.is_final,
                    segment_id: segment.id.clone(),
                    confidence: segment.confidence,
                    language: segment.language.clone(),
                },
                self.state.correlation(),
            );
        }
        if segment.is_final {
            self.coalescer.reset(&segment.id, kind);
            if let Some(sentence) = self.sentence_combiner.add_segment(segment) {
                self.on_sentence(sentence);
            }
        }
    }

    fn spawn_silence_ticker(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(SILENCE_TICK_MS)).await;
                if this.state.get_state() == State::Idle {
                    break;
                }
                if let Some(sentence) = this.sentence_combiner.check_silence_timeout() {
                    this.on_sentence(sentence);
                }
                if let Some(paragraph) = this.paragraph_builder.check_silence_gap() {
                    this.on_paragraph(paragraph);
                }
            }
        });
    }

    fn spawn_summary_worker(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;
                if this.state.get_state() == State::Idle {
                    break;
                }
                let summarizer = { this.summarizer.lock().clone() };
                let Some(summarizer) = summarizer else { continue };
                match summarizer.drain_once(&*this.llm).await {
                    None => continue,
                    Some(Ok(outcome)) => {
                        let summary = outcome.summary;
                        this.events.publish(
                            PipelineEventKind::ProgressiveSummary {
                                source_text: summary.source_text,
                                target_text: summary.target_text,
                                source_language: summary.source_language,
                                target_language: summary.target_language,
                                word_count: summary.word_count,
                                threshold: summary.threshold,
                                start_ms: summary.start_ms,
                                end_ms: summary.end_ms,
                            },
                            this.state.correlation(),
                        );
                    }
                    Some(Err(crate::summarizer::SummaryJobError::Generation(message))) => {
                        this.events.publish(
                            PipelineEventKind::Error {
                                code: "PROGRESSIVE_SUMMARY_GENERATION_FAILED".to_string(),
                                message,
                                recoverable: true,
                                details: None,
                            },
                            this.state.correlation(),
                        );
                    }
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }
}
