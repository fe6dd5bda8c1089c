//! Event-driven lecture captioning pipeline.
//!
//! Wires the ASR/LLM adapter ports from `univoice_core` into the full
//! coalescing -> sentence-combining -> translation -> paragraph ->
//! progressive-summary pipeline described by spec §4, the same layering
//! `voice-agent-rust`'s `pipeline` crate uses to sit between `voice_agent_core`
//! ports and `voice_agent_llm`/STT backends.

pub mod coalescer;
pub mod error;
pub mod event_bus;
pub mod history_grouper;
pub mod orchestrator;
pub mod paragraph_builder;
pub mod sentence_combiner;
pub mod state;
pub mod summarizer;
pub mod timeout_manager;
pub mod translation_queue;

pub use coalescer::{CoalescerConfig, Decision, Kind, StreamCoalescer};
pub use error::PipelineError;
pub use event_bus::EventBus;
pub use history_grouper::HistoryGrouper;
pub use orchestrator::PipelineOrchestrator;
pub use paragraph_builder::{ParagraphBuilder, ParagraphConfig};
pub use sentence_combiner::{SentenceCombiner, SentenceCombinerConfig};
pub use state::{PipelineStateManager, State, Transition};
pub use summarizer::{ProgressiveSummarizer, SummaryConfig, SummaryJobError, SummaryOutcome};
pub use timeout_manager::{TimeoutConfig, TranslationTimeoutManager};
pub use translation_queue::{
    ErrorHandler, QueueStats, SegmentStatus, TranslationHandler, TranslationQueueConfig, TranslationQueueManager,
};
