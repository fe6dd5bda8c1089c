//! Error kinds shared across the pipeline crates.

use thiserror::Error;

/// Aggregate error type for the core pipeline.
///
/// Variants line up with spec §7's error kinds; conversions from the more
/// specific per-crate errors (`LlmError`, `ConfigError`, ...) funnel into
/// this type at component boundaries the way `PipelineError` funnels into
/// `voice_agent_core::Error` in the teacher crate.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("command validation error: {0}")]
    CommandValidation(String),

    #[error("event validation error: {0}")]
    EventValidation(String),

    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: String, to: String },

    #[error("ASR connection error: {0}")]
    AsrConnection(String),

    #[error("ASR stream error: {0}")]
    AsrStream(String),

    #[error("translation timeout for segment {0}")]
    TranslationTimeout(String),

    #[error("translation provider error: {0}")]
    TranslationProvider(String),

    #[error("translation queue is full (capacity {0})")]
    QueueFull(usize),

    #[error("summary generation failed: {0}")]
    SummaryGeneration(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Stable machine-readable code, used to populate `PipelineEvent::Error.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::CommandValidation(_) => "COMMAND_VALIDATION_ERROR",
            Error::EventValidation(_) => "EVENT_VALIDATION_ERROR",
            Error::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Error::AsrConnection(_) => "ASR_CONNECTION_ERROR",
            Error::AsrStream(_) => "ASR_STREAM_ERROR",
            Error::TranslationTimeout(_) => "TRANSLATION_TIMEOUT_ERROR",
            Error::TranslationProvider(_) => "TRANSLATION_PROVIDER_ERROR",
            Error::QueueFull(_) => "QUEUE_FULL_ERROR",
            Error::SummaryGeneration(_) => "PROGRESSIVE_SUMMARY_GENERATION_FAILED",
            Error::Persistence(_) => "PERSISTENCE_ERROR",
            Error::Unknown(_) => "UNKNOWN",
        }
    }

    /// Whether the pipeline can keep running after this error (spec §7 propagation policy).
    pub fn recoverable(&self) -> bool {
        !matches!(self, Error::AsrStream(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
