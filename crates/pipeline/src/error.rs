use thiserror::Error;

/// Pipeline-crate-local errors, narrowed into [`univoice_core::Error`] at the
/// orchestrator boundary the way the teacher's `PipelineError` narrows into
/// `voice_agent_core::Error`.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("queue is full (capacity {0})")]
    QueueFull(usize),

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    #[error("languages cannot be updated while running")]
    UpdateLanguagesWhileRunning,
}

impl From<PipelineError> for univoice_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidStateTransition { from, to } => {
                univoice_core::Error::InvalidStateTransition { from, to }
            }
            PipelineError::QueueFull(cap) => univoice_core::Error::QueueFull(cap),
            PipelineError::AlreadyRunning | PipelineError::NotRunning | PipelineError::UpdateLanguagesWhileRunning => {
                univoice_core::Error::Unknown(err.to_string())
            }
        }
    }
}
