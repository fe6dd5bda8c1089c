use thiserror::Error;

/// Backend-level error, kept separate from `univoice_core::Error` the way
/// the teacher's `LlmError` is distinct from `voice_agent_core::Error`:
/// backends fail in backend-specific ways (HTTP, parsing) before the
/// adapter narrows that down to the handful of kinds the pipeline cares
/// about.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned an error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request timed out")]
    Timeout,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for univoice_core::Error {
    fn from(err: LlmError) -> Self {
        univoice_core::Error::TranslationProvider(err.to_string())
    }
}
