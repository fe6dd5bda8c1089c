pub mod asr;
pub mod llm;

pub use asr::{AsrAdapter, AsrConnectConfig, AsrError, AsrEvent, AudioFrame};
pub use llm::{Effort, LlmAdapter};
