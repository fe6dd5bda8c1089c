//! LLM backend and adapter implementations for the UniVoice pipeline.
//!
//! `backend` speaks a provider's wire format; `adapter` narrows that to
//! `univoice_core::LlmAdapter`. Concrete deployments plug in their own
//! [`backend::LlmBackend`] (SSE, gRPC, local runtime) behind the same
//! adapter.

pub mod adapter;
pub mod backend;
pub mod error;

pub use adapter::LlmAdapterImpl;
pub use backend::{BackendConfig, ChatMessage, FinishReason, GenerationResult, HttpChatBackend, LlmBackend};
pub use error::LlmError;
