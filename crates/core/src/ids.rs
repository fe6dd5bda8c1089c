//! Opaque identifiers used across the pipeline.
//!
//! Per spec §3, identifiers are opaque strings; monotonicity is not required,
//! uniqueness within a session is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-scoped correlation id, stamped on every command and event.
///
/// Owned exclusively by `PipelineStateManager` (C2); every other component
/// treats it as read-only, mirroring the ownership rule in spec §3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Allocate a fresh correlation id for a new run.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A segment/sentence/paragraph/summary id. Kept as a thin alias rather than
/// a newtype per record so records can be constructed without ceremony, the
/// way `segment_id: String` fields are used throughout the teacher's
/// `TranscriptResult`/`GenerateRequest` types.
pub type Id = String;

/// Allocate a fresh opaque id, e.g. for a `CombinedSentence` or `Paragraph`.
pub fn new_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
