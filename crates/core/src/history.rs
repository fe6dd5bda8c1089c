//! History grouper records (spec §3, §4.10: `HistoryBlock`).

use serde::{Deserialize, Serialize};

/// Placeholder target text until the realtime translation resolves.
pub const PLACEHOLDER_TARGET: &str = "translating…";
/// Marker written when a translation times out (spec §4.8, §7).
pub const TIMEOUT_MARKER: &str = "[translation timeout]";

/// One sentence inside a `HistoryBlock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySentence {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    pub timestamp_ms: u64,
}

/// Append-only, order-preserved block shown to the UI. Mutable in one
/// direction only: `target_text` on a sentence may be replaced exactly once
/// by a higher-quality translation; `is_paragraph` may flip false -> true
/// with a `paragraph_id` attached (spec §3 invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBlock {
    pub id: String,
    pub sentences: Vec<HistorySentence>,
    pub created_at: u64,
    pub is_paragraph: bool,
    pub paragraph_id: Option<String>,
    pub total_height: Option<u32>,
}

impl HistoryBlock {
    /// True if `current` may still be upgraded by a new translation: it is
    /// empty, the placeholder, or the timeout marker (spec §4.10's one-shot
    /// upgrade rule, and the idempotence property in spec §8).
    pub fn is_upgradable(current: &str) -> bool {
        current.is_empty() || current == PLACEHOLDER_TARGET || current == TIMEOUT_MARKER
    }
}
