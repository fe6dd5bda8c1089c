//! Progressive summarizer output record (spec §3, §4.11: `Summary`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    pub source_language: String,
    pub target_language: String,
    pub word_count: usize,
    /// The configured base threshold this summary was generated for (e.g. 400).
    pub threshold: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub timestamp_ms: u64,
}
