//! Configuration management for the UniVoice pipeline.
//!
//! Loads settings from an optional TOML/YAML file plus `UNIVOICE__`-prefixed
//! environment variables, the same layering `voice-agent-config` uses.

pub mod settings;

pub use settings::{
    load_settings, CoalescerConfig, HistoryConfig, HistoryPrimary, ParagraphConfig, Settings,
    SentenceCombinerConfig, StreamBatcherConfig, SummaryConfig, TranslationConfig,
    TranslationTimeoutConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
