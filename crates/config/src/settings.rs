//! Settings tree mirroring spec §6's "Configuration (enumerated options)".

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPrimary {
    #[default]
    Sentence,
    Paragraph,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "defaults::max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "defaults::max_queue_size")]
    pub max_queue_size: usize,
    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::max_concurrency(),
            max_queue_size: defaults::max_queue_size(),
            request_timeout_ms: defaults::request_timeout_ms(),
            max_retries: defaults::max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationTimeoutConfig {
    #[serde(default = "defaults::timeout_default_ms")]
    pub default_ms: u64,
    #[serde(default = "defaults::timeout_max_ms")]
    pub max_ms: u64,
    #[serde(default = "defaults::timeout_dynamic")]
    pub dynamic: bool,
}

impl Default for TranslationTimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: defaults::timeout_default_ms(),
            max_ms: defaults::timeout_max_ms(),
            dynamic: defaults::timeout_dynamic(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceCombinerConfig {
    #[serde(default = "defaults::max_segments")]
    pub max_segments: usize,
    #[serde(default = "defaults::combiner_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "defaults::min_segments")]
    pub min_segments: usize,
}

impl Default for SentenceCombinerConfig {
    fn default() -> Self {
        Self {
            max_segments: defaults::max_segments(),
            timeout_ms: defaults::combiner_timeout_ms(),
            min_segments: defaults::min_segments(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParagraphConfig {
    #[serde(default = "defaults::paragraph_min_ms")]
    pub min_ms: u64,
    #[serde(default = "defaults::paragraph_target_min_ms")]
    pub target_min_ms: u64,
    #[serde(default = "defaults::paragraph_target_max_ms")]
    pub target_max_ms: u64,
    #[serde(default = "defaults::paragraph_hard_cap_ms")]
    pub hard_cap_ms: u64,
    #[serde(default = "defaults::paragraph_silence_gap_ms")]
    pub silence_gap_ms: u64,
}

impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            min_ms: defaults::paragraph_min_ms(),
            target_min_ms: defaults::paragraph_target_min_ms(),
            target_max_ms: defaults::paragraph_target_max_ms(),
            hard_cap_ms: defaults::paragraph_hard_cap_ms(),
            silence_gap_ms: defaults::paragraph_silence_gap_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "defaults::summary_thresholds")]
    pub thresholds: Vec<usize>,
    #[serde(default = "defaults::char_language_multiplier")]
    pub char_language_multiplier: usize,
    #[serde(default = "defaults::summary_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "defaults::final_report_max_output_tokens")]
    pub final_report_max_output_tokens: u32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            thresholds: defaults::summary_thresholds(),
            char_language_multiplier: defaults::char_language_multiplier(),
            max_output_tokens: defaults::summary_max_output_tokens(),
            final_report_max_output_tokens: defaults::final_report_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalescerConfig {
    #[serde(default = "defaults::coalescer_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "defaults::coalescer_force_commit_ms")]
    pub force_commit_ms: u64,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::coalescer_debounce_ms(),
            force_commit_ms: defaults::coalescer_force_commit_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamBatcherConfig {
    #[serde(default = "defaults::batcher_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "defaults::batcher_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "defaults::batcher_min_chars")]
    pub min_chars: usize,
}

impl Default for StreamBatcherConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: defaults::batcher_min_interval_ms(),
            max_wait_ms: defaults::batcher_max_wait_ms(),
            min_chars: defaults::batcher_min_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub primary: HistoryPrimary,
}

/// Top-level settings object the orchestrator is constructed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "defaults::source_language")]
    pub source_language: String,
    #[serde(default = "defaults::target_language")]
    pub target_language: String,

    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub translation_timeout: TranslationTimeoutConfig,
    #[serde(default)]
    pub sentence_combiner: SentenceCombinerConfig,
    #[serde(default)]
    pub paragraph: ParagraphConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub coalescer: CoalescerConfig,
    #[serde(default)]
    pub stream_batcher: StreamBatcherConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_language: defaults::source_language(),
            target_language: defaults::target_language(),
            translation: TranslationConfig::default(),
            translation_timeout: TranslationTimeoutConfig::default(),
            sentence_combiner: SentenceCombinerConfig::default(),
            paragraph: ParagraphConfig::default(),
            summary: SummaryConfig::default(),
            coalescer: CoalescerConfig::default(),
            stream_batcher: StreamBatcherConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate cross-field invariants the way `voice_agent_config::Settings::validate`
    /// checks model paths/ports before the settings are handed to the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.translation.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "translation.max_concurrency".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.translation.max_queue_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "translation.max_queue_size".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.translation_timeout.max_ms < self.translation_timeout.default_ms {
            return Err(ConfigError::InvalidValue {
                field: "translation_timeout.max_ms".into(),
                message: "must be >= translation_timeout.default_ms".into(),
            });
        }
        if self.sentence_combiner.min_segments == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sentence_combiner.min_segments".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.sentence_combiner.min_segments > self.sentence_combiner.max_segments {
            return Err(ConfigError::InvalidValue {
                field: "sentence_combiner.max_segments".into(),
                message: "must be >= sentence_combiner.min_segments".into(),
            });
        }
        if self.paragraph.target_min_ms > self.paragraph.target_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "paragraph.target_max_ms".into(),
                message: "must be >= paragraph.target_min_ms".into(),
            });
        }
        if self.paragraph.hard_cap_ms < self.paragraph.target_max_ms {
            return Err(ConfigError::InvalidValue {
                field: "paragraph.hard_cap_ms".into(),
                message: "must be >= paragraph.target_max_ms".into(),
            });
        }
        if self.summary.thresholds.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "summary.thresholds".into(),
                message: "must list at least one threshold".into(),
            });
        }
        Ok(())
    }
}

/// Load settings the way `voice_agent_config::settings::load_settings` does:
/// an optional `config/default` file, an optional environment-specific file,
/// then `UNIVOICE__`-prefixed environment variable overrides, validated
/// before being returned.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    use config::{Config, Environment, File};

    let mut builder = Config::builder();
    builder = builder.add_source(File::with_name("config/default").required(false));
    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix("UNIVOICE")
            .separator("__")
            .try_parsing(true),
    );

    let built = builder.build()?;
    let settings: Settings = built.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

mod defaults {
    pub fn source_language() -> String {
        "en".into()
    }
    pub fn target_language() -> String {
        "ja".into()
    }
    pub fn max_concurrency() -> usize {
        3
    }
    pub fn max_queue_size() -> usize {
        100
    }
    pub fn request_timeout_ms() -> u64 {
        30_000
    }
    pub fn max_retries() -> u32 {
        1
    }
    pub fn timeout_default_ms() -> u64 {
        7_000
    }
    pub fn timeout_max_ms() -> u64 {
        10_000
    }
    pub fn timeout_dynamic() -> bool {
        true
    }
    pub fn max_segments() -> usize {
        10
    }
    pub fn combiner_timeout_ms() -> u64 {
        2_000
    }
    pub fn min_segments() -> usize {
        1
    }
    pub fn paragraph_min_ms() -> u64 {
        10_000
    }
    pub fn paragraph_target_min_ms() -> u64 {
        20_000
    }
    pub fn paragraph_target_max_ms() -> u64 {
        60_000
    }
    pub fn paragraph_hard_cap_ms() -> u64 {
        60_000
    }
    pub fn paragraph_silence_gap_ms() -> u64 {
        2_000
    }
    pub fn summary_thresholds() -> Vec<usize> {
        vec![400, 800, 1600, 2400]
    }
    pub fn char_language_multiplier() -> usize {
        4
    }
    pub fn summary_max_output_tokens() -> u32 {
        1500
    }
    pub fn final_report_max_output_tokens() -> u32 {
        8192
    }
    pub fn coalescer_debounce_ms() -> u64 {
        160
    }
    pub fn coalescer_force_commit_ms() -> u64 {
        1_100
    }
    pub fn batcher_min_interval_ms() -> u64 {
        100
    }
    pub fn batcher_max_wait_ms() -> u64 {
        200
    }
    pub fn batcher_min_chars() -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let settings = Settings::default();
        assert_eq!(settings.translation.max_concurrency, 3);
        assert_eq!(settings.translation.request_timeout_ms, 30_000);
        assert_eq!(settings.translation_timeout.max_ms, 10_000);
        assert_eq!(settings.summary.thresholds, vec![400, 800, 1600, 2400]);
        assert_eq!(settings.summary.char_language_multiplier, 4);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_timeout_bounds() {
        let mut settings = Settings::default();
        settings.translation_timeout.max_ms = 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn deserializes_partial_toml() {
        let toml_str = r#"
            source_language = "ja"
            target_language = "en"

            [translation]
            max_concurrency = 5
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.source_language, "ja");
        assert_eq!(settings.translation.max_concurrency, 5);
        assert_eq!(settings.translation.max_queue_size, 100);
    }
}
