//! Configuration management for silence-cutter.
//!
//! # Key Components
//!
//! - [`Config`] - Main configuration structure containing all settings
//! - [`ConfigService`] - Service interface for configuration management
//! - [`ProductionConfigService`] - Production implementation with file I/O
//! - [`TestConfigService`] - Test implementation with controlled behavior
//!
//! Configuration is layered: built-in defaults, then the user TOML file at
//! `$CONFIG_DIR/silence-cutter/config.toml`, then `CUTTER_*` environment
//! overrides. The two API credentials additionally fall back to
//! `OPENAI_API_KEY`; credential values are never logged or printed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub mod service;
pub mod validation;

pub use service::{ConfigService, ProductionConfigService, TestConfigService};
pub use validation::validate_config;

/// Full application configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Silence-detection parameters.
    pub detection: DetectionConfig,
    /// Take-grouping parameters.
    pub grouping: GroupingConfig,
    /// Speech-to-text engine settings.
    pub transcription: TranscriptionConfig,
    /// Scoring-oracle settings.
    pub scoring: ScoringConfig,
    /// Export and timecode settings.
    pub export: ExportConfig,
    /// Media-engine settings.
    pub engine: EngineConfig,
    /// Optional file path from which the configuration was loaded.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

/// Silence-detection parameters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Silence threshold in dB (levels below count as silence).
    pub noise_threshold_db: i32,
    /// Minimum silence length in seconds for a cut.
    pub min_silence_s: f64,
    /// Minimum speech length in seconds for a kept segment.
    pub min_speech_s: f64,
    /// Symmetric padding in seconds around each speech interval.
    pub padding_s: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            noise_threshold_db: -35,
            min_silence_s: 0.70,
            min_speech_s: 0.30,
            padding_s: 0.05,
        }
    }
}

/// Take-grouping parameters.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupingConfig {
    /// Transcription similarity needed for two takes to share a group.
    pub similarity_threshold: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.60,
        }
    }
}

/// Whisper model size.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelSize {
    type Err = crate::error::CutterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(crate::error::CutterError::config(format!(
                "Unknown transcription model '{}', expected tiny/base/small/medium/large",
                other
            ))),
        }
    }
}

/// Speech-to-text engine settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Model size, sent verbatim to OpenAI-compatible Whisper servers.
    pub model: ModelSize,
    /// ISO-639-1 language code, or "auto" for detection.
    pub language: String,
    /// Transcription endpoint base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u32,
    /// Number of retries per segment.
    pub max_retries: u32,
    /// Retry interval in milliseconds.
    pub retry_delay_ms: u64,
    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: ModelSize::Small,
            language: "auto".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_seconds: 120,
            max_retries: 2,
            retry_delay_ms: 500,
            api_key: None,
        }
    }
}

/// Scoring-oracle settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Provider name; only "openai"-compatible chat endpoints for now.
    pub provider: String,
    /// API key; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Chat model name.
    pub model: String,
    /// Chat endpoint base URL.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the reply.
    pub max_tokens: u32,
    /// Number of retries on transport failure.
    pub retry_attempts: u32,
    /// Retry interval in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            model: "gpt-4.1-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.3,
            max_tokens: 4000,
            retry_attempts: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Export and timecode settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Timebase of all timecode outputs.
    pub fps: u32,
    /// Output directory; the source directory when unset.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: 25,
            output_dir: None,
        }
    }
}

/// Media-engine settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// ffmpeg binary to invoke.
    pub ffmpeg_path: String,
    /// Per-invocation timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            timeout_seconds: 600,
        }
    }
}

impl Config {
    /// Read a configuration value by dot-separated key path.
    ///
    /// Credential values are masked.
    pub fn get_value(&self, key: &str) -> crate::Result<String> {
        let value = match key {
            "detection.noise_threshold_db" => self.detection.noise_threshold_db.to_string(),
            "detection.min_silence_s" => self.detection.min_silence_s.to_string(),
            "detection.min_speech_s" => self.detection.min_speech_s.to_string(),
            "detection.padding_s" => self.detection.padding_s.to_string(),
            "grouping.similarity_threshold" => self.grouping.similarity_threshold.to_string(),
            "transcription.model" => self.transcription.model.to_string(),
            "transcription.language" => self.transcription.language.clone(),
            "transcription.base_url" => self.transcription.base_url.clone(),
            "transcription.timeout_seconds" => self.transcription.timeout_seconds.to_string(),
            "transcription.max_retries" => self.transcription.max_retries.to_string(),
            "transcription.retry_delay_ms" => self.transcription.retry_delay_ms.to_string(),
            "transcription.api_key" => mask_credential(self.transcription.api_key.as_deref()),
            "scoring.provider" => self.scoring.provider.clone(),
            "scoring.api_key" => mask_credential(self.scoring.api_key.as_deref()),
            "scoring.model" => self.scoring.model.clone(),
            "scoring.base_url" => self.scoring.base_url.clone(),
            "scoring.temperature" => self.scoring.temperature.to_string(),
            "scoring.max_tokens" => self.scoring.max_tokens.to_string(),
            "scoring.retry_attempts" => self.scoring.retry_attempts.to_string(),
            "scoring.retry_delay_ms" => self.scoring.retry_delay_ms.to_string(),
            "export.fps" => self.export.fps.to_string(),
            "export.output_dir" => self
                .export
                .output_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "engine.ffmpeg_path" => self.engine.ffmpeg_path.clone(),
            "engine.timeout_seconds" => self.engine.timeout_seconds.to_string(),
            _ => {
                return Err(crate::error::CutterError::config(format!(
                    "Unknown configuration key: {}",
                    key
                )));
            }
        };
        Ok(value)
    }

    /// Set a configuration value by dot-separated key path.
    ///
    /// The value is type-converted, applied, and the whole configuration
    /// re-validated.
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::Result<()> {
        match key {
            "detection.noise_threshold_db" => {
                self.detection.noise_threshold_db = parse_value(key, value)?
            }
            "detection.min_silence_s" => self.detection.min_silence_s = parse_value(key, value)?,
            "detection.min_speech_s" => self.detection.min_speech_s = parse_value(key, value)?,
            "detection.padding_s" => self.detection.padding_s = parse_value(key, value)?,
            "grouping.similarity_threshold" => {
                self.grouping.similarity_threshold = parse_value(key, value)?
            }
            "transcription.model" => self.transcription.model = value.parse()?,
            "transcription.language" => self.transcription.language = value.to_string(),
            "transcription.base_url" => self.transcription.base_url = value.to_string(),
            "transcription.timeout_seconds" => {
                self.transcription.timeout_seconds = parse_value(key, value)?
            }
            "transcription.max_retries" => {
                self.transcription.max_retries = parse_value(key, value)?
            }
            "transcription.retry_delay_ms" => {
                self.transcription.retry_delay_ms = parse_value(key, value)?
            }
            "transcription.api_key" => {
                self.transcription.api_key = non_empty(value);
            }
            "scoring.provider" => self.scoring.provider = value.to_string(),
            "scoring.api_key" => self.scoring.api_key = non_empty(value),
            "scoring.model" => self.scoring.model = value.to_string(),
            "scoring.base_url" => self.scoring.base_url = value.to_string(),
            "scoring.temperature" => self.scoring.temperature = parse_value(key, value)?,
            "scoring.max_tokens" => self.scoring.max_tokens = parse_value(key, value)?,
            "scoring.retry_attempts" => self.scoring.retry_attempts = parse_value(key, value)?,
            "scoring.retry_delay_ms" => self.scoring.retry_delay_ms = parse_value(key, value)?,
            "export.fps" => self.export.fps = parse_value(key, value)?,
            "export.output_dir" => {
                self.export.output_dir = non_empty(value).map(PathBuf::from);
            }
            "engine.ffmpeg_path" => self.engine.ffmpeg_path = value.to_string(),
            "engine.timeout_seconds" => self.engine.timeout_seconds = parse_value(key, value)?,
            _ => {
                return Err(crate::error::CutterError::config(format!(
                    "Unknown configuration key: {}",
                    key
                )));
            }
        }
        validate_config(self)
    }

    /// All readable key paths, for `config list`.
    pub fn known_keys() -> &'static [&'static str] {
        &[
            "detection.noise_threshold_db",
            "detection.min_silence_s",
            "detection.min_speech_s",
            "detection.padding_s",
            "grouping.similarity_threshold",
            "transcription.model",
            "transcription.language",
            "transcription.base_url",
            "transcription.timeout_seconds",
            "transcription.max_retries",
            "transcription.retry_delay_ms",
            "transcription.api_key",
            "scoring.provider",
            "scoring.api_key",
            "scoring.model",
            "scoring.base_url",
            "scoring.temperature",
            "scoring.max_tokens",
            "scoring.retry_attempts",
            "scoring.retry_delay_ms",
            "export.fps",
            "export.output_dir",
            "engine.ffmpeg_path",
            "engine.timeout_seconds",
        ]
    }
}

fn mask_credential(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => "********".to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        crate::error::CutterError::config(format!("Invalid value for {}: {}", key, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let config = Config::default();
        assert_eq!(config.detection.noise_threshold_db, -35);
        assert_eq!(config.detection.min_silence_s, 0.70);
        assert_eq!(config.detection.min_speech_s, 0.30);
        assert_eq!(config.detection.padding_s, 0.05);
        assert_eq!(config.grouping.similarity_threshold, 0.60);
        assert_eq!(config.transcription.model, ModelSize::Small);
        assert_eq!(config.transcription.language, "auto");
        assert_eq!(config.export.fps, 25);
        assert_eq!(config.engine.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[detection]"));
        assert!(toml_str.contains("[scoring]"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.export.fps, 25);
    }

    #[test]
    fn test_model_size_parse_and_display() {
        assert_eq!("SMALL".parse::<ModelSize>().unwrap(), ModelSize::Small);
        assert_eq!(ModelSize::Large.to_string(), "large");
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut config = Config::default();
        config.set_value("export.fps", "30").unwrap();
        assert_eq!(config.get_value("export.fps").unwrap(), "30");

        config.set_value("transcription.model", "large").unwrap();
        assert_eq!(config.get_value("transcription.model").unwrap(), "large");

        config
            .set_value("grouping.similarity_threshold", "0.8")
            .unwrap();
        assert_eq!(config.grouping.similarity_threshold, 0.8);
    }

    #[test]
    fn test_set_rejects_invalid() {
        let mut config = Config::default();
        assert!(config.set_value("export.fps", "23").is_err());
        assert!(config.set_value("export.fps", "abc").is_err());
        assert!(config.set_value("no.such.key", "1").is_err());
        assert!(
            config
                .set_value("grouping.similarity_threshold", "1.5")
                .is_err()
        );
    }

    #[test]
    fn test_credentials_masked() {
        let mut config = Config::default();
        config.set_value("scoring.api_key", "sk-secret").unwrap();
        assert_eq!(config.get_value("scoring.api_key").unwrap(), "********");
        assert_eq!(config.scoring.api_key.as_deref(), Some("sk-secret"));
    }

    #[test]
    fn test_known_keys_all_readable() {
        let config = Config::default();
        for key in Config::known_keys() {
            config.get_value(key).unwrap();
        }
    }
}
