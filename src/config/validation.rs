//! Configuration validation rules.

use crate::config::Config;
use crate::error::CutterError;
use crate::Result;

/// Timebases the exporters accept.
pub const SUPPORTED_FPS: &[u32] = &[24, 25, 30, 50, 60];

/// Validate a full configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    if !SUPPORTED_FPS.contains(&config.export.fps) {
        return Err(CutterError::config(format!(
            "export.fps must be one of {:?}, got {}",
            SUPPORTED_FPS, config.export.fps
        )));
    }

    let similarity = config.grouping.similarity_threshold;
    if !(0.0..=1.0).contains(&similarity) {
        return Err(CutterError::config(format!(
            "grouping.similarity_threshold must be within [0, 1], got {}",
            similarity
        )));
    }

    if config.detection.min_silence_s <= 0.0 {
        return Err(CutterError::config(
            "detection.min_silence_s must be positive",
        ));
    }
    if config.detection.min_speech_s <= 0.0 {
        return Err(CutterError::config(
            "detection.min_speech_s must be positive",
        ));
    }
    if config.detection.padding_s < 0.0 {
        return Err(CutterError::config(
            "detection.padding_s must not be negative",
        ));
    }
    if !(-100..=0).contains(&config.detection.noise_threshold_db) {
        return Err(CutterError::config(format!(
            "detection.noise_threshold_db must be within [-100, 0], got {}",
            config.detection.noise_threshold_db
        )));
    }

    if !(0.0..=2.0).contains(&config.scoring.temperature) {
        return Err(CutterError::config(format!(
            "scoring.temperature must be within [0, 2], got {}",
            config.scoring.temperature
        )));
    }

    let language = config.transcription.language.as_str();
    if language != "auto" && language.len() != 2 {
        return Err(CutterError::config(format!(
            "transcription.language must be 'auto' or an ISO-639-1 code, got '{}'",
            language
        )));
    }

    if config.engine.timeout_seconds == 0 {
        return Err(CutterError::config(
            "engine.timeout_seconds must be positive",
        ));
    }

    Ok(())
}
