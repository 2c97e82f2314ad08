//! Volume-probe log parsing and the loudness quality heuristic.

use crate::core::model::{AudioMetrics, QualityTag};
use once_cell::sync::Lazy;
use regex::Regex;

static MEAN_VOLUME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"mean_volume:\s*(-?\d+(?:\.\d+)?)\s*dB").unwrap());
static MAX_VOLUME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"max_volume:\s*(-?\d+(?:\.\d+)?)\s*dB").unwrap());

/// Mean level used for the tag decision when the probe omitted it.
const FALLBACK_MEAN_DB: f64 = -70.0;

/// Mean above this is tagged loud/clipping.
const LOUD_MEAN_DB: f64 = -5.0;
/// Mean below this is tagged quiet.
const QUIET_MEAN_DB: f64 = -30.0;

/// Classify a mean volume level.
pub fn quality_for(mean_db: Option<f64>) -> QualityTag {
    let mean = mean_db.unwrap_or(FALLBACK_MEAN_DB);
    if mean > LOUD_MEAN_DB {
        QualityTag::LoudClipping
    } else if mean < QUIET_MEAN_DB {
        QualityTag::Quiet
    } else {
        QualityTag::Good
    }
}

/// Parse a volume-detect log into per-segment metrics.
///
/// Fields the log is silent about stay absent; only the tag decision
/// substitutes a floor value for a missing mean.
pub fn metrics_from_log(log: &str) -> AudioMetrics {
    let mean_db = MEAN_VOLUME_RE
        .captures(log)
        .and_then(|c| c[1].parse::<f64>().ok());
    let max_db = MAX_VOLUME_RE
        .captures(log)
        .and_then(|c| c[1].parse::<f64>().ok());
    AudioMetrics {
        mean_db,
        max_db,
        quality: quality_for(mean_db),
    }
}
