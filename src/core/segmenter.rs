//! Silence-log parsing and speech-segment derivation.
//!
//! The engine's silence-detect run is the only source of truth for segment
//! boundaries, and its textual log is the only I/O contract that can drift
//! silently. All parsing rules live here, behind explicit regexes, so the
//! contract is covered by tests against captured log shapes.

use crate::config::DetectionConfig;
use crate::core::model::{Segment, round3};
use crate::{Result, error::CutterError};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2})\.(\d+)").unwrap());
static SILENCE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_start:\s*(-?\d+(?:\.\d+)?)").unwrap());
static SILENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_end:\s*(-?\d+(?:\.\d+)?)").unwrap());

/// A silence interval reconstructed from the engine log.
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceSpan {
    /// Silence start, source seconds.
    pub start: f64,
    /// Silence end, source seconds; the media end for an unmatched start.
    pub end: f64,
    /// Whether an explicit `silence_end` event was observed.
    pub matched: bool,
}

/// Parse the total media duration from the first `Duration:` line.
pub fn parse_total_duration(log: &str) -> Option<f64> {
    let caps = DURATION_RE.captures(log)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let fraction: f64 = format!("0.{}", &caps[4]).parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds + fraction)
}

/// Collect silence spans from the log in textual order.
///
/// The i-th `silence_start` pairs with the i-th `silence_end`; a start
/// with no matching end is reported as running to `total_duration`.
pub fn parse_silence_spans(log: &str, total_duration: f64) -> Vec<SilenceSpan> {
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for line in log.lines() {
        if let Some(caps) = SILENCE_START_RE.captures(line) {
            if let Ok(v) = caps[1].parse::<f64>() {
                starts.push(v);
            }
        }
        if let Some(caps) = SILENCE_END_RE.captures(line) {
            // "silence_end: t | silence_duration: d" — the value sits
            // before the pipe, which the regex already isolates.
            if let Ok(v) = caps[1].parse::<f64>() {
                ends.push(v);
            }
        }
    }

    starts
        .into_iter()
        .enumerate()
        .map(|(i, start)| match ends.get(i) {
            Some(&end) => SilenceSpan {
                start,
                end,
                matched: true,
            },
            None => SilenceSpan {
                start,
                end: total_duration,
                matched: false,
            },
        })
        .collect()
}

/// Derive padded speech segments from a silence-detect log.
///
/// Speech intervals are the gaps between silences, padded symmetrically by
/// `padding_s` and filtered by `min_speech_s`. Adjacent padded segments may
/// overlap by up to twice the padding; they are deliberately not merged.
///
/// An unmatched trailing silence does not advance the speech resume point
/// past its own start, so the tail after it is still emitted.
pub fn derive_segments(log: &str, config: &DetectionConfig) -> Result<Vec<Segment>> {
    let total_duration = parse_total_duration(log).ok_or_else(|| {
        CutterError::engine_exec("silence log carries no Duration line".to_string())
    })?;
    let spans = parse_silence_spans(log, total_duration);
    debug!(
        "silence log: duration={:.3}s, {} silence span(s)",
        total_duration,
        spans.len()
    );

    let padding = config.padding_s;
    let min_speech = config.min_speech_s;
    let mut segments: Vec<Segment> = Vec::new();
    let mut prev_end: f64 = 0.0;

    let push_candidate = |segments: &mut Vec<Segment>, start: f64, end: f64| {
        let start = start.max(0.0);
        let end = end.min(total_duration);
        if end - start >= min_speech {
            let index = segments.len();
            trace!("speech candidate #{index}: [{start:.3}, {end:.3}]");
            segments.push(Segment::new(index, start, end));
        } else {
            trace!("discarded short candidate [{start:.3}, {end:.3}]");
        }
    };

    for span in &spans {
        push_candidate(&mut segments, prev_end - padding, span.start + padding);
        prev_end = if span.matched { span.end } else { span.start };
    }
    if prev_end < total_duration {
        push_candidate(&mut segments, prev_end - padding, total_duration);
    }

    if segments.is_empty() {
        return Err(CutterError::NoSpeechDetected);
    }
    debug!("derived {} speech segment(s)", segments.len());
    Ok(segments)
}

/// Total media duration, rounded to three decimals, for session metadata.
pub fn total_duration_rounded(log: &str) -> Option<f64> {
    parse_total_duration(log).map(round3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log(body: &str) -> String {
        format!(
            "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':\n  Duration: 00:00:10.00, start: 0.000000, bitrate: 317 kb/s\n{}",
            body
        )
    }

    #[test]
    fn test_parse_total_duration() {
        let log = sample_log("");
        assert_eq!(parse_total_duration(&log), Some(10.0));
    }

    #[test]
    fn test_parse_total_duration_hours_minutes() {
        let log = "  Duration: 01:02:03.50, start: 0.0";
        let total = parse_total_duration(log).unwrap();
        assert!((total - 3723.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_total_duration_missing() {
        assert_eq!(parse_total_duration("no duration here"), None);
    }

    #[test]
    fn test_parse_silence_spans_pairing() {
        let log = "\
[silencedetect @ 0x1] silence_start: 2.0
[silencedetect @ 0x1] silence_end: 3.0 | silence_duration: 1.0
[silencedetect @ 0x1] silence_start: 6.0
[silencedetect @ 0x1] silence_end: 7.0 | silence_duration: 1.0
";
        let spans = parse_silence_spans(log, 10.0);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], SilenceSpan { start: 2.0, end: 3.0, matched: true });
        assert_eq!(spans[1], SilenceSpan { start: 6.0, end: 7.0, matched: true });
    }

    #[test]
    fn test_parse_silence_spans_unmatched_start() {
        let log = "\
silence_start: 2.0
silence_end: 3.0 | silence_duration: 1.0
silence_start: 6.0
";
        let spans = parse_silence_spans(log, 10.0);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].matched);
        assert_eq!(spans[1], SilenceSpan { start: 6.0, end: 10.0, matched: false });
    }

    // Scenario: 10s source, silences [2,3] and [6,7], defaults.
    #[test]
    fn test_simple_segmentation() {
        let log = sample_log(
            "[silencedetect @ 0x1] silence_start: 2.0\n\
             [silencedetect @ 0x1] silence_end: 3.0 | silence_duration: 1.0\n\
             [silencedetect @ 0x1] silence_start: 6.0\n\
             [silencedetect @ 0x1] silence_end: 7.0 | silence_duration: 1.0\n",
        );
        let segments = derive_segments(&log, &DetectionConfig::default()).unwrap();
        let bounds: Vec<(f64, f64)> = segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0.0, 2.05), (2.95, 6.05), (6.95, 10.0)]);
        assert_eq!(
            segments.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    // Scenario: same source but the second silence never ends.
    #[test]
    fn test_unmatched_start_preserves_tail() {
        let log = sample_log(
            "[silencedetect @ 0x1] silence_start: 2.0\n\
             [silencedetect @ 0x1] silence_end: 3.0 | silence_duration: 1.0\n\
             [silencedetect @ 0x1] silence_start: 6.0\n",
        );
        let segments = derive_segments(&log, &DetectionConfig::default()).unwrap();
        let bounds: Vec<(f64, f64)> = segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0.0, 2.05), (2.95, 6.05), (5.95, 10.0)]);
    }

    #[test]
    fn test_min_speech_filters_short_gaps() {
        // Gap between the silences is 0.2s + 0.1s padding = 0.3s is kept,
        // but with min_speech raised it is dropped.
        let log = sample_log(
            "silence_start: 2.0\n\
             silence_end: 3.0 | silence_duration: 1.0\n\
             silence_start: 3.2\n\
             silence_end: 7.0 | silence_duration: 3.8\n",
        );
        let mut config = DetectionConfig::default();
        config.min_speech_s = 0.5;
        let segments = derive_segments(&log, &config).unwrap();
        let bounds: Vec<(f64, f64)> = segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0.0, 2.05), (6.95, 10.0)]);
    }

    #[test]
    fn test_no_silence_yields_single_segment() {
        let log = sample_log("");
        let segments = derive_segments(&log, &DetectionConfig::default()).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 10.0));
    }

    #[test]
    fn test_fully_silent_source_is_no_speech() {
        let log = sample_log(
            "silence_start: 0.0\n\
             silence_end: 10.0 | silence_duration: 10.0\n",
        );
        let mut config = DetectionConfig::default();
        config.padding_s = 0.0;
        let err = derive_segments(&log, &config).unwrap_err();
        assert!(matches!(err, CutterError::NoSpeechDetected));
    }

    #[test]
    fn test_missing_duration_is_engine_error() {
        let err = derive_segments("silence_start: 1.0", &DetectionConfig::default()).unwrap_err();
        assert!(matches!(err, CutterError::Engine { .. }));
    }

    #[test]
    fn test_segments_ordered_and_padded_only() {
        let log = sample_log(
            "silence_start: 1.0\n\
             silence_end: 2.0 | silence_duration: 1.0\n\
             silence_start: 4.0\n\
             silence_end: 5.5 | silence_duration: 1.5\n\
             silence_start: 8.0\n\
             silence_end: 9.0 | silence_duration: 1.0\n",
        );
        let config = DetectionConfig::default();
        let segments = derive_segments(&log, &config).unwrap();
        let total: f64 = segments.iter().map(|s| s.duration).sum();
        let tolerance = segments.len() as f64 * 2.0 * config.padding_s;
        assert!(total <= 10.0 + tolerance);
        for pair in segments.windows(2) {
            assert!(pair[0].start < pair[1].start);
            // Padded boundaries may touch or overlap by <= 2*padding.
            assert!(pair[1].start >= pair[0].end - 2.0 * config.padding_s);
        }
    }
}
