//! Data model for the take-selection pipeline.
//!
//! Segments are created once by the segmenter and never destroyed; group
//! membership is fixed by the grouper; scores and the best-take flag are
//! the only fields rewritten later (by the assembler, and by user
//! overrides).

use serde::Serialize;

/// Round a time value to three decimals (millisecond precision).
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Coarse loudness quality tag derived from the volume probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTag {
    /// Mean volume above −5 dB: likely clipping or over-driven.
    LoudClipping,
    /// Mean volume in the usable range.
    Good,
    /// Mean volume below −30 dB: likely too quiet.
    Quiet,
}

impl QualityTag {
    /// Human-readable label, also used in the oracle prompt.
    pub fn label(&self) -> &'static str {
        match self {
            QualityTag::LoudClipping => "loud/clipping",
            QualityTag::Good => "good",
            QualityTag::Quiet => "quiet",
        }
    }
}

/// Volume metrics measured per segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioMetrics {
    /// Mean volume in dB, absent when the probe log omitted it.
    pub mean_db: Option<f64>,
    /// Peak volume in dB, absent when the probe log omitted it.
    pub max_db: Option<f64>,
    /// Coarse quality tag (computed with a −70 dB default mean when absent).
    pub quality: QualityTag,
}

/// One timestamped piece of a transcription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptChunk {
    /// Chunk start, seconds relative to the segment.
    pub start: f64,
    /// Chunk end, seconds relative to the segment.
    pub end: f64,
    /// Chunk text.
    pub text: String,
}

/// Transcription stored on a segment.
///
/// An empty `text` is a valid result: it is what a failed or silent
/// transcription leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcription {
    /// Trimmed full text.
    pub text: String,
    /// Optional timestamped sub-chunks.
    pub chunks: Vec<TranscriptChunk>,
}

/// Per-take scores assigned by the oracle, each clamped to [0, 10].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiScores {
    pub audio_quality: f64,
    pub content: f64,
    pub emotion: f64,
    pub overall: f64,
    /// Free-form oracle comment.
    pub comment: String,
}

/// A contiguous speech interval (one take).
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    /// Stable ordinal in detection order, zero-based.
    pub index: usize,
    /// Start in source seconds, three-decimal precision.
    pub start: f64,
    /// End in source seconds, three-decimal precision.
    pub end: f64,
    /// `end - start`, three-decimal precision.
    pub duration: f64,
    /// Volume metrics, present after feature extraction.
    pub audio_metrics: Option<AudioMetrics>,
    /// Transcription, present after the transcription stage.
    pub transcription: Option<Transcription>,
    /// Oracle scores, present after scoring has been applied.
    pub ai_scores: Option<AiScores>,
    /// Whether this take is currently selected within its group.
    pub is_best: bool,
}

impl Segment {
    /// Create a segment from padded interval bounds.
    pub fn new(index: usize, start: f64, end: f64) -> Self {
        let start = round3(start);
        let end = round3(end);
        Self {
            index,
            start,
            end,
            duration: round3(end - start),
            audio_metrics: None,
            transcription: None,
            ai_scores: None,
            is_best: false,
        }
    }

    /// Transcribed text, empty when transcription is absent.
    pub fn text(&self) -> &str {
        self.transcription.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }
}

/// A cluster of takes believed to be repetitions of the same line.
///
/// Membership is stored as segment indices into the session's segment
/// list, in original index order.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    /// Stable ordinal in detection order of the earliest member.
    pub group_id: usize,
    /// Member segment indices, ascending.
    pub members: Vec<usize>,
    /// The longest transcription among members (ties → earliest index).
    pub text_summary: String,
}

/// One emitted best take, placed on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// The group this take was selected from.
    pub group_id: usize,
    /// The selected segment's index.
    pub segment_index: usize,
    /// Source start, seconds.
    pub source_start: f64,
    /// Source end, seconds.
    pub source_end: f64,
    /// Take duration, seconds.
    pub duration: f64,
    /// Position on the cut timeline, seconds.
    pub timeline_start: f64,
    /// End position on the cut timeline, seconds.
    pub timeline_end: f64,
}

/// The current edit decision.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditList {
    /// Permutation of group ids, as suggested by the oracle (or identity).
    pub suggested_order: Vec<usize>,
    /// One entry per group in `suggested_order` that has a best take.
    pub best_takes: Vec<TimelineEntry>,
    /// Sum of best-take durations, seconds.
    pub final_duration: f64,
    /// Source media duration, seconds.
    pub total_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(2.0004), 2.0);
        assert_eq!(round3(-0.0005), -0.001);
    }

    #[test]
    fn test_segment_new_rounds_times() {
        let seg = Segment::new(0, 1.23456, 2.99999);
        assert_eq!(seg.start, 1.235);
        assert_eq!(seg.end, 3.0);
        assert_eq!(seg.duration, 1.765);
        assert!(!seg.is_best);
        assert_eq!(seg.text(), "");
    }

    #[test]
    fn test_quality_tag_labels() {
        assert_eq!(QualityTag::LoudClipping.label(), "loud/clipping");
        assert_eq!(QualityTag::Good.label(), "good");
        assert_eq!(QualityTag::Quiet.label(), "quiet");
    }
}
