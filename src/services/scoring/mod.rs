//! Scoring-oracle integration.
//!
//! The oracle ranks the takes inside each group and proposes a group
//! order. This module defines the provider trait, the structured request
//! digest sent into prompt building, and the validated reply types the
//! assembler consumes.

use crate::core::model::Segment;
use crate::core::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Oracle provider trait.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Evaluate all groups and takes, returning per-take scores, a best
    /// take per group, and a suggested group order.
    async fn evaluate(&self, request: &EvaluationRequest) -> crate::Result<EvaluationResponse>;
}

/// One take as described to the oracle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TakeDigest {
    /// Global segment index.
    pub segment_index: usize,
    /// Take duration, seconds.
    pub duration: f64,
    /// Mean volume in dB, when the probe reported one.
    pub mean_db: Option<f64>,
    /// Coarse loudness tag label.
    pub quality: String,
    /// Transcribed text (possibly empty).
    pub text: String,
}

/// One group as described to the oracle.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupDigest {
    /// Group ordinal.
    pub group_id: usize,
    /// Longest member transcription.
    pub text_summary: String,
    /// Member takes in original order.
    pub takes: Vec<TakeDigest>,
}

/// The structured payload prompt building works from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationRequest {
    /// All groups, in id order.
    pub groups: Vec<GroupDigest>,
}

impl EvaluationRequest {
    /// Digest a session's groups and segments for the oracle.
    pub fn from_session(session: &Session) -> Self {
        let digest_take = |segment: &Segment| TakeDigest {
            segment_index: segment.index,
            duration: segment.duration,
            mean_db: segment.audio_metrics.as_ref().and_then(|m| m.mean_db),
            quality: segment
                .audio_metrics
                .as_ref()
                .map(|m| m.quality.label().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            text: segment.text().to_string(),
        };
        let groups = session
            .groups
            .iter()
            .map(|group| GroupDigest {
                group_id: group.group_id,
                text_summary: group.text_summary.clone(),
                takes: group
                    .members
                    .iter()
                    .map(|&m| digest_take(&session.segments[m]))
                    .collect(),
            })
            .collect();
        Self { groups }
    }
}

/// Scores for one take, as returned by the oracle.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TakeScore {
    /// Global segment index the scores belong to.
    pub segment_index: usize,
    pub audio_quality: f64,
    pub content: f64,
    pub emotion: f64,
    pub overall: f64,
    /// Free-form comment; absent means empty.
    #[serde(default)]
    pub comment: String,
}

/// The oracle's verdict on one group.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GroupEvaluation {
    /// Group the verdict applies to.
    pub group_id: usize,
    /// Per-take scores.
    pub takes: Vec<TakeScore>,
    /// Index into the group's takes list (out-of-range values fall back
    /// to a global segment index).
    pub best_take_index: usize,
    /// Why this take won.
    #[serde(default)]
    pub reason: String,
}

/// The full oracle reply.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EvaluationResponse {
    /// One verdict per group.
    pub evaluations: Vec<GroupEvaluation>,
    /// Suggested group order; empty means identity.
    #[serde(default)]
    pub suggested_order: Vec<usize>,
    /// Session-level notes for the report.
    #[serde(default)]
    pub overall_notes: String,
}

/// OpenAI-compatible chat client implementation
pub mod openai;

/// Oracle prompt templates and reply parsing
pub mod prompts;

pub use openai::OpenAiOracle;
pub use prompts::{build_evaluation_prompt, extract_json_payload, parse_evaluation};
