//! Edit-list assembly: score application, best-take tracking, and the
//! output timeline.
//!
//! Rebuilding is deliberately a pure function of (groups, suggested
//! order, best flags): applying the same evaluation or the same override
//! twice leaves the session bit-identical.

use crate::core::model::{AiScores, EditList, TimelineEntry, round3};
use crate::core::session::Session;
use crate::services::scoring::{EvaluationResponse, TakeScore};
use log::{debug, warn};

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 10.0)
}

fn scores_from(take: &TakeScore) -> AiScores {
    AiScores {
        audio_quality: clamp_score(take.audio_quality),
        content: clamp_score(take.content),
        emotion: clamp_score(take.emotion),
        overall: clamp_score(take.overall),
        comment: take.comment.clone(),
    }
}

impl Session {
    /// Apply an oracle evaluation: attach per-take scores, elect one best
    /// take per group, adopt the suggested group order, and rebuild the
    /// timeline.
    pub fn apply_evaluation(&mut self, response: &EvaluationResponse) {
        for evaluation in &response.evaluations {
            for take in &evaluation.takes {
                match self.segments.get_mut(take.segment_index) {
                    Some(segment) => segment.ai_scores = Some(scores_from(take)),
                    None => warn!(
                        "evaluation names unknown segment {} in group {}",
                        take.segment_index, evaluation.group_id
                    ),
                }
            }
        }

        for evaluation in &response.evaluations {
            let Some(group) = self.group(evaluation.group_id) else {
                warn!("evaluation names unknown group {}", evaluation.group_id);
                continue;
            };
            let members = group.members.clone();
            // `best_take_index` indexes the group's takes list; an
            // out-of-range value is taken verbatim as a global segment
            // index (compatibility fallback).
            let chosen = members
                .get(evaluation.best_take_index)
                .copied()
                .or_else(|| {
                    members
                        .contains(&evaluation.best_take_index)
                        .then_some(evaluation.best_take_index)
                });
            if chosen.is_none() {
                warn!(
                    "group {}: best_take_index {} resolves to no member",
                    evaluation.group_id, evaluation.best_take_index
                );
            }
            for member in members {
                self.segments[member].is_best = Some(member) == chosen;
            }
        }

        self.edit.suggested_order = self.sanitized_order(&response.suggested_order);
        self.overall_notes = response.overall_notes.clone();
        self.rebuild_edit_list();
    }

    /// User override: make `segment_index` the best take of `group_id`.
    ///
    /// Unknown groups or non-member segments are a silent no-op. The
    /// suggested group order is preserved; only the group's selection and
    /// the timeline change. Calling this twice with the same arguments is
    /// a no-op the second time.
    pub fn select_take(&mut self, group_id: usize, segment_index: usize) {
        let Some(group) = self.group(group_id) else {
            debug!("override ignored: unknown group {group_id}");
            return;
        };
        if !group.members.contains(&segment_index) {
            debug!("override ignored: segment {segment_index} not in group {group_id}");
            return;
        }
        let members = group.members.clone();
        for member in members {
            self.segments[member].is_best = member == segment_index;
        }
        self.rebuild_edit_list();
    }

    /// Rebuild `best_takes` and the timeline from the current selection.
    ///
    /// Groups without a best take are skipped silently. Deterministic and
    /// idempotent for a fixed (groups, suggested_order, is_best) state.
    pub fn rebuild_edit_list(&mut self) {
        if self.edit.suggested_order.is_empty() {
            self.edit.suggested_order = self.groups.iter().map(|g| g.group_id).collect();
        }

        let mut best_takes = Vec::new();
        let mut running = 0.0_f64;
        for &group_id in &self.edit.suggested_order {
            let Some(group) = self.groups.iter().find(|g| g.group_id == group_id) else {
                continue;
            };
            let Some(&best) = group.members.iter().find(|&&m| self.segments[m].is_best)
            else {
                continue;
            };
            let segment = &self.segments[best];
            let timeline_start = round3(running);
            let timeline_end = round3(running + segment.duration);
            best_takes.push(TimelineEntry {
                group_id,
                segment_index: segment.index,
                source_start: segment.start,
                source_end: segment.end,
                duration: segment.duration,
                timeline_start,
                timeline_end,
            });
            running += segment.duration;
        }

        self.edit = EditList {
            suggested_order: std::mem::take(&mut self.edit.suggested_order),
            best_takes,
            final_duration: round3(running),
            total_duration: self.source.total_duration,
        };
    }

    /// Drop order entries naming unknown groups and append groups the
    /// oracle forgot, in id order. An empty reply yields the identity
    /// permutation.
    fn sanitized_order(&self, suggested: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::new();
        for &group_id in suggested {
            if self.group(group_id).is_some() && !order.contains(&group_id) {
                order.push(group_id);
            }
        }
        for group in &self.groups {
            if !order.contains(&group.group_id) {
                order.push(group.group_id);
            }
        }
        order
    }
}
