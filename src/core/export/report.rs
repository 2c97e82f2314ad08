//! JSON session report.
//!
//! A full machine-readable record of the run: source metadata, the
//! timeline with scores, and per-group take detail including which take
//! is currently selected.

use crate::core::model::{AiScores, AudioMetrics};
use crate::core::session::Session;
use crate::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SourceReport {
    file_name: String,
    container: String,
    is_video: bool,
    duration: f64,
    fps: u32,
}

#[derive(Debug, Serialize)]
struct TimelineReport {
    position: usize,
    group_id: usize,
    segment_index: usize,
    source_start: f64,
    source_end: f64,
    duration: f64,
    timeline_start: f64,
    timeline_end: f64,
    text: String,
    scores: Option<AiScores>,
}

#[derive(Debug, Serialize)]
struct TakeReport {
    segment_index: usize,
    start: f64,
    end: f64,
    duration: f64,
    is_best: bool,
    text: String,
    audio_metrics: Option<AudioMetrics>,
    scores: Option<AiScores>,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    group_id: usize,
    text_summary: String,
    takes: Vec<TakeReport>,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    session_id: String,
    source: SourceReport,
    suggested_order: Vec<usize>,
    timeline: Vec<TimelineReport>,
    groups: Vec<GroupReport>,
    final_duration: f64,
    total_duration: f64,
    overall_notes: String,
}

fn build_report(session: &Session) -> SessionReport {
    let timeline = session
        .edit
        .best_takes
        .iter()
        .enumerate()
        .map(|(position, take)| {
            let segment = &session.segments[take.segment_index];
            TimelineReport {
                position,
                group_id: take.group_id,
                segment_index: take.segment_index,
                source_start: take.source_start,
                source_end: take.source_end,
                duration: take.duration,
                timeline_start: take.timeline_start,
                timeline_end: take.timeline_end,
                text: segment.text().to_string(),
                scores: segment.ai_scores.clone(),
            }
        })
        .collect();

    let groups = session
        .groups
        .iter()
        .map(|group| GroupReport {
            group_id: group.group_id,
            text_summary: group.text_summary.clone(),
            takes: group
                .members
                .iter()
                .map(|&m| {
                    let segment = &session.segments[m];
                    TakeReport {
                        segment_index: segment.index,
                        start: segment.start,
                        end: segment.end,
                        duration: segment.duration,
                        is_best: segment.is_best,
                        text: segment.text().to_string(),
                        audio_metrics: segment.audio_metrics.clone(),
                        scores: segment.ai_scores.clone(),
                    }
                })
                .collect(),
        })
        .collect();

    SessionReport {
        session_id: session.id.to_string(),
        source: SourceReport {
            file_name: session.source.file_name.clone(),
            container: session.source.extension.clone(),
            is_video: session.source.is_video,
            duration: session.source.total_duration,
            fps: session.fps,
        },
        suggested_order: session.edit.suggested_order.clone(),
        timeline,
        groups,
        final_duration: session.edit.final_duration,
        total_duration: session.edit.total_duration,
        overall_notes: session.overall_notes.clone(),
    }
}

/// Render the session report as pretty-printed JSON.
pub fn render_report(session: &Session) -> Result<String> {
    Ok(serde_json::to_string_pretty(&build_report(session))?)
}
