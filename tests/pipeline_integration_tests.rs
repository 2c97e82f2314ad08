//! End-to-end pipeline tests over trait doubles: canned engine logs in,
//! a ready session with exports out.

mod common;

use common::{
    FailingOracle, MockMediaEngine, MockOracle, MockSpeechEngine, SILENCE_LOG_TWO_GAPS,
    two_group_evaluation,
};
use silence_cutter::config::Config;
use silence_cutter::core::export::{render_edl, render_report, render_xmeml};
use silence_cutter::core::model::QualityTag;
use silence_cutter::core::pipeline::{Pipeline, progress_channel};
use silence_cutter::core::session::{ProgressEvent, SessionState};
use silence_cutter::error::CutterError;
use silence_cutter::services::media::OutputContainer;
use std::path::Path;
use std::sync::Arc;

const TAKE_TEXTS: &[&str] = &["hello world", "hello world.", "completely different"];

fn pipeline_with(
    engine: Arc<MockMediaEngine>,
    speech_texts: &[&str],
    oracle: Arc<dyn silence_cutter::services::scoring::ScoringOracle>,
) -> (Pipeline, tokio::sync::mpsc::Receiver<ProgressEvent>) {
    let (tx, rx) = progress_channel();
    let pipeline = Pipeline::new(
        engine,
        Arc::new(MockSpeechEngine::new(speech_texts)),
        oracle,
        tx,
    );
    (pipeline, rx)
}

#[tokio::test]
async fn test_full_pipeline_reaches_ready() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, mut rx) = pipeline_with(engine.clone(), TAKE_TEXTS, oracle.clone());

    let (session, _handle) = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap();

    assert_eq!(session.state, SessionState::Ready);
    assert_eq!(session.source.total_duration, 10.0);

    // Segmentation: [0, 2.05], [2.95, 6.05], [6.95, 10.0].
    let bounds: Vec<(f64, f64)> = session.segments.iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(bounds, vec![(0.0, 2.05), (2.95, 6.05), (6.95, 10.0)]);

    // Features: every segment measured and tagged.
    for segment in &session.segments {
        let metrics = segment.audio_metrics.as_ref().unwrap();
        assert_eq!(metrics.mean_db, Some(-18.3));
        assert_eq!(metrics.quality, QualityTag::Good);
    }

    // Grouping: near-duplicate first two takes share a group.
    assert_eq!(session.groups.len(), 2);
    assert_eq!(session.groups[0].members, vec![0, 1]);
    assert_eq!(session.groups[0].text_summary, "hello world.");
    assert_eq!(session.groups[1].members, vec![2]);

    // Scoring applied: best takes, order, scores.
    assert!(session.segments[1].is_best);
    assert!(!session.segments[0].is_best);
    assert!(session.segments[2].is_best);
    assert_eq!(session.edit.suggested_order, vec![1, 0]);
    assert_eq!(session.edit.best_takes.len(), 2);
    assert_eq!(session.edit.best_takes[0].segment_index, 2);
    assert_eq!(session.edit.best_takes[1].segment_index, 1);
    assert_eq!(session.overall_notes, "keep it tight");

    // The oracle saw the full digest.
    let requests = oracle.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].groups.len(), 2);
    assert_eq!(requests[0].groups[0].takes[1].text, "hello world.");

    // Progress stream carried the terminal state.
    let mut saw_ready = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ProgressEvent::StateChanged(SessionState::Ready)) {
            saw_ready = true;
        }
    }
    assert!(saw_ready);
}

#[tokio::test]
async fn test_exports_from_ready_session() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, _rx) = pipeline_with(engine, TAKE_TEXTS, oracle);
    let (session, _handle) = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap();

    let xml = render_xmeml(&session);
    assert!(xml.contains("<xmeml version=\"5\">"));
    assert!(xml.contains("<video>"));

    let edl = render_edl(&session);
    assert!(edl.starts_with("TITLE: Silence Cutter Edit"));
    // First event is group 1's only take [6.95, 10.0].
    assert!(edl.contains("001  AX       AA/V  C        00:00:06:24 00:00:10:00 00:00:00:00 00:00:03:01"));

    let report = render_report(&session).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(value["suggested_order"], serde_json::json!([1, 0]));
    assert_eq!(value["groups"][0]["takes"][1]["is_best"], true);
}

#[tokio::test]
async fn test_transcription_failure_is_tolerated() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, _rx) = pipeline_with(
        engine,
        &["hello world", "<fail>", "completely different"],
        oracle,
    );
    let (session, _handle) = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap();

    assert_eq!(session.state, SessionState::Ready);
    assert_eq!(session.segments[1].text(), "");
    // The failed take no longer matches its sibling, so it groups alone.
    assert_eq!(session.groups.len(), 3);
}

#[tokio::test]
async fn test_oracle_failure_fails_run() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let (pipeline, _rx) = pipeline_with(engine, TAKE_TEXTS, Arc::new(FailingOracle));
    let err = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CutterError::OracleProtocol { status: 503, .. }));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_no_speech_fails_run() {
    let log = "Duration: 00:00:05.00\nsilence_start: 0.0\nsilence_end: 5.0 | silence_duration: 5.0\n";
    let engine = Arc::new(MockMediaEngine::new(log));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let mut config = Config::default();
    config.detection.padding_s = 0.0;
    let (pipeline, _rx) = pipeline_with(engine, TAKE_TEXTS, oracle);
    let err = pipeline
        .run(Path::new("talk.mp4"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, CutterError::NoSpeechDetected));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_render_uses_best_take_intervals() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, mut rx) = pipeline_with(engine.clone(), TAKE_TEXTS, oracle);
    let (mut session, handle) = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap();

    let bytes = pipeline.render(&mut session, &handle).await.unwrap();
    assert_eq!(bytes, b"rendered");
    assert_eq!(session.state, SessionState::Done);

    // Suggested order [1, 0]: group 1's take first, then group 0's best.
    let intervals = engine.rendered_intervals.lock().unwrap().clone();
    assert_eq!(intervals, vec![(6.95, 10.0), (2.95, 6.05)]);
    assert_eq!(
        *engine.rendered_container.lock().unwrap(),
        Some(OutputContainer::VideoMp4)
    );

    let mut saw_render_progress = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ProgressEvent::Render(100)) {
            saw_render_progress = true;
        }
    }
    assert!(saw_render_progress);
}

#[tokio::test]
async fn test_override_then_rerender() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, _rx) = pipeline_with(engine.clone(), TAKE_TEXTS, oracle);
    let (mut session, handle) = pipeline
        .run(Path::new("talk.mp4"), &Config::default())
        .await
        .unwrap();

    // Override group 0's pick back to take 0, then rerender.
    session.select_take(0, 0);
    assert!(session.segments[0].is_best);
    assert!(!session.segments[1].is_best);
    assert_eq!(session.edit.suggested_order, vec![1, 0]);

    pipeline.render(&mut session, &handle).await.unwrap();
    let intervals = engine.rendered_intervals.lock().unwrap().clone();
    assert_eq!(intervals, vec![(6.95, 10.0), (0.0, 2.05)]);
}

#[tokio::test]
async fn test_audio_source_renders_mp3() {
    let engine = Arc::new(MockMediaEngine::new(SILENCE_LOG_TWO_GAPS));
    let oracle = Arc::new(MockOracle::new(two_group_evaluation()));
    let (pipeline, _rx) = pipeline_with(engine.clone(), TAKE_TEXTS, oracle);
    let (mut session, handle) = pipeline
        .run(Path::new("talk.wav"), &Config::default())
        .await
        .unwrap();
    assert!(!session.source.is_video);

    pipeline.render(&mut session, &handle).await.unwrap();
    assert_eq!(
        *engine.rendered_container.lock().unwrap(),
        Some(OutputContainer::AudioMp3)
    );
}
