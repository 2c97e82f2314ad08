//! Pipeline driver: one cooperatively scheduled task from source file to
//! `Ready` session.
//!
//! The driver owns the session and is its only writer. Progress leaves
//! through a bounded channel with non-blocking sends; a slow or absent
//! consumer drops events but never stalls a stage.

use crate::config::Config;
use crate::core::session::{ProgressEvent, Session, SessionState};
use crate::core::{features, grouper, segmenter};
use crate::services::media::{MediaEngine, MediaHandle, OutputContainer};
use crate::services::scoring::{EvaluationRequest, ScoringOracle};
use crate::services::transcription::{SpeechEngine, TranscribeOptions, decode_wav_samples};
use crate::{Result, error::CutterError};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sample rate of engine-extracted segment WAVs.
const SEGMENT_SAMPLE_RATE: u32 = 16_000;

/// Capacity of the progress channel; events beyond it are dropped.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Create the bounded progress channel a pipeline reports through.
pub fn progress_channel() -> (
    mpsc::Sender<ProgressEvent>,
    mpsc::Receiver<ProgressEvent>,
) {
    mpsc::channel(PROGRESS_CHANNEL_CAPACITY)
}

/// Drives a session through the take-selection stages.
pub struct Pipeline {
    engine: Arc<dyn MediaEngine>,
    speech: Arc<dyn SpeechEngine>,
    oracle: Arc<dyn ScoringOracle>,
    progress: mpsc::Sender<ProgressEvent>,
}

impl Pipeline {
    /// Assemble a pipeline over the three external services.
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        speech: Arc<dyn SpeechEngine>,
        oracle: Arc<dyn ScoringOracle>,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Self {
        Self {
            engine,
            speech,
            oracle,
            progress,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        let _ = self.progress.try_send(event);
    }

    fn set_state(&self, session: &mut Session, state: SessionState) {
        session.transition(state.clone());
        self.emit(ProgressEvent::StateChanged(state));
    }

    /// Run all stages up to `Ready`.
    ///
    /// Returns the session together with the engine handle so the caller
    /// can render the cut (and rerender after overrides). On failure the
    /// session is discarded — the pipeline does not resume.
    pub async fn run(&self, input: &Path, config: &Config) -> Result<(Session, MediaHandle)> {
        let mut session = Session::new(input, config.export.fps);
        match self.run_stages(&mut session, input, config).await {
            Ok(handle) => Ok((session, handle)),
            Err(e) => {
                self.set_state(&mut session, SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        session: &mut Session,
        input: &Path,
        config: &Config,
    ) -> Result<MediaHandle> {
        self.set_state(session, SessionState::LoadingEngine);
        let handle = self.engine.ingest(input).await?;

        self.set_state(session, SessionState::Probing);
        let silence_log = self
            .engine
            .silence_log(
                &handle,
                config.detection.noise_threshold_db,
                config.detection.min_silence_s,
            )
            .await?;

        self.set_state(session, SessionState::Segmenting);
        session.source.total_duration = segmenter::total_duration_rounded(&silence_log)
            .unwrap_or_default();
        session.segments = segmenter::derive_segments(&silence_log, &config.detection)?;
        let total = session.segments.len();

        // Per-segment WAV extraction and volume probing.
        let mut segment_samples: Vec<Vec<f32>> = Vec::with_capacity(total);
        for i in 0..total {
            self.set_state(session, SessionState::Extracting { done: i, total });
            let (start, end) = (session.segments[i].start, session.segments[i].end);

            let wav_bytes = self.engine.extract_wav(&handle, start, end).await?;
            match decode_wav_samples(&wav_bytes) {
                Ok(samples) => segment_samples.push(samples),
                Err(e) => {
                    warn!("segment {i}: WAV decode failed, transcription will be empty: {e}");
                    segment_samples.push(Vec::new());
                }
            }

            let volume_log = self.engine.volume_log(&handle, start, end).await?;
            session.segments[i].audio_metrics = Some(features::metrics_from_log(&volume_log));
            self.set_state(session, SessionState::Extracting { done: i + 1, total });
        }

        self.set_state(session, SessionState::LoadingTranscriber);
        self.speech.load().await?;

        let options = TranscribeOptions {
            language: match config.transcription.language.as_str() {
                "auto" | "" => None,
                lang => Some(lang.to_string()),
            },
            ..TranscribeOptions::default()
        };
        for i in 0..total {
            self.set_state(session, SessionState::Transcribing { done: i, total });
            let transcription = match self
                .speech
                .transcribe(&segment_samples[i], SEGMENT_SAMPLE_RATE, &options)
                .await
            {
                Ok(output) => crate::core::model::Transcription {
                    text: output.text,
                    chunks: output.chunks,
                },
                Err(e) => {
                    // Per-segment failures never stop the run.
                    warn!("segment {i}: transcription failed: {e}");
                    crate::core::model::Transcription::default()
                }
            };
            session.segments[i].transcription = Some(transcription);
            self.set_state(session, SessionState::Transcribing { done: i + 1, total });
        }
        drop(segment_samples);

        self.set_state(session, SessionState::Grouping);
        session.groups =
            grouper::group_segments(&session.segments, config.grouping.similarity_threshold);

        self.set_state(session, SessionState::Scoring);
        let request = EvaluationRequest::from_session(session);
        let evaluation = self.oracle.evaluate(&request).await?;

        self.set_state(session, SessionState::Assembling);
        session.apply_evaluation(&evaluation);
        debug!(
            "edit assembled: {} group(s), {} best take(s), {:.3}s of {:.3}s kept",
            session.groups.len(),
            session.edit.best_takes.len(),
            session.edit.final_duration,
            session.edit.total_duration
        );

        self.set_state(session, SessionState::Ready);
        Ok(handle)
    }

    /// Render the current best takes through the engine.
    ///
    /// Callable from `Ready` any number of times (overrides rebuild the
    /// timeline in between). Moves the session through `Rendering` into
    /// `Done`; a failed render ends in `Failed`.
    pub async fn render(
        &self,
        session: &mut Session,
        handle: &MediaHandle,
    ) -> Result<Vec<u8>> {
        let intervals = session.best_take_intervals();
        if intervals.is_empty() {
            return Err(CutterError::export(
                "cut",
                "no best takes selected, nothing to render",
            ));
        }
        let container = OutputContainer::for_source(session.source.is_video);

        self.set_state(session, SessionState::Rendering);
        let sender = self.progress.clone();
        let on_progress = move |percent: u8| {
            let _ = sender.try_send(ProgressEvent::Render(percent));
        };
        let result = self
            .engine
            .render_cut(handle, &intervals, container, &on_progress)
            .await;
        match result {
            Ok(bytes) => {
                self.set_state(session, SessionState::Done);
                Ok(bytes)
            }
            Err(e) => {
                self.set_state(session, SessionState::Failed);
                Err(e)
            }
        }
    }
}
