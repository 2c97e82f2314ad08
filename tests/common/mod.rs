//! Shared helpers and trait doubles for the integration suites.
#![allow(dead_code)]

use async_trait::async_trait;
use silence_cutter::Result;
use silence_cutter::error::CutterError;
use silence_cutter::services::media::{MediaEngine, MediaHandle, OutputContainer, ProgressFn};
use silence_cutter::services::scoring::{
    EvaluationRequest, EvaluationResponse, GroupEvaluation, ScoringOracle, TakeScore,
};
use silence_cutter::services::transcription::{
    SpeechEngine, TranscribeOptions, TranscriptOutput,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A silence-detect log for a 10 s source with silences [2,3] and [6,7].
pub const SILENCE_LOG_TWO_GAPS: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':
  Duration: 00:00:10.00, start: 0.000000, bitrate: 317 kb/s
[silencedetect @ 0x1] silence_start: 2.0
[silencedetect @ 0x1] silence_end: 3.0 | silence_duration: 1.0
[silencedetect @ 0x1] silence_start: 6.0
[silencedetect @ 0x1] silence_end: 7.0 | silence_duration: 1.0
";

/// A volume probe log with usable levels.
pub const VOLUME_LOG_GOOD: &str = "\
[Parsed_volumedetect_0 @ 0x2] n_samples: 88200
[Parsed_volumedetect_0 @ 0x2] mean_volume: -18.3 dB
[Parsed_volumedetect_0 @ 0x2] max_volume: -2.1 dB
";

/// Encode a short run of silence as a 16 kHz mono WAV.
pub fn wav_fixture(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Media engine double driven entirely by canned logs.
pub struct MockMediaEngine {
    pub silence_log: String,
    pub volume_log: String,
    /// Intervals passed to the last `render_cut` call.
    pub rendered_intervals: Mutex<Vec<(f64, f64)>>,
    pub rendered_container: Mutex<Option<OutputContainer>>,
}

impl MockMediaEngine {
    pub fn new(silence_log: &str) -> Self {
        Self {
            silence_log: silence_log.to_string(),
            volume_log: VOLUME_LOG_GOOD.to_string(),
            rendered_intervals: Mutex::new(Vec::new()),
            rendered_container: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MediaEngine for MockMediaEngine {
    async fn ingest(&self, source: &Path) -> Result<MediaHandle> {
        Ok(MediaHandle {
            path: source.to_path_buf(),
            source_name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "source".into()),
            mounted: false,
        })
    }

    async fn silence_log(
        &self,
        _handle: &MediaHandle,
        _noise_db: i32,
        _min_silence_s: f64,
    ) -> Result<String> {
        Ok(self.silence_log.clone())
    }

    async fn extract_wav(
        &self,
        _handle: &MediaHandle,
        start: f64,
        end: f64,
    ) -> Result<Vec<u8>> {
        let samples = (((end - start) * 16_000.0) as usize).max(16);
        Ok(wav_fixture(samples))
    }

    async fn volume_log(&self, _handle: &MediaHandle, _start: f64, _end: f64) -> Result<String> {
        Ok(self.volume_log.clone())
    }

    async fn render_cut(
        &self,
        _handle: &MediaHandle,
        intervals: &[(f64, f64)],
        container: OutputContainer,
        on_progress: &ProgressFn,
    ) -> Result<Vec<u8>> {
        *self.rendered_intervals.lock().unwrap() = intervals.to_vec();
        *self.rendered_container.lock().unwrap() = Some(container);
        on_progress(100);
        Ok(b"rendered".to_vec())
    }
}

/// Speech engine double returning canned texts in call order.
///
/// A text of `"<fail>"` makes that call fail, to exercise the
/// tolerate-and-continue path.
pub struct MockSpeechEngine {
    texts: Vec<String>,
    calls: AtomicUsize,
}

impl MockSpeechEngine {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    async fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        _options: &TranscribeOptions,
    ) -> Result<TranscriptOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.texts.get(call).cloned().unwrap_or_default();
        if text == "<fail>" {
            return Err(CutterError::TranscriptionFailed("canned failure".into()));
        }
        Ok(TranscriptOutput {
            text,
            chunks: Vec::new(),
        })
    }
}

/// Oracle double returning one canned response.
pub struct MockOracle {
    pub response: EvaluationResponse,
    pub requests: Mutex<Vec<EvaluationRequest>>,
}

impl MockOracle {
    pub fn new(response: EvaluationResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ScoringOracle for MockOracle {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// Oracle double that always fails with a protocol error.
pub struct FailingOracle;

#[async_trait]
impl ScoringOracle for FailingOracle {
    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<EvaluationResponse> {
        Err(CutterError::OracleProtocol {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

/// Canned evaluation for the two-group scenario produced by
/// [`SILENCE_LOG_TWO_GAPS`] with texts "hello world" / "hello world." /
/// "completely different".
pub fn two_group_evaluation() -> EvaluationResponse {
    let score = |segment_index: usize, overall: f64| TakeScore {
        segment_index,
        audio_quality: 7.0,
        content: 8.0,
        emotion: 6.0,
        overall,
        comment: "ok".into(),
    };
    EvaluationResponse {
        evaluations: vec![
            GroupEvaluation {
                group_id: 0,
                takes: vec![score(0, 6.0), score(1, 9.0)],
                best_take_index: 1,
                reason: "cleaner".into(),
            },
            GroupEvaluation {
                group_id: 1,
                takes: vec![score(2, 7.0)],
                best_take_index: 0,
                reason: String::new(),
            },
        ],
        suggested_order: vec![1, 0],
        overall_notes: "keep it tight".into(),
    }
}
