//! Speech-to-text integration.
//!
//! The engine contract is narrow: PCM samples in, text plus optional
//! timestamped chunks out. Per-segment failures are tolerated upstream —
//! the pipeline stores an empty transcription and continues.

use crate::core::model::TranscriptChunk;
use async_trait::async_trait;

/// Options forwarded to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeOptions {
    /// ISO-639-1 language hint; `None` lets the engine auto-detect.
    pub language: Option<String>,
    /// Processing window length, seconds.
    pub chunk_length_s: u32,
    /// Overlap between windows, seconds.
    pub stride_length_s: u32,
    /// Whether timestamped chunks are wanted.
    pub timestamps: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            chunk_length_s: 30,
            stride_length_s: 5,
            timestamps: true,
        }
    }
}

/// A transcription as returned by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptOutput {
    /// Full text, already trimmed.
    pub text: String,
    /// Timestamped sub-chunks, when the engine provides them.
    pub chunks: Vec<TranscriptChunk>,
}

/// Speech-to-text engine trait.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Warm up the engine (model download, health check). Default: no-op.
    async fn load(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Transcribe mono PCM samples at the given rate.
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        options: &TranscribeOptions,
    ) -> crate::Result<TranscriptOutput>;
}

/// WAV container decoding (RIFF chunk walk)
pub mod wav;

/// Whisper HTTP client implementation
pub mod whisper;

pub use wav::decode_wav_samples;
pub use whisper::WhisperApiClient;
