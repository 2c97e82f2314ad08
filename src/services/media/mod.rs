//! Media-engine abstraction.
//!
//! The decoder/filter engine is a black box behind the [`MediaEngine`]
//! trait: it ingests a source, runs the silence and volume probes,
//! extracts WAV segments, and renders the final cut. The production
//! implementation shells out to ffmpeg; tests substitute their own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Callback for incremental 0–100 % progress updates.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Output container for the rendered cut, chosen by source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    /// MP4 video, for video-like sources.
    VideoMp4,
    /// MP3 audio, for everything else.
    AudioMp3,
}

impl OutputContainer {
    /// Pick the container for a source.
    pub fn for_source(is_video: bool) -> Self {
        if is_video {
            OutputContainer::VideoMp4
        } else {
            OutputContainer::AudioMp3
        }
    }

    /// File extension of the rendered cut.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputContainer::VideoMp4 => "mp4",
            OutputContainer::AudioMp3 => "mp3",
        }
    }
}

/// An ingested source the engine can read.
///
/// Small sources are copied into engine scratch space; large ones are
/// mounted in place as a streamed-read view.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    /// Where the engine reads the media from.
    pub path: PathBuf,
    /// Original file name, for export metadata.
    pub source_name: String,
    /// True when the source is referenced in place rather than copied.
    pub mounted: bool,
}

/// The engine operations the pipeline drives.
///
/// Commands are serialised by the adapter; the handle is single-writer,
/// single-consumer.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Place the source where the engine can read it.
    async fn ingest(&self, source: &Path) -> crate::Result<MediaHandle>;

    /// Run silence detection, returning the engine's textual log.
    async fn silence_log(
        &self,
        handle: &MediaHandle,
        noise_db: i32,
        min_silence_s: f64,
    ) -> crate::Result<String>;

    /// Extract an interval as 16 kHz mono 16-bit PCM WAV.
    async fn extract_wav(
        &self,
        handle: &MediaHandle,
        start: f64,
        end: f64,
    ) -> crate::Result<Vec<u8>>;

    /// Run the volume probe over an interval, returning the textual log.
    async fn volume_log(
        &self,
        handle: &MediaHandle,
        start: f64,
        end: f64,
    ) -> crate::Result<String>;

    /// Concatenate intervals into a single rendered output.
    async fn render_cut(
        &self,
        handle: &MediaHandle,
        intervals: &[(f64, f64)],
        container: OutputContainer,
        on_progress: &ProgressFn,
    ) -> crate::Result<Vec<u8>>;
}

/// ffmpeg subprocess implementation
pub mod ffmpeg;

pub use ffmpeg::FfmpegEngine;
