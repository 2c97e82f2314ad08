//! ffmpeg subprocess engine.
//!
//! Every operation is one ffmpeg invocation with captured stderr. The
//! probe filters discard their output (`-f null`), so the useful data is
//! the log text itself; probe runs therefore tolerate a non-zero exit as
//! long as the log is populated.

use crate::config::EngineConfig;
use crate::error::{CutterError, EngineErrorKind};
use crate::services::media::{MediaEngine, MediaHandle, OutputContainer, ProgressFn};
use crate::Result;
use async_trait::async_trait;
use log::{debug, trace, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use uuid::Uuid;

/// Sources up to this size are copied into scratch space in full;
/// larger ones are mounted in place.
const COPY_THRESHOLD_BYTES: u64 = 500 * 1024 * 1024;

/// Build the silence-detect invocation.
///
/// Video decoding is skipped and audio downmixed to mono at 8 kHz, which
/// is plenty for level detection and much faster.
fn silence_detect_args(input: &Path, noise_db: i32, min_silence_s: f64) -> Vec<String> {
    vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        "8000".into(),
        "-af".into(),
        format!("silencedetect=noise={}dB:d={}", noise_db, min_silence_s),
        "-f".into(),
        "null".into(),
        "-".into(),
    ]
}

/// Build the WAV segment-extract invocation (16 kHz mono s16le).
fn extract_wav_args(input: &Path, start: f64, end: f64, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format!("{start:.3}"),
        "-to".into(),
        format!("{end:.3}"),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        "16000".into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-f".into(),
        "wav".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Build the volume-probe invocation.
fn volume_detect_args(input: &Path, start: f64, end: f64) -> Vec<String> {
    vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format!("{start:.3}"),
        "-to".into(),
        format!("{end:.3}"),
        "-vn".into(),
        "-af".into(),
        "volumedetect".into(),
        "-f".into(),
        "null".into(),
        "-".into(),
    ]
}

/// Build the per-interval part-extract invocation for the final render.
fn render_part_args(
    input: &Path,
    start: f64,
    end: f64,
    container: OutputContainer,
    output: &Path,
) -> Vec<String> {
    let mut args = vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format!("{start:.3}"),
        "-to".into(),
        format!("{end:.3}"),
    ];
    match container {
        OutputContainer::VideoMp4 => {
            args.extend(["-c".into(), "copy".into()]);
            args.extend(["-avoid_negative_ts".into(), "make_zero".into()]);
        }
        OutputContainer::AudioMp3 => {
            args.extend(["-vn".into(), "-c:a".into(), "libmp3lame".into()]);
            args.extend(["-q:a".into(), "2".into()]);
        }
    }
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Build the concat invocation over a part list file.
fn concat_args(list: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.to_string_lossy().into_owned(),
        "-c".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Whether a `-f null` probe run counts as successful.
///
/// ffmpeg occasionally exits non-zero on null-muxer runs even though the
/// filter log is complete; a populated log wins over the exit status.
fn null_probe_ok(success: bool, log: &str, marker: &str) -> bool {
    success || log.contains(marker)
}

/// Media engine backed by ffmpeg subprocess invocations.
///
/// Owns a scratch directory that vanishes when the engine is dropped,
/// releasing copied sources and intermediate files.
pub struct FfmpegEngine {
    binary: String,
    scratch: TempDir,
    timeout: Duration,
}

impl FfmpegEngine {
    /// Create an engine with its own scratch directory.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let scratch = TempDir::new().map_err(|e| {
            CutterError::engine(
                EngineErrorKind::FileSystem,
                format!("failed to create scratch directory: {}", e),
            )
        })?;
        Ok(Self {
            binary: config.ffmpeg_path.clone(),
            scratch,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    async fn run(&self, args: &[String]) -> Result<Output> {
        trace!("ffmpeg {}", args.join(" "));
        let future = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| {
                CutterError::engine(
                    EngineErrorKind::Timeout,
                    format!("engine run exceeded {:?}", self.timeout),
                )
            })?
            .map_err(|e| {
                let kind = if e.kind() == std::io::ErrorKind::NotFound {
                    EngineErrorKind::LoadFailed
                } else {
                    EngineErrorKind::ExecFailed
                };
                CutterError::engine(kind, format!("failed to start '{}': {}", self.binary, e))
            })?;
        Ok(output)
    }

    /// Run ffmpeg and require a zero exit.
    async fn run_checked(&self, args: &[String]) -> Result<Output> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CutterError::engine_exec(last_log_lines(&stderr, 6)));
        }
        Ok(output)
    }

    /// Run a `-f null` probe, tolerating a benign non-zero exit.
    async fn run_probe(&self, args: &[String], marker: &str) -> Result<String> {
        let output = self.run(args).await?;
        let log = String::from_utf8_lossy(&output.stderr).into_owned();
        if !null_probe_ok(output.status.success(), &log, marker) {
            return Err(CutterError::engine_exec(last_log_lines(&log, 6)));
        }
        if !output.status.success() {
            debug!("tolerating non-zero null-probe exit ({marker} log populated)");
        }
        Ok(log)
    }
}

/// Keep the tail of a log for error messages.
fn last_log_lines(log: &str, count: usize) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn ingest(&self, source: &Path) -> Result<MediaHandle> {
        let metadata = tokio::fs::metadata(source)
            .await
            .map_err(|e| CutterError::source_unreadable(source, e.to_string()))?;
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string());

        if metadata.len() <= COPY_THRESHOLD_BYTES {
            let extension = source
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "bin".to_string());
            let target = self.scratch_path(&format!("input.{extension}"));
            tokio::fs::copy(source, &target)
                .await
                .map_err(|e| CutterError::source_unreadable(source, e.to_string()))?;
            debug!("ingested {} ({} bytes, copied)", source_name, metadata.len());
            return Ok(MediaHandle {
                path: target,
                source_name,
                mounted: false,
            });
        }

        // Too large to copy: mount in place, but verify a probe read of
        // the first byte succeeds before the engine depends on it.
        let probe_path = source.to_path_buf();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = std::fs::File::open(&probe_path)?;
            let mut byte = [0u8; 1];
            file.read_exact(&mut byte)?;
            Ok(())
        })
        .await
        .map_err(|e| CutterError::source_unreadable(source, e.to_string()))?
        .map_err(|e| CutterError::source_unreadable(source, e.to_string()))?;

        debug!("ingested {} ({} bytes, mounted)", source_name, metadata.len());
        Ok(MediaHandle {
            path: source.to_path_buf(),
            source_name,
            mounted: true,
        })
    }

    async fn silence_log(
        &self,
        handle: &MediaHandle,
        noise_db: i32,
        min_silence_s: f64,
    ) -> Result<String> {
        let args = silence_detect_args(&handle.path, noise_db, min_silence_s);
        self.run_probe(&args, "Duration:").await
    }

    async fn extract_wav(&self, handle: &MediaHandle, start: f64, end: f64) -> Result<Vec<u8>> {
        let output_path = self.scratch_path(&format!("seg_{}.wav", Uuid::new_v4()));
        let args = extract_wav_args(&handle.path, start, end, &output_path);
        self.run_checked(&args).await?;
        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            CutterError::engine(
                EngineErrorKind::FileSystem,
                format!("failed to read extracted WAV: {}", e),
            )
        })?;
        // Scratch WAVs are one-shot; drop them as soon as they are read.
        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            warn!("failed to remove scratch WAV: {e}");
        }
        Ok(bytes)
    }

    async fn volume_log(&self, handle: &MediaHandle, start: f64, end: f64) -> Result<String> {
        let args = volume_detect_args(&handle.path, start, end);
        self.run_probe(&args, "volumedetect").await
    }

    async fn render_cut(
        &self,
        handle: &MediaHandle,
        intervals: &[(f64, f64)],
        container: OutputContainer,
        on_progress: &ProgressFn,
    ) -> Result<Vec<u8>> {
        if intervals.is_empty() {
            return Err(CutterError::engine_exec("render called with no intervals"));
        }

        let mut list_body = String::new();
        let mut part_paths = Vec::new();
        for (i, &(start, end)) in intervals.iter().enumerate() {
            let part = self.scratch_path(&format!("part_{i:04}.{}", container.extension()));
            let args = render_part_args(&handle.path, start, end, container, &part);
            self.run_checked(&args).await?;
            list_body.push_str(&format!(
                "file '{}'\n",
                part.to_string_lossy().replace('\'', "'\\''")
            ));
            part_paths.push(part);
            on_progress((((i + 1) * 90) / intervals.len()) as u8);
        }

        let list_path = self.scratch_path("concat.txt");
        tokio::fs::write(&list_path, list_body).await.map_err(|e| {
            CutterError::engine(
                EngineErrorKind::FileSystem,
                format!("failed to write concat list: {}", e),
            )
        })?;

        let output_path = self.scratch_path(&format!("cut.{}", container.extension()));
        self.run_checked(&concat_args(&list_path, &output_path))
            .await?;
        on_progress(98);

        let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
            CutterError::engine(
                EngineErrorKind::FileSystem,
                format!("failed to read rendered cut: {}", e),
            )
        })?;
        for part in part_paths {
            let _ = tokio::fs::remove_file(part).await;
        }
        let _ = tokio::fs::remove_file(&output_path).await;
        on_progress(100);
        Ok(bytes)
    }
}
