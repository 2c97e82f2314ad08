// src/cli/cut_args.rs
use clap::Args;
use std::path::PathBuf;

/// Arguments for the `cut` pipeline command.
///
/// Every optional flag overrides the corresponding configuration value
/// for this run only.
#[derive(Args, Debug)]
pub struct CutArgs {
    /// The recording to process (mp4/mov/mkv/webm/mp3/wav/m4a/...)
    pub input: PathBuf,

    /// Directory for the generated outputs (defaults to the source directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Silence threshold in dB (levels below count as silence)
    #[arg(long = "noise-db", allow_hyphen_values = true)]
    pub noise_db: Option<i32>,

    /// Minimum silence length in seconds for a cut
    #[arg(long = "min-silence")]
    pub min_silence: Option<f64>,

    /// Minimum speech length in seconds for a kept segment
    #[arg(long = "min-speech")]
    pub min_speech: Option<f64>,

    /// Padding in seconds preserved on both sides of each segment
    #[arg(long)]
    pub padding: Option<f64>,

    /// Transcription model size (tiny/base/small/medium/large)
    #[arg(long)]
    pub model: Option<String>,

    /// Transcription language (ISO-639-1 code, or "auto")
    #[arg(long)]
    pub language: Option<String>,

    /// Similarity threshold in [0, 1] for grouping repeated takes
    #[arg(long)]
    pub similarity: Option<f64>,

    /// Timecode frame rate (24/25/30/50/60)
    #[arg(long)]
    pub fps: Option<u32>,

    /// Write the EDL/XMEML/report but skip rendering the cut media
    #[arg(long)]
    pub skip_render: bool,
}

impl CutArgs {
    /// Fold the run-only overrides into a configuration.
    pub fn apply_to(&self, config: &mut crate::config::Config) -> crate::Result<()> {
        if let Some(noise_db) = self.noise_db {
            config.detection.noise_threshold_db = noise_db;
        }
        if let Some(min_silence) = self.min_silence {
            config.detection.min_silence_s = min_silence;
        }
        if let Some(min_speech) = self.min_speech {
            config.detection.min_speech_s = min_speech;
        }
        if let Some(padding) = self.padding {
            config.detection.padding_s = padding;
        }
        if let Some(model) = &self.model {
            config.transcription.model = model.parse()?;
        }
        if let Some(language) = &self.language {
            config.transcription.language = language.clone();
        }
        if let Some(similarity) = self.similarity {
            config.grouping.similarity_threshold = similarity;
        }
        if let Some(fps) = self.fps {
            config.export.fps = fps;
        }
        if let Some(output_dir) = &self.output_dir {
            config.export.output_dir = Some(output_dir.clone());
        }
        crate::config::validate_config(config)
    }
}
