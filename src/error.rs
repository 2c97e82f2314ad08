//! Error types for the silence-cutter take-selection pipeline.
//!
//! This module defines the `CutterError` enum covering all error conditions
//! that can occur during media-engine invocation, silence segmentation,
//! transcription, oracle scoring, and edit export.
//!
//! It also provides helper methods to construct errors, map them to process
//! exit codes, and generate user-friendly messages.
use thiserror::Error;

/// Classification of media-engine failures.
///
/// The engine is an external process; every failure carries the phase in
/// which it occurred so callers can distinguish a missing binary from a
/// hung filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// The engine binary could not be located or started.
    LoadFailed,
    /// The engine ran but exited with a real (non-benign) failure.
    ExecFailed,
    /// The engine did not finish within the configured time limit.
    Timeout,
    /// Scratch-space or source I/O failed around an engine call.
    FileSystem,
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineErrorKind::LoadFailed => "LoadFailed",
            EngineErrorKind::ExecFailed => "ExecFailed",
            EngineErrorKind::Timeout => "Timeout",
            EngineErrorKind::FileSystem => "FileSystem",
        };
        f.write_str(name)
    }
}

/// Represents all possible errors in the silence-cutter application.
///
/// # Exit Codes
///
/// Each error variant maps to an exit code via `CutterError::exit_code`:
/// 2 for `NoSpeechDetected`, 3 for engine failures, 4 for oracle failures
/// (including a missing credential), 1 for everything else.
#[derive(Error, Debug)]
pub enum CutterError {
    /// I/O operation failed during file system access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error due to invalid or missing settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// The source file could not be read by the engine ingest probe.
    #[error("Source unreadable: {path}: {message}")]
    SourceUnreadable {
        /// Path of the offending source file
        path: std::path::PathBuf,
        /// Why the probe read failed
        message: String,
    },

    /// The media engine failed during an operation.
    #[error("Engine error [{kind}]: {message}")]
    Engine {
        /// Failure classification
        kind: EngineErrorKind,
        /// Raw message from the engine or the adapter
        message: String,
    },

    /// Silence detection produced no speech segments.
    #[error("No speech detected in the source media")]
    NoSpeechDetected,

    /// A single segment failed to transcribe.
    ///
    /// Never fatal: the pipeline records an empty transcription and moves
    /// on. The variant exists so the transcription adapter can report the
    /// cause through logs.
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// No scoring-oracle credential was provided.
    #[error("No API key configured for the scoring oracle")]
    MissingCredential,

    /// The oracle answered with a non-2xx HTTP status.
    #[error("Oracle protocol error ({status}): {body}")]
    OracleProtocol {
        /// HTTP status code
        status: u16,
        /// Response body, preserved for debugging
        body: String,
    },

    /// The oracle reply was not valid JSON.
    #[error("Oracle reply is not valid JSON: {message}")]
    OracleParse {
        /// Parser diagnostic
        message: String,
        /// Offending reply text, preserved for debugging
        body: String,
    },

    /// The oracle reply parsed but is missing required fields.
    #[error("Oracle reply has unexpected shape: {message}")]
    OracleShape {
        /// Shape diagnostic
        message: String,
        /// Offending reply text, preserved for debugging
        body: String,
    },

    /// Writing one of the export artifacts failed.
    #[error("Export error [{format}]: {message}")]
    Export {
        /// Which artifact failed ("xmeml", "edl", "report", "cut")
        format: String,
        /// Detailed failure message
        message: String,
    },

    /// Catch-all error variant wrapping any other failure.
    #[error("Unknown error: {0}")]
    Other(#[from] anyhow::Error),
}

// Convert reqwest transport errors to oracle protocol errors; status
// mapping for real HTTP responses happens in the clients themselves.
impl From<reqwest::Error> for CutterError {
    fn from(err: reqwest::Error) -> Self {
        CutterError::OracleProtocol {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CutterError {
    fn from(err: serde_json::Error) -> Self {
        CutterError::Config {
            message: format!("JSON serialization/deserialization error: {}", err),
        }
    }
}

// Convert config crate error to configuration error
impl From<config::ConfigError> for CutterError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => CutterError::Config {
                message: format!("Configuration file not found: {}", path),
            },
            config::ConfigError::Message(msg) => CutterError::Config { message: msg },
            _ => CutterError::Config {
                message: format!("Configuration error: {}", err),
            },
        }
    }
}

/// Specialized `Result` type for silence-cutter operations.
pub type CutterResult<T> = Result<T, CutterError>;

impl CutterError {
    /// Create a configuration error with the given message.
    pub fn config<S: Into<String>>(message: S) -> Self {
        CutterError::Config {
            message: message.into(),
        }
    }

    /// Create an engine error with the given kind and message.
    pub fn engine<S: Into<String>>(kind: EngineErrorKind, message: S) -> Self {
        CutterError::Engine {
            kind,
            message: message.into(),
        }
    }

    /// Create an engine execution error.
    pub fn engine_exec<S: Into<String>>(message: S) -> Self {
        Self::engine(EngineErrorKind::ExecFailed, message)
    }

    /// Create a source-unreadable error for the given path.
    pub fn source_unreadable<S: Into<String>>(path: &std::path::Path, message: S) -> Self {
        CutterError::SourceUnreadable {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an export error for the given artifact format.
    pub fn export<S1, S2>(format: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        CutterError::Export {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the oracle family.
    pub fn is_oracle(&self) -> bool {
        matches!(
            self,
            CutterError::MissingCredential
                | CutterError::OracleProtocol { .. }
                | CutterError::OracleParse { .. }
                | CutterError::OracleShape { .. }
        )
    }

    /// Return the corresponding exit code for this error variant.
    pub fn exit_code(&self) -> i32 {
        match self {
            CutterError::NoSpeechDetected => 2,
            CutterError::Engine { .. } => 3,
            CutterError::MissingCredential
            | CutterError::OracleProtocol { .. }
            | CutterError::OracleParse { .. }
            | CutterError::OracleShape { .. } => 4,
            _ => 1,
        }
    }

    /// Return a user-friendly error message with suggested remedies.
    pub fn user_friendly_message(&self) -> String {
        match self {
            CutterError::Io(e) => format!("File operation error: {}", e),
            CutterError::Config { message } => format!(
                "Configuration error: {}\nHint: run 'silence-cutter config --help' for details",
                message
            ),
            CutterError::SourceUnreadable { path, message } => format!(
                "Source unreadable: {}: {}\nHint: verify the file exists and is a readable media file",
                path.display(),
                message
            ),
            CutterError::Engine { kind, message } => format!(
                "Media engine error ({}): {}\nHint: check that ffmpeg is installed and on PATH",
                kind, message
            ),
            CutterError::NoSpeechDetected => {
                "No speech detected in the source media\nHint: lower detection.noise_threshold_db or min_silence_s"
                    .to_string()
            }
            CutterError::MissingCredential => {
                "No API key configured for the scoring oracle\nHint: set OPENAI_API_KEY or scoring.api_key"
                    .to_string()
            }
            CutterError::OracleProtocol { status, body } => format!(
                "Scoring oracle HTTP error {}: {}\nHint: check network connection and API key settings",
                status, body
            ),
            CutterError::OracleParse { message, .. } => format!(
                "Scoring oracle returned malformed JSON: {}\nHint: retry, or try a different scoring.model",
                message
            ),
            CutterError::OracleShape { message, .. } => format!(
                "Scoring oracle reply is missing required fields: {}\nHint: retry, or try a different scoring.model",
                message
            ),
            CutterError::Export { format, message } => {
                format!("Failed to write {} export: {}", format, message)
            }
            CutterError::Other(err) => {
                format!("Unknown error: {}\nHint: please report this issue", err)
            }
            _ => format!("Error: {}", self),
        }
    }
}
