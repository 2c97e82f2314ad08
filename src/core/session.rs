//! The owned session value threaded through the pipeline.
//!
//! One `Session` exists per run. The pipeline driver is its only writer;
//! the UI observes state through the bounded progress channel and reads a
//! full snapshot once the session is `Ready`. Overrides go through
//! [`Session::select_take`] — there are no callbacks back into the UI.

use crate::core::model::{EditList, Group, Segment};
use log::debug;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extensions treated as video containers; everything else is audio.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm"];

/// Immutable facts about the source media.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Path as given on the command line.
    pub path: PathBuf,
    /// File name component.
    pub file_name: String,
    /// File stem used as the `<base>` of every output name.
    pub base_name: String,
    /// Lower-cased extension.
    pub extension: String,
    /// Whether the container is video-like.
    pub is_video: bool,
    /// Source duration in seconds, known after probing.
    pub total_duration: f64,
}

impl SourceInfo {
    /// Describe a source file. Duration is filled in after probing.
    pub fn new(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());
        let base_name = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "source".to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let is_video = VIDEO_EXTENSIONS.contains(&extension.as_str());
        Self {
            path: path.to_path_buf(),
            file_name,
            base_name,
            extension,
            is_video,
            total_duration: 0.0,
        }
    }
}

/// Pipeline lifecycle states.
///
/// `Failed` is reachable from every state; from `Ready`, overrides stay in
/// `Ready` and an explicit rerender passes through `Rendering` and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LoadingEngine,
    Probing,
    Segmenting,
    Extracting { done: usize, total: usize },
    LoadingTranscriber,
    Transcribing { done: usize, total: usize },
    Grouping,
    Scoring,
    Assembling,
    Ready,
    Rendering,
    Done,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::LoadingEngine => write!(f, "loading media engine"),
            SessionState::Probing => write!(f, "probing source"),
            SessionState::Segmenting => write!(f, "detecting speech"),
            SessionState::Extracting { done, total } => {
                write!(f, "extracting segments ({done}/{total})")
            }
            SessionState::LoadingTranscriber => write!(f, "loading transcriber"),
            SessionState::Transcribing { done, total } => {
                write!(f, "transcribing ({done}/{total})")
            }
            SessionState::Grouping => write!(f, "grouping takes"),
            SessionState::Scoring => write!(f, "scoring takes"),
            SessionState::Assembling => write!(f, "assembling edit"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Rendering => write!(f, "rendering cut"),
            SessionState::Done => write!(f, "done"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Events emitted onto the bounded progress channel.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// Incremental engine progress for the current call, 0–100.
    Engine(u8),
    /// Incremental render progress, 0–100.
    Render(u8),
}

/// All state owned by a single run.
#[derive(Debug, Clone)]
pub struct Session {
    /// Run identifier, for log correlation only.
    pub id: Uuid,
    /// Source media facts.
    pub source: SourceInfo,
    /// Output timebase.
    pub fps: u32,
    /// All detected speech segments, in detection order.
    pub segments: Vec<Segment>,
    /// Take groups, fixed after grouping.
    pub groups: Vec<Group>,
    /// The current edit decision.
    pub edit: EditList,
    /// Free-form oracle notes for the report.
    pub overall_notes: String,
    /// Current lifecycle state.
    pub state: SessionState,
}

impl Session {
    /// Create an idle session for the given source.
    pub fn new(path: &Path, fps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: SourceInfo::new(path),
            fps,
            segments: Vec::new(),
            groups: Vec::new(),
            edit: EditList::default(),
            overall_notes: String::new(),
            state: SessionState::Idle,
        }
    }

    /// Move to the next lifecycle state.
    pub fn transition(&mut self, next: SessionState) {
        debug!("session {}: {} -> {}", self.id, self.state, next);
        self.state = next;
    }

    /// The group with the given id, if any.
    pub fn group(&self, group_id: usize) -> Option<&Group> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    /// Source intervals of the current best takes, in timeline order.
    pub fn best_take_intervals(&self) -> Vec<(f64, f64)> {
        self.edit
            .best_takes
            .iter()
            .map(|entry| (entry.source_start, entry.source_end))
            .collect()
    }
}
