//! External service integrations for silence-cutter.
//!
//! Everything the pipeline cannot compute by itself lives here, behind
//! traits: the media decoder/filter engine, the speech-to-text engine,
//! and the scoring oracle.

pub mod media;
pub mod scoring;
pub mod transcription;
