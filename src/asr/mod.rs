//! Transcription collaborator boundary.

pub mod transcriber;

pub use transcriber::{MockTranscriber, Transcriber};
