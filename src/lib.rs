//! turngate - Real-time end-of-turn detection for speech streams
//!
//! Segments a continuous PCM audio stream into utterances by watching for
//! sustained silence after speech, then hands each completed utterance to
//! an optional transcriber and downstream workflow trigger.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod asr;
pub mod config;
pub mod defaults;
pub mod error;
pub mod protocol;
pub mod segment;
pub mod session;
pub mod transport;
pub mod vad;
pub mod workflow;

// Core traits (classify → segment → transcribe)
pub use asr::{MockTranscriber, Transcriber};
pub use vad::{EnergyClassifier, FrameClassifier, ScriptedClassifier};
pub use workflow::{NullTrigger, WorkflowEvent, WorkflowTrigger};

// Segmentation
pub use segment::{FrameAssembler, TurnSegmenter, TurnState};
pub use session::{SessionHandle, SessionManager, StreamSession, Utterance};

// Wire protocol
pub use protocol::OutboundMessage;

// Error handling
pub use error::{Result, TurngateError};

// Config
pub use config::{Config, SessionConfig};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
