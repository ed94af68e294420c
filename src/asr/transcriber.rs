use crate::error::{Result, TurngateError};
use std::sync::Arc;

/// Trait for utterance transcription.
///
/// This trait is the boundary to the external speech-to-text engine;
/// the segmentation core only ever hands it a complete utterance buffer.
/// `Ok(None)` is the explicit "no transcript" outcome (e.g. the engine
/// found no speech); implementors trim whitespace and never return an
/// empty `Some`.
pub trait Transcriber: Send + Sync {
    /// Transcribe a complete utterance.
    ///
    /// # Arguments
    /// * `audio` - Raw audio bytes (16kHz, 16-bit LE, mono PCM)
    ///
    /// # Returns
    /// The trimmed transcript, `None` when no speech was recognized,
    /// or an error from the underlying engine
    fn transcribe(&self, audio: &[u8]) -> Result<Option<String>>;

    /// Get the name of the engine or model in use
    fn name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across sessions.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[u8]) -> Result<Option<String>> {
        (**self).transcribe(audio)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    name: String,
    response: Option<String>,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Some("mock transcript".to_string()),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific transcript
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    /// Configure the mock to report "no transcript"
    pub fn with_no_transcript(mut self) -> Self {
        self.response = None;
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[u8]) -> Result<Option<String>> {
        if self.should_fail {
            Err(TurngateError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
