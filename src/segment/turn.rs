//! End-of-turn state machine.
//!
//! Consumes classified frames and decides when a speaker has finished an
//! utterance: a run of trailing silence of configured length after speech
//! was observed. Owns the accumulated utterance buffer and guarantees a
//! full reset on every emission so consecutive utterances never bleed.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Read-only snapshot of the segmenter, also the `vad_state` wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Current utterance buffer length in bytes.
    pub buffer_size: usize,
    /// Consecutive silence frames observed.
    pub silence_frames: u32,
    /// Consecutive speech frames observed.
    pub speech_frames: u32,
    /// Whether speech has been observed since the last reset.
    pub in_speech: bool,
    /// Silence frames required to end a turn.
    pub eot_threshold: u32,
}

/// Turn segmenter state machine.
///
/// Two logical states: idle (no speech yet) and speaking (watching for
/// trailing silence). End-of-turn transitions straight back to a fresh
/// idle state; there is no terminal state.
pub struct TurnSegmenter {
    eot_threshold: u32,
    utterance: Vec<u8>,
    speech_frames: u32,
    silence_frames: u32,
    in_speech: bool,
}

impl TurnSegmenter {
    /// Creates an idle segmenter with the given end-of-turn threshold.
    pub fn new(eot_threshold: u32) -> Self {
        Self {
            eot_threshold,
            utterance: Vec::new(),
            speech_frames: 0,
            silence_frames: 0,
            in_speech: false,
        }
    }

    /// Advances the state machine by one classified frame.
    ///
    /// The frame's bytes are always appended to the utterance buffer,
    /// regardless of classification. The counters track consecutive run
    /// lengths: a speech frame zeroes the silence run and vice versa.
    ///
    /// Returns the complete utterance buffer when this frame completes a
    /// turn (speech was observed and the trailing-silence run reached the
    /// threshold); the segmenter is fully reset in the same call.
    pub fn on_frame(&mut self, frame: &[u8], is_speech: bool) -> Option<Vec<u8>> {
        self.utterance.extend_from_slice(frame);

        if is_speech {
            self.speech_frames += 1;
            self.silence_frames = 0;
            self.in_speech = true;
            debug!(speech_frames = self.speech_frames, "speech frame");
        } else {
            self.silence_frames += 1;
            self.speech_frames = 0;
            debug!(silence_frames = self.silence_frames, "silence frame");
        }

        if self.in_speech && self.silence_frames >= self.eot_threshold {
            debug!(
                buffer_size = self.utterance.len(),
                silence_frames = self.silence_frames,
                "end of turn"
            );
            return Some(self.capture_and_reset());
        }

        None
    }

    /// Appends raw bytes to the utterance buffer without classification.
    ///
    /// Used to flush a sub-frame remainder into the buffer before a forced
    /// end-of-turn, so no received byte of a live utterance is lost.
    pub fn append_unclassified(&mut self, bytes: &[u8]) {
        self.utterance.extend_from_slice(bytes);
    }

    /// Forces an end-of-turn, e.g. on disconnect or timeout.
    ///
    /// Returns the utterance buffer only if speech was observed and the
    /// buffer is non-empty; silence-only audio is never an utterance.
    /// State is reset either way.
    pub fn force_eot(&mut self) -> Option<Vec<u8>> {
        if self.in_speech && !self.utterance.is_empty() {
            debug!(buffer_size = self.utterance.len(), "forced end of turn");
            Some(self.capture_and_reset())
        } else {
            self.reset();
            None
        }
    }

    /// Read-only snapshot for monitoring; never mutates state.
    pub fn state(&self) -> TurnState {
        TurnState {
            buffer_size: self.utterance.len(),
            silence_frames: self.silence_frames,
            speech_frames: self.speech_frames,
            in_speech: self.in_speech,
            eot_threshold: self.eot_threshold,
        }
    }

    /// Resets all counters and discards any buffered audio.
    pub fn reset(&mut self) {
        self.utterance = Vec::new();
        self.speech_frames = 0;
        self.silence_frames = 0;
        self.in_speech = false;
    }

    fn capture_and_reset(&mut self) -> Vec<u8> {
        let captured = std::mem::take(&mut self.utterance);
        self.reset();
        captured
    }
}
