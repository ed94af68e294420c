//! Per-connection stream session.
//!
//! Binds one frame assembler, one classifier and one turn segmenter to a
//! logical audio stream. `process_chunk` is the sole inbound entry point;
//! the session cycles through accumulate → emit → reset once per utterance
//! without being recreated.

use crate::config::SessionConfig;
use crate::error::{Result, TurngateError};
use crate::segment::{FrameAssembler, TurnSegmenter, TurnState};
use crate::vad::{EnergyClassifier, FrameClassifier};
use tracing::warn;

/// A completed utterance captured at end-of-turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Full recorded audio, from first frame after reset through the
    /// trailing silence that ended the turn.
    pub audio: Vec<u8>,
}

impl Utterance {
    /// Audio length in bytes.
    pub fn size_bytes(&self) -> usize {
        self.audio.len()
    }

    /// Duration in milliseconds for 16-bit mono PCM at the given rate.
    pub fn duration_ms(&self, sample_rate: u32) -> u64 {
        let samples = (self.audio.len() / 2) as u64;
        samples * 1000 / sample_rate as u64
    }
}

/// Stream session orchestrating assembler → classifier → segmenter.
pub struct StreamSession {
    config: SessionConfig,
    assembler: FrameAssembler,
    classifier: Box<dyn FrameClassifier>,
    segmenter: TurnSegmenter,
}

impl StreamSession {
    /// Creates a session from a validated config and a classifier.
    ///
    /// The classifier's frame size must agree with the config; a mismatch
    /// here would make every frame malformed.
    pub fn new(config: SessionConfig, classifier: Box<dyn FrameClassifier>) -> Result<Self> {
        config.validate()?;
        if classifier.frame_size_bytes() != config.frame_size_bytes() {
            return Err(TurngateError::ConfigInvalidValue {
                key: "classifier.frame_size_bytes".to_string(),
                message: format!(
                    "classifier expects {} bytes, session frames are {}",
                    classifier.frame_size_bytes(),
                    config.frame_size_bytes()
                ),
            });
        }
        Ok(Self {
            assembler: FrameAssembler::new(config.frame_size_bytes()),
            segmenter: TurnSegmenter::new(config.eot_frame_threshold()),
            classifier,
            config,
        })
    }

    /// Creates a session backed by the built-in energy classifier.
    pub fn with_energy_classifier(config: SessionConfig) -> Result<Self> {
        let classifier = EnergyClassifier::new(&config)?;
        Self::new(config, Box::new(classifier))
    }

    /// Processes one inbound chunk of raw PCM bytes.
    ///
    /// Contract: at most one utterance is emitted per call. Processing
    /// stops at the first end-of-turn; already-assembled frames from the
    /// same chunk beyond that point are discarded, so the next utterance
    /// starts from a clean boundary. The sub-frame remainder held by the
    /// assembler is flushed into the emitted utterance, matching the
    /// forced path: every buffered byte of the turn is part of the
    /// payload.
    ///
    /// A classifier failure abandons classification for the rest of the
    /// chunk and returns `None`. The affected frames are still kept in the
    /// utterance buffer (unclassified, counters untouched) so no audio is
    /// lost, and the session stays usable for the next chunk.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Option<Utterance> {
        let frames = self.assembler.feed(chunk);

        for (idx, frame) in frames.iter().enumerate() {
            let is_speech = match self.classifier.classify(frame) {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(error = %e, "classifier failed, keeping remaining frames unclassified");
                    for unclassified in &frames[idx..] {
                        self.segmenter.append_unclassified(unclassified);
                    }
                    return None;
                }
            };

            if let Some(mut audio) = self.segmenter.on_frame(frame, is_speech) {
                audio.extend_from_slice(&self.assembler.take_pending());
                return Some(Utterance { audio });
            }
        }

        None
    }

    /// Forces an end-of-turn, salvaging any in-flight utterance.
    ///
    /// The sub-frame remainder held by the assembler is flushed into the
    /// utterance buffer first, so every received byte of a live utterance
    /// is part of the salvage. Returns `None` when no speech was observed.
    pub fn force_eot(&mut self) -> Option<Utterance> {
        let pending = self.assembler.take_pending();
        if !pending.is_empty() {
            self.segmenter.append_unclassified(&pending);
        }
        self.segmenter.force_eot().map(|audio| Utterance { audio })
    }

    /// Read-only state snapshot for monitoring.
    pub fn state(&self) -> TurnState {
        self.segmenter.state()
    }

    /// The immutable session parameters.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vad::classifier::{ScriptedClassifier, ScriptedDecision};

    const FRAME: usize = 960;

    fn speech_bytes(frames: usize) -> Vec<u8> {
        // Amplitude 3000 → RMS ~0.09, above every threshold
        3000i16.to_le_bytes().repeat(frames * FRAME / 2)
    }

    fn silence_bytes(frames: usize) -> Vec<u8> {
        vec![0u8; frames * FRAME]
    }

    fn energy_session() -> StreamSession {
        StreamSession::with_energy_classifier(SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut session = energy_session();
        assert!(session.process_chunk(&[]).is_none());
        assert_eq!(session.state().buffer_size, 0);
    }

    #[test]
    fn test_canonical_scenario_51_frames() {
        // 16kHz, 30ms frames, 1.5s silence → threshold 50. One speech frame
        // plus 50 silence frames completes a turn of 51 frames (48960 bytes).
        let mut session = energy_session();

        assert!(session.process_chunk(&speech_bytes(1)).is_none());
        for _ in 0..49 {
            assert!(session.process_chunk(&silence_bytes(1)).is_none());
        }

        let utterance = session.process_chunk(&silence_bytes(1)).unwrap();
        assert_eq!(utterance.size_bytes(), 48960);
        assert_eq!(utterance.duration_ms(16000), 51 * 30);
    }

    #[test]
    fn test_state_resets_after_eot() {
        let mut session = energy_session();
        session.process_chunk(&speech_bytes(1));
        session.process_chunk(&silence_bytes(50)).unwrap();

        let state = session.state();
        assert_eq!(state.buffer_size, 0);
        assert_eq!(state.speech_frames, 0);
        assert_eq!(state.silence_frames, 0);
        assert!(!state.in_speech);
    }

    #[test]
    fn test_chunks_split_mid_frame() {
        let mut session = energy_session();
        let stream = speech_bytes(3);

        // 1.5 frames then 1.5 frames: 3 classified, none malformed
        session.process_chunk(&stream[..FRAME * 3 / 2]);
        session.process_chunk(&stream[FRAME * 3 / 2..]);

        let state = session.state();
        assert_eq!(state.buffer_size, FRAME * 3);
        assert_eq!(state.speech_frames, 3);
    }

    #[test]
    fn test_silence_only_stream_never_fires() {
        let mut session = energy_session();
        for _ in 0..120 {
            assert!(session.process_chunk(&silence_bytes(1)).is_none());
        }
        assert!(!session.state().in_speech);
        assert!(session.force_eot().is_none());
    }

    #[test]
    fn test_at_most_one_utterance_per_call() {
        // Threshold 2 via a scripted classifier; one chunk carrying two
        // full speech+silence cycles still emits only the first utterance.
        let config = SessionConfig {
            eot_silence_secs: 0.06,
            ..Default::default()
        };
        assert_eq!(config.eot_frame_threshold(), 2);

        let script = vec![
            ScriptedDecision::Speech,
            ScriptedDecision::Silence,
            ScriptedDecision::Silence,
            ScriptedDecision::Speech,
            ScriptedDecision::Silence,
            ScriptedDecision::Silence,
        ];
        let classifier = ScriptedClassifier::new(FRAME, script);
        let mut session = StreamSession::new(config, Box::new(classifier)).unwrap();

        let utterance = session.process_chunk(&silence_bytes(6)).unwrap();
        assert_eq!(utterance.size_bytes(), FRAME * 3);

        // Frames beyond the first end-of-turn were discarded
        let state = session.state();
        assert_eq!(state.buffer_size, 0);
        assert!(!state.in_speech);
    }

    #[test]
    fn test_eot_payload_includes_pending_remainder() {
        let mut session = energy_session();
        session.process_chunk(&speech_bytes(1));

        // 50 silence frames plus half a frame in one chunk: the half frame
        // rides along in the emitted payload, same as the forced path
        let mut chunk = silence_bytes(50);
        chunk.extend_from_slice(&silence_bytes(1)[..FRAME / 2]);
        let utterance = session.process_chunk(&chunk).unwrap();
        assert_eq!(utterance.size_bytes(), 48960 + FRAME / 2);

        // It does not also leak into the next utterance
        assert!(session.process_chunk(&speech_bytes(1)).is_none());
        assert_eq!(session.state().buffer_size, FRAME);
    }

    #[test]
    fn test_classifier_failure_keeps_session_alive() {
        let script = vec![
            ScriptedDecision::Speech,
            ScriptedDecision::Fail,
            ScriptedDecision::Speech,
        ];
        let classifier = ScriptedClassifier::new(FRAME, script);
        let mut session =
            StreamSession::new(SessionConfig::default(), Box::new(classifier)).unwrap();

        assert!(session.process_chunk(&silence_bytes(2)).is_none());
        // First frame landed before the failure; the failing frame's bytes
        // were kept without touching the counters
        let state = session.state();
        assert_eq!(state.speech_frames, 1);
        assert_eq!(state.buffer_size, FRAME * 2);

        // The session keeps classifying subsequent chunks
        assert!(session.process_chunk(&silence_bytes(1)).is_none());
        assert_eq!(session.state().speech_frames, 2);
        assert_eq!(session.state().buffer_size, FRAME * 3);
    }

    #[test]
    fn test_force_eot_salvages_remainder_bytes() {
        let mut session = energy_session();
        session.process_chunk(&speech_bytes(1));
        session.process_chunk(&silence_bytes(1)[..100].to_vec());

        let utterance = session.force_eot().unwrap();
        assert_eq!(utterance.size_bytes(), FRAME + 100);
        assert_eq!(session.state().buffer_size, 0);
    }

    #[test]
    fn test_force_eot_without_speech_discards_remainder() {
        let mut session = energy_session();
        session.process_chunk(&silence_bytes(1)[..100].to_vec());

        assert!(session.force_eot().is_none());
        // Pending remainder was cleared, not carried forward
        let mut chunk = silence_bytes(1);
        chunk.truncate(FRAME - 100);
        assert!(session.process_chunk(&chunk).is_none());
        assert_eq!(session.state().buffer_size, 0);
    }

    #[test]
    fn test_frame_size_mismatch_rejected_at_construction() {
        let classifier = ScriptedClassifier::always_silence(FRAME / 2);
        let result = StreamSession::new(SessionConfig::default(), Box::new(classifier));
        assert!(result.is_err());
    }

    #[test]
    fn test_consecutive_utterances_are_independent() {
        let mut session = energy_session();

        session.process_chunk(&speech_bytes(2));
        let first = session.process_chunk(&silence_bytes(50)).unwrap();
        assert_eq!(first.size_bytes(), FRAME * 52);

        session.process_chunk(&speech_bytes(1));
        let second = session.process_chunk(&silence_bytes(50)).unwrap();
        assert_eq!(second.size_bytes(), FRAME * 51);
    }
}
