use crate::error::{Result, TurngateError};
use std::sync::Arc;
use std::sync::Mutex;

/// Trait for per-frame speech/silence classification.
///
/// This trait allows swapping implementations (real energy-based VAD vs
/// scripted test doubles). Implementations hold no per-stream state: the
/// same frame always yields the same decision.
pub trait FrameClassifier: Send + Sync {
    /// Classify exactly one frame of 16-bit LE mono PCM.
    ///
    /// # Arguments
    /// * `frame` - Frame bytes; length must exactly match the configured frame size
    ///
    /// # Returns
    /// `true` for speech, `false` for silence, or an error for malformed input
    fn classify(&self, frame: &[u8]) -> Result<bool>;

    /// Expected frame size in bytes.
    fn frame_size_bytes(&self) -> usize;
}

/// Implement FrameClassifier for Arc<T> to allow sharing across sessions.
impl<T: FrameClassifier> FrameClassifier for Arc<T> {
    fn classify(&self, frame: &[u8]) -> Result<bool> {
        (**self).classify(frame)
    }

    fn frame_size_bytes(&self) -> usize {
        (**self).frame_size_bytes()
    }
}

/// One scripted outcome for the test classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedDecision {
    Speech,
    Silence,
    Fail,
}

/// Test classifier that replays a fixed sequence of decisions.
///
/// Once the script is exhausted, every further frame is silence. Frames
/// of the wrong size are still rejected, matching the real classifier.
pub struct ScriptedClassifier {
    frame_size_bytes: usize,
    script: Mutex<Vec<ScriptedDecision>>,
    cursor: Mutex<usize>,
}

impl ScriptedClassifier {
    /// Create a classifier replaying the given decisions in order.
    pub fn new(frame_size_bytes: usize, script: Vec<ScriptedDecision>) -> Self {
        Self {
            frame_size_bytes,
            script: Mutex::new(script),
            cursor: Mutex::new(0),
        }
    }

    /// Shorthand: `n` speech frames followed by endless silence.
    pub fn speech_then_silence(frame_size_bytes: usize, n: usize) -> Self {
        Self::new(frame_size_bytes, vec![ScriptedDecision::Speech; n])
    }

    /// Shorthand: everything is silence.
    pub fn always_silence(frame_size_bytes: usize) -> Self {
        Self::new(frame_size_bytes, Vec::new())
    }
}

impl FrameClassifier for ScriptedClassifier {
    fn classify(&self, frame: &[u8]) -> Result<bool> {
        if frame.len() != self.frame_size_bytes {
            return Err(TurngateError::MalformedFrame {
                expected: self.frame_size_bytes,
                actual: frame.len(),
            });
        }

        let script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let decision = script.get(*cursor).copied();
        *cursor += 1;

        match decision {
            Some(ScriptedDecision::Speech) => Ok(true),
            Some(ScriptedDecision::Silence) | None => Ok(false),
            Some(ScriptedDecision::Fail) => Err(TurngateError::Classifier {
                message: "scripted classifier failure".to_string(),
            }),
        }
    }

    fn frame_size_bytes(&self) -> usize {
        self.frame_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_classifier_replays_script() {
        let classifier = ScriptedClassifier::new(
            4,
            vec![
                ScriptedDecision::Speech,
                ScriptedDecision::Silence,
                ScriptedDecision::Speech,
            ],
        );
        let frame = [0u8; 4];

        assert!(classifier.classify(&frame).unwrap());
        assert!(!classifier.classify(&frame).unwrap());
        assert!(classifier.classify(&frame).unwrap());
        // Exhausted script falls back to silence
        assert!(!classifier.classify(&frame).unwrap());
    }

    #[test]
    fn test_scripted_classifier_rejects_wrong_size() {
        let classifier = ScriptedClassifier::always_silence(4);
        let result = classifier.classify(&[0u8; 3]);
        assert!(matches!(
            result,
            Err(TurngateError::MalformedFrame {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_scripted_classifier_failure_injection() {
        let classifier = ScriptedClassifier::new(2, vec![ScriptedDecision::Fail]);
        let result = classifier.classify(&[0u8; 2]);
        assert!(matches!(result, Err(TurngateError::Classifier { .. })));
    }

    #[test]
    fn test_classifier_trait_is_object_safe() {
        let classifier: Box<dyn FrameClassifier> = Box::new(ScriptedClassifier::always_silence(2));
        assert_eq!(classifier.frame_size_bytes(), 2);
        assert!(!classifier.classify(&[0u8; 2]).unwrap());
    }

    #[test]
    fn test_arc_classifier_shares_script() {
        let classifier = Arc::new(ScriptedClassifier::speech_then_silence(2, 1));
        let frame = [0u8; 2];

        assert!(classifier.classify(&frame).unwrap());
        assert!(!classifier.classify(&frame).unwrap());
    }
}
