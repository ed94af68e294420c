//! RMS-energy voice activity classifier.
//!
//! Classifies a single fixed-size PCM frame as speech or silence by
//! comparing its normalized RMS level against a threshold selected by
//! the aggressiveness knob.

use crate::config::SessionConfig;
use crate::defaults;
use crate::error::{Result, TurngateError};
use crate::vad::classifier::FrameClassifier;

/// Stateless energy-based classifier.
///
/// Aggressiveness (0-3) is fixed at construction; higher values pick a
/// higher RMS threshold, biasing ambiguous frames toward silence.
#[derive(Debug, Clone, Copy)]
pub struct EnergyClassifier {
    frame_size_bytes: usize,
    threshold: f32,
}

impl EnergyClassifier {
    /// Create a classifier for the given session parameters.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            frame_size_bytes: config.frame_size_bytes(),
            threshold: defaults::RMS_THRESHOLDS[config.aggressiveness as usize],
        })
    }

    /// The speech threshold in effect.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl FrameClassifier for EnergyClassifier {
    fn classify(&self, frame: &[u8]) -> Result<bool> {
        if frame.len() != self.frame_size_bytes {
            return Err(TurngateError::MalformedFrame {
                expected: self.frame_size_bytes,
                actual: frame.len(),
            });
        }

        Ok(rms_of_pcm(frame) > self.threshold)
    }

    fn frame_size_bytes(&self) -> usize {
        self.frame_size_bytes
    }
}

/// Calculates the normalized Root Mean Square of 16-bit LE PCM bytes.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn rms_of_pcm(bytes: &[u8]) -> f32 {
    let samples = bytes.chunks_exact(2);
    let count = samples.len();
    if count == 0 {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .map(|pair| {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / count as f64;
    mean_square.sqrt() as f32
}
