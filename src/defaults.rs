//! Canonical constants for turngate.
//!
//! Every configuration type derives its defaults from here so the framing
//! math and the config layer can never drift apart.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard rate for speech processing; higher rates add
/// bandwidth without improving voice activity decisions.
pub const SAMPLE_RATE: u32 = 16000;

/// Default frame duration in milliseconds.
///
/// 30ms frames are the canonical unit for per-frame voice activity
/// classification. At 16kHz this is 480 samples (960 bytes of 16-bit PCM).
pub const FRAME_DURATION_MS: u32 = 30;

/// Bytes per sample for 16-bit signed little-endian PCM.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Default classifier aggressiveness (0-3).
///
/// Higher values bias ambiguous frames toward silence, detecting
/// end-of-turn sooner at the cost of clipping soft trailing speech.
pub const AGGRESSIVENESS: u8 = 3;

/// Default trailing-silence duration in seconds before end-of-turn fires.
///
/// 1.5s allows for natural pauses in speech without prematurely
/// ending the speaker's turn.
pub const EOT_SILENCE_SECS: f32 = 1.5;

/// RMS thresholds indexed by aggressiveness (0-3).
///
/// Frames with normalized RMS at or below the threshold are silence.
/// Index 2 matches the 0.02 level tuned for typical microphone input.
pub const RMS_THRESHOLDS: [f32; 4] = [0.008, 0.012, 0.02, 0.03];

/// Default bounded-channel capacity for per-session message passing.
///
/// Large enough to absorb transport jitter without ballooning memory;
/// a full channel applies backpressure to the transport loop.
pub const CHANNEL_BUFFER_SIZE: usize = 100;

/// Derived frame size in samples for a given rate and duration.
pub const fn frame_size_samples(sample_rate: u32, frame_duration_ms: u32) -> usize {
    (sample_rate as usize * frame_duration_ms as usize) / 1000
}

/// Derived frame size in bytes of 16-bit PCM.
pub const fn frame_size_bytes(sample_rate: u32, frame_duration_ms: u32) -> usize {
    frame_size_samples(sample_rate, frame_duration_ms) * BYTES_PER_SAMPLE
}
