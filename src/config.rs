use crate::defaults;
use crate::error::{Result, TurngateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub vad: VadConfig,
    pub asr: AsrConfig,
}

/// Audio stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub frame_duration_ms: u32,
}

/// Voice activity detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    pub aggressiveness: u8,
    pub eot_silence_secs: f32,
}

/// Transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AsrConfig {
    pub enabled: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_duration_ms: defaults::FRAME_DURATION_MS,
        }
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            aggressiveness: defaults::AGGRESSIVENESS,
            eot_silence_secs: defaults::EOT_SILENCE_SECS,
        }
    }
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Errors for invalid TOML are propagated.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TURNGATE_AGGRESSIVENESS → vad.aggressiveness
    /// - TURNGATE_EOT_SILENCE_SECS → vad.eot_silence_secs
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("TURNGATE_AGGRESSIVENESS")
            && let Ok(aggressiveness) = value.parse()
        {
            self.vad.aggressiveness = aggressiveness;
        }

        if let Ok(value) = std::env::var("TURNGATE_EOT_SILENCE_SECS")
            && let Ok(secs) = value.parse()
        {
            self.vad.eot_silence_secs = secs;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/turngate/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("turngate")
            .join("config.toml")
    }
}

/// Immutable per-session parameters.
///
/// Validated once at session creation; every derived quantity (frame sizes,
/// end-of-turn threshold) comes from here so the framing and the state
/// machine can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Classification frame duration in milliseconds.
    pub frame_duration_ms: u32,
    /// Classifier aggressiveness (0-3, higher = more biased toward silence).
    pub aggressiveness: u8,
    /// Trailing silence duration in seconds that ends a turn.
    pub eot_silence_secs: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_duration_ms: defaults::FRAME_DURATION_MS,
            aggressiveness: defaults::AGGRESSIVENESS,
            eot_silence_secs: defaults::EOT_SILENCE_SECS,
        }
    }
}

impl SessionConfig {
    /// Build a validated session config from the root config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let session = Self {
            sample_rate: config.audio.sample_rate,
            frame_duration_ms: config.audio.frame_duration_ms,
            aggressiveness: config.vad.aggressiveness,
            eot_silence_secs: config.vad.eot_silence_secs,
        };
        session.validate()?;
        Ok(session)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.sample_rate, 8000 | 16000 | 32000 | 48000) {
            return Err(TurngateError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: format!("unsupported rate {} Hz", self.sample_rate),
            });
        }
        if !matches!(self.frame_duration_ms, 10 | 20 | 30) {
            return Err(TurngateError::ConfigInvalidValue {
                key: "audio.frame_duration_ms".to_string(),
                message: format!("must be 10, 20 or 30, got {}", self.frame_duration_ms),
            });
        }
        if self.aggressiveness > 3 {
            return Err(TurngateError::ConfigInvalidValue {
                key: "vad.aggressiveness".to_string(),
                message: format!("must be 0-3, got {}", self.aggressiveness),
            });
        }
        if !self.eot_silence_secs.is_finite() || self.eot_silence_secs <= 0.0 {
            return Err(TurngateError::ConfigInvalidValue {
                key: "vad.eot_silence_secs".to_string(),
                message: format!("must be positive, got {}", self.eot_silence_secs),
            });
        }
        Ok(())
    }

    /// Samples per classification frame.
    pub fn frame_size_samples(&self) -> usize {
        defaults::frame_size_samples(self.sample_rate, self.frame_duration_ms)
    }

    /// Bytes per classification frame (16-bit PCM).
    pub fn frame_size_bytes(&self) -> usize {
        defaults::frame_size_bytes(self.sample_rate, self.frame_duration_ms)
    }

    /// Number of consecutive silence frames that triggers end-of-turn.
    pub fn eot_frame_threshold(&self) -> u32 {
        (self.eot_silence_secs * 1000.0 / self.frame_duration_ms as f32).round() as u32
    }
}
