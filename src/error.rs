//! Error types for turngate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurngateError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Frame classification errors
    #[error("Malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("Frame classification failed: {message}")]
    Classifier { message: String },

    // Transcription errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Transport errors
    #[error("Transport socket error: {message}")]
    TransportSocket { message: String },

    #[error("Transport protocol error: {message}")]
    TransportProtocol { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, TurngateError>;
