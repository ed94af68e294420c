//! JSON message protocol for the outbound side of the audio transport.
//!
//! Inbound messages are raw binary PCM chunks and carry no JSON framing;
//! only the outbound status/eot notifications are serialized here.

use crate::segment::TurnState;
use serde::{Deserialize, Serialize};

/// Messages sent to the client over the transport channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Periodic state update after a non-empty chunk without end-of-turn.
    Status { vad_state: TurnState },
    /// One utterance completed; carries the derived transcript and
    /// metadata, never the raw audio.
    Eot {
        transcript: Option<String>,
        audio_size: usize,
        vad_state: TurnState,
        step_functions_triggered: bool,
    },
}

impl OutboundMessage {
    /// Serialize message to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> TurnState {
        TurnState {
            buffer_size: 1920,
            silence_frames: 2,
            speech_frames: 0,
            in_speech: true,
            eot_threshold: 50,
        }
    }

    #[test]
    fn test_status_json_roundtrip() {
        let msg = OutboundMessage::Status {
            vad_state: sample_state(),
        };
        let json = msg.to_json().expect("should serialize");
        let deserialized = OutboundMessage::from_json(&json).expect("should deserialize");
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_status_json_format() {
        let msg = OutboundMessage::Status {
            vad_state: sample_state(),
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"status\""), "got: {}", json);
        assert!(json.contains("\"buffer_size\":1920"));
        assert!(json.contains("\"silence_frames\":2"));
        assert!(json.contains("\"speech_frames\":0"));
        assert!(json.contains("\"in_speech\":true"));
        assert!(json.contains("\"eot_threshold\":50"));
    }

    #[test]
    fn test_eot_json_roundtrip() {
        let msg = OutboundMessage::Eot {
            transcript: Some("hello world".to_string()),
            audio_size: 48960,
            vad_state: sample_state(),
            step_functions_triggered: true,
        };
        let json = msg.to_json().expect("should serialize");
        let deserialized = OutboundMessage::from_json(&json).expect("should deserialize");
        assert_eq!(msg, deserialized);
        assert!(json.contains("\"type\":\"eot\""));
        assert!(json.contains("\"transcript\":\"hello world\""));
        assert!(json.contains("\"audio_size\":48960"));
        assert!(json.contains("\"step_functions_triggered\":true"));
    }

    #[test]
    fn test_eot_null_transcript() {
        let msg = OutboundMessage::Eot {
            transcript: None,
            audio_size: 960,
            vad_state: sample_state(),
            step_functions_triggered: false,
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"transcript\":null"), "got: {}", json);

        let deserialized = OutboundMessage::from_json(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_invalid_json_returns_error() {
        assert!(OutboundMessage::from_json(r#"{"type": "unknown"}"#).is_err());
        assert!(OutboundMessage::from_json(r#"{"no_type": true}"#).is_err());
        assert!(OutboundMessage::from_json("not json at all").is_err());
    }

    #[test]
    fn test_transcript_with_special_chars() {
        let msg = OutboundMessage::Eot {
            transcript: Some(r#"he said "stop" and \n left"#.to_string()),
            audio_size: 10,
            vad_state: sample_state(),
            step_functions_triggered: false,
        };
        let json = msg.to_json().expect("should serialize");
        let deserialized = OutboundMessage::from_json(&json).expect("should deserialize");
        assert_eq!(msg, deserialized);
    }
}
