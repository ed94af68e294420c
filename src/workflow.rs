//! Downstream workflow trigger boundary.
//!
//! When an utterance yields a transcript, the session manager fires a
//! workflow event downstream. The call is fire-and-forget: the core never
//! awaits its completion and never retries.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Metadata describing the audio an event was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub duration_ms: u64,
    pub size_bytes: usize,
}

/// Event handed to the downstream workflow on a transcribed utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub utterance: String,
    pub session_id: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub audio_metadata: AudioMetadata,
}

impl WorkflowEvent {
    /// Builds an event stamped with the current wall-clock time.
    pub fn new(utterance: String, session_id: String, audio_metadata: AudioMetadata) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            utterance,
            session_id,
            timestamp,
            audio_metadata,
        }
    }
}

/// Trait for triggering a downstream workflow.
pub trait WorkflowTrigger: Send + Sync {
    /// Hand off one event. Must not block and must not fail into the core.
    fn trigger(&self, event: WorkflowEvent);
}

/// Trigger that drops every event, for deployments without a workflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrigger;

impl WorkflowTrigger for NullTrigger {
    fn trigger(&self, event: WorkflowEvent) {
        debug!(session_id = %event.session_id, "workflow trigger disabled, dropping event");
    }
}

/// Trigger that records events in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingTrigger {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl WorkflowTrigger for RecordingTrigger {
    fn trigger(&self, event: WorkflowEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
