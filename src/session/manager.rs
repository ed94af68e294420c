//! Session manager: one task per connection.
//!
//! Each session task owns its `StreamSession` outright and receives chunks
//! over a bounded channel, so audio for one connection is processed strictly
//! in arrival order while independent sessions run fully in parallel.
//! Transcription runs on a blocking worker and never stalls chunk ingestion.

use crate::asr::Transcriber;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::protocol::OutboundMessage;
use crate::segment::TurnState;
use crate::session::stream::{StreamSession, Utterance};
use crate::workflow::{AudioMetadata, NullTrigger, WorkflowEvent, WorkflowTrigger};
use crate::defaults;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Handle to a spawned session task.
///
/// Dropping `chunks` (or the whole handle) closes the inbound side; the
/// task then performs a final forced end-of-turn to salvage any in-flight
/// utterance before exiting.
pub struct SessionHandle {
    /// Inbound raw PCM chunks. An empty chunk is a client-requested flush.
    pub chunks: mpsc::Sender<Vec<u8>>,
    /// Outbound status and eot messages.
    pub events: mpsc::Receiver<OutboundMessage>,
}

/// Factory for per-connection session tasks.
///
/// Shared collaborators (transcriber, workflow trigger) are held behind
/// `Arc` and cloned into each task; sessions share no mutable state.
pub struct SessionManager {
    config: SessionConfig,
    transcriber: Option<Arc<dyn Transcriber>>,
    workflow: Arc<dyn WorkflowTrigger>,
    channel_buffer: usize,
}

impl SessionManager {
    /// Creates a manager without a transcriber (eot messages will carry
    /// `transcript: null`) and with the workflow trigger disabled.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            transcriber: None,
            workflow: Arc::new(NullTrigger),
            channel_buffer: defaults::CHANNEL_BUFFER_SIZE,
        }
    }

    /// Attaches the transcription collaborator.
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Attaches the downstream workflow trigger.
    pub fn with_workflow(mut self, workflow: Arc<dyn WorkflowTrigger>) -> Self {
        self.workflow = workflow;
        self
    }

    /// Spawns a session task for one connection.
    pub fn spawn(&self, session_id: impl Into<String>) -> Result<SessionHandle> {
        let session_id = session_id.into();
        let session = StreamSession::with_energy_classifier(self.config)?;

        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<u8>>(self.channel_buffer);
        let (event_tx, event_rx) = mpsc::channel::<OutboundMessage>(self.channel_buffer);

        let ctx = SessionContext {
            session_id: session_id.clone(),
            sample_rate: self.config.sample_rate,
            transcriber: self.transcriber.clone(),
            workflow: Arc::clone(&self.workflow),
            events: event_tx,
        };

        info!(
            session_id = %session_id,
            eot_threshold = self.config.eot_frame_threshold(),
            "session opened"
        );
        tokio::spawn(run_session(session, chunk_rx, ctx));

        Ok(SessionHandle {
            chunks: chunk_tx,
            events: event_rx,
        })
    }
}

/// Shared pieces a session task needs when an utterance completes.
#[derive(Clone)]
struct SessionContext {
    session_id: String,
    sample_rate: u32,
    transcriber: Option<Arc<dyn Transcriber>>,
    workflow: Arc<dyn WorkflowTrigger>,
    events: mpsc::Sender<OutboundMessage>,
}

/// Session task body: chunks in, status/eot messages out.
async fn run_session(
    mut session: StreamSession,
    mut chunks: mpsc::Receiver<Vec<u8>>,
    ctx: SessionContext,
) {
    while let Some(chunk) = chunks.recv().await {
        if chunk.is_empty() {
            // Client-requested flush
            if let Some(utterance) = session.force_eot() {
                dispatch_eot(utterance, session.state(), ctx.clone());
            }
            continue;
        }

        match session.process_chunk(&chunk) {
            Some(utterance) => {
                dispatch_eot(utterance, session.state(), ctx.clone());
            }
            None => {
                let status = OutboundMessage::Status {
                    vad_state: session.state(),
                };
                if ctx.events.send(status).await.is_err() {
                    debug!(session_id = %ctx.session_id, "client gone, closing session");
                    return;
                }
            }
        }
    }

    // Inbound side closed: salvage any in-flight utterance, best effort.
    if let Some(utterance) = session.force_eot() {
        debug!(
            session_id = %ctx.session_id,
            bytes = utterance.size_bytes(),
            "salvaging utterance on disconnect"
        );
        dispatch_eot(utterance, session.state(), ctx.clone());
    }
    info!(session_id = %ctx.session_id, "session closed");
}

/// Transcribes one completed utterance and emits the eot message.
///
/// Runs detached so the session task keeps ingesting chunks while the
/// transcription is in flight. A transcription error is reported as
/// "no transcript"; the workflow trigger fires only for real transcripts.
fn dispatch_eot(utterance: Utterance, vad_state: TurnState, ctx: SessionContext) {
    tokio::spawn(async move {
        let audio_size = utterance.size_bytes();
        let duration_ms = utterance.duration_ms(ctx.sample_rate);

        let transcript = match ctx.transcriber {
            Some(transcriber) => {
                let audio = utterance.audio;
                match tokio::task::spawn_blocking(move || transcriber.transcribe(&audio)).await {
                    Ok(Ok(text)) => text,
                    Ok(Err(e)) => {
                        warn!(session_id = %ctx.session_id, error = %e, "transcription failed");
                        None
                    }
                    Err(e) => {
                        warn!(session_id = %ctx.session_id, error = %e, "transcription task panicked");
                        None
                    }
                }
            }
            None => None,
        };

        let step_functions_triggered = match &transcript {
            Some(text) => {
                ctx.workflow.trigger(WorkflowEvent::new(
                    text.clone(),
                    ctx.session_id.clone(),
                    AudioMetadata {
                        duration_ms,
                        size_bytes: audio_size,
                    },
                ));
                true
            }
            None => false,
        };

        info!(
            session_id = %ctx.session_id,
            audio_size,
            has_transcript = transcript.is_some(),
            "end of turn"
        );

        let message = OutboundMessage::Eot {
            transcript,
            audio_size,
            vad_state,
            step_functions_triggered,
        };
        if ctx.events.send(message).await.is_err() {
            debug!(session_id = %ctx.session_id, "client gone before eot delivery");
        }
    });
}
