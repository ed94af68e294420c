//! Async Unix socket transport adapter.
//!
//! Accepts one connection per audio stream. Inbound messages are
//! length-prefixed (u32 little-endian) binary PCM chunks; a zero-length
//! message is a client-requested flush. Outbound messages are
//! newline-delimited JSON (`status` / `eot`). Connection close triggers a
//! final forced end-of-turn inside the session task; teardown errors are
//! suppressed (best-effort cleanup).

use crate::error::{Result, TurngateError};
use crate::session::{SessionHandle, SessionManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Upper bound on a single inbound chunk.
///
/// 16 MiB is over eight minutes of 16kHz/16-bit mono audio in one message;
/// anything larger is a framing error, not a chunk.
const MAX_CHUNK_BYTES: u32 = 16 * 1024 * 1024;

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// Unix socket server feeding audio streams into session tasks.
pub struct TransportServer {
    socket_path: PathBuf,
    state: ServerState,
    next_session: AtomicU64,
}

impl TransportServer {
    /// Create a new transport server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            state: ServerState::new(),
            next_session: AtomicU64::new(0),
        }
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("turngate.sock")
        } else {
            std::env::temp_dir().join("turngate.sock")
        }
    }

    /// Start the server and handle incoming connections.
    pub async fn start(&self, manager: SessionManager) -> Result<()> {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| TurngateError::TransportSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| TurngateError::TransportSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;
        info!(path = %self.socket_path.display(), "transport listening");

        let manager = Arc::new(manager);

        loop {
            if self.state.is_shutdown().await {
                break;
            }

            // Accept with timeout to re-check the shutdown flag
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let session_id =
                        format!("conn-{}", self.next_session.fetch_add(1, Ordering::Relaxed));
                    match manager.spawn(&session_id) {
                        Ok(handle) => {
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handle).await {
                                    debug!(session_id = %session_id, error = %e, "connection ended");
                                }
                            });
                        }
                        Err(e) => {
                            warn!(session_id = %session_id, error = %e, "failed to open session");
                        }
                    }
                }
                Ok(Err(e)) => {
                    return Err(TurngateError::TransportSocket {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| TurngateError::TransportSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Pump one connection: binary chunks in, JSON lines out.
async fn handle_connection(stream: UnixStream, handle: SessionHandle) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let SessionHandle {
        chunks,
        mut events,
    } = handle;

    // Outbound pump: session events → JSON lines. Ends when the session
    // task (and every in-flight eot dispatch) has dropped its sender.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            let json = match message.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "failed to serialize outbound message");
                    continue;
                }
            };
            if writer.write_all(json.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
            {
                break;
            }
            let _ = writer.flush().await;
        }
    });

    // Inbound pump: length-prefixed chunks → session channel.
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(_) => break, // EOF or error: client is gone
        }

        let len = u32::from_le_bytes(len_buf);
        if len > MAX_CHUNK_BYTES {
            drop(chunks);
            let _ = writer_task.await;
            return Err(TurngateError::TransportProtocol {
                message: format!("chunk length {} exceeds {} byte limit", len, MAX_CHUNK_BYTES),
            });
        }

        let mut chunk = vec![0u8; len as usize];
        if len > 0 && reader.read_exact(&mut chunk).await.is_err() {
            break;
        }

        if chunks.send(chunk).await.is_err() {
            break;
        }
    }

    // Closing the chunk channel lets the session salvage any in-flight
    // utterance; the writer drains the final eot before finishing.
    drop(chunks);
    let _ = writer_task.await;

    Ok(())
}
