//! Per-connection stream sessions and their manager.

pub mod manager;
pub mod stream;

pub use manager::{SessionHandle, SessionManager};
pub use stream::{StreamSession, Utterance};
