//! Session errors.

use present_core::ProtocolError;

/// Why a session ended.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The client closed the connection.
    #[error("Connection closed")]
    Closed,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
