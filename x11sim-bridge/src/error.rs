use std::time::Duration;

use thiserror::Error;
use x11sim_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection setup refused (server protocol {major}.{minor}): {reason}")]
    SetupFailed {
        major: u16,
        minor: u16,
        reason: String,
    },

    #[error("reply channel closed before a reply arrived")]
    ReplyChannelClosed,

    #[error("no reply within {0:?}")]
    ReplyTimeout(Duration),

    #[error("reader task failed: {0}")]
    ReaderTask(String),
}

impl SessionError {
    /// True when the channel itself can no longer be used.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::ReplyTimeout(_))
    }
}
