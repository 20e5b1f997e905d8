use crate::protocol::ErrorCode;
use std::{io::Error as IoError, sync::Arc};
use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[cfg(test)]
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    #[error(transparent)]
    IoError(#[from] IoError),

    #[error(transparent)]
    Protocol(#[from] crate::protocol::Error),

    #[error("camera reported error: {0}")]
    Camera(ErrorCode),

    #[error("malformed reply: {}", hex::encode(.0))]
    MalformedReply(Vec<u8>),

    /// The connection failed while the command was queued or outstanding.
    ///
    /// Every command on the link gets a handle to the same error.
    #[error("transport error: {0}")]
    Transport(Arc<IoError>),

    #[error("disconnected")]
    Disconnected,

    #[error("timeout waiting for response")]
    Timeout,

    #[error("command superseded by a newer command")]
    Superseded,

    #[error("channel unavailable, likely dropped")]
    ChannelUnavailable,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// `true` if a command was rejected before it was sent, because of a bad
    /// parameter.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::Protocol(e) if e.is_invalid_argument())
    }

    /// `true` if the connection to the camera failed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Disconnected | Error::IoError(_)
        )
    }
}
