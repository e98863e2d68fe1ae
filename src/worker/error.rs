//! Bridge error types.

use std::io;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot::error::TryRecvError;

use super::protocol::{Action, ErrorKind, ErrorPayload};

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors a caller can observe from a bridge call.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The backend side failed; the payload is the reconstructed failure.
    #[error("{0}")]
    Remote(ErrorPayload),

    /// Failed to start the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(#[source] io::Error),

    /// The worker loop is no longer accepting calls.
    #[error("worker thread has exited")]
    WorkerExited,

    /// The reply channel closed without delivering a reply.
    #[error("reply channel closed without a reply")]
    ChannelClosed,

    /// The reply did not have the shape the action promises.
    #[error("failed to decode {action} reply: {source}")]
    Decode {
        action: Action,
        #[source]
        source: serde_json::Error,
    },

    /// An action name outside the protocol.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl BridgeError {
    /// The transported failure, if this error came from the backend side.
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Remote(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.payload().map(|payload| payload.kind)
    }

    /// A structured field carried by a backend failure (e.g. `"line"`).
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload().and_then(|payload| payload.field(name))
    }

    /// Check if this error indicates the worker has gone away.
    pub fn is_worker_exited(&self) -> bool {
        matches!(self, Self::WorkerExited | Self::ChannelClosed)
    }
}

impl From<ErrorPayload> for BridgeError {
    fn from(payload: ErrorPayload) -> Self {
        Self::Remote(payload)
    }
}

impl From<TryRecvError> for BridgeError {
    fn from(_: TryRecvError) -> Self {
        Self::ChannelClosed
    }
}
