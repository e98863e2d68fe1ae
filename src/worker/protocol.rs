//! Protocol types for bridge communication.
//!
//! A call travels to the worker as a [`CallEnvelope`] and comes back as
//! exactly one [`ReplyMessage`]. Values cross the boundary as
//! `serde_json::Value`, so anything a backend returns must survive
//! serialization to be delivered.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use uuid::Uuid;

use super::error::{BridgeError, BridgeResult};
use super::signal::Signal;
use crate::metadata::ParseOptions;

/// Version of the [`ErrorPayload`] layout.
pub const PROTOCOL_VERSION: u32 = 1;

// ============================================================================
// Actions and Requests
// ============================================================================

/// Operation tag routed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    GetVersion,
    GetTypesInfo,
    GetVisitorKeys,
    GetTokenLabels,
    MaybeParse,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::GetVersion,
        Action::GetTypesInfo,
        Action::GetVisitorKeys,
        Action::GetTokenLabels,
        Action::MaybeParse,
    ];

    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetVersion => "GET_VERSION",
            Action::GetTypesInfo => "GET_TYPES_INFO",
            Action::GetVisitorKeys => "GET_VISITOR_KEYS",
            Action::GetTokenLabels => "GET_TOKEN_LABELS",
            Action::MaybeParse => "MAYBE_PARSE",
        }
    }

    /// Whether the action answers with data that never changes for a loaded backend.
    pub fn is_metadata(&self) -> bool {
        !matches!(self, Action::MaybeParse)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownAction(s.to_string()))
    }
}

/// An action together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetVersion,
    GetTypesInfo,
    GetVisitorKeys,
    GetTokenLabels,
    MaybeParse {
        source: String,
        options: ParseOptions,
    },
}

impl Request {
    pub fn maybe_parse(source: impl Into<String>, options: ParseOptions) -> Self {
        Request::MaybeParse {
            source: source.into(),
            options,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Request::GetVersion => Action::GetVersion,
            Request::GetTypesInfo => Action::GetTypesInfo,
            Request::GetVisitorKeys => Action::GetVisitorKeys,
            Request::GetTokenLabels => Action::GetTokenLabels,
            Request::MaybeParse { .. } => Action::MaybeParse,
        }
    }
}

// ============================================================================
// Call Envelope
// ============================================================================

/// One request on its way to the worker.
///
/// Consumed exactly once by the worker loop. Dropping it on any path
/// completes the call through its [`Completion`].
#[derive(Debug)]
pub(crate) struct CallEnvelope {
    /// Log correlation only; replies are routed by the completion's channel.
    pub id: Uuid,
    pub request: Request,
    pub completion: Completion,
}

/// Worker-side half of a call: the reply endpoint and the caller's signal.
///
/// Sending the reply or dropping the completion closes the endpoint and
/// then raises the signal, in that order.
#[derive(Debug)]
pub(crate) struct Completion {
    reply: Option<oneshot::Sender<ReplyMessage>>,
    signal: Arc<Signal>,
}

impl Completion {
    pub fn new(reply: oneshot::Sender<ReplyMessage>, signal: Arc<Signal>) -> Self {
        Self {
            reply: Some(reply),
            signal,
        }
    }

    /// Deliver the reply. Returns `false` if the caller is already gone.
    pub fn complete(mut self, reply: ReplyMessage) -> bool {
        match self.reply.take() {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        drop(self.reply.take());
        self.signal.raise();
    }
}

// ============================================================================
// Replies
// ============================================================================

/// The single message sent back for a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMessage {
    Result(Value),
    Error(ErrorPayload),
}

impl ReplyMessage {
    pub fn is_error(&self) -> bool {
        matches!(self, ReplyMessage::Error(_))
    }

    /// Unwrap the reply, turning a transported error into [`BridgeError::Remote`].
    pub fn into_result(self) -> BridgeResult<Value> {
        match self {
            ReplyMessage::Result(value) => Ok(value),
            ReplyMessage::Error(payload) => Err(BridgeError::Remote(payload)),
        }
    }
}

/// Category of a transported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend failed while computing the result.
    Dispatch,
    /// The result could not be encoded for the reply channel.
    Transport,
    /// The backend never finished loading.
    Initialization,
    /// The backend panicked.
    Panic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Dispatch => "dispatch",
            ErrorKind::Transport => "transport",
            ErrorKind::Initialization => "initialization",
            ErrorKind::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// A failure in transportable form.
///
/// Carries a fixed set of fields; anything else a backend wants the caller
/// to see (line numbers, error codes) goes in `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub version: u32,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl ErrorPayload {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialization, message)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}
