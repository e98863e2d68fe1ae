//! Worker-side dispatch.
//!
//! [`dispatch`] maps a [`Request`] onto the matching [`Backend`] query.
//! [`execute`] wraps it with panic capture and encoding so both bridges
//! produce identical [`ReplyMessage`]s for the same input.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::protocol::{Action, ErrorKind, ErrorPayload, ReplyMessage, Request};
use crate::metadata::{ParseOptions, ParseOutcome, TokenLabels, TypesInfo, VisitorKeys};

/// The parser/introspection engine behind the bridge.
///
/// The four metadata queries must be deterministic for the lifetime of the
/// backend; callers memoize them.
pub trait Backend: Send + Sync + 'static {
    /// Tree type produced by [`Backend::maybe_parse`].
    type Ast: Serialize;

    fn version(&self) -> Result<String, BackendError>;

    fn types_info(&self) -> Result<TypesInfo, BackendError>;

    fn visitor_keys(&self) -> Result<VisitorKeys, BackendError>;

    fn token_labels(&self) -> Result<TokenLabels, BackendError>;

    /// Parse `source`, or answer [`ParseOutcome::Deferred`] with the options
    /// the caller should hand to its own parser.
    fn maybe_parse(
        &self,
        source: &str,
        options: &ParseOptions,
    ) -> Result<ParseOutcome<Self::Ast>, BackendError>;
}

/// Failure raised by a backend query.
///
/// Fields attached with [`BackendError::with_field`] reach the caller
/// through [`ErrorPayload::data`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub data: Map<String, Value>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }
}

impl From<BackendError> for ErrorPayload {
    fn from(err: BackendError) -> Self {
        ErrorPayload {
            data: err.data,
            ..ErrorPayload::new(ErrorKind::Dispatch, err.message)
        }
    }
}

/// Result of one dispatched request, before encoding.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome<A> {
    Version(String),
    TypesInfo(TypesInfo),
    VisitorKeys(VisitorKeys),
    TokenLabels(TokenLabels),
    Parse(ParseOutcome<A>),
}

/// Run `request` against `backend`. Backend failures pass through untouched.
pub fn dispatch<B: Backend>(backend: &B, request: &Request) -> Result<Outcome<B::Ast>, BackendError> {
    match request {
        Request::GetVersion => backend.version().map(Outcome::Version),
        Request::GetTypesInfo => backend.types_info().map(Outcome::TypesInfo),
        Request::GetVisitorKeys => backend.visitor_keys().map(Outcome::VisitorKeys),
        Request::GetTokenLabels => backend.token_labels().map(Outcome::TokenLabels),
        Request::MaybeParse { source, options } => {
            backend.maybe_parse(source, options).map(Outcome::Parse)
        }
    }
}

/// Dispatch and encode the outcome as the reply for this call.
///
/// Never fails: backend errors, panics, and values that cannot be encoded
/// all become [`ReplyMessage::Error`].
pub fn execute<B: Backend>(backend: &B, request: &Request) -> ReplyMessage {
    let action = request.action();
    match panic::catch_unwind(AssertUnwindSafe(|| dispatch(backend, request))) {
        Ok(Ok(outcome)) => encode(action, &outcome),
        Ok(Err(err)) => {
            tracing::debug!(%action, error = %err, "backend query failed");
            ReplyMessage::Error(err.into())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(%action, %message, "backend panicked");
            ReplyMessage::Error(ErrorPayload::new(ErrorKind::Panic, message))
        }
    }
}

fn encode<T: Serialize>(action: Action, value: &T) -> ReplyMessage {
    match serde_json::to_value(value) {
        Ok(value) => ReplyMessage::Result(value),
        Err(err) => {
            tracing::warn!(%action, error = %err, "result cannot be transported");
            ReplyMessage::Error(
                ErrorPayload::transport(format!("{action} result cannot be transported: {err}"))
                    .with_field("action", action.as_str()),
            )
        }
    }
}

/// Builds a backend; runs once per bridge.
pub(crate) type BackendFactory<B> = Box<dyn FnOnce() -> Result<B, BackendError> + Send>;

/// Run a backend factory, turning its failure or panic into an
/// `initialization` payload.
pub(crate) fn initialize<B: Backend>(factory: BackendFactory<B>) -> Result<B, ErrorPayload> {
    match panic::catch_unwind(AssertUnwindSafe(factory)) {
        Ok(Ok(backend)) => Ok(backend),
        Ok(Err(err)) => Err(ErrorPayload {
            data: err.data,
            ..ErrorPayload::initialization(err.message)
        }),
        Err(panic) => Err(ErrorPayload::initialization(format!(
            "backend panicked during initialization: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "backend panicked".to_string()
    }
}
