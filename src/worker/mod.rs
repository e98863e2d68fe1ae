//! Bridge between a synchronous caller and the parser backend.
//!
//! The host calls into the backend as if it were a plain function; the
//! bridge turns that into a request/response exchange with a persistent
//! worker thread and parks the caller until the answer arrives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caller thread (blocking)                    │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                     RemoteBridge::call                    │  │
//! │  │  - fresh Signal + oneshot reply channel per call          │  │
//! │  │  - posts CallEnvelope, parks on the Signal                │  │
//! │  │  - takes the single ReplyMessage once woken               │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                   │
//! │              CallEnvelope    │    ReplyMessage + signal raise    │
//! │                              ▼                                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │          Worker thread (current-thread tokio runtime)           │
//! │  - waits once for the backend to load                           │
//! │  - dispatch → encode → reply → close → raise, for every call    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`InProcessBridge`] skips the thread and runs the same dispatch path on
//! the caller, for hosts that do not want a worker.
//!
//! # Example
//!
//! ```ignore
//! use parsebridge::worker::{Bridge, RemoteBridge, Request};
//!
//! let bridge = RemoteBridge::spawn(|| MyBackend::load())?;
//! let keys = bridge.call(Request::GetVisitorKeys)?;
//! ```

mod bridge;
mod client;
mod dispatch;
mod entry;
mod error;
mod local;
pub mod protocol;
mod signal;

pub use bridge::Bridge;
pub use client::RemoteBridge;
pub use dispatch::{dispatch, execute, Backend, BackendError, Outcome};
pub use error::{BridgeError, BridgeResult};
pub use local::InProcessBridge;
pub use protocol::{Action, ErrorKind, ErrorPayload, ReplyMessage, Request, PROTOCOL_VERSION};
