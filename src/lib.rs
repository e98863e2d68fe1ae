//! # parsebridge
//!
//! A blocking call bridge between a lint front-end and a parser backend.
//!
//! ## Architecture
//!
//! The host process is synchronous, but its parser backend lives on a
//! dedicated worker thread. parsebridge gives the host an ordinary,
//! blocking call interface over that thread:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              ParserClient (metadata memoized)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Bridge::call]
//! ┌─────────────────────────────────────────────────────────┐
//! │        RemoteBridge          │      InProcessBridge      │
//! │  envelope + signal + reply   │   direct call, same shape │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dispatch]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Backend (parser engine)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod logging;
pub mod metadata;
pub mod worker;

pub use config::{BridgeMode, BridgeSettings, Settings};
pub use metadata::{connect, ParseOptions, ParseOutcome, ParserClient};
pub use worker::{
    Backend, BackendError, Bridge, BridgeError, BridgeResult, InProcessBridge, RemoteBridge,
};
