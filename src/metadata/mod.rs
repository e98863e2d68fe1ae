//! Host-facing parser client.
//!
//! This module is the only surface the lint front-end uses. Callers never
//! see actions, envelopes, or signals; they call five methods on
//! [`ParserClient`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ParserClient                            │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  Cached (once per client)     │  Uncached                 │  │
//! │  │  - version()                  │  - maybe_parse()          │  │
//! │  │  - types_info()               │                           │  │
//! │  │  - visitor_keys()             │                           │  │
//! │  │  - token_labels()             │                           │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              RemoteBridge  or  InProcessBridge                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use parsebridge::config::Settings;
//! use parsebridge::metadata::{connect, ParseOptions, ParseOutcome};
//!
//! let settings = Settings::load()?;
//! let client = connect(&settings.bridge, || MyBackend::load())?;
//!
//! let version = client.version()?;
//! match client.maybe_parse::<serde_json::Value>(source, &ParseOptions::new())? {
//!     ParseOutcome::Parsed { ast } => lint(ast),
//!     ParseOutcome::Deferred { options } => lint(full_parse(source, &options)?),
//! }
//! ```

mod client;
mod types;

pub use client::{connect, ParserClient};
pub use types::*;
