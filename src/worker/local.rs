//! In-process bridge.
//!
//! Runs the dispatcher on the calling thread. Replies go through the same
//! [`execute`] path as on the worker, so results and failures have the same
//! shape as with [`RemoteBridge`](super::RemoteBridge), including transport
//! failures for values that cannot be encoded.

use std::sync::{Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use super::bridge::Bridge;
use super::dispatch::{execute, initialize, Backend, BackendError, BackendFactory};
use super::error::BridgeResult;
use super::protocol::{ErrorPayload, Request};

/// Bridge that calls the backend directly, with no thread or channel.
pub struct InProcessBridge<B> {
    factory: Mutex<Option<BackendFactory<B>>>,
    backend: OnceCell<Result<B, ErrorPayload>>,
}

impl<B: Backend> InProcessBridge<B> {
    /// Wrap a loaded backend.
    pub fn new(backend: B) -> Self {
        Self {
            factory: Mutex::new(None),
            backend: OnceCell::with_value(Ok(backend)),
        }
    }

    /// Defer loading the backend to the first call.
    ///
    /// A failed load is remembered and reported to every call, as the worker
    /// does.
    pub fn lazy<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<B, BackendError> + Send + 'static,
    {
        Self {
            factory: Mutex::new(Some(Box::new(factory))),
            backend: OnceCell::new(),
        }
    }

    /// The backend, if it has been loaded successfully.
    pub fn backend(&self) -> Option<&B> {
        self.backend.get().and_then(|loaded| loaded.as_ref().ok())
    }

    fn load(&self) -> Result<&B, ErrorPayload> {
        let loaded = self.backend.get_or_init(|| {
            let factory = self
                .factory
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let Some(factory) = factory else {
                return Err(ErrorPayload::initialization("backend factory already consumed"));
            };
            let loaded = initialize(factory);
            if loaded.is_ok() {
                debug!("backend initialized in process");
            }
            loaded
        });
        loaded.as_ref().map_err(Clone::clone)
    }
}

impl<B: Backend> Bridge for InProcessBridge<B> {
    fn call(&self, request: Request) -> BridgeResult<Value> {
        let backend = self.load()?;
        execute(backend, &request).into_result()
    }
}
