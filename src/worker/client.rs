//! Blocking client for the worker thread.

use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};
use uuid::Uuid;

use super::bridge::Bridge;
use super::dispatch::{Backend, BackendError};
use super::entry;
use super::error::{BridgeError, BridgeResult};
use super::protocol::{CallEnvelope, Completion, Request};
use super::signal::Signal;
use crate::config::BridgeSettings;

/// Bridge to a backend living on a dedicated worker thread.
///
/// Each call allocates its own completion signal and one-shot reply channel, posts
/// the envelope, and parks the calling thread until the worker raises the
/// signal. Calls from several threads may be in flight at once; each one is
/// matched to its reply by its own channel, never by arrival order.
///
/// There is no timeout. A backend that never answers blocks its caller
/// indefinitely, so never call this from an async context.
///
/// # Example
///
/// ```ignore
/// use parsebridge::worker::{Bridge, RemoteBridge, Request};
///
/// let bridge = RemoteBridge::spawn(|| MyBackend::load())?;
/// let version = bridge.call(Request::GetVersion)?;
/// ```
pub struct RemoteBridge {
    /// Sender side of the worker's inbox.
    outbox: mpsc::UnboundedSender<CallEnvelope>,

    /// Never joined; the worker exits on its own once `outbox` is dropped.
    _worker: thread::JoinHandle<()>,

    thread_name: String,
}

impl RemoteBridge {
    /// Start a worker with default settings.
    ///
    /// `factory` runs on the worker side; calls made before it finishes wait
    /// for it, and a failure is reported to every call.
    pub fn spawn<B, F>(factory: F) -> BridgeResult<Self>
    where
        B: Backend,
        F: FnOnce() -> Result<B, BackendError> + Send + 'static,
    {
        Self::spawn_with_settings(factory, &BridgeSettings::default())
    }

    /// Start a worker for an already constructed backend.
    pub fn with_backend<B: Backend>(backend: B) -> BridgeResult<Self> {
        Self::spawn(move || Ok(backend))
    }

    /// Start a worker configured by `settings`.
    pub fn spawn_with_settings<B, F>(factory: F, settings: &BridgeSettings) -> BridgeResult<Self>
    where
        B: Backend,
        F: FnOnce() -> Result<B, BackendError> + Send + 'static,
    {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let dispatch_threads = settings.dispatch_threads;

        let mut builder = thread::Builder::new().name(settings.thread_name.clone());
        if let Some(stack_size) = settings.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let worker = builder
            .spawn(move || entry::run::<B>(Box::new(factory), inbox, dispatch_threads))
            .map_err(BridgeError::SpawnFailed)?;

        debug!(thread = %settings.thread_name, dispatch_threads, "worker started");

        Ok(Self {
            outbox,
            _worker: worker,
            thread_name: settings.thread_name.clone(),
        })
    }

    /// Check if the worker loop is still accepting calls.
    pub fn is_alive(&self) -> bool {
        !self.outbox.is_closed()
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }
}

impl Bridge for RemoteBridge {
    fn call(&self, request: Request) -> BridgeResult<Value> {
        let id = Uuid::new_v4();
        let action = request.action();

        let signal = Arc::new(Signal::new());
        let (reply_tx, mut reply_rx) = oneshot::channel();
        let envelope = CallEnvelope {
            id,
            request,
            completion: Completion::new(reply_tx, Arc::clone(&signal)),
        };

        trace!(%id, %action, "posting call");
        if self.outbox.send(envelope).is_err() {
            return Err(BridgeError::WorkerExited);
        }

        signal.wait();
        trace!(%id, %action, "call completed");

        reply_rx.try_recv()?.into_result()
    }
}

impl Drop for RemoteBridge {
    fn drop(&mut self) {
        debug!(thread = %self.thread_name, "releasing worker");
    }
}
