//! The worker thread's receive loop.
//!
//! The loop owns a current-thread tokio runtime. Every inbound envelope is
//! handled on its own task, so a slow call never stops the loop from
//! picking up the next one, and replies may go out in any order.
//!
//! ```text
//!   inbox ──► recv ──► spawn(handle) ──► wait for backend ──► spawn_blocking(execute)
//!                                                                     │
//!                              signal.raise() ◄── close ◄── reply ◄───┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, error, trace, warn};

use super::dispatch::{execute, initialize, Backend, BackendFactory};
use super::protocol::{CallEnvelope, ErrorKind, ErrorPayload, ReplyMessage};

/// Run the loop until every sender for `inbox` is gone.
///
/// Envelopes left in the inbox when the loop stops are dropped, which
/// completes them without a reply.
pub(crate) fn run<B: Backend>(
    factory: BackendFactory<B>,
    mut inbox: mpsc::UnboundedReceiver<CallEnvelope>,
    dispatch_threads: usize,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .max_blocking_threads(dispatch_threads.max(1))
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start worker runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let slot = Arc::new(BackendSlot::new(factory));

        // Start loading right away; the first calls wait on the same cell.
        tokio::spawn({
            let slot = Arc::clone(&slot);
            async move {
                if let Err(payload) = slot.get().await {
                    warn!(message = %payload.message, "backend failed to initialize");
                }
            }
        });

        while let Some(envelope) = inbox.recv().await {
            tokio::spawn(handle(Arc::clone(&slot), envelope));
        }
        debug!("bridge closed, worker loop exiting");
    });
}

async fn handle<B: Backend>(slot: Arc<BackendSlot<B>>, envelope: CallEnvelope) {
    let CallEnvelope {
        id,
        request,
        completion,
    } = envelope;
    let action = request.action();
    trace!(%id, %action, "call received");

    let reply = match slot.get().await {
        Ok(backend) => {
            match tokio::task::spawn_blocking(move || execute(backend.as_ref(), &request)).await {
                Ok(reply) => reply,
                Err(err) => ReplyMessage::Error(ErrorPayload::new(
                    ErrorKind::Panic,
                    format!("dispatch task failed: {err}"),
                )),
            }
        }
        Err(payload) => ReplyMessage::Error(payload),
    };

    if reply.is_error() {
        debug!(%id, %action, "call failed");
    }
    if !completion.complete(reply) {
        trace!(%id, %action, "caller went away before the reply");
    }
}

/// Lazily initialized backend shared by every call on this worker.
struct BackendSlot<B> {
    factory: Mutex<Option<BackendFactory<B>>>,
    backend: OnceCell<Result<Arc<B>, ErrorPayload>>,
}

impl<B: Backend> BackendSlot<B> {
    fn new(factory: BackendFactory<B>) -> Self {
        Self {
            factory: Mutex::new(Some(factory)),
            backend: OnceCell::new(),
        }
    }

    /// Wait for initialization, running it if nobody has yet.
    async fn get(&self) -> Result<Arc<B>, ErrorPayload> {
        self.backend
            .get_or_init(|| async {
                let factory = self
                    .factory
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                let Some(factory) = factory else {
                    return Err(ErrorPayload::initialization("backend factory already consumed"));
                };
                match tokio::task::spawn_blocking(move || initialize(factory)).await {
                    Ok(Ok(backend)) => {
                        debug!("backend initialized");
                        Ok(Arc::new(backend))
                    }
                    Ok(Err(payload)) => Err(payload),
                    Err(err) => Err(ErrorPayload::initialization(format!(
                        "initialization task failed: {err}"
                    ))),
                }
            })
            .await
            .clone()
    }
}
