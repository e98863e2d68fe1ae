//! One-shot completion latch.
//!
//! Each call gets a fresh [`Signal`]. The worker side raises it exactly once;
//! the caller that created it parks on it until then. The waiting thread
//! sleeps on a condition variable rather than polling.

use std::sync::{Condvar, Mutex, PoisonError};

/// Binary latch with wake notification. Starts lowered.
#[derive(Debug, Default)]
pub struct Signal {
    raised: Mutex<bool>,
    wake: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the latch and wake any waiter. Raising twice is a no-op.
    pub fn raise(&self) {
        let mut raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        *raised = true;
        self.wake.notify_all();
    }

    #[cfg(test)]
    pub fn is_raised(&self) -> bool {
        *self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block the calling thread until the latch is raised.
    ///
    /// There is no timeout: a signal that is never raised parks the caller forever.
    pub fn wait(&self) {
        let raised = self.raised.lock().unwrap_or_else(PoisonError::into_inner);
        let _raised = self
            .wake
            .wait_while(raised, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
