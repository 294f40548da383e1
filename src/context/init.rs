//! One-shot init-completion signal
//!
//! Callers awaiting agent startup block here until the state machine
//! reports whether the initial handshake succeeded. The first report wins;
//! later reports are ignored.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Init-completion signal
#[derive(Debug, Default)]
pub struct InitSignal {
    outcome: Mutex<Option<bool>>,
    completed: Condvar,
}

impl InitSignal {
    /// Create an incomplete signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the init outcome and wake all waiters
    ///
    /// Returns true if this call fixed the outcome, false if an earlier
    /// call already did.
    pub fn complete(&self, success: bool) -> bool {
        let mut outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        if outcome.is_some() {
            return false;
        }
        *outcome = Some(success);
        self.completed.notify_all();
        true
    }

    /// Get the outcome, if init has completed
    pub fn outcome(&self) -> Option<bool> {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until init completes and return whether it succeeded
    pub fn wait(&self) -> bool {
        let outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self
            .completed
            .wait_while(outcome, |o| o.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        outcome.unwrap_or(false)
    }

    /// Block until init completes or the timeout elapses
    ///
    /// Returns `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        let deadline = Instant::now() + timeout;
        let mut outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if let Some(success) = *outcome {
                return Some(success);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .completed
                .wait_timeout(outcome, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            outcome = guard;
        }
    }
}
