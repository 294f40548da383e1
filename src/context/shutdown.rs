//! Shutdown signal and cooperative interruption
//!
//! The shutdown flag is monotonic (false to true only) and can be raised
//! from any thread. Blocking waits park on the signal's condvar, so a
//! shutdown request wakes them immediately instead of after their full
//! duration.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A blocking wait was abandoned because shutdown was requested.
///
/// Carries no payload: the only instruction is "abandon now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("blocking wait interrupted by shutdown request")]
pub struct Interrupted;

/// Thread-safe, monotonic shutdown flag
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    requested: Mutex<bool>,
    changed: Condvar,
}

impl ShutdownSignal {
    /// Create a signal in the "running" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter
    ///
    /// Returns true if this call raised the flag, false if it was already set.
    pub fn request(&self) -> bool {
        let mut requested = self.requested.lock().unwrap_or_else(PoisonError::into_inner);
        let first = !*requested;
        *requested = true;
        self.changed.notify_all();
        first
    }

    /// Check if shutdown has been requested
    pub fn is_requested(&self) -> bool {
        *self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `duration` unless shutdown is requested first
    ///
    /// Returns `Err(Interrupted)` if shutdown was requested before or during
    /// the wait. Spurious wakeups do not shorten the wait.
    pub fn wait_timeout(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        let mut requested = self.requested.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if *requested {
                return Err(Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (guard, _) = self
                .changed
                .wait_timeout(requested, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            requested = guard;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_requested());
    }

    #[test]
    fn test_request_is_monotonic() {
        let signal = ShutdownSignal::new();
        assert!(signal.request());
        assert!(!signal.request());
        assert!(signal.is_requested());
    }

    #[test]
    fn test_wait_elapses_without_shutdown() {
        let signal = ShutdownSignal::new();
        let start = Instant::now();
        assert_eq!(signal.wait_timeout(Duration::from_millis(50)), Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_after_shutdown_interrupts_immediately() {
        let signal = ShutdownSignal::new();
        signal.request();
        assert_eq!(signal.wait_timeout(Duration::from_secs(60)), Err(Interrupted));
    }

    #[test]
    fn test_shutdown_wakes_waiter() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                let result = signal.wait_timeout(Duration::from_secs(60));
                (result, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        signal.request();

        let (result, elapsed) = waiter.join().unwrap();
        assert_eq!(result, Err(Interrupted));
        assert!(elapsed < Duration::from_secs(5));
    }
}
