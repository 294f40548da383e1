//! Virtual clock

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::context::{Clock, Interrupted, ShutdownSignal};

/// Clock whose time only moves when a sleep is recorded or `advance` is called
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
    interrupt_on_sleep: Mutex<Option<usize>>,
}

impl ManualClock {
    /// Create a clock starting at `start_millis`
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
            ..Self::default()
        }
    }

    /// Interrupt the n-th sleep (1-based) as if shutdown arrived mid-wait
    pub fn interrupt_on_sleep(&self, n: usize) {
        *self
            .interrupt_on_sleep
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    /// Move time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        self.now
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }

    /// Every sleep started so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sleeps in whole milliseconds, convenient for assertions
    pub fn sleeps_millis(&self) -> Vec<u64> {
        self.sleeps().iter().map(|d| d.as_millis() as u64).collect()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration, shutdown: &ShutdownSignal) -> Result<(), Interrupted> {
        if shutdown.is_requested() {
            return Err(Interrupted);
        }

        let count = {
            let mut sleeps = self.sleeps.lock().unwrap_or_else(PoisonError::into_inner);
            sleeps.push(duration);
            sleeps.len()
        };

        let interrupt_at = *self
            .interrupt_on_sleep
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if interrupt_at == Some(count) {
            shutdown.request();
            return Err(Interrupted);
        }

        self.advance(duration);
        Ok(())
    }
}
