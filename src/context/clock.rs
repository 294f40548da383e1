//! Time source and interruptible sleep

use std::time::Duration;

use chrono::Utc;

use super::shutdown::{Interrupted, ShutdownSignal};

/// Time source used by the sending context
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    /// Block for `duration`, aborting with `Interrupted` on shutdown
    fn sleep(&self, duration: Duration, shutdown: &ShutdownSignal) -> Result<(), Interrupted>;
}

/// Wall-clock time source
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn sleep(&self, duration: Duration, shutdown: &ShutdownSignal) -> Result<(), Interrupted> {
        shutdown.wait_timeout(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_sleep_interrupted_by_prior_shutdown() {
        let shutdown = ShutdownSignal::new();
        shutdown.request();
        assert_eq!(
            SystemClock.sleep(Duration::from_secs(60), &shutdown),
            Err(Interrupted)
        );
    }
}
