//! Beacon sending state machine
//!
//! Every state implements [`SendingState`]. [`execute`] is the single entry
//! point that runs a state's work and then enforces shutdown, so no concrete
//! state has to handle shutdown transitions itself:
//!
//! ```text
//! Init → TimeSync → {CaptureOn ⇄ CaptureOff} → FlushSessions → Terminal
//! ```
//!
//! Any state moves to its shutdown successor when shutdown is observed at
//! the end of its activation.

mod capture_off;
mod capture_on;
mod flush_sessions;
mod init;
mod terminal;
mod time_sync;

pub use capture_off::CaptureOffState;
pub use capture_on::CaptureOnState;
pub use flush_sessions::FlushSessionsState;
pub use init::{
    InitState, ReinitDelays, INITIAL_RETRY_SLEEP_TIME, MAX_INITIAL_STATUS_REQUEST_RETRIES,
    REINIT_DELAY_MILLISECONDS,
};
pub use terminal::TerminalState;
pub use time_sync::TimeSyncState;

use std::fmt;

use tracing::debug;

use crate::context::{BeaconSendingContext, Interrupted};

/// Identifies a state without holding it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Initial handshake with the backend
    Init,
    /// Clock synchronization after a handshake
    TimeSync,
    /// Steady state with capturing enabled
    CaptureOn,
    /// Steady state with capturing disabled
    CaptureOff,
    /// Flushing open sessions before termination
    FlushSessions,
    /// Final state; nothing runs after it
    Terminal,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::TimeSync => write!(f, "time_sync"),
            Self::CaptureOn => write!(f, "capture_on"),
            Self::CaptureOff => write!(f, "capture_off"),
            Self::FlushSessions => write!(f, "flush_sessions"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Result of a state's own work: `Some(next)` moves on, `None` stays put
pub type Transition = Option<Box<dyn SendingState>>;

/// A unit of work in the beacon sending state machine
pub trait SendingState: fmt::Debug + Send {
    /// Which state this is
    fn kind(&self) -> StateKind;

    /// Whether the machine stops once this state is installed
    fn is_terminal(&self) -> bool {
        false
    }

    /// Fresh instance of the state to install when shutdown is observed
    fn shutdown_state(&self) -> Box<dyn SendingState>;

    /// The state's own work
    ///
    /// Returns `Err(Interrupted)` when a blocking wait was aborted by a
    /// shutdown request.
    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted>;

    /// Cleanup hook run when `do_execute` was interrupted
    fn on_interrupted(&mut self, _ctx: &BeaconSendingContext) {}
}

/// Execute one activation of `state` and return the state to run next
///
/// 1. Run the state's work.
/// 2. On interruption, run the state's interrupt hook and request shutdown.
/// 3. If shutdown is requested, the successor is the state's shutdown
///    state, whatever the work decided.
///
/// The context's current state is written exactly once, with the returned
/// successor. Interruption never propagates past this function.
pub fn execute(mut state: Box<dyn SendingState>, ctx: &BeaconSendingContext) -> Box<dyn SendingState> {
    let transition = match state.do_execute(ctx) {
        Ok(transition) => transition,
        Err(Interrupted) => {
            debug!(state = %state.kind(), "state interrupted");
            state.on_interrupted(ctx);
            ctx.request_shutdown();
            None
        }
    };

    let next = if ctx.is_shutdown_requested() {
        state.shutdown_state()
    } else {
        transition.unwrap_or(state)
    };

    ctx.set_current_state(next.kind());
    next
}

/// Drive the machine from `initial` until a terminal state is installed
///
/// Returns the kind of the terminal state.
pub fn run(ctx: &BeaconSendingContext, initial: Box<dyn SendingState>) -> StateKind {
    let mut state = initial;
    ctx.set_current_state(state.kind());

    while !state.is_terminal() {
        state = execute(state, ctx);
    }

    state.kind()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SendingSettings;
    use crate::mock::{ManualClock, MockTransport};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn create_context() -> BeaconSendingContext {
        BeaconSendingContext::new(
            SendingSettings::new("app-1"),
            Arc::new(MockTransport::new()),
            Arc::new(ManualClock::new(0)),
        )
    }

    /// Requests shutdown from inside its work, then tries to move on anyway
    #[derive(Debug)]
    struct ShutdownThenTransition;

    impl SendingState for ShutdownThenTransition {
        fn kind(&self) -> StateKind {
            StateKind::CaptureOn
        }

        fn shutdown_state(&self) -> Box<dyn SendingState> {
            Box::new(FlushSessionsState::new())
        }

        fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
            ctx.request_shutdown();
            Ok(Some(Box::new(CaptureOffState::new())))
        }
    }

    /// Sleeps; flags when its interrupt hook runs
    #[derive(Debug, Default)]
    struct SleepingState {
        interrupted: Arc<AtomicBool>,
    }

    impl SendingState for SleepingState {
        fn kind(&self) -> StateKind {
            StateKind::CaptureOff
        }

        fn shutdown_state(&self) -> Box<dyn SendingState> {
            Box::new(TerminalState::new())
        }

        fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
            ctx.sleep(Duration::from_secs(60))?;
            Ok(Some(Box::new(CaptureOnState::new())))
        }

        fn on_interrupted(&mut self, _ctx: &BeaconSendingContext) {
            self.interrupted.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_state_kind_display() {
        assert_eq!(StateKind::Init.to_string(), "init");
        assert_eq!(StateKind::FlushSessions.to_string(), "flush_sessions");
        assert_eq!(StateKind::Terminal.to_string(), "terminal");
    }

    #[test]
    fn test_shutdown_overrides_natural_transition() {
        let ctx = create_context();

        let next = execute(Box::new(ShutdownThenTransition), &ctx);

        assert_eq!(next.kind(), StateKind::FlushSessions);
        assert_eq!(ctx.current_state(), StateKind::FlushSessions);
    }

    #[test]
    fn test_interruption_requests_shutdown() {
        let clock = Arc::new(ManualClock::new(0));
        clock.interrupt_on_sleep(1);
        let ctx = BeaconSendingContext::new(
            SendingSettings::new("app-1"),
            Arc::new(MockTransport::new()),
            clock,
        );

        let next = execute(Box::new(SleepingState::default()), &ctx);

        assert!(ctx.is_shutdown_requested());
        assert_eq!(next.kind(), StateKind::Terminal);
        assert_eq!(ctx.current_state(), StateKind::Terminal);
    }

    #[test]
    fn test_interrupt_hook_runs() {
        let ctx = create_context();
        ctx.request_shutdown();
        let interrupted = Arc::new(AtomicBool::new(false));
        let state = SleepingState {
            interrupted: Arc::clone(&interrupted),
        };

        let next = execute(Box::new(state), &ctx);

        assert!(interrupted.load(Ordering::SeqCst));
        assert_eq!(next.kind(), StateKind::Terminal);
    }

    #[test]
    fn test_uninterrupted_sleep_takes_natural_transition() {
        let ctx = create_context();
        let interrupted = Arc::new(AtomicBool::new(false));
        let state = SleepingState {
            interrupted: Arc::clone(&interrupted),
        };

        let next = execute(Box::new(state), &ctx);

        assert!(!interrupted.load(Ordering::SeqCst));
        assert_eq!(next.kind(), StateKind::CaptureOn);
        assert_eq!(ctx.current_state(), StateKind::CaptureOn);
    }

    #[test]
    fn test_without_shutdown_natural_transition_wins() {
        let ctx = create_context();

        let next = execute(Box::new(FlushSessionsState::new()), &ctx);

        assert_eq!(next.kind(), StateKind::Terminal);
        assert!(!ctx.is_shutdown_requested());
    }

    #[test]
    fn test_terminal_state_is_idempotent() {
        let ctx = create_context();
        let mut state: Box<dyn SendingState> = Box::new(TerminalState::new());

        for _ in 0..3 {
            state = execute(state, &ctx);
            assert!(state.is_terminal());
            assert_eq!(ctx.current_state(), StateKind::Terminal);
        }
        assert!(ctx.is_shutdown_requested());
    }

    #[test]
    fn test_run_stops_at_terminal() {
        let ctx = create_context();
        ctx.request_shutdown();

        let last = run(&ctx, Box::new(InitState::new()));

        assert_eq!(last, StateKind::Terminal);
        assert!(ctx.is_in_terminal_state());
        assert_eq!(ctx.init_outcome(), Some(false));
    }
}
