//! Time sync state
//!
//! Marks the point the agent's clock was last aligned with the backend and,
//! after the initial handshake, releases callers waiting for startup.
//!
//! Transitions to:
//! - `CaptureOn` or `CaptureOff`, depending on the applied configuration
//! - `Terminal` upon shutdown request during initialization
//! - `FlushSessions` upon shutdown request otherwise

use super::{
    CaptureOffState, CaptureOnState, FlushSessionsState, SendingState, StateKind, TerminalState,
    Transition,
};
use crate::context::{BeaconSendingContext, Interrupted};

/// Time sync state
#[derive(Debug)]
pub struct TimeSyncState {
    initial: bool,
}

impl TimeSyncState {
    /// `initial` is true right after the initial handshake
    pub fn new(initial: bool) -> Self {
        Self { initial }
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }
}

impl SendingState for TimeSyncState {
    fn kind(&self) -> StateKind {
        StateKind::TimeSync
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        if self.initial {
            Box::new(TerminalState::new())
        } else {
            Box::new(FlushSessionsState::new())
        }
    }

    fn on_interrupted(&mut self, ctx: &BeaconSendingContext) {
        if self.initial {
            ctx.init_completed(false);
        }
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        if ctx.is_shutdown_requested() {
            if self.initial {
                ctx.init_completed(false);
            }
            return Ok(None);
        }

        ctx.set_last_time_sync_time(ctx.current_timestamp());
        if self.initial {
            ctx.init_completed(true);
        }

        if ctx.is_capture_on() {
            Ok(Some(Box::new(CaptureOnState::new())))
        } else {
            Ok(Some(Box::new(CaptureOffState::new())))
        }
    }
}
