//! Flush sessions state
//!
//! Gives every registered session flusher the chance to send what is still
//! buffered before the agent terminates.
//!
//! Transitions to `Terminal`, also upon shutdown request.

use tracing::info;

use super::{SendingState, StateKind, TerminalState, Transition};
use crate::context::{BeaconSendingContext, Interrupted};

/// Flush sessions state
#[derive(Debug, Default)]
pub struct FlushSessionsState;

impl FlushSessionsState {
    pub fn new() -> Self {
        Self
    }
}

impl SendingState for FlushSessionsState {
    fn kind(&self) -> StateKind {
        StateKind::FlushSessions
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        Box::new(TerminalState::new())
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        let flushed = ctx.flush_sessions();
        info!(flushers = flushed, "flushed open sessions");
        Ok(Some(Box::new(TerminalState::new())))
    }
}
