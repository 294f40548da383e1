//! Terminal state
//!
//! Nothing runs after it. Executing it again keeps the machine here.

use super::{SendingState, StateKind, Transition};
use crate::context::{BeaconSendingContext, Interrupted};

/// Terminal state
#[derive(Debug, Default)]
pub struct TerminalState;

impl TerminalState {
    pub fn new() -> Self {
        Self
    }
}

impl SendingState for TerminalState {
    fn kind(&self) -> StateKind {
        StateKind::Terminal
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        Box::new(TerminalState::new())
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        ctx.request_shutdown();
        Ok(None)
    }
}
