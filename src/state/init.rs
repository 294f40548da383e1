//! Initial handshake state
//!
//! Obtains the backend configuration before anything else runs. Each
//! attempt is a bounded-retry status request; when a whole attempt yields
//! no response the state waits on an escalating delay schedule and tries
//! again, until a response arrives or shutdown is requested.
//!
//! Transitions to:
//! - `Terminal` upon shutdown request
//! - `TimeSync` (initial) once a status response was received

use std::time::Duration;

use tracing::info;

use super::{SendingState, StateKind, TerminalState, TimeSyncState, Transition};
use crate::context::{BeaconSendingContext, Interrupted};
use crate::request::send_status_request;

/// Immediate retries per status request attempt
pub const MAX_INITIAL_STATUS_REQUEST_RETRIES: u32 = 5;

/// First sleep between immediate retries
pub const INITIAL_RETRY_SLEEP_TIME: Duration = Duration::from_millis(1000);

/// Delays between consecutive failed attempts: 1 min, 5 min, 15 min, 1 h, 2 h
pub const REINIT_DELAY_MILLISECONDS: [u64; 5] = [
    60 * 1000,
    5 * 60 * 1000,
    15 * 60 * 1000,
    60 * 60 * 1000,
    2 * 60 * 60 * 1000,
];

/// Saturating cursor over [`REINIT_DELAY_MILLISECONDS`]
///
/// Never wraps and never resets: once the last entry is reached it is
/// returned forever.
#[derive(Debug, Default, Clone)]
pub struct ReinitDelays {
    index: usize,
}

impl ReinitDelays {
    /// Start at the first (shortest) delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current delay and advance the cursor
    pub fn next_delay(&mut self) -> Duration {
        let delay = REINIT_DELAY_MILLISECONDS[self.index];
        self.index = (self.index + 1).min(REINIT_DELAY_MILLISECONDS.len() - 1);
        Duration::from_millis(delay)
    }
}

/// Initial handshake state
#[derive(Debug, Default)]
pub struct InitState;

impl InitState {
    pub fn new() -> Self {
        Self
    }
}

impl SendingState for InitState {
    fn kind(&self) -> StateKind {
        StateKind::Init
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        Box::new(TerminalState::new())
    }

    fn on_interrupted(&mut self, ctx: &BeaconSendingContext) {
        // callers waiting for startup must not hang on an interrupted agent
        ctx.init_completed(false);
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        // local to this activation
        let mut delays = ReinitDelays::new();

        let response = loop {
            let timestamp = ctx.current_timestamp();
            ctx.set_last_open_session_beacon_send_time(timestamp);
            ctx.set_last_status_check_time(timestamp);

            let response = send_status_request(
                ctx,
                MAX_INITIAL_STATUS_REQUEST_RETRIES,
                INITIAL_RETRY_SLEEP_TIME,
            )?;
            if ctx.is_shutdown_requested() || response.is_some() {
                break response;
            }

            let delay = delays.next_delay();
            info!(
                delay_ms = delay.as_millis() as u64,
                "backend unreachable, delaying next initialization attempt"
            );
            ctx.sleep(delay)?;
        };

        if ctx.is_shutdown_requested() {
            // the shutdown transition itself is made by `execute`
            ctx.init_completed(false);
            return Ok(None);
        }

        match response {
            Some(response) => {
                ctx.handle_status_response(response);
                Ok(Some(Box::new(TimeSyncState::new(true))))
            }
            None => Ok(None),
        }
    }
}
