//! Capture off state
//!
//! Capturing is disabled by the backend. The only work left is checking
//! back at the status check interval in case it gets enabled again.
//!
//! Transitions to:
//! - `CaptureOn` once a status response enables capturing
//! - `FlushSessions` upon shutdown request

use std::time::Duration;

use tracing::debug;

use super::{CaptureOnState, FlushSessionsState, SendingState, StateKind, Transition};
use crate::context::{BeaconSendingContext, Interrupted};
use crate::request::{send_status_request, INITIAL_RETRY_SLEEP_TIME, MAX_STATUS_REQUEST_RETRIES};

/// Time left until the next status check is due, zero if it is overdue
pub(super) fn time_until_status_check(ctx: &BeaconSendingContext, now: i64) -> Duration {
    let elapsed = now.saturating_sub(ctx.last_status_check_time()).max(0) as u64;
    let interval = ctx.status_check_interval().as_millis() as u64;
    Duration::from_millis(interval.saturating_sub(elapsed))
}

/// Capture off state
#[derive(Debug, Default)]
pub struct CaptureOffState;

impl CaptureOffState {
    pub fn new() -> Self {
        Self
    }
}

impl SendingState for CaptureOffState {
    fn kind(&self) -> StateKind {
        StateKind::CaptureOff
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        Box::new(FlushSessionsState::new())
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        let wait = time_until_status_check(ctx, ctx.current_timestamp());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "capture off, waiting for status check");
            ctx.sleep(wait)?;
        }

        let response =
            send_status_request(ctx, MAX_STATUS_REQUEST_RETRIES, INITIAL_RETRY_SLEEP_TIME)?;
        ctx.set_last_status_check_time(ctx.current_timestamp());
        if let Some(response) = response {
            ctx.handle_status_response(response);
        }

        if ctx.is_capture_on() {
            Ok(Some(Box::new(CaptureOnState::new())))
        } else {
            Ok(None)
        }
    }
}
