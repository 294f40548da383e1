//! Capture on state
//!
//! Steady-state reporting: wakes up once per send interval and, when the
//! status check interval has elapsed, refreshes the backend configuration.
//!
//! Transitions to:
//! - `CaptureOff` once a status response disables capturing
//! - `FlushSessions` upon shutdown request

use tracing::debug;

use super::capture_off::time_until_status_check;
use super::{CaptureOffState, FlushSessionsState, SendingState, StateKind, Transition};
use crate::context::{BeaconSendingContext, Interrupted};
use crate::request::{send_status_request, INITIAL_RETRY_SLEEP_TIME, MAX_STATUS_REQUEST_RETRIES};

/// Capture on state
#[derive(Debug, Default)]
pub struct CaptureOnState;

impl CaptureOnState {
    pub fn new() -> Self {
        Self
    }
}

impl SendingState for CaptureOnState {
    fn kind(&self) -> StateKind {
        StateKind::CaptureOn
    }

    fn shutdown_state(&self) -> Box<dyn SendingState> {
        Box::new(FlushSessionsState::new())
    }

    fn do_execute(&mut self, ctx: &BeaconSendingContext) -> Result<Transition, Interrupted> {
        ctx.sleep(ctx.send_interval())?;

        let now = ctx.current_timestamp();
        if time_until_status_check(ctx, now).is_zero() {
            debug!("status check due");
            let response =
                send_status_request(ctx, MAX_STATUS_REQUEST_RETRIES, INITIAL_RETRY_SLEEP_TIME)?;
            ctx.set_last_status_check_time(now);
            if let Some(response) = response {
                ctx.handle_status_response(response);
            }
        }

        if ctx.is_capture_on() {
            Ok(None)
        } else {
            Ok(Some(Box::new(CaptureOffState::new())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SendingSettings;
    use crate::mock::{ManualClock, MockTransport};
    use crate::state::execute;
    use beacon_protocol::StatusResponse;
    use std::sync::Arc;
    use std::time::Duration;

    fn create_context(
        transport: &Arc<MockTransport>,
        clock: &Arc<ManualClock>,
    ) -> BeaconSendingContext {
        let settings = SendingSettings {
            status_check_interval: Duration::from_secs(300),
            ..SendingSettings::new("app-1")
        };
        let ctx = BeaconSendingContext::new(settings, transport.clone(), clock.clone());
        ctx.handle_status_response(StatusResponse {
            send_interval_ms: 60_000,
            ..StatusResponse::default()
        });
        ctx.set_last_status_check_time(0);
        ctx
    }

    #[test]
    fn test_sleeps_send_interval_and_stays() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(0));
        let ctx = create_context(&transport, &clock);

        let next = execute(Box::new(CaptureOnState::new()), &ctx);

        assert_eq!(next.kind(), StateKind::CaptureOn);
        assert_eq!(clock.sleeps_millis(), vec![60_000]);
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_status_check_when_interval_elapsed() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(0));
        let ctx = create_context(&transport, &clock);

        let mut state: Box<dyn SendingState> = Box::new(CaptureOnState::new());
        for _ in 0..5 {
            state = execute(state, &ctx);
        }

        assert_eq!(state.kind(), StateKind::CaptureOn);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(ctx.last_status_check_time(), 300_000);
    }

    #[test]
    fn test_capture_disabled_moves_to_capture_off() {
        let transport = Arc::new(MockTransport::responding(StatusResponse {
            multiplicity: 0,
            ..StatusResponse::default()
        }));
        let clock = Arc::new(ManualClock::new(0));
        let ctx = create_context(&transport, &clock);
        clock.advance(Duration::from_secs(600));

        let next = execute(Box::new(CaptureOnState::new()), &ctx);

        assert_eq!(next.kind(), StateKind::CaptureOff);
        assert!(!ctx.is_capture_on());
    }

    #[test]
    fn test_interrupted_sleep_flushes_sessions() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(0));
        clock.interrupt_on_sleep(1);
        let ctx = create_context(&transport, &clock);

        let next = execute(Box::new(CaptureOnState::new()), &ctx);

        assert_eq!(next.kind(), StateKind::FlushSessions);
        assert_eq!(ctx.current_state(), StateKind::FlushSessions);
        assert!(ctx.is_shutdown_requested());
    }
}
