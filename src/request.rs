//! Bounded-retry status request
//!
//! A single "attempt" from the states' point of view: the request is sent,
//! and on failure retried up to `max_retries` times with a sleep between
//! tries that starts at `initial_retry_sleep` and doubles each time.

use std::time::Duration;

use beacon_protocol::StatusResponse;
use tracing::{debug, warn};

use crate::context::{BeaconSendingContext, Interrupted};

/// Retries used by the steady-state status checks
pub const MAX_STATUS_REQUEST_RETRIES: u32 = 5;

/// First inter-retry sleep used by the steady-state status checks
pub const INITIAL_RETRY_SLEEP_TIME: Duration = Duration::from_millis(1000);

/// Send a status request, retrying on failure
///
/// Returns `Ok(None)` once the retries are spent or shutdown is requested
/// without a response, and `Err(Interrupted)` when an inter-retry sleep is
/// aborted by shutdown.
pub fn send_status_request(
    ctx: &BeaconSendingContext,
    max_retries: u32,
    initial_retry_sleep: Duration,
) -> Result<Option<StatusResponse>, Interrupted> {
    let mut retry = 0;
    let mut sleep = initial_retry_sleep;

    loop {
        match ctx.send_status_request() {
            Ok(response) => {
                debug!(retry, "status request succeeded");
                return Ok(Some(response));
            }
            Err(err) => warn!(error = %err, retry, max_retries, "status request failed"),
        }

        if retry >= max_retries || ctx.is_shutdown_requested() {
            return Ok(None);
        }

        ctx.sleep(sleep)?;
        sleep = sleep.saturating_mul(2);
        retry += 1;
    }
}
