//! Beacon sending context
//!
//! The single shared object between the sender thread and the rest of the
//! agent. It holds the current state, the shutdown flag, the handshake
//! timestamps and the configuration applied from the backend, and exposes
//! the blocking primitives (sleep, status request) the states build on.
//!
//! Every field sits behind its own synchronization boundary; states only
//! ever see the narrow operations below.

mod clock;
mod init;
mod shutdown;

pub use clock::{Clock, SystemClock};
pub use init::InitSignal;
pub use shutdown::{Interrupted, ShutdownSignal};

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use beacon_protocol::status::DEFAULT_SERVER_ID;
use beacon_protocol::{StatusRequest, StatusResponse};
use tracing::{debug, info};

use crate::state::StateKind;
use crate::transport::{StatusTransport, TransportError};

/// Default interval between status checks (2 hours)
pub const DEFAULT_STATUS_CHECK_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Local settings the context is created with
#[derive(Debug, Clone)]
pub struct SendingSettings {
    /// Application identifier sent with every status request
    pub application_id: String,
    /// Interval between status checks while capturing
    pub status_check_interval: Duration,
}

impl SendingSettings {
    /// Create settings for an application with the default check interval
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            status_check_interval: DEFAULT_STATUS_CHECK_INTERVAL,
        }
    }
}

/// Configuration applied from the latest status response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Whether capturing is enabled
    pub capture: bool,
    /// Interval between beacon sends
    pub send_interval: Duration,
    /// Server id requests are routed to
    pub server_id: u32,
    /// Maximum beacon size in kilobytes
    pub max_beacon_size_kb: u32,
    /// Whether errors are captured
    pub capture_errors: bool,
    /// Whether crashes are captured
    pub capture_crashes: bool,
}

impl From<&StatusResponse> for ServerConfig {
    fn from(response: &StatusResponse) -> Self {
        Self {
            capture: response.is_capture_enabled(),
            send_interval: Duration::from_millis(response.send_interval_ms),
            server_id: response.server_id,
            max_beacon_size_kb: response.max_beacon_size_kb,
            capture_errors: response.capture_errors,
            capture_crashes: response.capture_crashes,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&StatusResponse::default())
    }
}

/// Hook invoked when open sessions must be flushed before termination
pub trait SessionFlusher: Send + Sync {
    /// Finish and send all buffered session data
    fn flush(&self);
}

/// Shared execution context for the beacon sending state machine
pub struct BeaconSendingContext {
    settings: SendingSettings,
    transport: Arc<dyn StatusTransport>,
    clock: Arc<dyn Clock>,
    shutdown: Arc<ShutdownSignal>,
    init: InitSignal,
    current_state: Mutex<StateKind>,
    server_config: Mutex<ServerConfig>,
    last_open_session_beacon_send_time: AtomicI64,
    last_status_check_time: AtomicI64,
    last_time_sync_time: AtomicI64,
    session_flushers: Mutex<Vec<Arc<dyn SessionFlusher>>>,
}

impl BeaconSendingContext {
    /// Create a context starting in the init state
    pub fn new(
        settings: SendingSettings,
        transport: Arc<dyn StatusTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_shutdown_signal(settings, transport, clock, Arc::new(ShutdownSignal::new()))
    }

    /// Create a context that shares an existing shutdown signal
    pub fn with_shutdown_signal(
        settings: SendingSettings,
        transport: Arc<dyn StatusTransport>,
        clock: Arc<dyn Clock>,
        shutdown: Arc<ShutdownSignal>,
    ) -> Self {
        Self {
            settings,
            transport,
            clock,
            shutdown,
            init: InitSignal::new(),
            current_state: Mutex::new(StateKind::Init),
            server_config: Mutex::new(ServerConfig::default()),
            last_open_session_beacon_send_time: AtomicI64::new(-1),
            last_status_check_time: AtomicI64::new(-1),
            last_time_sync_time: AtomicI64::new(-1),
            session_flushers: Mutex::new(Vec::new()),
        }
    }

    /// Current time in milliseconds since the Unix epoch
    pub fn current_timestamp(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn set_last_open_session_beacon_send_time(&self, timestamp: i64) {
        self.last_open_session_beacon_send_time
            .store(timestamp, Ordering::SeqCst);
    }

    /// Last time open sessions were sent (-1 if never)
    pub fn last_open_session_beacon_send_time(&self) -> i64 {
        self.last_open_session_beacon_send_time.load(Ordering::SeqCst)
    }

    pub fn set_last_status_check_time(&self, timestamp: i64) {
        self.last_status_check_time.store(timestamp, Ordering::SeqCst);
    }

    /// Last time a status request was attempted (-1 if never)
    pub fn last_status_check_time(&self) -> i64 {
        self.last_status_check_time.load(Ordering::SeqCst)
    }

    pub fn set_last_time_sync_time(&self, timestamp: i64) {
        self.last_time_sync_time.store(timestamp, Ordering::SeqCst);
    }

    /// Last time the clock was synchronized (-1 if never)
    pub fn last_time_sync_time(&self) -> i64 {
        self.last_time_sync_time.load(Ordering::SeqCst)
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Request shutdown; idempotent
    pub fn request_shutdown(&self) {
        if self.shutdown.request() {
            info!(state = %self.current_state(), "shutdown requested");
        }
    }

    /// Shared handle to the shutdown signal, for signal handlers
    pub fn shutdown_signal(&self) -> Arc<ShutdownSignal> {
        Arc::clone(&self.shutdown)
    }

    /// Kind of the currently installed state
    pub fn current_state(&self) -> StateKind {
        *self.current_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a new current state
    pub fn set_current_state(&self, state: StateKind) {
        let mut current = self.current_state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != state {
            debug!(from = %*current, to = %state, "state transition");
        }
        *current = state;
    }

    /// Check if the machine has reached its terminal state
    pub fn is_in_terminal_state(&self) -> bool {
        self.current_state() == StateKind::Terminal
    }

    /// Block for `duration`, aborting with `Interrupted` on shutdown
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.clock.sleep(duration, &self.shutdown)
    }

    /// Build the status request for the current server id
    pub fn status_request(&self) -> StatusRequest {
        StatusRequest::new(self.settings.application_id.clone(), self.server_config().server_id)
    }

    /// Perform a single status request, without retries
    pub fn send_status_request(&self) -> Result<StatusResponse, TransportError> {
        self.transport.send_status_request(&self.status_request())
    }

    /// Apply the configuration carried by a status response
    pub fn handle_status_response(&self, response: StatusResponse) {
        let config = ServerConfig::from(&response);
        info!(
            capture = config.capture,
            send_interval_ms = config.send_interval.as_millis() as u64,
            server_id = config.server_id,
            "applied backend configuration"
        );
        *self.server_config.lock().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Snapshot of the configuration applied from the backend
    pub fn server_config(&self) -> ServerConfig {
        self.server_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Report the outcome of initialization; the first report wins
    pub fn init_completed(&self, success: bool) {
        if self.init.complete(success) {
            info!(success, "initialization completed");
        } else {
            debug!(success, "ignoring repeated init completion");
        }
    }

    /// Init outcome, if reported
    pub fn init_outcome(&self) -> Option<bool> {
        self.init.outcome()
    }

    /// Block until init completes and return whether it succeeded
    pub fn wait_for_init(&self) -> bool {
        self.init.wait()
    }

    /// Block until init completes or the timeout elapses
    ///
    /// A timeout reports `false`.
    pub fn wait_for_init_timeout(&self, timeout: Duration) -> bool {
        self.init.wait_timeout(timeout).unwrap_or(false)
    }

    pub fn is_capture_on(&self) -> bool {
        self.server_config().capture
    }

    pub fn send_interval(&self) -> Duration {
        self.server_config().send_interval
    }

    pub fn status_check_interval(&self) -> Duration {
        self.settings.status_check_interval
    }

    /// Register a hook run when sessions are flushed
    pub fn register_session_flusher(&self, flusher: Arc<dyn SessionFlusher>) {
        self.session_flushers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(flusher);
    }

    /// Run every registered flush hook and return how many ran
    pub fn flush_sessions(&self) -> usize {
        let flushers = self
            .session_flushers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for flusher in &flushers {
            flusher.flush();
        }
        flushers.len()
    }
}

impl std::fmt::Debug for BeaconSendingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeaconSendingContext")
            .field("settings", &self.settings)
            .field("current_state", &self.current_state())
            .field("shutdown_requested", &self.is_shutdown_requested())
            .field("server_config", &self.server_config())
            .finish()
    }
}
