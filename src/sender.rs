//! Beacon sender thread
//!
//! Runs the state machine on a dedicated worker thread, starting from the
//! initial handshake and ending at the terminal state. Other threads talk
//! to it only through the shared context: they wait for init completion and
//! request shutdown.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::context::BeaconSendingContext;
use crate::state::{self, InitState, StateKind};

/// Default time to wait for the worker thread on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval at which shutdown polls the worker thread
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Name of the worker thread
pub const THREAD_NAME: &str = "beacon-sender";

/// Sender errors
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    #[error("Beacon sender already initialized")]
    AlreadyInitialized,

    #[error("Failed to spawn beacon sender thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("Beacon sender did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("Beacon sender thread panicked")]
    WorkerPanicked,
}

/// Owner of the beacon sending worker thread
pub struct BeaconSender {
    context: Arc<BeaconSendingContext>,
    shutdown_timeout: Duration,
    worker: Mutex<Option<JoinHandle<StateKind>>>,
}

impl BeaconSender {
    /// Create a sender with the default shutdown timeout
    pub fn new(context: Arc<BeaconSendingContext>) -> Self {
        Self::with_shutdown_timeout(context, DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Create a sender with a custom shutdown timeout
    pub fn with_shutdown_timeout(context: Arc<BeaconSendingContext>, shutdown_timeout: Duration) -> Self {
        Self {
            context,
            shutdown_timeout,
            worker: Mutex::new(None),
        }
    }

    /// Get the shared context
    pub fn context(&self) -> &Arc<BeaconSendingContext> {
        &self.context
    }

    /// Start the worker thread
    ///
    /// May be called once; the machine starts in the init state.
    pub fn initialize(&self) -> Result<(), SenderError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(SenderError::AlreadyInitialized);
        }

        let ctx = Arc::clone(&self.context);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                info!("beacon sender started");
                let last = state::run(&ctx, Box::new(InitState::new()));
                info!(state = %last, "beacon sender stopped");
                last
            })?;

        *worker = Some(handle);
        Ok(())
    }

    /// Block until the initial handshake completes
    ///
    /// Returns false if init failed because of shutdown or interruption.
    pub fn wait_for_init(&self) -> bool {
        self.context.wait_for_init()
    }

    /// Block until the initial handshake completes or the timeout elapses
    pub fn wait_for_init_timeout(&self, timeout: Duration) -> bool {
        self.context.wait_for_init_timeout(timeout)
    }

    /// Check if init completed successfully
    pub fn is_initialized(&self) -> bool {
        self.context.init_outcome() == Some(true)
    }

    /// Request shutdown and wait for the worker thread to stop
    ///
    /// A worker that does not stop within the shutdown timeout is detached.
    pub fn shutdown(&self) -> Result<(), SenderError> {
        self.context.request_shutdown();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        let start = Instant::now();
        while !handle.is_finished() {
            if start.elapsed() >= self.shutdown_timeout {
                warn!(
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "beacon sender did not stop in time, detaching"
                );
                return Err(SenderError::ShutdownTimeout(self.shutdown_timeout));
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        match handle.join() {
            Ok(_) => Ok(()),
            Err(_) => Err(SenderError::WorkerPanicked),
        }
    }
}
