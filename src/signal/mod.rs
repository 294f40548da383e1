//! Signal handling for graceful shutdown (SIGINT/SIGTERM)
//!
//! On the first signal the agent's shutdown flag is raised, which wakes the
//! beacon sender out of any sleep and drives the state machine to its
//! terminal state. A second signal exits immediately.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::context::ShutdownSignal;

/// Exit code after an immediate exit on a repeated signal
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: request graceful shutdown
    RequestShutdown,
    /// Second signal: exit immediately
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

/// Signal handler state
#[derive(Debug)]
pub struct SignalState {
    shutdown: Arc<ShutdownSignal>,
    signal_count: AtomicU8,
}

impl SignalState {
    /// Create signal state that raises `shutdown` on the first signal
    pub fn new(shutdown: Arc<ShutdownSignal>) -> Self {
        Self {
            shutdown,
            signal_count: AtomicU8::new(0),
        }
    }

    /// Get the number of signals received
    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Check if shutdown has been requested, by a signal or otherwise
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }

    /// Handle a signal and return the action taken
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        match count {
            0 => {
                self.shutdown.request();
                SignalAction::RequestShutdown
            }
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }
}

/// Installs the process signal handler
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    /// Create a handler for the given shutdown signal
    pub fn new(shutdown: Arc<ShutdownSignal>) -> Self {
        Self {
            state: Arc::new(SignalState::new(shutdown)),
        }
    }

    /// Get a reference to the signal state
    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the handler for SIGINT and SIGTERM
    ///
    /// Must be called at most once per process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::RequestShutdown => {
                warn!("received interrupt signal, shutting down");
            }
            SignalAction::ImmediateExit => {
                warn!("received second interrupt, exiting immediately");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            SignalAction::Ignore => {}
        })
    }
}
