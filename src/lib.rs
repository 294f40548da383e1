//! Beacon Agent - telemetry beacon sending state machine
//!
//! This crate implements the beacon sender of a monitoring agent: a
//! dedicated thread that runs a state machine against the monitoring
//! backend. The machine starts with an initial handshake (a status request
//! retried with backoff until the backend answers), then alternates between
//! capturing and non-capturing steady states until shutdown drives it to
//! its terminal state.

pub mod config;
pub mod context;
pub mod mock;
pub mod request;
pub mod sender;
pub mod signal;
pub mod state;
pub mod transport;

pub use config::{AgentConfig, ConfigError, EffectiveConfig};
pub use context::{BeaconSendingContext, Clock, Interrupted, SendingSettings, ServerConfig, SessionFlusher, ShutdownSignal, SystemClock};
pub use sender::{BeaconSender, SenderError};
pub use state::{SendingState, StateKind};
pub use transport::{HttpConfig, HttpTransport, StatusTransport, TransportError};
