//! Beacon Protocol Types
//!
//! Defines the status request sent to the monitoring backend and the
//! configuration payload it answers with.

pub mod error;
pub mod status;

pub use error::ProtocolError;
pub use status::{StatusRequest, StatusResponse};

/// Protocol version announced with every status request.
pub const PROTOCOL_VERSION: u32 = 3;

/// Platform type identifier reported to the backend.
pub const PLATFORM_TYPE: u32 = 1;

/// Agent technology tag reported to the backend.
pub const AGENT_TECHNOLOGY: &str = "rust";

/// Current agent version string.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");
