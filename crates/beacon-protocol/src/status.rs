//! Status operation types.
//!
//! The status request doubles as handshake and heartbeat: it confirms the
//! backend is reachable and fetches the configuration the agent runs with.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::{AGENT_TECHNOLOGY, AGENT_VERSION, PLATFORM_TYPE, PROTOCOL_VERSION};

/// Default send interval when the backend does not provide one (2 minutes).
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 2 * 60 * 1000;

/// Default maximum beacon size in kilobytes.
pub const DEFAULT_MAX_BEACON_SIZE_KB: u32 = 30;

/// Server id used before the backend assigns one.
pub const DEFAULT_SERVER_ID: u32 = 1;

/// Status request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    /// Application identifier assigned by the backend.
    pub application_id: String,
    /// Server id the request is routed to.
    pub server_id: u32,
    /// Version of the reporting agent.
    pub agent_version: String,
    /// Platform type identifier.
    pub platform: u32,
}

impl StatusRequest {
    /// Create a status request for an application, routed to the given server.
    pub fn new(application_id: impl Into<String>, server_id: u32) -> Self {
        Self {
            application_id: application_id.into(),
            server_id,
            agent_version: AGENT_VERSION.to_string(),
            platform: PLATFORM_TYPE,
        }
    }

    /// Query parameters in the order they are sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", "m".to_string()),
            ("srvid", self.server_id.to_string()),
            ("app", self.application_id.clone()),
            ("va", self.agent_version.clone()),
            ("pt", self.platform.to_string()),
            ("tt", AGENT_TECHNOLOGY.to_string()),
            ("protocol", PROTOCOL_VERSION.to_string()),
        ]
    }
}

/// Status response payload.
///
/// Every field is optional on the wire; missing fields take the documented
/// defaults so that an empty object is a valid "keep defaults" answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether data capturing is enabled.
    #[serde(default = "default_true")]
    pub capture: bool,
    /// Interval between beacon sends in milliseconds.
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    /// Server id subsequent requests must be routed to.
    #[serde(default = "default_server_id")]
    pub server_id: u32,
    /// Maximum size of a single beacon in kilobytes.
    #[serde(default = "default_max_beacon_size_kb")]
    pub max_beacon_size_kb: u32,
    /// Whether errors are captured.
    #[serde(default = "default_true")]
    pub capture_errors: bool,
    /// Whether crashes are captured.
    #[serde(default = "default_true")]
    pub capture_crashes: bool,
    /// Traffic control multiplicity; zero switches capturing off.
    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,
}

fn default_true() -> bool {
    true
}

fn default_send_interval_ms() -> u64 {
    DEFAULT_SEND_INTERVAL_MS
}

fn default_server_id() -> u32 {
    DEFAULT_SERVER_ID
}

fn default_max_beacon_size_kb() -> u32 {
    DEFAULT_MAX_BEACON_SIZE_KB
}

fn default_multiplicity() -> u32 {
    1
}

impl Default for StatusResponse {
    fn default() -> Self {
        Self {
            capture: true,
            send_interval_ms: DEFAULT_SEND_INTERVAL_MS,
            server_id: DEFAULT_SERVER_ID,
            max_beacon_size_kb: DEFAULT_MAX_BEACON_SIZE_KB,
            capture_errors: true,
            capture_crashes: true,
            multiplicity: 1,
        }
    }
}

impl StatusResponse {
    /// Parse and validate a response body.
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        let response: Self = serde_json::from_str(body)?;
        response.validate()?;
        Ok(response)
    }

    /// Check field invariants.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.send_interval_ms == 0 {
            return Err(ProtocolError::invalid_field(
                "send_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.max_beacon_size_kb == 0 {
            return Err(ProtocolError::invalid_field(
                "max_beacon_size_kb",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Capturing is on only when enabled and not throttled to zero.
    pub fn is_capture_enabled(&self) -> bool {
        self.capture && self.multiplicity > 0
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
