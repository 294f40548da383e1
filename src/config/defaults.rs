//! Built-in agent defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Beacon endpoint URL (default: empty, must be configured)
    pub endpoint: String,

    /// Application identifier (default: empty, must be configured)
    pub application_id: String,

    /// Interval between status checks in milliseconds (default: 2 hours)
    pub status_check_interval_ms: u64,

    /// Connection timeout in seconds (default: 30)
    pub connect_timeout_seconds: u64,

    /// Request timeout in seconds (default: 30)
    pub read_timeout_seconds: u64,

    /// Time the CLI waits for the initial handshake (default: 30)
    pub init_timeout_seconds: u64,

    /// Time to wait for the sender thread on shutdown (default: 10)
    pub shutdown_timeout_seconds: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            application_id: String::new(),
            status_check_interval_ms: 2 * 60 * 60 * 1000,
            connect_timeout_seconds: 30,
            read_timeout_seconds: 30,
            init_timeout_seconds: 30,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "endpoint": self.endpoint,
            "application_id": self.application_id,
            "status_check_interval_ms": self.status_check_interval_ms,
            "timeouts": {
                "connect_seconds": self.connect_timeout_seconds,
                "read_seconds": self.read_timeout_seconds,
                "init_seconds": self.init_timeout_seconds,
                "shutdown_seconds": self.shutdown_timeout_seconds
            }
        })
    }
}
