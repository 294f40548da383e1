//! Typed agent settings
//!
//! Deserialized from the merged configuration and checked against the
//! accepted bounds before the sender is built from them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::context::SendingSettings;
use crate::transport::HttpConfig;

/// Upper bound for connect and read timeouts, in seconds
pub const MAX_NETWORK_TIMEOUT_SECONDS: u64 = 300;

/// Timeout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Connection timeout, in (0, 300]
    pub connect_seconds: u64,

    /// Request timeout, in (0, 300]
    pub read_seconds: u64,

    /// How long the CLI waits for the initial handshake
    pub init_seconds: u64,

    /// How long shutdown waits for the sender thread
    pub shutdown_seconds: u64,
}

/// Agent settings resolved from all configuration layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub endpoint: String,
    pub application_id: String,
    pub status_check_interval_ms: u64,
    pub timeouts: TimeoutSettings,
}

impl AgentConfig {
    /// Check value bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeouts;

        if t.connect_seconds == 0 || t.connect_seconds > MAX_NETWORK_TIMEOUT_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "timeouts.connect_seconds must be in (0, {}], got {}",
                MAX_NETWORK_TIMEOUT_SECONDS, t.connect_seconds
            )));
        }

        if t.read_seconds == 0 || t.read_seconds > MAX_NETWORK_TIMEOUT_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "timeouts.read_seconds must be in (0, {}], got {}",
                MAX_NETWORK_TIMEOUT_SECONDS, t.read_seconds
            )));
        }

        if t.init_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts.init_seconds must be greater than 0".to_string(),
            ));
        }

        if t.shutdown_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts.shutdown_seconds must be greater than 0".to_string(),
            ));
        }

        if self.status_check_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "status_check_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Check that the backend is configured
    ///
    /// Only needed to actually talk to the backend; inspecting the config
    /// works without it.
    pub fn require_backend(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "endpoint is not configured".to_string(),
            ));
        }
        if self.application_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "application_id is not configured".to_string(),
            ));
        }
        Ok(())
    }

    pub fn sending_settings(&self) -> SendingSettings {
        SendingSettings {
            application_id: self.application_id.clone(),
            status_check_interval: Duration::from_millis(self.status_check_interval_ms),
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            endpoint: self.endpoint.clone(),
            connect_timeout: Duration::from_secs(self.timeouts.connect_seconds),
            read_timeout: Duration::from_secs(self.timeouts.read_seconds),
        }
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.init_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.shutdown_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuiltinDefaults;

    fn default_config() -> AgentConfig {
        serde_json::from_value(BuiltinDefaults::default().to_value()).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeouts.connect_seconds, 30);
    }

    #[test]
    fn test_connect_timeout_bounds() {
        let mut config = default_config();

        config.timeouts.connect_seconds = 0;
        assert!(config.validate().is_err());

        config.timeouts.connect_seconds = 301;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connect_seconds"));

        config.timeouts.connect_seconds = 300;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_status_check_interval_rejected() {
        let mut config = default_config();
        config.status_check_interval_ms = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("status_check_interval_ms"));
    }

    #[test]
    fn test_require_backend() {
        let mut config = default_config();
        assert!(config.require_backend().is_err());

        config.endpoint = "https://beacon.example.com/mbeacon".to_string();
        assert!(config.require_backend().is_err());

        config.application_id = "app-1".to_string();
        assert!(config.require_backend().is_ok());
    }

    #[test]
    fn test_conversions() {
        let mut config = default_config();
        config.endpoint = "https://beacon.example.com".to_string();
        config.application_id = "app-1".to_string();
        config.status_check_interval_ms = 60_000;
        config.timeouts.read_seconds = 5;

        let settings = config.sending_settings();
        assert_eq!(settings.application_id, "app-1");
        assert_eq!(settings.status_check_interval, Duration::from_secs(60));

        let http = config.http_config();
        assert_eq!(http.endpoint, "https://beacon.example.com");
        assert_eq!(http.read_timeout, Duration::from_secs(5));
        assert_eq!(http.connect_timeout, Duration::from_secs(30));

        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
    }
}
