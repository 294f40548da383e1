//! Transport Layer for Status Requests
//!
//! Abstracts the network connection to the monitoring backend. Provides:
//! - StatusTransport trait: interface for a single status request
//! - HttpTransport: blocking HTTP client for production
//!
//! A test double lives in [`crate::mock`].

mod http;

pub use http::{HttpConfig, HttpTransport};

use beacon_protocol::{ProtocolError, StatusRequest, StatusResponse};

/// Transport trait for status requests
///
/// One call is one network round trip; retry policy belongs to the caller.
pub trait StatusTransport: Send + Sync {
    /// Send a status request and return the backend's response
    fn send_status_request(&self, request: &StatusRequest) -> Result<StatusResponse, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Backend answered with HTTP status {code}")]
    Status { code: u16 },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                code: status.as_u16(),
            }
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::Status { code: 503 };
        assert_eq!(err.to_string(), "Backend answered with HTTP status 503");

        let err = TransportError::ConnectionFailed("refused".to_string());
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_protocol_error_converts() {
        let err: TransportError =
            ProtocolError::invalid_field("send_interval_ms", "must be greater than zero").into();
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}
