//! Blocking HTTP transport
//!
//! Sends the status request as a GET with query parameters and decodes the
//! JSON body. Each call is bounded by the connect and read timeouts, which
//! is what keeps an in-flight request from stalling shutdown indefinitely.

use std::time::Duration;

use beacon_protocol::{StatusRequest, StatusResponse};
use reqwest::blocking::Client;
use tracing::debug;

use super::{StatusTransport, TransportError};

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Beacon endpoint URL
    pub endpoint: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout, including reading the body
    pub read_timeout: Duration,
}

impl HttpConfig {
    /// Create a config for an endpoint with default timeouts
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP transport for production use
pub struct HttpTransport {
    config: HttpConfig,
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Get the configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl StatusTransport for HttpTransport {
    fn send_status_request(&self, request: &StatusRequest) -> Result<StatusResponse, TransportError> {
        debug!(
            endpoint = %self.config.endpoint,
            server_id = request.server_id,
            "sending status request"
        );

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&request.query_pairs())
            .send()?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text()?;
        Ok(StatusResponse::parse(&body)?)
    }
}
