//! Error types for the status protocol.

/// Errors raised while decoding a status response.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed status response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ProtocolError {
    /// Create an invalid field error.
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_display() {
        let err = ProtocolError::invalid_field("send_interval_ms", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid value for send_interval_ms: must be positive"
        );
    }
}
