//! Error types for ipwatch.

use thiserror::Error;

/// Result type alias for ipwatch.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Monitor error types.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration error. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP transport error. Retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider-reported rejection (non-success envelope or error code).
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Echo-service response carried no extractable IP.
    #[error("No IP found in response: {0}")]
    IpNotFound(String),

    /// Extracted string failed public-IPv4 validation.
    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    /// IP fetch exhausted its retry budget.
    #[error("IP detection failed: {0}")]
    IpDetection(String),

    /// Configured DNS record does not exist at the provider.
    #[error("DNS record not found: {0}")]
    RecordNotFound(String),

    /// Last-known-IP state problem (unreadable or corrupt slot).
    #[error("State error: {0}")]
    State(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for MonitorError {
    fn from(e: reqwest::Error) -> Self {
        MonitorError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for MonitorError {
    fn from(e: toml::de::Error) -> Self {
        MonitorError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        MonitorError::Serialization(e.to_string())
    }
}
