//! Error types for the instance control plane
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for control-plane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the instance control plane
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required request parameters are absent or empty
    #[error("Missing required parameter(s): {0}")]
    MissingParameter(String),

    /// The `secret` timestamp is unparseable or outside the tolerance window
    #[error("Invalid request: {0}")]
    StaleOrInvalidTimestamp(String),

    /// The `action` parameter names no known action
    #[error("Invalid action specified: {0}")]
    UnknownAction(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A provider call failed at a named step
    #[error("{step} failed: {message}")]
    Provider {
        /// Step or provider call that failed (e.g. "release", "status")
        step: String,
        /// Provider message
        message: String,
    },

    /// Raw provider API failure, before a step name is attached
    #[error("Provider API error: {0}")]
    Api(String),

    /// More than one static IP is attached to the instance being reassigned
    #[error("Instance {instance} has {count} static IPs attached; refusing to pick one")]
    MultipleStaticIps {
        /// Instance name
        instance: String,
        /// Number of attached static IPs found
        count: usize,
    },

    /// DNS sync failure (logged, never returned to HTTP callers)
    #[error("DNS sync error: {0}")]
    DnsSync(String),

    /// Credential resolution errors
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing parameter error
    pub fn missing(msg: impl Into<String>) -> Self {
        Self::MissingParameter(msg.into())
    }

    /// Create a timestamp error
    pub fn stale(msg: impl Into<String>) -> Self {
        Self::StaleOrInvalidTimestamp(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a step-scoped provider error
    pub fn provider(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Create a raw provider API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a DNS sync error
    pub fn dns_sync(msg: impl Into<String>) -> Self {
        Self::DnsSync(msg.into())
    }

    /// Create a credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Attach a step name to a raw provider failure.
    ///
    /// `Api` and `NotFound` become `Provider { step, .. }`; every other
    /// variant already says what went wrong and passes through unchanged.
    pub fn at_step(self, step: impl std::fmt::Display) -> Self {
        match self {
            Self::Api(message) | Self::NotFound(message) => Self::Provider {
                step: step.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Whether this error is caused by the caller's request rather than a provider
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::StaleOrInvalidTimestamp(_)
                | Self::UnknownAction(_)
                | Self::InvalidInput(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
