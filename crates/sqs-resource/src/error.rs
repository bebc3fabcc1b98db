//! Error types for queue and message operations.

use chrono::Duration;
use thiserror::Error;

/// Failure reported by an [`SqsApi`](crate::client::SqsApi) implementation.
///
/// Queue and message operations that delegate to the client return this value
/// exactly as the client produced it.
#[derive(Debug, Clone, Error)]
pub enum SqsError {
    #[error("Queue not found: {queue_url}")]
    QueueNotFound { queue_url: String },

    #[error("Receipt handle is invalid: {receipt_handle}")]
    ReceiptHandleInvalid { receipt_handle: String },

    #[error("{operation} failed: {code} - {message}")]
    Service {
        operation: String,
        code: String,
        message: String,
    },

    #[error("{operation} timed out")]
    Timeout { operation: String },

    #[error("{operation} could not reach the service: {message}")]
    Network { operation: String, message: String },

    #[error("{operation} returned an unreadable response: {message}")]
    Response { operation: String, message: String },

    #[error("{operation} request could not be constructed: {message}")]
    Construction { operation: String, message: String },
}

impl SqsError {
    /// Check if the failure is likely to succeed on a later attempt.
    ///
    /// Nothing in this crate retries; the classification is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::ReceiptHandleInvalid { .. } => false,
            Self::Service { code, .. } => matches!(
                code.as_str(),
                "ThrottlingException"
                    | "RequestThrottled"
                    | "ServiceUnavailable"
                    | "InternalError"
                    | "KmsThrottled"
            ),
            Self::Timeout { .. } => true,
            Self::Network { .. } => true,
            Self::Response { .. } => true,
            Self::Construction { .. } => false,
        }
    }

    /// Get suggested retry delay
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Service { .. } if self.is_transient() => Some(Duration::seconds(1)),
            Self::Timeout { .. } => Some(Duration::seconds(1)),
            Self::Network { .. } => Some(Duration::seconds(5)),
            _ => None,
        }
    }

    /// Service error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            Self::QueueNotFound { .. } => Some("AWS.SimpleQueueService.NonExistentQueue"),
            Self::ReceiptHandleInvalid { .. } => Some("ReceiptHandleIsInvalid"),
            _ => None,
        }
    }
}

/// Errors raised by the typed queue attribute accessors.
#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("Failed to fetch queue attributes: {0}")]
    Fetch(#[from] SqsError),

    #[error("Attribute '{name}' is not an integer: {value:?}")]
    InvalidInteger {
        name: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Attribute '{name}' is not a valid epoch timestamp: {value:?}")]
    InvalidTimestamp { name: String, value: String },

    #[error("Unknown queue attribute accessor: {accessor}")]
    UnknownAttribute { accessor: String },
}

/// Errors during message body decoding
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Message has no body")]
    MissingBody,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {0}")]
    Parsing(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
