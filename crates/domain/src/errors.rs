//! Error types used throughout the client

use thiserror::Error;

use crate::types::TransactionState;

/// Categories of client errors, used by the executors to pick a recovery path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid client setup - never retried
    Config,
    /// No response received - retry on the same endpoint
    Transport,
    /// Server signalled it is overloaded - retry on the same endpoint
    Busy,
    /// Session token rejected (401) - re-login and replay once
    Authentication,
    /// Any other error status - abandon the endpoint, try the next one
    Server,
    /// Local transaction lifecycle violations
    Transaction,
    /// Caller preconditions and undecodable responses - never sent or never usable
    Client,
}

/// Main error type for the graph database client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphDbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Service busy at {endpoint} (status {status})")]
    ServiceBusy { endpoint: String, status: u16 },

    #[error("Unauthorized request to {endpoint}")]
    Unauthorized { endpoint: String, body: String },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16, body: String },

    #[error("Transaction is not active (state: {state})")]
    TransactionInactive { state: TransactionState },

    #[error("Could not obtain transaction identifier")]
    MissingTransactionLocation,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl GraphDbError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::ServiceBusy { .. } => ErrorCategory::Busy,
            Self::Unauthorized { .. } | Self::Auth(_) => ErrorCategory::Authentication,
            Self::Status { .. } | Self::MissingTransactionLocation => ErrorCategory::Server,
            Self::TransactionInactive { .. } => ErrorCategory::Transaction,
            Self::InvalidInput(_) | Self::Parse(_) => ErrorCategory::Client,
        }
    }

    /// Whether the same endpoint may be attempted again after this error
    pub fn is_retriable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transport | ErrorCategory::Busy)
    }

    /// Whether the server rejected the session token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServiceBusy { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Shorthand for a transport failure at `endpoint`
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport { endpoint: endpoint.into(), message: message.into() }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, GraphDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(GraphDbError::Config("x".into()).category(), ErrorCategory::Config);
        assert_eq!(GraphDbError::transport("a", "refused").category(), ErrorCategory::Transport);
        assert_eq!(
            GraphDbError::ServiceBusy { endpoint: "a".into(), status: 503 }.category(),
            ErrorCategory::Busy
        );
        assert_eq!(
            GraphDbError::Unauthorized { endpoint: "a".into(), body: String::new() }.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            GraphDbError::TransactionInactive { state: TransactionState::Committed }.category(),
            ErrorCategory::Transaction
        );
    }

    #[test]
    fn test_only_transport_and_busy_are_retriable() {
        assert!(GraphDbError::transport("a", "timeout").is_retriable());
        assert!(GraphDbError::ServiceBusy { endpoint: "a".into(), status: 503 }.is_retriable());
        assert!(!GraphDbError::Status { endpoint: "a".into(), status: 500, body: String::new() }
            .is_retriable());
        assert!(!GraphDbError::Unauthorized { endpoint: "a".into(), body: String::new() }
            .is_retriable());
        assert!(!GraphDbError::MissingTransactionLocation.is_retriable());
    }

    #[test]
    fn test_status_accessor() {
        let err = GraphDbError::Status { endpoint: "a".into(), status: 404, body: "gone".into() };
        assert_eq!(err.status(), Some(404));
        assert_eq!(GraphDbError::transport("a", "dns").status(), None);
    }
}
