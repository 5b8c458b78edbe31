//! Error types for Broadcast Tower

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the message store.
///
/// The store and query engine themselves are total; every variant here belongs
/// to start-up or the listeners. Rejected requests are [`ValidationError`]s and
/// never leave the router.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bind address could not be parsed
    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reasons a broadcast or query request is rejected before reaching the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `messageText` was absent or not a string
    #[error("missing message text")]
    MissingMessage,

    /// `messageText` exceeds the configured size
    #[error("message is {size} bytes, limit is {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// Request body could not be decoded
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// Request body exceeded the transport limit
    #[error("body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// A query parameter was malformed or out of range
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A query parameter was given more than once
    #[error("parameter '{0}' given more than once")]
    DuplicateParameter(&'static str),
}

impl ValidationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MessageTooLarge {
            size: 12,
            limit: 10,
        };
        assert_eq!(err.to_string(), "message is 12 bytes, limit is 10");

        let err = ValidationError::invalid("limit", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'limit': must be positive"
        );
    }

    #[test]
    fn test_startup_error_conversions() {
        let parse_err = "not-an-addr".parse::<SocketAddr>().unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::AddrParse(_)));

        let err: Error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy").into();
        assert_eq!(err.to_string(), "I/O error: busy");
    }
}
