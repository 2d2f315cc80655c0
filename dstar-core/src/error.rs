//! Error types for dstar-rs

use thiserror::Error;

/// Result type alias for dstar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dstar-rs
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DHCP protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Attack execution error
    #[error("Attack error: {0}")]
    Attack(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Transmission failed
    #[error("Send failed: {0}")]
    Send(String),

    /// Insufficient privileges
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),

    /// Execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl Error {
    /// Create a protocol error with a custom message
    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create an attack error with a custom message
    pub fn attack<S: Into<String>>(msg: S) -> Self {
        Error::Attack(msg.into())
    }

    /// Create a send error with a custom message
    pub fn send<S: Into<String>>(msg: S) -> Self {
        Error::Send(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = Error::invalid_parameter("interval_ms", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'interval_ms': must be greater than zero"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "raw socket");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("Network I/O error"));
    }
}
