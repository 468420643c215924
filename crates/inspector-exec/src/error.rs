//! Error types for inspector-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a host
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Host address is empty or otherwise unusable
    #[error("invalid host address: {0:?}")]
    InvalidHost(String),

    /// Failed to connect to remote host (dial or handshake)
    #[error("error connecting to remote host: {0}")]
    ConnectionFailed(String),

    /// None of the offered credentials were accepted
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A command channel could not be opened or the exec request was refused
    #[error("failed to open session: {0}")]
    SessionOpen(String),

    /// Host did not finish within the configured deadline
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),

    /// Session was used after it was closed
    #[error("not connected")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = ExecError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "timed out after 30s");
    }

    #[test]
    fn test_connection_message_mentions_cause() {
        let err = ExecError::ConnectionFailed("Connection refused (os error 111)".into());
        assert_eq!(
            err.to_string(),
            "error connecting to remote host: Connection refused (os error 111)"
        );
    }
}
