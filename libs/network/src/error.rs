//! Transport Error Types
//!
//! Error handling for session bootstrap and socket transport. Transport-level
//! failures end the session (or abort bootstrap); per-message failures never
//! reach this type, they are logged and dropped by the read loop.

use thiserror::Error;

/// Session error alias
pub type SessionError = TransportError;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Rendezvous host unreachable; bootstrap aborted
    #[error("could not connect to host {host}:{port}")]
    CouldNotConnect {
        host: String,
        port: u16,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network connectivity errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Handshake failed after the rendezvous host was reached
    #[error("Handshake error: {message}")]
    Handshake {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Protocol and serialization errors
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport timeout errors
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Peer closed the connection
    #[error("Connection closed: {context}")]
    Closed { context: String },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create a could-not-connect error with source
    pub fn could_not_connect(
        host: impl Into<String>,
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CouldNotConnect {
            host: host.into(),
            port,
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a handshake error
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
            source: None,
        }
    }

    /// Create a handshake error with source
    pub fn handshake_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Handshake {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Create a protocol error with source
    pub fn protocol_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Protocol {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a closed-connection error
    pub fn closed(context: impl Into<String>) -> Self {
        Self::Closed {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn could_not_connect_message_is_stable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::could_not_connect("viz01", 5600, io);
        assert_eq!(err.to_string(), "could not connect to host viz01:5600");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn timeout_names_operation_and_limit() {
        let err = TransportError::timeout("session readiness", 2500);
        assert_eq!(
            err.to_string(),
            "Timeout error: session readiness exceeded 2500ms"
        );
    }
}
