//! Error types for the namespace guard.
//!
//! Defines the crate error type with classification for the not-found
//! condition that the decision engine treats specially.

use thiserror::Error;

/// Error type for cluster access, configuration and serving
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A cluster query could not be completed
    #[error("Query failed: {0}")]
    Query(String),

    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Kube(kube::Error::Api(e)) => e.code == 404,
            _ => false,
        }
    }
}

/// Result type alias for namespace guard operations
pub type Result<T> = std::result::Result<T, Error>;
