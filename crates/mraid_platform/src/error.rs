//! Platform error types

use thiserror::Error;

/// Host-integration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Failed to initialize a host service
    #[error("Platform initialization failed: {0}")]
    InitFailed(String),

    /// A host service exists but cannot serve the request (e.g. no calendar app)
    #[error("Platform service not available: {0}")]
    Unavailable(String),

    /// The host context does not support the operation (e.g. no orientation control)
    #[error("Platform operation not supported: {0}")]
    Unsupported(String),

    /// A listener or connection was released twice or never registered
    #[error("Not registered: {0}")]
    NotRegistered(String),

    /// The view hierarchy rejected a structural change
    #[error("Invalid view hierarchy operation: {0}")]
    Hierarchy(String),

    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
