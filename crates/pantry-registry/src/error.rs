//! Error types for the registry.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur in the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Username already taken.
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Resource not found.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Resource name already taken within its kind.
    #[error("name already taken: {0}")]
    NameTaken(String),

    /// Invalid resource name format.
    #[error("invalid name: {0}")]
    InvalidName(String),
}
