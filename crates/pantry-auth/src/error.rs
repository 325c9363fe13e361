//! Error types for authorization and collaboration.

use pantry_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur in collaboration operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The referenced record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The acting user may not perform the operation.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// The user is already a member of the group.
    #[error("already a member: {0}")]
    AlreadyMember(String),

    /// The user already collaborates on the resource.
    #[error("already a collaborator: {0}")]
    AlreadyCollaborator(String),

    /// The record already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The resource type is not one of the shareable kinds.
    #[error("invalid resource type: {0}")]
    InvalidResourceType(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<RegistryError> for AuthError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UserNotFound(s) => AuthError::NotFound(format!("user {}", s)),
            RegistryError::ResourceNotFound(s) => AuthError::NotFound(s),
            RegistryError::UsernameTaken(s) | RegistryError::NameTaken(s) => {
                AuthError::AlreadyExists(s)
            }
            RegistryError::InvalidUsername(s) | RegistryError::InvalidName(s) => {
                AuthError::InvalidInput(s)
            }
        }
    }
}

/// Result type for collaboration operations.
pub type Result<T> = std::result::Result<T, AuthError>;
