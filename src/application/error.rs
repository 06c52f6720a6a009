use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    /// The requested transition clashes with an in-flight one, e.g. a draft
    /// already submitted for moderation. Surfaced to the caller, not retried.
    #[error("conflict: {0}")]
    Conflict(&'static str),
    /// The advert is mid-moderation and refuses edits until the pending
    /// action settles.
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Integrity breaches are programmer errors, not user-recoverable.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::invariant(message))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            RepoError::Integrity { message } => AppError::integrity(message),
            other => AppError::Infra(InfraError::database(other.to_string())),
        }
    }
}
