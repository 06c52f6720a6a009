use thiserror::Error;

/// Errors raised by the advert domain rules themselves, independent of any
/// storage backend.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("advert validation failed: {message}")]
    Validation { message: String },
    /// A structural assumption did not hold, e.g. a draft row without an
    /// origin or a draft spawning its own draft.
    #[error("advert invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
