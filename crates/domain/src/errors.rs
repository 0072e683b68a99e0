use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid identifier: {0}")]
    InvalidTaskId(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
