use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Unknown or unusable LED at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected input, e.g. a trigger the LED does not support
    #[error("{0}")]
    Validation(String),

    /// Attribute read/write failure
    #[error("I/O error: {0}")]
    Io(String),

    /// An encoder failed to produce blinks
    #[error("Encoder '{name}' failed: {message}")]
    Handler { name: String, message: String },

    #[error("Registration failed: {0}")]
    Registration(String),

    /// The operation was discarded by a reset before it could complete
    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    pub fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io(format!("{path}: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
