#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtomError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtomError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl AtomError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
