use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("content node `{path}` not found")]
    ContentNotFound { path: String },
    #[error("content validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn content_not_found(path: impl Into<String>) -> Self {
        Self::ContentNotFound { path: path.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
