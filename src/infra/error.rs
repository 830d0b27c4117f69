use thiserror::Error;

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("content tree `{path}` is invalid: {source}")]
    Content {
        path: String,
        #[source]
        source: ContentError,
    },
}

/// Why a content file could not be turned into a content tree.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("malformed content file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn content(path: impl Into<String>, source: ContentError) -> Self {
        Self::Content {
            path: path.into(),
            source,
        }
    }
}
