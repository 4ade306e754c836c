//! Shared error type returned by every other crate in the workspace.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error taxonomy. Each backend-facing crate defines its own
/// error enum and converts into this one at the crate boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("index unavailable ({backend}): {message}")]
    IndexUnavailable { backend: String, message: String },

    #[error("retrieval unavailable: all legs failed")]
    RetrievalUnavailable,

    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("session store unavailable: {0}")]
    SessionStoreUnavailable(String),

    #[error("utility store unavailable: {0}")]
    UtilityStoreUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status category this error maps to, per the error-handling design.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::Timeout(_) => 408,
            Error::Cancelled => 499,
            Error::NotFound(_) => 404,
            Error::EmbeddingUnavailable(_)
            | Error::IndexUnavailable { .. }
            | Error::RetrievalUnavailable
            | Error::GenerationUnavailable(_)
            | Error::SessionStoreUnavailable(_)
            | Error::UtilityStoreUnavailable(_) => 503,
            Error::Config(_) | Error::Other(_) => 500,
        }
    }
}
