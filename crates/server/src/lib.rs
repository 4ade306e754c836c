//! BV-RAG Server
//!
//! HTTP and WebSocket surface over the answering pipeline: the
//! text-query/voice-query/tts endpoints, a debugging-oriented raw search
//! endpoint, regulation lookup, admin inspection endpoints, and a
//! Prometheus metrics exporter.

pub mod http;
pub mod metrics;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use thiserror::Error;

/// Errors raised directly by the HTTP layer, distinct from
/// `bv_rag_core::Error` (which already carries its own status-code
/// mapping for pipeline failures).
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<&ServerError> for axum::http::StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
