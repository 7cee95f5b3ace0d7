//! Status-page error types.

use thiserror::Error;

/// Errors returned by a [`StatusPageApi`](crate::StatusPageApi) backend.
#[derive(Debug, Error)]
pub enum StatusPageError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StatusPageResult<T> = Result<T, StatusPageError>;
