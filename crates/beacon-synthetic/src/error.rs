//! Synthetic-monitoring error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntheticError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("client is not registered")]
    NotRegistered,

    #[error("check not found: {0}")]
    NotFound(i64),
}

pub type SyntheticResult<T> = Result<T, SyntheticError>;
