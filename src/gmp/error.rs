// ABOUTME: Errors raised by the GMP client.
// ABOUTME: Wraps transport failures and reports rejected commands.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmpError {
    #[error(transparent)]
    Transport(#[from] crate::transport::Error),

    #[error("GMP command failed with status {status}: {status_text}")]
    Response { status: String, status_text: String },

    #[error("invalid GMP response: {0}")]
    InvalidResponse(String),

    #[error("invalid GMP command: {0}")]
    InvalidCommand(String),
}
