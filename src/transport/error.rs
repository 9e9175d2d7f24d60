// ABOUTME: Transport-level error types.
// ABOUTME: Covers connection, authentication, TLS setup, timeouts and framing failures.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("not connected")]
    NotConnected,

    #[error("authentication failed: no valid credentials")]
    AuthenticationFailed,

    #[error("SSH agent not available: {0}")]
    AgentUnavailable(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("failed to load certificate from {path}: {reason}")]
    CertificateLoadFailed { path: PathBuf, reason: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed before a complete response was received")]
    ClosedMidResponse,

    #[error("channel closed unexpectedly")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("SSH key error: {0}")]
    Key(#[from] russh::keys::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
