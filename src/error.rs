// ABOUTME: Application-wide error type for gvm-shell.
// ABOUTME: Uses thiserror; each layer's error converts in with `?`.

use crate::gmp::GmpError;
use crate::shell::ScriptError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Gmp(#[from] GmpError),

    #[error("failed to set up logging: {0}")]
    Logging(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
