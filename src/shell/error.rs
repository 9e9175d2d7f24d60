// ABOUTME: Script and console evaluation errors with SNAFU pattern.
// ABOUTME: Runtime errors are wrapped with the 1-based line they occurred on.

use crate::gmp::GmpError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ScriptError {
    #[snafu(display("syntax error: {message}"))]
    Syntax { message: String },

    #[snafu(display("name '{name}' is not defined"))]
    UndefinedName { name: String },

    #[snafu(display("'{kind}' has no attribute '{attribute}'"))]
    NoAttribute {
        kind: &'static str,
        attribute: String,
    },

    #[snafu(display("type error: {message}"))]
    Type { message: String },

    #[snafu(display("command failed: {source}"))]
    Command { source: GmpError },

    #[snafu(display("cannot decode {}: {source}", path.display()))]
    Decode {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("output failed: {source}"))]
    Output { source: std::io::Error },

    #[snafu(display("line {line}: {source}"))]
    AtLine {
        line: usize,
        #[snafu(source(from(ScriptError, Box::new)))]
        source: Box<ScriptError>,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorKind {
    Syntax,
    Name,
    Attribute,
    Type,
    Command,
    Decode,
    Output,
}

impl ScriptError {
    /// The kind of the underlying error, looking through line wrappers.
    pub fn kind(&self) -> ScriptErrorKind {
        match self {
            ScriptError::Syntax { .. } => ScriptErrorKind::Syntax,
            ScriptError::UndefinedName { .. } => ScriptErrorKind::Name,
            ScriptError::NoAttribute { .. } => ScriptErrorKind::Attribute,
            ScriptError::Type { .. } => ScriptErrorKind::Type,
            ScriptError::Command { .. } => ScriptErrorKind::Command,
            ScriptError::Decode { .. } => ScriptErrorKind::Decode,
            ScriptError::Output { .. } => ScriptErrorKind::Output,
            ScriptError::AtLine { source, .. } => source.kind(),
        }
    }

    /// Line number, if the error was raised while running a script.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
