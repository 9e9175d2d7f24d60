// ABOUTME: Process-wide logging setup driven by the --log flag.
// ABOUTME: Writes tracing output to a fixed local file, or installs nothing when disabled.

use clap::ValueEnum;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file written in the current working directory.
pub const LOG_FILE: &str = "gvm-pyshell.log";

/// Levels accepted by `--log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
    #[value(name = "CRITICAL")]
    Critical,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`. Critical has no tracing
    /// counterpart and maps to error.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

/// Logging settings, applied once at startup.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `None` leaves logging disabled.
    pub level: Option<LogLevel>,
    pub file: PathBuf,
}

impl LogConfig {
    pub fn new(level: Option<LogLevel>) -> Self {
        Self {
            level,
            file: PathBuf::from(LOG_FILE),
        }
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = path.into();
        self
    }
}

/// Install the global subscriber. Returns whether logging was enabled.
pub fn init(config: &LogConfig) -> io::Result<bool> {
    let Some(level) = config.level else {
        return Ok(false);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.as_directive()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(true)
}
