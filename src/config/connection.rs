// ABOUTME: Resolved connection settings for the three GMP transports.
// ABOUTME: Holds defaults and converts the raw timeout flag into an optional Duration.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Seconds to wait for a response when `--timeout` is not given.
pub const DEFAULT_TIMEOUT: i64 = 60;
/// Timeout flag value meaning "wait forever".
pub const NO_TIMEOUT: i64 = -1;
/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Default SSH user on a GSM appliance.
pub const DEFAULT_SSH_USER: &str = "gmp";
/// Default gvmd TLS port.
pub const DEFAULT_GVM_PORT: u16 = 9390;
/// Default gvmd Unix socket.
pub const DEFAULT_UNIX_SOCKET_PATH: &str = "/usr/local/var/run/gvmd.sock";

/// Convert the `--timeout` flag into a connection timeout.
///
/// `-1` disables the timeout. Values below `-1` are rejected by the
/// argument parser, so they never reach this point.
pub fn resolve_timeout(seconds: i64) -> Option<Duration> {
    if seconds == NO_TIMEOUT {
        None
    } else {
        Some(Duration::from_secs(seconds.max(0) as u64))
    }
}

/// Which transport a connection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Ssh,
    Tls,
    Socket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Ssh => write!(f, "ssh"),
            TransportKind::Tls => write!(f, "tls"),
            TransportKind::Socket => write!(f, "socket"),
        }
    }
}

/// Everything needed to open one connection to gvmd.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "connection_type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    Ssh {
        hostname: String,
        port: u16,
        ssh_user: String,
        #[serde(serialize_with = "serialize_timeout")]
        timeout: Option<Duration>,
    },
    Tls {
        hostname: String,
        port: u16,
        certfile: Option<PathBuf>,
        keyfile: Option<PathBuf>,
        cafile: Option<PathBuf>,
        no_credentials: bool,
        #[serde(serialize_with = "serialize_timeout")]
        timeout: Option<Duration>,
    },
    Socket {
        path: PathBuf,
        #[serde(serialize_with = "serialize_timeout")]
        timeout: Option<Duration>,
    },
}

impl ConnectionConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            ConnectionConfig::Ssh { .. } => TransportKind::Ssh,
            ConnectionConfig::Tls { .. } => TransportKind::Tls,
            ConnectionConfig::Socket { .. } => TransportKind::Socket,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self {
            ConnectionConfig::Ssh { timeout, .. }
            | ConnectionConfig::Tls { timeout, .. }
            | ConnectionConfig::Socket { timeout, .. } => *timeout,
        }
    }

    /// Short human-readable endpoint, e.g. `ssh://gmp@host:22`.
    pub fn endpoint(&self) -> String {
        match self {
            ConnectionConfig::Ssh {
                hostname,
                port,
                ssh_user,
                ..
            } => format!("ssh://{}@{}:{}", ssh_user, hostname, port),
            ConnectionConfig::Tls { hostname, port, .. } => {
                format!("tls://{}:{}", hostname, port)
            }
            ConnectionConfig::Socket { path, .. } => format!("unix://{}", path.display()),
        }
    }
}

fn serialize_timeout<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match timeout {
        Some(t) => serializer.serialize_some(&t.as_secs()),
        None => serializer.serialize_none(),
    }
}
