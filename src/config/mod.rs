// ABOUTME: Option resolution for a shell session.
// ABOUTME: Merges config-file credential defaults under the command-line flags.

mod auth;
mod connection;

pub use auth::{AuthDefaults, DEFAULT_CONFIG_PATH, expand_home, load_auth_defaults};
pub use connection::{
    ConnectionConfig, DEFAULT_GVM_PORT, DEFAULT_SSH_PORT, DEFAULT_SSH_USER, DEFAULT_TIMEOUT,
    DEFAULT_UNIX_SOCKET_PATH, NO_TIMEOUT, TransportKind, resolve_timeout,
};

use crate::cli::{Cli, ConnectionCommand};
use crate::diagnostics::{Diagnostics, Warning};
use crate::logging::LogLevel;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Message printed when `--sockpath` is used.
pub const SOCKPATH_DEPRECATION: &str =
    "The --sockpath parameter has been deprecated. Please use --socketpath instead";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("No section: '{section}' in {path}")]
    MissingSection { path: PathBuf, section: &'static str },
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOptions {
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    pub config: Option<PathBuf>,
    pub loglevel: Option<LogLevel>,
    pub interactive: bool,
    pub gmp_username: String,
    pub gmp_password: String,
    pub script: Vec<PathBuf>,
}

impl ResolvedOptions {
    /// Merge parsed flags over config-file defaults.
    ///
    /// Flags always win. Credentials missing from both sources resolve to
    /// empty strings.
    pub fn resolve(cli: Cli, defaults: AuthDefaults, diag: &mut Diagnostics) -> Self {
        let config = cli.config;
        let (shared, connection) = match cli.connection {
            ConnectionCommand::Ssh(args) => {
                let timeout = resolve_timeout(args.shared.timeout);
                (
                    args.shared,
                    ConnectionConfig::Ssh {
                        hostname: args.hostname,
                        port: args.port,
                        ssh_user: args.ssh_user,
                        timeout,
                    },
                )
            }
            ConnectionCommand::Tls(args) => {
                let timeout = resolve_timeout(args.shared.timeout);
                (
                    args.shared,
                    ConnectionConfig::Tls {
                        hostname: args.hostname,
                        port: args.port,
                        certfile: args.certfile,
                        keyfile: args.keyfile,
                        cafile: args.cafile,
                        no_credentials: args.no_credentials,
                        timeout,
                    },
                )
            }
            ConnectionCommand::Socket(args) => {
                let timeout = resolve_timeout(args.shared.timeout);
                let path = match args.sockpath.flatten() {
                    Some(path) => {
                        diag.warn(Warning::deprecated_option(SOCKPATH_DEPRECATION));
                        path
                    }
                    None => args.socketpath,
                };
                (args.shared, ConnectionConfig::Socket { path, timeout })
            }
        };

        Self {
            connection,
            config,
            loglevel: shared.loglevel,
            interactive: shared.interactive,
            gmp_username: shared
                .gmp_username
                .or(defaults.gmp_username)
                .unwrap_or_default(),
            gmp_password: shared
                .gmp_password
                .or(defaults.gmp_password)
                .unwrap_or_default(),
            script: shared.script,
        }
    }

    /// The script to run. Only the first positional path is ever used.
    pub fn script(&self) -> Option<&Path> {
        self.script.first().map(PathBuf::as_path)
    }
}

/// Load credential defaults, reporting failures as warnings.
///
/// A broken config file never stops the session; the built-in defaults are
/// used instead.
pub fn load_defaults(path: Option<&Path>, diag: &mut Diagnostics) -> AuthDefaults {
    let Some(path) = path else {
        return AuthDefaults::default();
    };
    match load_auth_defaults(path) {
        Ok(defaults) => defaults,
        Err(e) => {
            diag.warn(Warning::config_unreadable(e.to_string()));
            AuthDefaults::default()
        }
    }
}
