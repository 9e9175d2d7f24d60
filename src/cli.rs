// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: One subcommand per transport, each flattening the shared session flags.

use crate::config::{
    DEFAULT_CONFIG_PATH, DEFAULT_GVM_PORT, DEFAULT_SSH_PORT, DEFAULT_SSH_USER, DEFAULT_TIMEOUT,
    DEFAULT_UNIX_SOCKET_PATH, NO_TIMEOUT,
};
use crate::logging::LogLevel;
use crate::shell::HELP_TEXT;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gvm-shell")]
#[command(about = "Interactive console and script runner for GMP")]
#[command(long_about = HELP_TEXT)]
#[command(version)]
#[command(subcommand_value_name = "CONNECTION_TYPE")]
#[command(after_help = "usage: gvm-shell [-h] [--version] [connection_type] ...\n   or: gvm-shell connection_type --help")]
pub struct Cli {
    /// Configuration file path. Default: ~/.config/gvm-tools.conf
    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CONFIG_PATH
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub connection: ConnectionCommand,
}

impl Cli {
    pub fn shared(&self) -> &SharedArgs {
        self.connection.shared()
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConnectionCommand {
    /// Use SSH connection for gmp service.
    Ssh(SshArgs),

    /// Use TLS secured connection for gmp service.
    Tls(TlsArgs),

    /// Use UNIX-Socket connection for gmp service.
    Socket(SocketArgs),
}

impl ConnectionCommand {
    pub fn shared(&self) -> &SharedArgs {
        match self {
            ConnectionCommand::Ssh(args) => &args.shared,
            ConnectionCommand::Tls(args) => &args.shared,
            ConnectionCommand::Socket(args) => &args.shared,
        }
    }
}

/// Flags accepted by every transport.
#[derive(Debug, Clone, Args)]
pub struct SharedArgs {
    /// Wait <seconds> for response or if value -1, then wait continuously.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT,
        allow_negative_numbers = true,
        value_parser = parse_timeout
    )]
    pub timeout: i64,

    /// Activates logging. Default level: INFO.
    #[arg(
        long = "log",
        value_name = "LEVEL",
        value_enum,
        num_args = 0..=1,
        default_missing_value = "INFO"
    )]
    pub loglevel: Option<LogLevel>,

    /// Start an interactive console.
    #[arg(short, long)]
    pub interactive: bool,

    /// GMP username.
    #[arg(long)]
    pub gmp_username: Option<String>,

    /// GMP password.
    #[arg(long)]
    pub gmp_password: Option<String>,

    /// Preload gmp script. Example: myscript.gmp.
    #[arg(value_name = "SCRIPT")]
    pub script: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SshArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Hostname or IP-Address.
    #[arg(long)]
    pub hostname: String,

    /// Port.
    #[arg(long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// SSH Username.
    #[arg(long, default_value = DEFAULT_SSH_USER)]
    pub ssh_user: String,
}

#[derive(Debug, Clone, Args)]
pub struct TlsArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Hostname or IP-Address.
    #[arg(long)]
    pub hostname: String,

    /// Port.
    #[arg(long, default_value_t = DEFAULT_GVM_PORT)]
    pub port: u16,

    /// Path to the client certificate file.
    #[arg(long, value_name = "PATH")]
    pub certfile: Option<PathBuf>,

    /// Path to key certificate file.
    #[arg(long, value_name = "PATH")]
    pub keyfile: Option<PathBuf>,

    /// Path to CA certificate file.
    #[arg(long, value_name = "PATH")]
    pub cafile: Option<PathBuf>,

    /// Use only certificates.
    #[arg(long)]
    pub no_credentials: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SocketArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Deprecated. Use --socketpath instead
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub sockpath: Option<Option<PathBuf>>,

    /// UNIX-Socket path.
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_value = DEFAULT_UNIX_SOCKET_PATH,
        default_missing_value = DEFAULT_UNIX_SOCKET_PATH
    )]
    pub socketpath: PathBuf,
}

fn parse_timeout(value: &str) -> Result<i64, String> {
    let seconds: i64 = value
        .parse()
        .map_err(|_| format!("invalid timeout: {}", value))?;
    if seconds < NO_TIMEOUT {
        return Err(format!(
            "timeout must be -1 or a non-negative number of seconds, got {}",
            seconds
        ));
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn timeout_below_minus_one_is_rejected() {
        assert!(parse_timeout("-2").is_err());
        assert_eq!(parse_timeout("-1"), Ok(-1));
        assert_eq!(parse_timeout("5"), Ok(5));
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["gvm-shell"]).is_err());
    }

    #[test]
    fn ssh_requires_hostname() {
        assert!(Cli::try_parse_from(["gvm-shell", "ssh"]).is_err());
    }

    #[test]
    fn log_without_level_defaults_to_info() {
        let cli =
            Cli::try_parse_from(["gvm-shell", "socket", "--log", "--", "script.gmp"]).unwrap();
        assert_eq!(cli.shared().loglevel, Some(LogLevel::Info));
        assert_eq!(cli.shared().script, vec![PathBuf::from("script.gmp")]);
    }

    #[test]
    fn bare_config_flag_uses_default_path() {
        let cli = Cli::try_parse_from(["gvm-shell", "socket", "-c"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from(DEFAULT_CONFIG_PATH)));
    }

    #[test]
    fn config_flag_before_connection_type() {
        let cli = Cli::try_parse_from(["gvm-shell", "-c", "f", "socket"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("f")));
        assert!(matches!(cli.connection, ConnectionCommand::Socket(_)));
    }

    #[test]
    fn config_flag_after_connection_type() {
        let cli =
            Cli::try_parse_from(["gvm-shell", "ssh", "--hostname", "h", "--config", "f"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("f")));
    }

    #[test]
    fn negative_one_timeout_parses() {
        let cli = Cli::try_parse_from(["gvm-shell", "socket", "--timeout", "-1"]).unwrap();
        assert_eq!(cli.shared().timeout, -1);
    }
}
