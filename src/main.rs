// ABOUTME: Entry point for the gvm-shell CLI application.
// ABOUTME: Resolves options, builds the GMP client, then runs the script and/or console.

use clap::Parser;
use gvm_shell::cli::Cli;
use gvm_shell::config::{self, ConnectionConfig, ResolvedOptions};
use gvm_shell::diagnostics::{Diagnostics, Warning};
use gvm_shell::error::{Error, Result};
use gvm_shell::gmp::{CheckCommandTransform, Gmp};
use gvm_shell::logging::{self, LogConfig};
use gvm_shell::shell::{self, ExecutionPlan, Interpreter, Namespace, RustylineReader};
use gvm_shell::transport;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Installed first so startup warnings reach the log file too.
    logging::init(&LogConfig::new(cli.shared().loglevel)).map_err(Error::Logging)?;

    let mut diag = Diagnostics::default();
    let defaults = config::load_defaults(cli.config.as_deref(), &mut diag);
    let options = ResolvedOptions::resolve(cli, defaults, &mut diag);
    diag.emit();

    tracing::debug!("Resolved options: {:?}", options);

    let mut client = Gmp::new(
        transport::open(&options.connection),
        Box::new(CheckCommandTransform),
    );
    if let ConnectionConfig::Tls {
        no_credentials: true,
        ..
    } = options.connection
    {
        client = client.without_credentials();
    }

    let plan = ExecutionPlan::new(
        options.script().map(|path| path.to_path_buf()),
        options.interactive,
    );
    let mut namespace = Namespace::with_builtins(options);
    let mut reader = RustylineReader::new();
    let mut stdout = std::io::stdout();

    let outcome = {
        let mut interpreter = Interpreter::new(&mut client, &mut stdout);
        shell::run_session(&plan, &mut interpreter, &mut namespace, &mut reader).await
    };

    // Disconnect before any session error is reported.
    if let Err(e) = client.disconnect().await {
        let mut diag = Diagnostics::default();
        diag.warn(Warning::disconnect(e.to_string()));
        diag.emit();
    }

    outcome.map_err(Error::from)
}
