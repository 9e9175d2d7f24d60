// ABOUTME: Loads a script file and runs it through the interpreter.
// ABOUTME: Unreadable files are reported and skipped; runtime errors propagate.

use super::error::{DecodeSnafu, ScriptError};
use super::interpreter::Interpreter;
use super::namespace::Namespace;
use snafu::ResultExt;
use std::io;
use std::path::Path;

/// Run the script at `path` in `namespace`.
///
/// A file that cannot be read prints its error and counts as done, so an
/// interactive session can still follow. Content that is not UTF-8 is an
/// error.
pub async fn load(
    path: &Path,
    interpreter: &mut Interpreter<'_>,
    namespace: &mut Namespace,
) -> Result<(), ScriptError> {
    let source = match tokio::fs::read_to_string(path).await {
        Ok(source) => source,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return Err(e).context(DecodeSnafu { path });
        }
        Err(e) => {
            tracing::warn!("Could not read script {}: {}", path.display(), e);
            interpreter.write_line(&format!("{}: {}", path.display(), e))?;
            return Ok(());
        }
    };

    tracing::info!("Running script {}", path.display());
    interpreter.execute(namespace, &source).await
}
