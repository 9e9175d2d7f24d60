// ABOUTME: Script execution and the interactive console over one GMP client.
// ABOUTME: A session runs the optional script first, then the console, sharing one namespace.

pub mod console;
mod error;
mod help;
mod interpreter;
mod namespace;
mod parser;
mod plan;
pub mod script;

pub use console::{BANNER, LineReader, PROMPT, ReadOutcome, RustylineReader};
pub use error::{ScriptError, ScriptErrorKind};
pub use help::HELP_TEXT;
pub use interpreter::Interpreter;
pub use namespace::{Namespace, Value};
pub use parser::{Argument, Expr, Statement, parse_line};
pub use plan::ExecutionPlan;

/// Run the planned script and console against one namespace.
///
/// The console is entered at most once. Script errors end the session
/// before the console would open.
pub async fn run_session(
    plan: &ExecutionPlan,
    interpreter: &mut Interpreter<'_>,
    namespace: &mut Namespace,
    reader: &mut dyn LineReader,
) -> Result<(), ScriptError> {
    if let Some(path) = &plan.script {
        script::load(path, interpreter, namespace).await?;
    }
    if plan.console {
        console::run(interpreter, namespace, reader).await?;
    }
    Ok(())
}
