// ABOUTME: Interactive read-eval-print loop over the session namespace.
// ABOUTME: Line editing via rustyline on a dedicated reader thread.

use super::error::{OutputSnafu, ScriptError};
use super::interpreter::Interpreter;
use super::namespace::Namespace;
use async_trait::async_trait;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use snafu::ResultExt;
use std::io;
use std::sync::mpsc;
use std::thread;
use tokio::sync::mpsc as async_mpsc;

pub const BANNER: &str =
    "GVM Interactive Console. Type \"help\" to get information about functionality.";
pub const PROMPT: &str = ">>> ";

/// Result of reading one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl+C: the current line was discarded.
    Interrupted,
    /// Ctrl+D or closed input.
    Eof,
}

/// Source of console input.
#[async_trait]
pub trait LineReader: Send {
    async fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome>;
}

struct Worker {
    prompts: mpsc::Sender<String>,
    lines: async_mpsc::UnboundedReceiver<io::Result<ReadOutcome>>,
}

/// Terminal line reader with history for the current session.
///
/// The editor lives on its own thread, started on the first read, so the
/// runtime keeps polling connection I/O while the user types.
#[derive(Default)]
pub struct RustylineReader {
    worker: Option<Worker>,
}

impl RustylineReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn() -> io::Result<Worker> {
        let (prompt_tx, prompt_rx) = mpsc::channel::<String>();
        let (line_tx, line_rx) = async_mpsc::unbounded_channel();

        thread::Builder::new()
            .name("readline".to_string())
            .spawn(move || {
                let mut editor = match DefaultEditor::new() {
                    Ok(editor) => editor,
                    Err(e) => {
                        let _ = line_tx.send(Err(io::Error::other(e)));
                        return;
                    }
                };
                while let Ok(prompt) = prompt_rx.recv() {
                    let outcome = match editor.readline(&prompt) {
                        Ok(line) => {
                            if !line.trim().is_empty() {
                                let _ = editor.add_history_entry(line.as_str());
                            }
                            Ok(ReadOutcome::Line(line))
                        }
                        Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
                        Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
                        Err(ReadlineError::Io(e)) => Err(e),
                        Err(e) => Err(io::Error::other(e)),
                    };
                    if line_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Worker {
            prompts: prompt_tx,
            lines: line_rx,
        })
    }
}

#[async_trait]
impl LineReader for RustylineReader {
    async fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        if self.worker.is_none() {
            self.worker = Some(Self::spawn()?);
        }
        let Some(worker) = self.worker.as_mut() else {
            return Ok(ReadOutcome::Eof);
        };
        if worker.prompts.send(prompt.to_string()).is_err() {
            return Ok(ReadOutcome::Eof);
        }
        Ok(worker.lines.recv().await.transpose()?.unwrap_or(ReadOutcome::Eof))
    }
}

/// Run the console until end of input.
///
/// Evaluation errors are printed and the loop continues. Only output
/// and input failures end the console early.
pub async fn run(
    interpreter: &mut Interpreter<'_>,
    namespace: &mut Namespace,
    reader: &mut dyn LineReader,
) -> Result<(), ScriptError> {
    interpreter.write_line(BANNER)?;

    loop {
        match reader.read_line(PROMPT).await.context(OutputSnafu)? {
            ReadOutcome::Line(line) => match interpreter.eval_statement(namespace, &line).await {
                Ok(Some(value)) if !value.is_none() => {
                    let echo = interpreter.repr(&value);
                    interpreter.write_line(&echo)?;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Console statement failed: {}", e);
                    interpreter.write_line(&format!("Error: {}", e))?;
                }
            },
            ReadOutcome::Interrupted => interpreter.write_line("KeyboardInterrupt")?,
            ReadOutcome::Eof => break,
        }
    }

    tracing::debug!("Console closed");
    Ok(())
}
