// ABOUTME: Decides whether a run executes a script, opens the console, or both.

use std::path::PathBuf;

/// What a session does once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub script: Option<PathBuf>,
    pub console: bool,
}

impl ExecutionPlan {
    /// Without a script the console always opens; with one it opens only
    /// when `interactive` is set.
    pub fn new(script: Option<PathBuf>, interactive: bool) -> Self {
        let console = script.is_none() || interactive;
        Self { script, console }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        let script = || Some(PathBuf::from("run.gmp"));

        assert!(ExecutionPlan::new(None, false).console);
        assert!(ExecutionPlan::new(None, true).console);
        assert!(!ExecutionPlan::new(script(), false).console);
        assert_eq!(
            ExecutionPlan::new(script(), true),
            ExecutionPlan {
                script: script(),
                console: true,
            }
        );
    }
}
