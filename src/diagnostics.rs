// ABOUTME: Diagnostics accumulator for non-fatal warnings during startup and teardown.
// ABOUTME: Collects warnings that shouldn't stop a session but should be shown to users.

/// Collects non-fatal warnings while a session is set up and torn down.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Write every collected warning to stderr, in order.
    pub fn emit(&self) {
        for warning in &self.warnings {
            eprintln!("{}", warning.message);
        }
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a warning for a config file that could not be used.
    pub fn config_unreadable(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ConfigUnreadable,
            message: message.into(),
        }
    }

    /// Create a warning for a deprecated command-line option.
    pub fn deprecated_option(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DeprecatedOption,
            message: message.into(),
        }
    }

    /// Create a warning for a disconnect that failed.
    pub fn disconnect(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Disconnect,
            message: message.into(),
        }
    }
}

/// Categories of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Config file missing, unreadable, or without an [Auth] section.
    ConfigUnreadable,
    /// A deprecated flag was used.
    DeprecatedOption,
    /// Failed to cleanly close the connection.
    Disconnect,
}
