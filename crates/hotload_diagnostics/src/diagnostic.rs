//! Structured diagnostic messages attached to a unit and line.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A diagnostic emitted while compiling one unit.
///
/// `line` is 1-indexed and refers to the source file backing `unit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unit being compiled when the diagnostic was produced.
    pub unit: String,
    /// Source line, if the compiler could locate the problem.
    pub line: Option<u32>,
    /// The main diagnostic message.
    pub message: String,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic for `unit`.
    pub fn error(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, unit, message)
    }

    /// Creates a new warning diagnostic for `unit`.
    pub fn warning(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, unit, message)
    }

    fn new(severity: Severity, unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            unit: unit.into(),
            line: None,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Sets the source line of this diagnostic.
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
