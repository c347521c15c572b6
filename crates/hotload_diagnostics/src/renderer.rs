//! Human-readable rendering of compile diagnostics.

use crate::diagnostic::Diagnostic;

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error: unexpected token
///   --> app.models.User:12
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders a single diagnostic into a formatted string.
    pub fn render(&self, diag: &Diagnostic) -> String {
        let severity = if self.color {
            let code = if diag.severity.is_error() { "31" } else { "33" };
            format!("\x1b[1;{code}m{}\x1b[0m", diag.severity)
        } else {
            diag.severity.to_string()
        };

        let mut out = format!("{severity}: {}\n", diag.message);
        match diag.line {
            Some(line) => out.push_str(&format!("  --> {}:{line}\n", diag.unit)),
            None => out.push_str(&format!("  --> {}\n", diag.unit)),
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}
