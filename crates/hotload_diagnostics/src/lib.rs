//! Compiler diagnostics reported by a failed compile.
//!
//! A compile pipeline that rejects a unit returns its [`Diagnostic`]s; the
//! loader logs them and the CLI renders them with the [`TerminalRenderer`].
//! The thread-safe [`DiagnosticSink`] lets a compiler accumulate
//! diagnostics across the units of one batch.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::TerminalRenderer;
pub use severity::Severity;
pub use sink::DiagnosticSink;
