//! Compiler diagnostics.
//!
//! The compiler has exactly one failure mode: the first lexical,
//! syntactic, or semantic error aborts the run. [`Diagnostic`] carries
//! the message and the source position; every phase returns
//! [`Result`] and propagates with `?`, and the driver renders the error
//! and exits with code 1.

use thiserror::Error;

use crate::span::{SourceFile, Span};

/// A fatal compiler error with its source position.
///
/// # Examples
///
/// ```
/// use yoctocc_util::{Diagnostic, SourceFile, Span};
///
/// let file = SourceFile::new("t.c", "int x@;\n");
/// let diag = Diagnostic::new("Unexpected character '@'", Span::new(5, 6, 1, 6));
/// assert_eq!(diag.render(&file), "Error at t.c 1:6: Unexpected character '@'");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct Diagnostic {
    /// Human-readable description of the error.
    pub message: String,
    /// Where the error occurred.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a diagnostic at the given span.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Renders the single-line locator form used on standard error.
    ///
    /// The line/column are recomputed from the span's byte offset so the
    /// position is correct even for spans synthesized without line info.
    pub fn render(&self, file: &SourceFile) -> String {
        let (line, column) = file.location(self.span.start);
        format!(
            "Error at {} {}:{}: {}",
            file.name(),
            line,
            column,
            self.message
        )
    }
}

/// Result alias used throughout the compiler.
pub type Result<T> = std::result::Result<T, Diagnostic>;
