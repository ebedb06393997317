//! Core diagnostic types.
//!
//! A [`Diagnostic`] is a severity, an optional error code, an optional
//! source span and a message, plus secondary labels and notes. Every phase
//! builds them with the same builder methods and appends them to a
//! [`Diagnostics`](crate::Diagnostics) sink.

use std::fmt;

use tarn_ir::Span;

use crate::ErrorCode;

/// Severity level, ordered from least to most severe.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub enum Severity {
    Debug,
    #[default]
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Warn => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A secondary span with an explanation, e.g. "first defined here".
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub span: Option<Span>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: Option<ErrorCode>) -> Self {
        Diagnostic {
            severity,
            code,
            span: None,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::new(Severity::Error, Some(code))
    }

    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::new(Severity::Warn, Some(code))
    }

    /// Compiler-internal trace message; hidden unless debug output is on.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, None).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Anchor the diagnostic at `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} [{}]: {}", self.severity, code, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }
        if let Some(span) = self.span {
            write!(f, "\n  --> {span}")?;
        }
        for label in &self.labels {
            write!(f, "\n      {}: {}", label.span, label.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}

/// Create an "unexpected token" diagnostic.
pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message(format!("expected {expected}, found {found}"))
        .with_span(span)
}

/// Create an "unclosed delimiter" diagnostic. `missing_at` may lie past
/// the end of the input.
pub fn unclosed_delimiter(open_span: Span, missing_at: Span, delimiter: char) -> Diagnostic {
    let expected = match delimiter {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => delimiter,
    };
    Diagnostic::error(ErrorCode::E1003)
        .with_message(format!("unclosed delimiter `{delimiter}`"))
        .with_span(missing_at)
        .with_label(open_span, format!("`{delimiter}` opened here"))
        .with_note(format!("expected `{expected}`"))
}

/// Create a "type mismatch" diagnostic.
pub fn type_mismatch(span: Span, expected: &str, found: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3001)
        .with_message(format!("type mismatch: expected `{expected}`, found `{found}`"))
        .with_span(span)
}
