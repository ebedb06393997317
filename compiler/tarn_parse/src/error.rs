//! Local parse failures.
//!
//! A production that cannot continue returns a [`ParseFailure`]: the one
//! diagnostic describing the problem plus the recovery its catcher should
//! apply. Minor problems that do not stop the production go straight to
//! the sink instead.

use tarn_diagnostic::{unexpected_token, Diagnostic, ErrorCode};
use tarn_ir::{Span, TokenKind};

use crate::recovery::RecoveryBehavior;

#[derive(Clone, Debug)]
pub struct ParseFailure {
    pub diagnostic: Diagnostic,
    pub recovery: RecoveryBehavior,
}

pub type ParseResult<T> = Result<T, ParseFailure>;

impl ParseFailure {
    pub fn new(diagnostic: Diagnostic) -> Self {
        ParseFailure {
            diagnostic,
            recovery: RecoveryBehavior::None,
        }
    }

    #[must_use]
    pub fn with_recovery(mut self, recovery: RecoveryBehavior) -> Self {
        self.recovery = recovery;
        self
    }

    /// `expected ..., found ...` at `span`.
    pub fn expected(expected: &str, found: TokenKind, span: Span) -> Self {
        Self::new(unexpected_token(span, expected, found.describe()))
    }

    pub fn expected_expression(found: TokenKind, span: Span) -> Self {
        Self::new(
            Diagnostic::error(ErrorCode::E1002)
                .with_message(format!("expected expression, found {}", found.describe()))
                .with_span(span),
        )
    }

    pub fn expected_identifier(found: TokenKind, span: Span) -> Self {
        Self::new(
            Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("expected identifier, found {}", found.describe()))
                .with_span(span),
        )
    }

    pub fn expected_type(found: TokenKind, span: Span) -> Self {
        Self::new(
            Diagnostic::error(ErrorCode::E1005)
                .with_message(format!("expected type, found {}", found.describe()))
                .with_span(span),
        )
    }

    pub fn invalid_pattern(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            Diagnostic::error(ErrorCode::E1006)
                .with_message(message)
                .with_span(span),
        )
    }
}
