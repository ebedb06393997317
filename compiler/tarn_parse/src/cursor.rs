//! Token cursor for navigating the token stream.
//!
//! The stream always ends with `Eof`; the cursor never moves past it, so
//! `current()` is total.

use tarn_ir::{Name, Span, StringInterner, Token, TokenKind};

pub struct Cursor<'a> {
    tokens: &'a [Token],
    interner: &'a StringInterner,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// `tokens` must be non-empty and end with `Eof`.
    pub fn new(tokens: &'a [Token], interner: &'a StringInterner) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must end with Eof"
        );
        Cursor {
            tokens,
            interner,
            pos: 0,
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Used for progress tracking: compare before and after a production.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn current(&self) -> Token {
        self.peek(0)
    }

    #[inline]
    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the last consumed token, or a point at the start.
    pub fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(self.current_span().start),
        }
    }

    /// Token `n` places ahead; clamps to the final `Eof`.
    pub fn peek(&self, n: usize) -> Token {
        let index = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(index)
            .copied()
            .unwrap_or(Token::new(TokenKind::Eof, Span::DUMMY))
    }

    #[inline]
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Same variant as `kind`, payload ignored.
    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind().same_kind(kind)
    }

    pub fn check_ident(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
    }

    /// Identifier text starting with an uppercase letter.
    pub fn is_constructor_name(&self, name: Name) -> bool {
        self.interner
            .lookup(name)
            .chars()
            .next()
            .is_some_and(char::is_uppercase)
    }

    /// Consume the current token. At `Eof` this is a no-op that returns `Eof`.
    pub fn advance(&mut self) -> Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tracing::trace!(kind = ?token.kind, span = ?token.span, "advance");
        token
    }

    /// Consume the current token if it is `kind`.
    pub fn eat(&mut self, kind: &TokenKind) -> Option<Span> {
        if self.check(kind) {
            Some(self.advance().span)
        } else {
            None
        }
    }
}
