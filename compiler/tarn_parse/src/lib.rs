//! Recursive descent parser for Tarn.
//!
//! Produces a [`ParsedModule`] from the significant tokens of one source
//! file. Problems travel on two channels: a production that cannot go on
//! returns a [`ParseFailure`] carrying its recovery, while minor issues
//! (missing `;`, empty `match`, chained comparisons) are pushed to the sink
//! and parsing simply continues. A malformed statement never stops the
//! module.

mod context;
mod cursor;
mod error;
mod grammar;
mod recovery;

pub use context::ParseContext;
pub use cursor::Cursor;
pub use error::{ParseFailure, ParseResult};
pub use recovery::{recover, RecoveryBehavior, TokenSet};

use tarn_diagnostic::{unclosed_delimiter, unexpected_token, Diagnostic, Diagnostics, ErrorCode};
use tarn_ir::ast::{Ident, ParsedModule, Statement};
use tarn_ir::{Name, Span, StringInterner, Tagged, Token, TokenKind, TokenList};

use recovery::STATEMENT_BOUNDARY;

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    context: ParseContext,
    sink: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with `Eof` and contain no comments.
    pub fn new(
        tokens: &'a [Token],
        interner: &'a StringInterner,
        sink: &'a mut Diagnostics,
    ) -> Self {
        Parser {
            cursor: Cursor::new(tokens, interner),
            context: ParseContext::NONE,
            sink,
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(code = ?diagnostic.code, "parse diagnostic");
        self.sink.push(diagnostic);
    }

    /// Consume `kind` or fail without moving.
    fn expect(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Span> {
        if let Some(span) = self.cursor.eat(kind) {
            Ok(span)
        } else {
            let token = self.cursor.current();
            Err(ParseFailure::expected(expected, token.kind, token.span))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        let token = self.cursor.current();
        if let TokenKind::Ident(name) = token.kind {
            self.cursor.advance();
            Ok(Tagged::new(token.span, name))
        } else {
            Err(ParseFailure::expected_identifier(token.kind, token.span))
        }
    }

    /// Run `f` with `flag` added to the context.
    fn with_context<T>(&mut self, flag: ParseContext, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.context;
        self.context = saved.with(flag);
        let result = f(self);
        self.context = saved;
        result
    }

    /// Run `f` with `flag` removed from the context.
    fn without_context<T>(&mut self, flag: ParseContext, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.context;
        self.context = saved.without(flag);
        let result = f(self);
        self.context = saved;
        result
    }

    /// Parse `open contents close`, with the open token current.
    ///
    /// A failure inside the contents is reported here, the cursor skips to
    /// just past the matching `close`, and the result holds `None` so the
    /// caller can produce its error node. A missing `close` is an `E1003`
    /// failure that abandons the statement.
    fn delimited<T>(
        &mut self,
        close: TokenKind,
        contents: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Tagged<Option<T>>> {
        let open = self.cursor.advance();
        let result = self.without_context(ParseContext::NO_RECORD_LIT, contents);
        match result {
            Ok(value) => match self.cursor.eat(&close) {
                Some(end) => Ok(Tagged::new(open.span.merge(end), Some(value))),
                None => {
                    let missing_at = Span::new(self.cursor.previous_span().end(), 1);
                    Err(ParseFailure::new(unclosed_delimiter(
                        open.span,
                        missing_at,
                        delimiter_char(open.kind),
                    ))
                    .with_recovery(RecoveryBehavior::SkipToStatement))
                }
            },
            Err(failure) if failure.recovery == RecoveryBehavior::SkipToStatement => Err(failure),
            Err(failure) => {
                let failure = failure.with_recovery(RecoveryBehavior::SkipUntilToken(close));
                if recover(&mut self.cursor, failure.recovery) {
                    self.report(failure.diagnostic);
                    Ok(Tagged::new(
                        open.span.merge(self.cursor.previous_span()),
                        None,
                    ))
                } else {
                    Err(failure.with_recovery(RecoveryBehavior::SkipToStatement))
                }
            }
        }
    }

    /// Comma-separated items up to (not including) `close`. A trailing
    /// comma is allowed.
    fn comma_list<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = Vec::new();
        while !self.cursor.check(close) && !self.cursor.is_at_end() {
            items.push(item(self)?);
            if self.cursor.eat(&TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(items)
    }

    /// Statements until `Eof`, or until an unmatched `}` when `in_block`.
    fn parse_statements(&mut self, in_block: bool) -> Vec<Tagged<Statement>> {
        let mut statements = Vec::new();
        loop {
            match self.cursor.current_kind() {
                TokenKind::Eof => break,
                TokenKind::RBrace if in_block => break,
                TokenKind::Semicolon => {
                    self.cursor.advance();
                    continue;
                }
                TokenKind::RBrace => {
                    let span = self.cursor.advance().span;
                    self.report(unexpected_token(span, "statement", "`}`"));
                    continue;
                }
                _ => {}
            }

            let start = self.cursor.position();
            match self.parse_statement() {
                Ok(statement) => {
                    let needs_terminator = !matches!(statement.value, Statement::Module { .. });
                    statements.push(statement);
                    if needs_terminator {
                        if let Err(failure) = self.expect_statement_end() {
                            self.recover_statement(failure);
                        }
                    }
                }
                Err(failure) => self.recover_statement(failure),
            }

            if self.cursor.position() == start {
                self.cursor.advance();
            }
        }
        statements
    }

    fn recover_statement(&mut self, failure: ParseFailure) {
        self.report(failure.diagnostic);
        match failure.recovery {
            RecoveryBehavior::SkipToStatement => {
                recover(&mut self.cursor, RecoveryBehavior::SkipToStatement);
            }
            other => {
                recover(&mut self.cursor, other);
                if !STATEMENT_BOUNDARY.contains(&self.cursor.current_kind()) {
                    recover(&mut self.cursor, RecoveryBehavior::SkipToStatement);
                }
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Tagged<Statement>> {
        let start = self.cursor.current_span();
        let statement = match self.cursor.current_kind() {
            TokenKind::Let => self.parse_let_statement()?,
            TokenKind::Type => Statement::TypeDefinition(self.parse_type_definition()?),
            TokenKind::Mod => self.parse_module_statement()?,
            _ => Statement::Expression(self.parse_expr()?),
        };
        Ok(Tagged::new(
            start.merge(self.cursor.previous_span()),
            statement,
        ))
    }

    /// `;` after a statement. When the next statement obviously starts
    /// anyway, the omission is reported and parsing carries on.
    fn expect_statement_end(&mut self) -> ParseResult<()> {
        if self.cursor.eat(&TokenKind::Semicolon).is_some() {
            return Ok(());
        }
        let token = self.cursor.current();
        if STATEMENT_BOUNDARY.contains(&token.kind) {
            let at = Span::point(self.cursor.previous_span().end());
            self.report(
                Diagnostic::error(ErrorCode::E1007)
                    .with_message(format!("expected `;` before {}", token.kind.describe()))
                    .with_span(at),
            );
            Ok(())
        } else {
            Err(ParseFailure::expected("`;`", token.kind, token.span)
                .with_recovery(RecoveryBehavior::SkipToStatement))
        }
    }

    /// `let p = e;`, or a `let p = e in body` expression statement.
    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        let start = self.cursor.current_span();
        let (pattern, value) = self.parse_let_head()?;
        if self.cursor.check(&TokenKind::In) {
            let expr = self.finish_let_expr(start, pattern, value)?;
            return Ok(Statement::Expression(expr));
        }
        Ok(Statement::Let { pattern, value })
    }

    /// `mod name { statements }`, with an optional trailing `;`.
    fn parse_module_statement(&mut self) -> ParseResult<Statement> {
        self.cursor.advance();
        let name = self.expect_ident()?;
        let open = self.expect(&TokenKind::LBrace, "`{`")?;
        let statements = self.parse_statements(true);
        if self.cursor.eat(&TokenKind::RBrace).is_none() {
            let missing_at = Span::new(self.cursor.previous_span().end(), 1);
            self.report(unclosed_delimiter(open, missing_at, '{'));
        }
        self.cursor.eat(&TokenKind::Semicolon);
        Ok(Statement::Module { name, statements })
    }
}

fn delimiter_char(kind: TokenKind) -> char {
    match kind {
        TokenKind::LParen => '(',
        TokenKind::LBracket => '[',
        _ => '{',
    }
}

/// Parse the significant tokens of `tokens` into a module named
/// `module_name`. Comments are dropped; a missing final `Eof` is supplied.
#[tracing::instrument(level = "debug", skip_all, fields(module = interner.lookup(module_name)))]
pub fn parse(
    tokens: &TokenList,
    interner: &StringInterner,
    module_name: Name,
    sink: &mut Diagnostics,
) -> ParsedModule {
    let mut significant: Vec<Token> = tokens.significant().iter().copied().collect();
    if significant.last().map(|t| t.kind) != Some(TokenKind::Eof) {
        let end = significant.last().map_or(0, |t| t.span.end());
        significant.push(Token::new(TokenKind::Eof, Span::point(end)));
    }

    let mut parser = Parser::new(&significant, interner, sink);
    let statements = parser.parse_statements(false);
    tracing::debug!(statements = statements.len(), "parsed");
    ParsedModule {
        name: module_name,
        statements,
    }
}

#[cfg(test)]
mod tests;
