//! Lexer for Tarn using logos with string interning.
//!
//! [`Lexer`] is a lazy iterator over [`Token`]s. It can be re-created over the
//! same text any number of times and always yields the same sequence, ending
//! with a single `Eof`. [`lex`] collects the whole list and reports every
//! error token to the diagnostic sink.
//!
//! Comments stay in the token list; the parser filters them out.

mod raw_token;

use logos::Logos;
use tarn_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use tarn_ir::{LexError, Radix, Span, StringInterner, Token, TokenKind, TokenList};

use raw_token::RawToken;

/// Lazy token stream over one source text.
pub struct Lexer<'src, 'i> {
    inner: logos::Lexer<'src, RawToken>,
    interner: &'i StringInterner,
    end: u32,
    finished: bool,
}

impl<'src, 'i> Lexer<'src, 'i> {
    pub fn new(source: &'src str, interner: &'i StringInterner) -> Self {
        Lexer {
            inner: RawToken::lexer(source),
            interner,
            end: u32::try_from(source.len()).unwrap_or(u32::MAX),
            finished: false,
        }
    }

    fn convert(&self, raw: RawToken, slice: &str) -> TokenKind {
        let intern = |s: &str| self.interner.intern(s);
        match raw {
            RawToken::DocComment => TokenKind::DocComment(intern(slice)),
            RawToken::LineComment => TokenKind::LineComment(intern(slice)),
            RawToken::BlockComment => TokenKind::BlockComment(intern(slice)),
            RawToken::UnterminatedBlockComment => {
                TokenKind::Error(LexError::UnterminatedBlockComment)
            }

            RawToken::Let => TokenKind::Let,
            RawToken::In => TokenKind::In,
            RawToken::Fn => TokenKind::Fn,
            RawToken::If => TokenKind::If,
            RawToken::Then => TokenKind::Then,
            RawToken::Else => TokenKind::Else,
            RawToken::Match => TokenKind::Match,
            RawToken::Type => TokenKind::Type,
            RawToken::Mod => TokenKind::Mod,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,

            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,

            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::ColonColon => TokenKind::ColonColon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::FatArrow => TokenKind::FatArrow,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Eq => TokenKind::Eq,
            RawToken::Underscore => TokenKind::Underscore,

            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::PlusDot => TokenKind::PlusDot,
            RawToken::MinusDot => TokenKind::MinusDot,
            RawToken::StarDot => TokenKind::StarDot,
            RawToken::SlashDot => TokenKind::SlashDot,
            RawToken::PlusPlus => TokenKind::PlusPlus,
            RawToken::EqEq => TokenKind::EqEq,
            RawToken::NotEq => TokenKind::NotEq,
            RawToken::Lt => TokenKind::Lt,
            RawToken::LtEq => TokenKind::LtEq,
            RawToken::Gt => TokenKind::Gt,
            RawToken::GtEq => TokenKind::GtEq,
            RawToken::AmpAmp => TokenKind::AmpAmp,
            RawToken::PipePipe => TokenKind::PipePipe,
            RawToken::Bang => TokenKind::Bang,
            RawToken::TildeMinus => TokenKind::TildeMinus,

            RawToken::HexInt => int(intern(slice), Radix::Hexadecimal),
            RawToken::BinInt => int(intern(slice), Radix::Binary),
            RawToken::OctInt => int(intern(slice), Radix::Octal),
            RawToken::DecInt => int(intern(slice), Radix::Decimal),
            RawToken::Real => TokenKind::Real(intern(slice)),
            RawToken::MalformedNumber => TokenKind::Error(LexError::MalformedNumber),

            RawToken::String => TokenKind::Str(intern(strip_quotes(slice))),
            RawToken::UnterminatedString => TokenKind::Error(LexError::UnterminatedString),
            RawToken::Char => {
                let body = strip_quotes(slice);
                if is_single_char(body) {
                    TokenKind::Char(intern(body))
                } else {
                    TokenKind::Error(LexError::InvalidCharLiteral)
                }
            }
            RawToken::UnterminatedChar => TokenKind::Error(LexError::InvalidCharLiteral),

            RawToken::Ident => TokenKind::Ident(intern(slice)),
        }
    }
}

impl Iterator for Lexer<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let Some(result) = self.inner.next() else {
            self.finished = true;
            return Some(Token::new(TokenKind::Eof, Span::point(self.end)));
        };
        let span = Span::from_range(self.inner.span());
        let kind = match result {
            Ok(raw) => self.convert(raw, self.inner.slice()),
            Err(()) => TokenKind::Error(LexError::UnknownCharacter),
        };
        Some(Token::new(kind, span))
    }
}

#[inline]
fn int(raw: tarn_ir::Name, radix: Radix) -> TokenKind {
    TokenKind::Int { raw, radix }
}

/// Drop the surrounding quote characters of a terminated literal.
fn strip_quotes(slice: &str) -> &str {
    slice.get(1..slice.len().saturating_sub(1)).unwrap_or("")
}

/// Exactly one character or one escape sequence.
fn is_single_char(body: &str) -> bool {
    let mut chars = body.chars();
    match chars.next() {
        None => false,
        Some('\\') => match chars.next() {
            // `\u{...}` spans several characters.
            Some('u') => body.ends_with('}') && body.starts_with("\\u{"),
            Some(_) => chars.next().is_none(),
            None => false,
        },
        Some(_) => chars.next().is_none(),
    }
}

fn error_code(error: LexError) -> ErrorCode {
    match error {
        LexError::UnterminatedString => ErrorCode::E0001,
        LexError::UnknownCharacter => ErrorCode::E0002,
        LexError::MalformedNumber => ErrorCode::E0003,
        LexError::UnterminatedBlockComment => ErrorCode::E0004,
        LexError::InvalidCharLiteral => ErrorCode::E0005,
    }
}

/// Diagnostic for an error token covering `text`.
pub fn lex_error_diagnostic(error: LexError, span: Span, text: &str) -> Diagnostic {
    let shown: String = text.chars().take(24).collect();
    let diagnostic = Diagnostic::error(error_code(error))
        .with_message(format!("{error}: `{shown}`"))
        .with_span(span);
    match error {
        LexError::MalformedNumber => diagnostic
            .with_note("a number cannot run straight into letters; add a space or an operator"),
        _ => diagnostic,
    }
}

/// Lex `source` into a complete token list, comments included.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex(source: &str, interner: &StringInterner, sink: &mut Diagnostics) -> TokenList {
    let mut tokens = TokenList::new();
    for token in Lexer::new(source, interner) {
        if let TokenKind::Error(error) = token.kind {
            let text = source.get(token.span.to_range()).unwrap_or("");
            tracing::trace!(?error, span = ?token.span, "error token");
            sink.push(lex_error_diagnostic(error, token.span, text));
        }
        tokens.push(token);
    }
    tracing::debug!(count = tokens.len(), "lexed");
    tokens
}
