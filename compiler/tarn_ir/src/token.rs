//! Tokens produced by the lexer.
//!
//! Literal tokens carry their raw source text, not a parsed value. Whether
//! `0xFF` is in range, or how `1_000` is read, is decided during lowering.

use std::fmt;

use crate::{Name, Span};

/// Radix of an integer literal, taken from its prefix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

impl Radix {
    pub const fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }

    /// Length of the literal prefix (`0x`, `0b`, `0o`).
    pub const fn prefix_len(self) -> usize {
        match self {
            Radix::Decimal => 0,
            _ => 2,
        }
    }
}

/// Why a run of source text could not be tokenized.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LexError {
    /// Digits running straight into identifier characters, like `1m`.
    MalformedNumber,
    /// A string literal without its closing quote.
    UnterminatedString,
    /// A character literal that is empty, unterminated or too long.
    InvalidCharLiteral,
    /// A `/*` comment that never closes.
    UnterminatedBlockComment,
    /// A character that starts no token.
    UnknownCharacter,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LexError::MalformedNumber => "malformed numeric literal",
            LexError::UnterminatedString => "unterminated string literal",
            LexError::InvalidCharLiteral => "invalid character literal",
            LexError::UnterminatedBlockComment => "unterminated block comment",
            LexError::UnknownCharacter => "unknown character",
        };
        f.write_str(text)
    }
}

/// Kind of a token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Literals
    Ident(Name),
    Int { raw: Name, radix: Radix },
    Real(Name),
    /// Text between the quotes, escapes not yet processed.
    Str(Name),
    /// Text between the quotes, escapes not yet processed.
    Char(Name),

    // Keywords
    Let,
    In,
    Fn,
    If,
    Then,
    Else,
    Match,
    Type,
    Mod,
    True,
    False,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Comma,
    Semicolon,
    Colon,
    ColonColon,
    Dot,
    DotDot,
    Arrow,
    FatArrow,
    Pipe,
    Eq,
    Underscore,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusDot,
    MinusDot,
    StarDot,
    SlashDot,
    PlusPlus,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    TildeMinus,

    // Extras
    LineComment(Name),
    BlockComment(Name),
    DocComment(Name),
    Error(LexError),

    Eof,
}

impl TokenKind {
    pub const TAG_EOF: u8 = 64;

    /// Dense index of the variant, for bitset token sets.
    pub const fn discriminant_index(&self) -> u8 {
        match self {
            TokenKind::Ident(_) => 0,
            TokenKind::Int { .. } => 1,
            TokenKind::Real(_) => 2,
            TokenKind::Str(_) => 3,
            TokenKind::Char(_) => 4,
            TokenKind::Let => 5,
            TokenKind::In => 6,
            TokenKind::Fn => 7,
            TokenKind::If => 8,
            TokenKind::Then => 9,
            TokenKind::Else => 10,
            TokenKind::Match => 11,
            TokenKind::Type => 12,
            TokenKind::Mod => 13,
            TokenKind::True => 14,
            TokenKind::False => 15,
            TokenKind::LParen => 16,
            TokenKind::RParen => 17,
            TokenKind::LBracket => 18,
            TokenKind::RBracket => 19,
            TokenKind::LBrace => 20,
            TokenKind::RBrace => 21,
            TokenKind::Comma => 22,
            TokenKind::Semicolon => 23,
            TokenKind::Colon => 24,
            TokenKind::ColonColon => 25,
            TokenKind::Dot => 26,
            TokenKind::DotDot => 27,
            TokenKind::Arrow => 28,
            TokenKind::FatArrow => 29,
            TokenKind::Pipe => 30,
            TokenKind::Eq => 31,
            TokenKind::Underscore => 32,
            TokenKind::Plus => 33,
            TokenKind::Minus => 34,
            TokenKind::Star => 35,
            TokenKind::Slash => 36,
            TokenKind::Percent => 37,
            TokenKind::PlusDot => 38,
            TokenKind::MinusDot => 39,
            TokenKind::StarDot => 40,
            TokenKind::SlashDot => 41,
            TokenKind::PlusPlus => 42,
            TokenKind::EqEq => 43,
            TokenKind::NotEq => 44,
            TokenKind::Lt => 45,
            TokenKind::LtEq => 46,
            TokenKind::Gt => 47,
            TokenKind::GtEq => 48,
            TokenKind::AmpAmp => 49,
            TokenKind::PipePipe => 50,
            TokenKind::Bang => 51,
            TokenKind::TildeMinus => 52,
            TokenKind::LineComment(_) => 53,
            TokenKind::BlockComment(_) => 54,
            TokenKind::DocComment(_) => 55,
            TokenKind::Error(_) => 56,
            TokenKind::Eof => Self::TAG_EOF,
        }
    }

    /// Same variant, ignoring payloads.
    #[inline]
    pub const fn same_kind(&self, other: &TokenKind) -> bool {
        self.discriminant_index() == other.discriminant_index()
    }

    pub const fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment(_) | TokenKind::BlockComment(_) | TokenKind::DocComment(_)
        )
    }

    pub const fn is_open_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace
        )
    }

    pub const fn is_close_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace
        )
    }

    /// Short human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Int { .. } => "integer literal",
            TokenKind::Real(_) => "real literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::Char(_) => "character literal",
            TokenKind::Let => "`let`",
            TokenKind::In => "`in`",
            TokenKind::Fn => "`fn`",
            TokenKind::If => "`if`",
            TokenKind::Then => "`then`",
            TokenKind::Else => "`else`",
            TokenKind::Match => "`match`",
            TokenKind::Type => "`type`",
            TokenKind::Mod => "`mod`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::DotDot => "`..`",
            TokenKind::Arrow => "`->`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Pipe => "`|`",
            TokenKind::Eq => "`=`",
            TokenKind::Underscore => "`_`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::PlusDot => "`+.`",
            TokenKind::MinusDot => "`-.`",
            TokenKind::StarDot => "`*.`",
            TokenKind::SlashDot => "`/.`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::TildeMinus => "`~-`",
            TokenKind::LineComment(_) => "comment",
            TokenKind::BlockComment(_) => "block comment",
            TokenKind::DocComment(_) => "doc comment",
            TokenKind::Error(_) => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Every token of one source file, ending with exactly one `Eof`.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }

    /// Copy of the list with comments removed, as the parser consumes it.
    pub fn significant(&self) -> TokenList {
        TokenList {
            tokens: self
                .tokens
                .iter()
                .filter(|t| !t.kind.is_trivia())
                .copied()
                .collect(),
        }
    }

    /// The comment tokens, in source order.
    pub fn comments(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.kind.is_trivia())
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        TokenList {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_ignore_payload() {
        let a = TokenKind::Ident(Name::EMPTY);
        let b = TokenKind::Ident(crate::StringInterner::new().intern("x"));
        assert!(a.same_kind(&b));
        assert!(!a.same_kind(&TokenKind::Let));
    }

    #[test]
    fn discriminants_fit_bitset() {
        assert!(TokenKind::Eof.discriminant_index() < 128);
        assert!(TokenKind::Error(LexError::UnknownCharacter).discriminant_index() < 128);
    }

    #[test]
    fn significant_drops_comments() {
        let interner = crate::StringInterner::new();
        let comment = interner.intern("// hi");
        let list: TokenList = [
            Token::new(TokenKind::LineComment(comment), Span::new(0, 5)),
            Token::new(TokenKind::Let, Span::new(6, 3)),
            Token::new(TokenKind::Eof, Span::point(9)),
        ]
        .into_iter()
        .collect();

        let significant = list.significant();
        assert_eq!(significant.kinds(), vec![TokenKind::Let, TokenKind::Eof]);
        assert_eq!(list.comments().count(), 1);
    }
}
