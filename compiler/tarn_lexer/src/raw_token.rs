//! Raw Token Definition
//!
//! The `RawToken` enum is the logos-derived tokenizer output before
//! string interning and conversion to [`TokenKind`](tarn_ir::TokenKind).

use logos::Logos;

/// Consume the rest of the input; used when a construct never closes.
fn bump_rest(lex: &mut logos::Lexer<'_, RawToken>) {
    lex.bump(lex.remainder().len());
}

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub(crate) enum RawToken {
    // Comments
    #[regex(r"///[^\n]*", priority = 5)]
    DocComment,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,
    #[token("/*", bump_rest)]
    UnterminatedBlockComment,

    // Keywords
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token("fn")]
    Fn,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("match")]
    Match,
    #[token("type")]
    Type,
    #[token("mod")]
    Mod,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("|")]
    Pipe,
    #[token("=")]
    Eq,
    #[token("_", priority = 3)]
    Underscore,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+.")]
    PlusDot,
    #[token("-.")]
    MinusDot,
    #[token("*.")]
    StarDot,
    #[token("/.")]
    SlashDot,
    #[token("++")]
    PlusPlus,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("~-")]
    TildeMinus,

    // Numeric literals. The explicit priorities settle ties against
    // `MalformedNumber`, which matches any digit-led identifier run and so
    // only wins when it is strictly longer than every valid literal.
    #[regex(r"0x[0-9a-fA-F][0-9a-fA-F_]*", priority = 10)]
    HexInt,
    #[regex(r"0b[01][01_]*", priority = 10)]
    BinInt,
    #[regex(r"0o[0-7][0-7_]*", priority = 10)]
    OctInt,
    #[regex(r"[0-9][0-9_]*", priority = 10)]
    DecInt,
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", priority = 10)]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", priority = 10)]
    Real,
    #[regex(r"[0-9][0-9a-zA-Z_]*", priority = 1)]
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9a-zA-Z_]*", priority = 1)]
    MalformedNumber,

    // Text literals (no unescaped newlines)
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,
    #[regex(r#""([^"\\\n]|\\[^\n])*"#)]
    UnterminatedString,
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    Char,
    #[regex(r"'([^'\\\n]|\\[^\n])*", priority = 1)]
    UnterminatedChar,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_']*")]
    Ident,
}
