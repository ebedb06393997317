//! Literal cooking: raw token text to [`ConstValue`].
//!
//! The lexer only checks a literal's shape. Range checks and escape
//! processing happen here so that one bad literal becomes one diagnostic
//! and an `Error` node, not a cascade.

use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ast::Literal;
use tarn_ir::ir::ConstValue;
use tarn_ir::{Radix, Span, StringInterner};

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum LiteralError {
    #[error("integer literal `{0}` does not fit in 64 bits")]
    IntOverflow(String),
    #[error("real literal `{0}` is out of range")]
    RealOverflow(String),
    /// `offset` is relative to the first character after the opening quote.
    #[error("unknown escape sequence `{sequence}`")]
    InvalidEscape {
        sequence: String,
        offset: u32,
        len: u32,
    },
    #[error("character literal must hold exactly one character")]
    NotOneChar,
}

impl LiteralError {
    /// Diagnostic for a literal written at `span`.
    pub fn to_diagnostic(&self, span: Span) -> Diagnostic {
        match self {
            LiteralError::IntOverflow(_) | LiteralError::RealOverflow(_) => {
                Diagnostic::error(ErrorCode::E3006)
                    .with_message(self.to_string())
                    .with_span(span)
            }
            LiteralError::InvalidEscape { offset, len, .. } => {
                // Skip the opening quote.
                let at = Span::new(span.start + 1 + offset, *len);
                Diagnostic::error(ErrorCode::E3007)
                    .with_message(self.to_string())
                    .with_span(if span.contains_span(at) { at } else { span })
                    .with_note(r#"valid escapes are \n \t \r \\ \" \' \0 and \u{...}"#)
            }
            LiteralError::NotOneChar => Diagnostic::error(ErrorCode::E3007)
                .with_message(self.to_string())
                .with_span(span),
        }
    }
}

/// Parse `literal`, negating numeric values when `negated` is set.
pub fn cook(
    literal: Literal,
    negated: bool,
    interner: &StringInterner,
) -> Result<ConstValue, LiteralError> {
    match literal {
        Literal::Int { raw, radix } => cook_int(interner.lookup(raw), radix, negated).map(ConstValue::Int),
        Literal::Real(raw) => {
            let text = interner.lookup(raw);
            match parse_float_skip_underscores(text) {
                Some(value) if value.is_finite() => {
                    Ok(ConstValue::Real(if negated { -value } else { value }))
                }
                _ => Err(LiteralError::RealOverflow(text.to_owned())),
            }
        }
        Literal::Str(raw) => unescape(interner.lookup(raw)).map(ConstValue::Text),
        Literal::Char(raw) => {
            let text = unescape(interner.lookup(raw))?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(ConstValue::Char(c)),
                _ => Err(LiteralError::NotOneChar),
            }
        }
        Literal::Bool(value) => Ok(ConstValue::Bool(value)),
        Literal::Unit => Ok(ConstValue::Unit),
    }
}

fn cook_int(text: &str, radix: Radix, negated: bool) -> Result<i64, LiteralError> {
    let digits = text.get(radix.prefix_len()..).unwrap_or("");
    let overflow = || LiteralError::IntOverflow(text.to_owned());
    let magnitude = parse_int_skip_underscores(digits, radix.base()).ok_or_else(overflow)?;
    if negated {
        if magnitude == i64::MIN.unsigned_abs() {
            return Ok(i64::MIN);
        }
        i64::try_from(magnitude).map(|v| -v).map_err(|_| overflow())
    } else {
        i64::try_from(magnitude).map_err(|_| overflow())
    }
}

/// Digits in `radix` with `_` separators ignored. `None` on overflow or a
/// stray digit.
pub(crate) fn parse_int_skip_underscores(s: &str, radix: u32) -> Option<u64> {
    let mut result: u64 = 0;
    let mut any = false;
    for c in s.chars() {
        if c == '_' {
            continue;
        }
        let digit = c.to_digit(radix)?;
        result = result
            .checked_mul(u64::from(radix))?
            .checked_add(u64::from(digit))?;
        any = true;
    }
    any.then_some(result)
}

pub(crate) fn parse_float_skip_underscores(s: &str) -> Option<f64> {
    if s.contains('_') {
        s.replace('_', "").parse().ok()
    } else {
        s.parse().ok()
    }
}

fn resolve_common_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}

/// Process escapes in the body of a string or char literal. Stops at the
/// first bad escape.
pub(crate) fn unescape(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, escaped)) = chars.next() else {
            return Err(invalid_escape(body, start, body.len()));
        };
        if let Some(resolved) = resolve_common_escape(escaped) {
            out.push(resolved);
            continue;
        }
        if escaped != 'u' {
            return Err(invalid_escape(body, start, start + 1 + escaped.len_utf8()));
        }
        // \u{XXXX}
        if chars.next_if(|(_, c)| *c == '{').is_none() {
            return Err(invalid_escape(body, start, start + 2));
        }
        let mut hex = String::new();
        let mut end = start + 3;
        let mut closed = false;
        for (i, c) in chars.by_ref() {
            end = i + c.len_utf8();
            if c == '}' {
                closed = true;
                break;
            }
            hex.push(c);
        }
        let scalar = (closed && (1..=6).contains(&hex.len()))
            .then(|| u32::from_str_radix(&hex, 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match scalar {
            Some(c) => out.push(c),
            None => return Err(invalid_escape(body, start, end)),
        }
    }
    Ok(out)
}

fn invalid_escape(body: &str, start: usize, end: usize) -> LiteralError {
    let end = end.min(body.len());
    LiteralError::InvalidEscape {
        sequence: body.get(start..end).unwrap_or("\\").to_owned(),
        offset: u32::try_from(start).unwrap_or(u32::MAX),
        len: u32::try_from(end - start).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn int(interner: &StringInterner, raw: &str, radix: Radix, negated: bool) -> Result<ConstValue, LiteralError> {
        cook(
            Literal::Int {
                raw: interner.intern(raw),
                radix,
            },
            negated,
            interner,
        )
    }

    #[test]
    fn radix_prefixes_and_underscores() {
        let interner = StringInterner::new();
        assert_eq!(int(&interner, "0xFF", Radix::Hexadecimal, false), Ok(ConstValue::Int(255)));
        assert_eq!(int(&interner, "0b1010", Radix::Binary, false), Ok(ConstValue::Int(10)));
        assert_eq!(int(&interner, "0o17", Radix::Octal, false), Ok(ConstValue::Int(15)));
        assert_eq!(int(&interner, "1_000_000", Radix::Decimal, false), Ok(ConstValue::Int(1_000_000)));
    }

    #[test]
    fn int_range_edges() {
        let interner = StringInterner::new();
        assert_eq!(
            int(&interner, "9223372036854775807", Radix::Decimal, false),
            Ok(ConstValue::Int(i64::MAX))
        );
        assert!(matches!(
            int(&interner, "9223372036854775808", Radix::Decimal, false),
            Err(LiteralError::IntOverflow(_))
        ));
        assert_eq!(
            int(&interner, "9223372036854775808", Radix::Decimal, true),
            Ok(ConstValue::Int(i64::MIN))
        );
        assert!(matches!(
            int(&interner, "0xFFFF_FFFF_FFFF_FFFF_F", Radix::Hexadecimal, false),
            Err(LiteralError::IntOverflow(_))
        ));
    }

    #[test]
    fn negated_literals() {
        let interner = StringInterner::new();
        assert_eq!(int(&interner, "42", Radix::Decimal, true), Ok(ConstValue::Int(-42)));
        assert_eq!(
            cook(Literal::Real(interner.intern("2.5")), true, &interner),
            Ok(ConstValue::Real(-2.5))
        );
    }

    #[test]
    fn reals_skip_underscores() {
        let interner = StringInterner::new();
        assert_eq!(
            cook(Literal::Real(interner.intern("1_000.5")), false, &interner),
            Ok(ConstValue::Real(1000.5))
        );
        assert!(matches!(
            cook(Literal::Real(interner.intern("1e999")), false, &interner),
            Err(LiteralError::RealOverflow(_))
        ));
    }

    #[test]
    fn escapes_are_processed() {
        assert_eq!(unescape(r#"a\tb\n\"q\"\\"#), Ok("a\tb\n\"q\"\\".to_owned()));
        assert_eq!(unescape(r"\u{1F600}\0"), Ok("\u{1F600}\0".to_owned()));
        assert_eq!(unescape(r"\'"), Ok("'".to_owned()));
    }

    #[test]
    fn bad_escape_reports_its_position() {
        let error = unescape(r"ab\qc");
        assert_eq!(
            error,
            Err(LiteralError::InvalidEscape {
                sequence: r"\q".to_owned(),
                offset: 2,
                len: 2,
            })
        );
        let Err(error) = error else {
            panic!("expected an escape error");
        };
        let diagnostic = error.to_diagnostic(Span::new(10, 7));
        assert_eq!(diagnostic.code, Some(ErrorCode::E3007));
        assert_eq!(diagnostic.span, Some(Span::new(13, 2)));
    }

    #[test]
    fn malformed_unicode_escapes() {
        assert!(unescape(r"\u{}").is_err());
        assert!(unescape(r"\u{110000}").is_err());
        assert!(unescape(r"\u{41").is_err());
        assert!(unescape(r"\u41").is_err());
    }

    #[test]
    fn char_literals() {
        let interner = StringInterner::new();
        assert_eq!(
            cook(Literal::Char(interner.intern(r"\n")), false, &interner),
            Ok(ConstValue::Char('\n'))
        );
        assert_eq!(
            cook(Literal::Char(interner.intern("é")), false, &interner),
            Ok(ConstValue::Char('é'))
        );
    }

    #[test]
    fn overflow_diagnostic_code() {
        let diagnostic = LiteralError::IntOverflow("99999999999999999999".to_owned())
            .to_diagnostic(Span::new(0, 20));
        assert_eq!(diagnostic.code, Some(ErrorCode::E3006));
    }

    proptest! {
        #[test]
        fn decimal_ints_match_std(value in 0..=i64::MAX) {
            let interner = StringInterner::new();
            let raw = value.to_string();
            prop_assert_eq!(int(&interner, &raw, Radix::Decimal, false), Ok(ConstValue::Int(value)));
        }

        #[test]
        fn plain_text_is_unchanged(text in "[a-zA-Z0-9 ]{0,32}") {
            prop_assert_eq!(unescape(&text), Ok(text.clone()));
        }
    }
}
