//! Pattern parsing.
//!
//! A constructor takes at most one payload, which must be atomic:
//! `Cons (h, t)`, `Some x`, `Some (Some x)`.

use tarn_ir::ast::{ArrayPatternExpression, Ident, Literal, Pat, PatternExpression, QualifiedName};
use tarn_ir::{Tagged, TokenKind};
use tarn_stack::ensure_sufficient_stack;

use super::{literal, qualified_span};
use crate::{ParseFailure, ParseResult, Parser};

fn starts_pattern_atom(kind: TokenKind) -> bool {
    literal(kind).is_some()
        || matches!(
            kind,
            TokenKind::Underscore
                | TokenKind::Minus
                | TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::LBracket
        )
}

enum Parenthesized {
    Single(Pat),
    Hinted(Pat, tarn_ir::ast::TypeExpr),
    Tuple(Vec<Pat>),
}

impl Parser<'_> {
    pub(crate) fn parse_pattern(&mut self) -> ParseResult<Pat> {
        ensure_sufficient_stack(|| {
            if !self.cursor.check_ident() {
                return self.parse_pattern_atom();
            }
            let name = self.parse_qualified_name()?;
            let takes_payload =
                name.is_qualified() || self.cursor.is_constructor_name(name.name.value);
            if takes_payload && starts_pattern_atom(self.cursor.current_kind()) {
                let payload = self.parse_pattern_atom()?;
                let span = qualified_span(&name).merge(payload.span);
                return Ok(Tagged::new(
                    span,
                    PatternExpression::Constructor {
                        name,
                        payload: Some(Box::new(payload)),
                    },
                ));
            }
            Ok(self.name_pattern(name))
        })
    }

    /// `m::x`, `Ctor` or a binding.
    fn name_pattern(&self, name: QualifiedName) -> Pat {
        let span = qualified_span(&name);
        if name.is_qualified() {
            Tagged::new(span, PatternExpression::QualifiedPath(name))
        } else if self.cursor.is_constructor_name(name.name.value) {
            Tagged::new(
                span,
                PatternExpression::Constructor {
                    name,
                    payload: None,
                },
            )
        } else {
            Tagged::new(span, PatternExpression::Identifier(name.name.value))
        }
    }

    fn parse_pattern_atom(&mut self) -> ParseResult<Pat> {
        let token = self.cursor.current();
        if let Some(value) = literal(token.kind) {
            self.cursor.advance();
            return Ok(Tagged::new(
                token.span,
                PatternExpression::Literal {
                    literal: value,
                    negated: false,
                },
            ));
        }
        match token.kind {
            TokenKind::Underscore => {
                self.cursor.advance();
                Ok(Tagged::new(token.span, PatternExpression::Wildcard))
            }
            TokenKind::Minus => {
                self.cursor.advance();
                let number = self.cursor.current();
                match literal(number.kind) {
                    Some(value @ (Literal::Int { .. } | Literal::Real(_))) => {
                        self.cursor.advance();
                        Ok(Tagged::new(
                            token.span.merge(number.span),
                            PatternExpression::Literal {
                                literal: value,
                                negated: true,
                            },
                        ))
                    }
                    _ => Err(ParseFailure::invalid_pattern(
                        "`-` in a pattern must be followed by a numeric literal",
                        number.span,
                    )),
                }
            }
            TokenKind::Ident(_) => {
                let name = self.parse_qualified_name()?;
                Ok(self.name_pattern(name))
            }
            TokenKind::LParen => self.parse_parenthesized_pattern(),
            TokenKind::LBracket => self.parse_array_pattern(),
            // Already reported by the lexer; match anything.
            TokenKind::Error(_) => {
                self.cursor.advance();
                Ok(Tagged::new(token.span, PatternExpression::Wildcard))
            }
            other => Err(ParseFailure::invalid_pattern(
                format!("expected pattern, found {}", other.describe()),
                token.span,
            )),
        }
    }

    /// `()`, `(p)`, `(p: t)` or `(p, q, ...)`.
    fn parse_parenthesized_pattern(&mut self) -> ParseResult<Pat> {
        if self.cursor.peek_kind(1) == TokenKind::RParen {
            let open = self.cursor.advance().span;
            let close = self.cursor.advance().span;
            return Ok(Tagged::new(
                open.merge(close),
                PatternExpression::Literal {
                    literal: Literal::Unit,
                    negated: false,
                },
            ));
        }

        let body = self.delimited(TokenKind::RParen, |p| {
            let first = p.parse_pattern()?;
            if p.cursor.eat(&TokenKind::Colon).is_some() {
                let ty = p.parse_type()?;
                return Ok(Parenthesized::Hinted(first, ty));
            }
            if !p.cursor.check(&TokenKind::Comma) {
                return Ok(Parenthesized::Single(first));
            }
            let mut items = vec![first];
            while p.cursor.eat(&TokenKind::Comma).is_some() {
                if p.cursor.check(&TokenKind::RParen) {
                    break;
                }
                items.push(p.parse_pattern()?);
            }
            Ok(Parenthesized::Tuple(items))
        })?;

        let span = body.span;
        Ok(match body.value {
            Some(Parenthesized::Single(inner)) => inner,
            Some(Parenthesized::Hinted(pattern, ty)) => Tagged::new(
                span,
                PatternExpression::TypeHinted {
                    pattern: Box::new(pattern),
                    ty,
                },
            ),
            Some(Parenthesized::Tuple(items)) => Tagged::new(span, PatternExpression::Tuple(items)),
            None => Tagged::new(span, PatternExpression::Wildcard),
        })
    }

    /// `[a, b]`, `[a, ..rest]`, `[..rest, z]`, `[a, ..rest, z]`.
    fn parse_array_pattern(&mut self) -> ParseResult<Pat> {
        let body = self.delimited(TokenKind::RBracket, |p| {
            let mut leading = Vec::new();
            let mut rest: Option<Option<Ident>> = None;
            let mut trailing = Vec::new();

            while !p.cursor.check(&TokenKind::RBracket) && !p.cursor.is_at_end() {
                if let Some(dots) = p.cursor.eat(&TokenKind::DotDot) {
                    if rest.is_some() {
                        return Err(ParseFailure::invalid_pattern(
                            "an array pattern can have only one `..`",
                            dots,
                        ));
                    }
                    let token = p.cursor.current();
                    rest = Some(match token.kind {
                        TokenKind::Ident(name) => {
                            p.cursor.advance();
                            Some(Tagged::new(token.span, name))
                        }
                        _ => None,
                    });
                } else {
                    let element = p.parse_pattern()?;
                    if rest.is_some() {
                        trailing.push(element);
                    } else {
                        leading.push(element);
                    }
                }
                if p.cursor.eat(&TokenKind::Comma).is_none() {
                    break;
                }
            }

            Ok(match rest {
                None => ArrayPatternExpression::Exact(leading),
                Some(rest) if trailing.is_empty() => {
                    ArrayPatternExpression::LeadingWithRest { leading, rest }
                }
                Some(rest) if leading.is_empty() => {
                    ArrayPatternExpression::TrailingWithRest { rest, trailing }
                }
                Some(rest) => ArrayPatternExpression::Surrounding {
                    leading,
                    rest,
                    trailing,
                },
            })
        })?;

        Ok(match body.value {
            Some(shape) => Tagged::new(body.span, PatternExpression::Array(shape)),
            None => Tagged::new(body.span, PatternExpression::Wildcard),
        })
    }
}
