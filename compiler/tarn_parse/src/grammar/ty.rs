//! Type expression parsing.

use tarn_ir::ast::{TypeExpr, TypeExpression};
use tarn_ir::{Tagged, TokenKind};
use tarn_stack::ensure_sufficient_stack;

use super::qualified_span;
use crate::{ParseFailure, ParseResult, Parser};

pub(super) fn starts_type_atom(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_) | TokenKind::LParen | TokenKind::LBracket
    )
}

impl Parser<'_> {
    /// `a -> b` is right associative.
    pub(crate) fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        ensure_sufficient_stack(|| {
            let domain = self.parse_type_application()?;
            if self.cursor.eat(&TokenKind::Arrow).is_none() {
                return Ok(domain);
            }
            let codomain = self.parse_type()?;
            Ok(Tagged::new(
                domain.span.merge(codomain.span),
                TypeExpression::Function {
                    domain: Box::new(domain),
                    codomain: Box::new(codomain),
                },
            ))
        })
    }

    /// `list int`, `m::map text int`. Only names can be applied.
    fn parse_type_application(&mut self) -> ParseResult<TypeExpr> {
        let head = self.parse_type_atom()?;
        if !matches!(
            head.value,
            TypeExpression::Identifier(_) | TypeExpression::QualifiedPath(_)
        ) {
            return Ok(head);
        }
        let mut args = Vec::new();
        while starts_type_atom(self.cursor.current_kind()) {
            args.push(self.parse_type_atom()?);
        }
        let Some(last) = args.last() else {
            return Ok(head);
        };
        Ok(Tagged::new(
            head.span.merge(last.span),
            TypeExpression::Application {
                head: Box::new(head),
                args,
            },
        ))
    }

    pub(crate) fn parse_type_atom(&mut self) -> ParseResult<TypeExpr> {
        let token = self.cursor.current();
        match token.kind {
            TokenKind::Ident(_) => {
                let name = self.parse_qualified_name()?;
                let span = qualified_span(&name);
                Ok(if name.is_qualified() {
                    Tagged::new(span, TypeExpression::QualifiedPath(name))
                } else {
                    Tagged::new(span, TypeExpression::Identifier(name.name.value))
                })
            }
            TokenKind::LParen if self.cursor.peek_kind(1) == TokenKind::RParen => {
                self.cursor.advance();
                let close = self.cursor.advance().span;
                Ok(Tagged::new(token.span.merge(close), TypeExpression::Unit))
            }
            TokenKind::LParen => {
                let body = self.delimited(TokenKind::RParen, |p| {
                    let mut items = vec![p.parse_type()?];
                    while p.cursor.eat(&TokenKind::Comma).is_some() {
                        if p.cursor.check(&TokenKind::RParen) {
                            break;
                        }
                        items.push(p.parse_type()?);
                    }
                    Ok(items)
                })?;
                Ok(match body.value {
                    Some(mut items) if items.len() == 1 => {
                        items.pop().unwrap_or(Tagged::new(body.span, TypeExpression::Error))
                    }
                    Some(items) => Tagged::new(body.span, TypeExpression::Product(items)),
                    None => Tagged::new(body.span, TypeExpression::Error),
                })
            }
            TokenKind::LBracket => {
                let body = self.delimited(TokenKind::RBracket, Self::parse_type)?;
                Ok(match body.value {
                    Some(element) => Tagged::new(body.span, TypeExpression::Array(Box::new(element))),
                    None => Tagged::new(body.span, TypeExpression::Error),
                })
            }
            TokenKind::Error(_) => {
                self.cursor.advance();
                Ok(Tagged::new(token.span, TypeExpression::Error))
            }
            other => Err(ParseFailure::expected_type(other, token.span)),
        }
    }
}
