//! `type` definitions.

use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ast::{
    RecordFieldDefinition, TypeDefinition, TypeDefinitionStatement, TypeExpression,
    VariantDefinition,
};
use tarn_ir::{Tagged, TokenKind};

use super::ty::starts_type_atom;
use crate::{ParseResult, Parser};

impl Parser<'_> {
    /// `type name params = definition`, with `type` current.
    pub(crate) fn parse_type_definition(&mut self) -> ParseResult<TypeDefinitionStatement> {
        self.cursor.advance();
        let name = self.expect_ident()?;
        let mut params = Vec::new();
        while let TokenKind::Ident(param) = self.cursor.current_kind() {
            let span = self.cursor.advance().span;
            params.push(Tagged::new(span, param));
        }
        self.expect(&TokenKind::Eq, "`=`")?;

        let start = self.cursor.current_span();
        let definition = match self.cursor.current_kind() {
            TokenKind::LBrace => {
                let body = self.delimited(TokenKind::RBrace, |p| {
                    p.comma_list(&TokenKind::RBrace, |p| {
                        let name = p.expect_ident()?;
                        p.expect(&TokenKind::Colon, "`:`")?;
                        let ty = p.parse_type()?;
                        Ok(RecordFieldDefinition { name, ty })
                    })
                })?;
                match body.value {
                    Some(fields) => TypeDefinition::Record(fields),
                    None => TypeDefinition::Alias(Tagged::new(body.span, TypeExpression::Error)),
                }
            }
            TokenKind::Pipe => TypeDefinition::Sum(self.parse_variants()?),
            TokenKind::Ident(first) if self.cursor.is_constructor_name(first) => {
                TypeDefinition::Sum(self.parse_variants()?)
            }
            _ => TypeDefinition::Alias(self.parse_type()?),
        };

        Ok(TypeDefinitionStatement {
            name,
            params,
            definition: Tagged::new(start.merge(self.cursor.previous_span()), definition),
        })
    }

    /// `| A | B payload ...`; the leading `|` is optional.
    fn parse_variants(&mut self) -> ParseResult<Vec<VariantDefinition>> {
        self.cursor.eat(&TokenKind::Pipe);
        let mut variants = Vec::new();
        loop {
            let name = self.expect_ident()?;
            if !self.cursor.is_constructor_name(name.value) {
                self.report(
                    Diagnostic::error(ErrorCode::E1004)
                        .with_message("variant names must start with an uppercase letter")
                        .with_span(name.span),
                );
            }
            let payload = if starts_type_atom(self.cursor.current_kind()) {
                Some(self.parse_type_atom()?)
            } else {
                None
            };
            variants.push(VariantDefinition { name, payload });
            if self.cursor.eat(&TokenKind::Pipe).is_none() {
                break;
            }
        }
        Ok(variants)
    }
}
