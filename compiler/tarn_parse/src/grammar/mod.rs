//! Grammar productions, one file per syntactic category.
//!
//! - `expr.rs`: precedence climbing, application, atoms, `let`/`fn`/`if`/`match`
//! - `pattern.rs`: patterns, including the four array shapes
//! - `ty.rs`: type expressions
//! - `item.rs`: `type` definitions

mod expr;
mod item;
mod pattern;
mod ty;

use tarn_ir::ast::{Literal, QualifiedName};
use tarn_ir::{Span, TokenKind};

use crate::{ParseResult, Parser};

/// Literal carried by `kind`, if it is a literal token.
fn literal(kind: TokenKind) -> Option<Literal> {
    match kind {
        TokenKind::Int { raw, radix } => Some(Literal::Int { raw, radix }),
        TokenKind::Real(raw) => Some(Literal::Real(raw)),
        TokenKind::Str(raw) => Some(Literal::Str(raw)),
        TokenKind::Char(raw) => Some(Literal::Char(raw)),
        TokenKind::True => Some(Literal::Bool(true)),
        TokenKind::False => Some(Literal::Bool(false)),
        _ => None,
    }
}

fn qualified_span(name: &QualifiedName) -> Span {
    name.modules
        .first()
        .map_or(name.name.span, |first| first.span.merge(name.name.span))
}

impl Parser<'_> {
    /// `a::b::name`, with the first identifier current.
    fn parse_qualified_name(&mut self) -> ParseResult<QualifiedName> {
        let mut name = self.expect_ident()?;
        let mut modules = Vec::new();
        while self.cursor.check(&TokenKind::ColonColon) {
            self.cursor.advance();
            modules.push(name);
            name = self.expect_ident()?;
        }
        Ok(QualifiedName { modules, name })
    }
}
