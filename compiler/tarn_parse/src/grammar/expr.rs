//! Expression parsing.
//!
//! Lowest to highest: the keyword forms (`let`, `fn`, `if`, `match`) and
//! unary operators, then binary operators by precedence climbing, then
//! juxtaposition, then `.field`, then atoms.

use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ast::{
    ArrayElement, BinaryOp, Expr, Literal, MatchArm, Parameter, Pat, QualifiedName,
    RecordFieldInit, UnaryOp, ValueExpression,
};
use tarn_ir::{Span, Tagged, TokenKind};
use tarn_stack::ensure_sufficient_stack;

use super::{literal, qualified_span};
use crate::{ParseContext, ParseFailure, ParseResult, Parser};

/// Binary operator spelled by `kind`.
pub(super) fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::PlusDot => BinaryOp::AddReal,
        TokenKind::MinusDot => BinaryOp::SubReal,
        TokenKind::StarDot => BinaryOp::MulReal,
        TokenKind::SlashDot => BinaryOp::DivReal,
        TokenKind::PlusPlus => BinaryOp::Concat,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Tokens that can begin an application argument.
fn starts_atom(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::Int { .. }
            | TokenKind::Real(_)
            | TokenKind::Str(_)
            | TokenKind::Char(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Error(_)
    )
}

enum Parenthesized {
    Single(Expr),
    Tuple(Vec<Expr>),
}

impl Parser<'_> {
    /// Parse an expression.
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.parse_binary(0))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        let mut comparison: Option<Span> = None;

        while let Some(op) = binary_op(self.cursor.current_kind()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            let op_span = self.cursor.advance().span;

            if op.is_comparison() {
                if let Some(first) = comparison {
                    self.report(
                        Diagnostic::error(ErrorCode::E1009)
                            .with_message("comparison operators cannot be chained")
                            .with_span(op_span)
                            .with_label(first, "first comparison")
                            .with_note("use `&&` to combine comparisons"),
                    );
                }
                comparison = Some(op_span);
            } else {
                comparison = None;
            }

            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Tagged::new(
                lhs.span.merge(rhs.span),
                ValueExpression::Binary {
                    op: Tagged::new(op_span, op),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let token = self.cursor.current();
        let op = match token.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.cursor.advance();
            let operand = ensure_sufficient_stack(|| self.parse_unary())?;
            return Ok(Tagged::new(
                token.span.merge(operand.span),
                ValueExpression::Unary {
                    op: Tagged::new(token.span, op),
                    operand: Box::new(operand),
                },
            ));
        }

        match token.kind {
            TokenKind::Let => self.parse_let_expr(),
            TokenKind::Fn => self.parse_fn(),
            TokenKind::If => self.parse_if(),
            TokenKind::Match => self.parse_match(),
            _ => self.parse_application(),
        }
    }

    /// `f a b` is `(f a) b`.
    fn parse_application(&mut self) -> ParseResult<Expr> {
        let mut callee = self.parse_postfix()?;
        while starts_atom(self.cursor.current_kind()) {
            let argument = self.parse_postfix()?;
            callee = Tagged::new(
                callee.span.merge(argument.span),
                ValueExpression::Call {
                    callee: Box::new(callee),
                    argument: Box::new(argument),
                },
            );
        }
        Ok(callee)
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut value = self.parse_atom()?;
        while self.cursor.eat(&TokenKind::Dot).is_some() {
            let field = self.expect_ident()?;
            value = Tagged::new(
                value.span.merge(field.span),
                ValueExpression::FieldAccess {
                    value: Box::new(value),
                    field,
                },
            );
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let token = self.cursor.current();
        if let Some(value) = literal(token.kind) {
            self.cursor.advance();
            return Ok(Tagged::new(token.span, ValueExpression::Literal(value)));
        }
        match token.kind {
            // Already reported by the lexer.
            TokenKind::Error(_) => {
                self.cursor.advance();
                Ok(Tagged::new(token.span, ValueExpression::Error))
            }
            TokenKind::Ident(_) => self.parse_name_expr(),
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_array(),
            other => Err(ParseFailure::expected_expression(other, token.span)),
        }
    }

    /// Identifier, qualified path or record literal.
    fn parse_name_expr(&mut self) -> ParseResult<Expr> {
        let name = self.parse_qualified_name()?;
        if self.cursor.check(&TokenKind::LBrace)
            && !self.context.has(ParseContext::NO_RECORD_LIT)
        {
            return self.parse_record_literal(name);
        }
        let span = qualified_span(&name);
        if name.is_qualified() {
            Ok(Tagged::new(span, ValueExpression::QualifiedPath(name)))
        } else {
            Ok(Tagged::new(span, ValueExpression::Identifier(name.name.value)))
        }
    }

    /// `name { field = value, ... }`, with `{` current.
    fn parse_record_literal(&mut self, name: QualifiedName) -> ParseResult<Expr> {
        let start = qualified_span(&name);
        let body = self.delimited(TokenKind::RBrace, |p| {
            p.comma_list(&TokenKind::RBrace, |p| {
                let field = p.expect_ident()?;
                p.expect(&TokenKind::Eq, "`=`")?;
                let value = p.parse_expr()?;
                Ok(RecordFieldInit { name: field, value })
            })
        })?;
        let span = start.merge(body.span);
        Ok(match body.value {
            Some(fields) => Tagged::new(span, ValueExpression::Record { name, fields }),
            None => Tagged::new(span, ValueExpression::Error),
        })
    }

    /// `()`, `(op)`, `(e)` or `(a, b, ...)`.
    fn parse_parenthesized(&mut self) -> ParseResult<Expr> {
        if self.cursor.peek_kind(1) == TokenKind::RParen {
            let open = self.cursor.advance().span;
            let close = self.cursor.advance().span;
            return Ok(Tagged::new(
                open.merge(close),
                ValueExpression::Literal(Literal::Unit),
            ));
        }
        if self.cursor.peek_kind(2) == TokenKind::RParen {
            let operator = match self.cursor.peek_kind(1) {
                TokenKind::TildeMinus => Some(ValueExpression::UnaryOperatorValue(UnaryOp::Neg)),
                TokenKind::Bang => Some(ValueExpression::UnaryOperatorValue(UnaryOp::Not)),
                kind => binary_op(kind).map(ValueExpression::OperatorValue),
            };
            if let Some(value) = operator {
                let open = self.cursor.advance().span;
                self.cursor.advance();
                let close = self.cursor.advance().span;
                return Ok(Tagged::new(open.merge(close), value));
            }
        }

        let body = self.delimited(TokenKind::RParen, |p| {
            let first = p.parse_expr()?;
            if !p.cursor.check(&TokenKind::Comma) {
                return Ok(Parenthesized::Single(first));
            }
            let mut items = vec![first];
            while p.cursor.eat(&TokenKind::Comma).is_some() {
                if p.cursor.check(&TokenKind::RParen) {
                    break;
                }
                items.push(p.parse_expr()?);
            }
            Ok(Parenthesized::Tuple(items))
        })?;
        Ok(match body.value {
            Some(Parenthesized::Single(inner)) => inner,
            Some(Parenthesized::Tuple(items)) => {
                Tagged::new(body.span, ValueExpression::Tuple(items))
            }
            None => Tagged::new(body.span, ValueExpression::Error),
        })
    }

    /// `[a, ..xs, b]`
    fn parse_array(&mut self) -> ParseResult<Expr> {
        let body = self.delimited(TokenKind::RBracket, |p| {
            p.comma_list(&TokenKind::RBracket, |p| {
                if let Some(dots) = p.cursor.eat(&TokenKind::DotDot) {
                    let value = p.parse_expr()?;
                    Ok(Tagged::new(dots.merge(value.span), ArrayElement::Splice(value)))
                } else {
                    let value = p.parse_expr()?;
                    Ok(Tagged::new(value.span, ArrayElement::Single(value)))
                }
            })
        })?;
        Ok(match body.value {
            Some(elements) => Tagged::new(body.span, ValueExpression::Array(elements)),
            None => Tagged::new(body.span, ValueExpression::Error),
        })
    }

    /// `let pattern = value`, with `let` current.
    pub(crate) fn parse_let_head(&mut self) -> ParseResult<(Pat, Expr)> {
        self.cursor.advance();
        let pattern = self.parse_pattern()?;
        self.expect(&TokenKind::Eq, "`=`")?;
        let value = self.parse_expr()?;
        Ok((pattern, value))
    }

    /// `in body` after a let head that started at `start`.
    pub(crate) fn finish_let_expr(&mut self, start: Span, pattern: Pat, value: Expr) -> ParseResult<Expr> {
        self.expect(&TokenKind::In, "`in`")?;
        let body = self.parse_expr()?;
        Ok(Tagged::new(
            start.merge(body.span),
            ValueExpression::Let {
                pattern: Box::new(pattern),
                value: Box::new(value),
                body: Box::new(body),
            },
        ))
    }

    fn parse_let_expr(&mut self) -> ParseResult<Expr> {
        let start = self.cursor.current_span();
        let (pattern, value) = self.parse_let_head()?;
        self.finish_let_expr(start, pattern, value)
    }

    /// `fn params => body` or `fn | p => e | ...`.
    fn parse_fn(&mut self) -> ParseResult<Expr> {
        let start = self.cursor.advance().span;

        if self.cursor.check(&TokenKind::Pipe) {
            let mut arms = Vec::new();
            while self.cursor.eat(&TokenKind::Pipe).is_some() {
                arms.push(self.parse_arm()?);
            }
            return Ok(Tagged::new(
                start.merge(self.cursor.previous_span()),
                ValueExpression::MultiClauseFunction(arms),
            ));
        }

        let mut params = Vec::new();
        let mut recovered = false;
        loop {
            let token = self.cursor.current();
            match token.kind {
                TokenKind::Ident(name) => {
                    self.cursor.advance();
                    params.push(Tagged::new(
                        token.span,
                        Parameter::Named {
                            name: Tagged::new(token.span, name),
                            hint: None,
                        },
                    ));
                }
                TokenKind::LParen if self.cursor.peek_kind(1) == TokenKind::RParen => {
                    self.cursor.advance();
                    let close = self.cursor.advance().span;
                    params.push(Tagged::new(token.span.merge(close), Parameter::Unit));
                }
                TokenKind::LParen => {
                    let param = self.delimited(TokenKind::RParen, |p| {
                        let name = p.expect_ident()?;
                        p.expect(&TokenKind::Colon, "`:`")?;
                        let hint = p.parse_type()?;
                        Ok(Parameter::Named {
                            name,
                            hint: Some(hint),
                        })
                    })?;
                    match param.value {
                        Some(value) => params.push(Tagged::new(param.span, value)),
                        None => recovered = true,
                    }
                }
                _ => break,
            }
        }
        if params.is_empty() && !recovered {
            let token = self.cursor.current();
            return Err(ParseFailure::expected("function parameter", token.kind, token.span));
        }

        self.expect(&TokenKind::FatArrow, "`=>`")?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        if recovered {
            return Ok(Tagged::new(span, ValueExpression::Error));
        }
        Ok(Tagged::new(
            span,
            ValueExpression::Function {
                params,
                body: Box::new(body),
            },
        ))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let start = self.cursor.advance().span;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::Then, "`then`")?;
        let then_branch = self.parse_expr()?;
        self.expect(&TokenKind::Else, "`else`")?;
        let else_branch = self.parse_expr()?;
        Ok(Tagged::new(
            start.merge(else_branch.span),
            ValueExpression::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        ))
    }

    /// `match scrutinee { pattern => body, ... }`
    fn parse_match(&mut self) -> ParseResult<Expr> {
        let start = self.cursor.advance().span;
        let scrutinee = self.with_context(ParseContext::NO_RECORD_LIT, Self::parse_expr)?;
        if !self.cursor.check(&TokenKind::LBrace) {
            let token = self.cursor.current();
            return Err(ParseFailure::expected("`{`", token.kind, token.span));
        }
        let body = self.delimited(TokenKind::RBrace, |p| {
            p.comma_list(&TokenKind::RBrace, Self::parse_arm)
        })?;
        let span = start.merge(body.span);
        let Some(arms) = body.value else {
            return Ok(Tagged::new(span, ValueExpression::Error));
        };
        if arms.is_empty() {
            self.report(
                Diagnostic::warning(ErrorCode::E1008)
                    .with_message("`match` has no arms")
                    .with_span(span),
            );
        }
        Ok(Tagged::new(
            span,
            ValueExpression::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
        ))
    }

    /// `pattern => body`
    fn parse_arm(&mut self) -> ParseResult<MatchArm> {
        let pattern = self.parse_pattern()?;
        self.expect(&TokenKind::FatArrow, "`=>`")?;
        let body = self.parse_expr()?;
        Ok(MatchArm { pattern, body })
    }
}
