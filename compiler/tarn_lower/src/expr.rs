//! Expression lowering.

use rustc_hash::FxHashSet;
use tarn_ir::ast::{
    ArrayElement, BinaryOp, Expr, Literal, MatchArm, Parameter, UnaryOp, ValueExpression,
};
use tarn_ir::ir::{build, ConstValue, IrFunction, IrKind, IrNode, IrParameter, Typed};
use tarn_ir::{Intrinsic, Path, Span, Tagged};
use tarn_resolve::NameKind;
use tarn_stack::ensure_sufficient_stack;

use crate::literal;
use crate::{Frame, Lowerer};

/// Name of the parameter a multi-clause function matches on. Not a valid
/// identifier, so it cannot be shadowed or referenced from source.
const CLAUSE_ARGUMENT: &str = "$arg";

impl Lowerer<'_, '_> {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> IrNode {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, expr: &Expr) -> IrNode {
        let span = expr.span;
        match &expr.value {
            ValueExpression::Let {
                pattern,
                value,
                body,
            } => {
                let mark = self.resolver.enter_scope();
                let mut bound = Vec::new();
                let pattern = self.lower_pattern(pattern, &mut bound);
                self.resolver.begin_initializing(&bound);
                let value = self.lower_expr(value);
                self.resolver.end_initializing(&bound);
                let body = self.lower_expr(body);
                self.resolver.exit_scope(mark);
                build::node(
                    span,
                    IrKind::Let {
                        pattern,
                        value: Box::new(value),
                        body: Box::new(body),
                    },
                )
            }
            ValueExpression::Literal(value) => match literal::cook(*value, false, self.interner) {
                Ok(value) => build::constant(span, value),
                Err(error) => {
                    self.sink.push(error.to_diagnostic(span));
                    build::node(span, IrKind::Error)
                }
            },
            ValueExpression::Identifier(name) => {
                let path = self
                    .resolver
                    .resolve(NameKind::Value, Tagged::new(span, *name), self.sink);
                self.note_use(path);
                self.identifier(span, path)
            }
            ValueExpression::QualifiedPath(name) => {
                let path = self
                    .resolver
                    .resolve_qualified(NameKind::Value, name, self.sink);
                self.identifier(span, path)
            }
            ValueExpression::Binary { op, lhs, rhs } => self.lower_binary(span, *op, lhs, rhs),
            ValueExpression::Unary { op, operand } => {
                if let (
                    UnaryOp::Neg,
                    ValueExpression::Literal(literal @ (Literal::Int { .. } | Literal::Real(_))),
                ) = (op.value, &operand.value)
                {
                    // Folded here so `-9223372036854775808` fits.
                    return match literal::cook(*literal, true, self.interner) {
                        Ok(value) => build::constant(span, value),
                        Err(error) => {
                            self.sink.push(error.to_diagnostic(span));
                            build::node(span, IrKind::Error)
                        }
                    };
                }
                let callee = self.operator(op.span, Intrinsic::from_unary(op.value));
                let operand = self.lower_expr(operand);
                build::call(span, callee, operand)
            }
            ValueExpression::OperatorValue(op) => self.operator(span, Intrinsic::from_binary(*op)),
            ValueExpression::UnaryOperatorValue(op) => {
                self.operator(span, Intrinsic::from_unary(*op))
            }
            ValueExpression::Function { params, body } => self.lower_function(span, params, body),
            ValueExpression::MultiClauseFunction(arms) => self.lower_multi_clause(span, arms),
            ValueExpression::Call { callee, argument } => {
                let callee = self.lower_expr(callee);
                let argument = self.lower_expr(argument);
                build::call(span, callee, argument)
            }
            ValueExpression::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.lower_expr(condition);
                let then_branch = self.lower_expr(then_branch);
                let else_branch = self.lower_expr(else_branch);
                build::node(
                    span,
                    IrKind::If {
                        condition: Box::new(condition),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                )
            }
            ValueExpression::Match { scrutinee, arms } => {
                let scrutinee = self.lower_expr(scrutinee);
                self.lower_match(span, scrutinee, arms)
            }
            ValueExpression::Tuple(items) => {
                let items = items.iter().map(|item| self.lower_expr(item)).collect();
                build::node(span, IrKind::Tuple(items))
            }
            ValueExpression::Array(elements) => self.lower_array(span, elements),
            ValueExpression::Record { name, fields } => {
                let path = self.resolve_type_name(name);
                if path.is_poisoned() {
                    for field in fields {
                        self.lower_expr(&field.value);
                    }
                    return build::node(span, IrKind::Error);
                }
                let fields = fields
                    .iter()
                    .map(|field| (field.name, self.lower_expr(&field.value)))
                    .collect();
                build::node(span, IrKind::Record { path, fields })
            }
            ValueExpression::FieldAccess { value, field } => {
                let value = self.lower_expr(value);
                build::node(
                    span,
                    IrKind::Project {
                        value: Box::new(value),
                        field: *field,
                    },
                )
            }
            ValueExpression::Error => build::node(span, IrKind::Error),
        }
    }

    fn identifier(&self, span: Span, path: Path) -> IrNode {
        if path.is_poisoned() {
            return build::node(span, IrKind::Error);
        }
        build::ident(span, path)
    }

    fn operator(&self, span: Span, op: Intrinsic) -> IrNode {
        build::ident(span, self.resolver.prelude().operator(op))
    }

    /// `a op b` is `op a b`.
    fn lower_binary(&mut self, span: Span, op: Tagged<BinaryOp>, lhs: &Expr, rhs: &Expr) -> IrNode {
        let callee = self.operator(op.span, Intrinsic::from_binary(op.value));
        let lhs = self.lower_expr(lhs);
        let partial = build::call(lhs.span.merge(op.span), callee, lhs);
        let rhs = self.lower_expr(rhs);
        build::call(span, partial, rhs)
    }

    /// `[a, ..xs, b]` is `push (append (push [] a) xs) b`.
    fn lower_array(&mut self, span: Span, elements: &[Tagged<ArrayElement>]) -> IrNode {
        let mut acc = build::constant(span, ConstValue::EmptyArray);
        for element in elements {
            let (op, value) = match &element.value {
                ArrayElement::Single(value) => (Intrinsic::Push, value),
                ArrayElement::Splice(value) => (Intrinsic::Append, value),
            };
            let callee = self.operator(element.span, op);
            let value = self.lower_expr(value);
            let fold_span = Span::point(span.start).merge(element.span);
            let partial = build::call(fold_span, callee, acc);
            acc = build::call(fold_span, partial, value);
        }
        if !elements.is_empty() {
            acc.span = span;
        }
        acc
    }

    /// `fn a b => body` is `fn a => fn b => body`; each layer is its own
    /// function scope so inner layers capture outer parameters.
    fn lower_function(&mut self, span: Span, params: &[Tagged<Parameter>], body: &Expr) -> IrNode {
        let Some((first, rest)) = params.split_first() else {
            return self.lower_expr(body);
        };
        let inner_span = rest.first().map_or(body.span, |p| p.span.merge(body.span));

        let mark = self.resolver.enter_function_scope();
        self.push_frame();
        let param = match &first.value {
            Parameter::Named { name, hint } => {
                let hint = hint.as_ref().map(|hint| self.lower_type(hint));
                let path = self.resolver.define(NameKind::Value, *name, self.sink);
                Some(IrParameter { path, hint })
            }
            Parameter::Unit => None,
        };
        let body = if rest.is_empty() {
            self.lower_expr(body)
        } else {
            self.lower_function(inner_span, rest, body)
        };
        let captures = self.pop_frame();
        self.resolver.exit_scope(mark);

        build::node(
            span,
            IrKind::Function(IrFunction {
                param,
                captures,
                body: Box::new(body),
            }),
        )
    }

    /// `fn | p => a | q => b` is `fn $arg => match $arg { p => a, q => b }`.
    fn lower_multi_clause(&mut self, span: Span, arms: &[MatchArm]) -> IrNode {
        let mark = self.resolver.enter_function_scope();
        self.push_frame();
        let argument = self.resolver.define_hidden(CLAUSE_ARGUMENT, span);
        let scrutinee = build::ident(span, argument);
        let body = self.lower_match(span, scrutinee, arms);
        let captures = self.pop_frame();
        self.resolver.exit_scope(mark);

        build::node(
            span,
            IrKind::Function(IrFunction {
                param: Some(IrParameter {
                    path: argument,
                    hint: None,
                }),
                captures,
                body: Box::new(body),
            }),
        )
    }

    fn lower_match(&mut self, span: Span, scrutinee: IrNode, arms: &[MatchArm]) -> IrNode {
        let mut patterns = Vec::with_capacity(arms.len());
        let mut branches = Vec::with_capacity(arms.len());
        for arm in arms {
            let mark = self.resolver.enter_scope();
            let mut bound = Vec::new();
            patterns.push(self.lower_pattern(&arm.pattern, &mut bound));
            branches.push(self.lower_expr(&arm.body));
            self.resolver.exit_scope(mark);
        }
        build::node(
            span,
            IrKind::Match {
                scrutinee: Box::new(scrutinee),
                patterns,
                branches,
            },
        )
    }

    fn push_frame(&mut self) {
        self.frames.push(Frame {
            depth: self.resolver.function_depth(),
            captures: Vec::new(),
            seen: FxHashSet::default(),
        });
    }

    fn pop_frame(&mut self) -> Vec<Typed<Path>> {
        self.frames
            .pop()
            .map(|frame| frame.captures.into_iter().map(Typed::unresolved).collect())
            .unwrap_or_default()
    }
}

