//! Pattern lowering. Every identifier a pattern binds is defined in the
//! current scope as it is reached, so `(x, x)` is a redefinition.

use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ast::{ArrayPatternExpression, Ident, Pat, PatternExpression, QualifiedName};
use tarn_ir::ir::{build, ArrayPattern, Pattern, PatternKind};
use tarn_ir::{Path, Span, Tagged};
use tarn_resolve::NameKind;
use tarn_stack::ensure_sufficient_stack;

use crate::literal;
use crate::Lowerer;

impl Lowerer<'_, '_> {
    /// Lower `pattern`, pushing the path of every binding onto `bound`.
    pub(crate) fn lower_pattern(&mut self, pattern: &Pat, bound: &mut Vec<Path>) -> Pattern {
        ensure_sufficient_stack(|| {
            let kind = self.lower_pattern_kind(pattern, bound);
            build::pattern(pattern.span, kind)
        })
    }

    fn lower_pattern_kind(&mut self, pattern: &Pat, bound: &mut Vec<Path>) -> PatternKind {
        let span = pattern.span;
        match &pattern.value {
            PatternExpression::Wildcard => PatternKind::Wildcard,
            PatternExpression::Literal { literal, negated } => {
                match literal::cook(*literal, *negated, self.interner) {
                    Ok(value) => PatternKind::Const(value),
                    Err(error) => {
                        self.sink.push(error.to_diagnostic(span));
                        PatternKind::Error
                    }
                }
            }
            PatternExpression::Identifier(name) => {
                PatternKind::Binding(self.bind(Tagged::new(span, *name), bound))
            }
            PatternExpression::QualifiedPath(name) => self.constructor(span, name, None, bound),
            PatternExpression::Constructor { name, payload } => {
                self.constructor(span, name, payload.as_deref(), bound)
            }
            PatternExpression::Tuple(items) => PatternKind::Tuple(
                items
                    .iter()
                    .map(|item| self.lower_pattern(item, bound))
                    .collect(),
            ),
            PatternExpression::Array(array) => PatternKind::Array(self.lower_array_pattern(array, bound)),
            PatternExpression::TypeHinted { pattern, ty } => {
                let hint = self.lower_type(ty);
                let pattern = self.lower_pattern(pattern, bound);
                PatternKind::Hinted {
                    pattern: Box::new(pattern),
                    hint,
                }
            }
        }
    }

    fn bind(&mut self, name: Ident, bound: &mut Vec<Path>) -> Path {
        let path = self.resolver.define(NameKind::Value, name, self.sink);
        bound.push(path);
        path
    }

    fn constructor(
        &mut self,
        span: Span,
        name: &QualifiedName,
        payload: Option<&Pat>,
        bound: &mut Vec<Path>,
    ) -> PatternKind {
        let path = self
            .resolver
            .resolve_qualified(NameKind::Value, name, self.sink);
        let payload = payload.map(|payload| Box::new(self.lower_pattern(payload, bound)));
        if path.is_poisoned() {
            return PatternKind::Error;
        }
        if self.universe.constructor(path).is_none() {
            self.sink.push(
                Diagnostic::error(ErrorCode::E1006)
                    .with_message(format!(
                        "`{}` is not a variant constructor",
                        self.interner.lookup(name.name.value)
                    ))
                    .with_span(span)
                    .with_note("only constructors and literals can be matched against"),
            );
            return PatternKind::Error;
        }
        PatternKind::Constructor { path, payload }
    }

    fn lower_array_pattern(
        &mut self,
        array: &ArrayPatternExpression,
        bound: &mut Vec<Path>,
    ) -> ArrayPattern {
        match array {
            ArrayPatternExpression::Exact(items) => ArrayPattern::Exact(self.lower_patterns(items, bound)),
            ArrayPatternExpression::LeadingWithRest { leading, rest } => {
                let leading = self.lower_patterns(leading, bound);
                let rest = rest.map(|rest| self.bind(rest, bound));
                ArrayPattern::LeadingWithRest { leading, rest }
            }
            ArrayPatternExpression::TrailingWithRest { rest, trailing } => {
                let rest = rest.map(|rest| self.bind(rest, bound));
                let trailing = self.lower_patterns(trailing, bound);
                ArrayPattern::TrailingWithRest { rest, trailing }
            }
            ArrayPatternExpression::Surrounding {
                leading,
                rest,
                trailing,
            } => {
                let leading = self.lower_patterns(leading, bound);
                let rest = rest.map(|rest| self.bind(rest, bound));
                let trailing = self.lower_patterns(trailing, bound);
                ArrayPattern::Surrounding {
                    leading,
                    rest,
                    trailing,
                }
            }
        }
    }

    fn lower_patterns(&mut self, items: &[Pat], bound: &mut Vec<Path>) -> Vec<Pattern> {
        items
            .iter()
            .map(|item| self.lower_pattern(item, bound))
            .collect()
    }
}
