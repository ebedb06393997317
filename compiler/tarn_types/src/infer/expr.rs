//! Expression inference.

use rustc_hash::FxHashSet;
use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ir::{ConstValue, IrFunction, IrKind, IrNode, Pattern};
use tarn_ir::{Name, Path, Span, Tagged, Type};
use tarn_stack::ensure_sufficient_stack;

use super::Infer;
use crate::intrinsics::intrinsic_type;

pub(super) fn const_type(value: &ConstValue, fresh: impl FnOnce() -> Type) -> Type {
    match value {
        ConstValue::Unit => Type::Unit,
        ConstValue::Int(_) => Type::Int,
        ConstValue::Real(_) => Type::Real,
        ConstValue::Bool(_) => Type::Bool,
        ConstValue::Text(_) => Type::Text,
        ConstValue::Char(_) => Type::Char,
        ConstValue::EmptyArray => Type::array(fresh()),
    }
}

impl Infer<'_> {
    /// Infer `node`, store the (unresolved) type in its slot and return it.
    pub(crate) fn infer_expr(&mut self, node: &mut IrNode) -> Type {
        ensure_sufficient_stack(|| {
            let span = node.span;
            let ty = self.infer_kind(span, &mut node.value.value);
            node.value.ty = ty.clone();
            ty
        })
    }

    fn infer_kind(&mut self, span: Span, kind: &mut IrKind) -> Type {
        match kind {
            IrKind::Const(value) => const_type(value, || self.ctx.fresh_var()),
            IrKind::Identifier(path) => self.identifier_type(*path),
            IrKind::Tuple(items) => {
                Type::Product(items.iter_mut().map(|item| self.infer_expr(item)).collect())
            }
            IrKind::Record { path, fields } => self.infer_record(span, *path, fields),
            IrKind::Project { value, field } => {
                let ty = self.infer_expr(value);
                self.project(&ty, *field)
            }
            IrKind::Function(function) => self.infer_function(function),
            IrKind::Call {
                callee, argument, ..
            } => {
                let callee_ty = self.infer_expr(callee);
                let argument_ty = self.infer_expr(argument);
                match self.ctx.shallow(&callee_ty) {
                    Type::Function(domain, codomain) => {
                        self.unify_at(argument.span, &domain, &argument_ty);
                        *codomain
                    }
                    _ => {
                        let result = self.ctx.fresh_var();
                        let expected = Type::function(argument_ty, result.clone());
                        self.unify_at(span, &expected, &callee_ty);
                        result
                    }
                }
            }
            IrKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_ty = self.infer_expr(condition);
                self.unify_at(condition.span, &Type::Bool, &condition_ty);
                let then_ty = self.infer_expr(then_branch);
                let else_ty = self.infer_expr(else_branch);
                self.unify_at(else_branch.span, &then_ty, &else_ty);
                then_ty
            }
            IrKind::Match {
                scrutinee,
                patterns,
                branches,
            } => {
                let scrutinee_ty = self.infer_expr(scrutinee);
                let result = self.ctx.fresh_var();
                for (pattern, branch) in patterns.iter_mut().zip(branches.iter_mut()) {
                    let mark = self.locals.len();
                    let mut bound = Vec::new();
                    let pattern_ty = self.infer_pattern(pattern, &mut bound);
                    self.unify_at(pattern.span, &scrutinee_ty, &pattern_ty);
                    self.locals.extend(bound);
                    let branch_ty = self.infer_expr(branch);
                    self.unify_at(branch.span, &result, &branch_ty);
                    self.locals.truncate(mark);
                }
                result
            }
            IrKind::Let {
                pattern,
                value,
                body,
            } => {
                let mark = self.locals.len();
                let bound = self.infer_let(pattern, value);
                self.locals.extend(bound);
                let ty = self.infer_expr(body);
                self.locals.truncate(mark);
                ty
            }
            IrKind::Error => self.ctx.fresh_var(),
        }
    }

    /// Infer `let pattern = value` and generalize what it binds. The
    /// pattern's bindings are visible while `value` is inferred.
    pub(crate) fn infer_let(&mut self, pattern: &mut Pattern, value: &mut IrNode) -> Vec<Path> {
        let mut bound = Vec::new();
        let pattern_ty = self.infer_pattern(pattern, &mut bound);
        let value_ty = self.infer_expr(value);
        self.unify_at(value.span, &pattern_ty, &value_ty);
        self.generalize_bindings(&bound);
        bound
    }

    fn identifier_type(&mut self, path: Path) -> Type {
        if path.is_poisoned() {
            return self.ctx.fresh_var();
        }
        if let Some(scheme) = self.env.get(&path) {
            let scheme = scheme.clone();
            return self.ctx.instantiate(&scheme);
        }
        if let Some(ty) = self.constructor_type(path) {
            return ty;
        }
        if let Some(op) = self.ctx.universe().intrinsic(path) {
            return intrinsic_type(op, &mut self.ctx);
        }
        tracing::debug!(salt = path.salt, "identifier without a type");
        self.ctx.fresh_var()
    }

    /// Fresh instance of the sum a constructor builds, and its payload.
    pub(super) fn constructor_instance(&mut self, path: Path) -> Option<(Type, Option<Type>)> {
        let universe = self.ctx.universe();
        let info = universe.constructor(path)?;
        let arity = universe.get(info.owner).map_or(0, |d| d.arity);
        let args: Vec<Type> = (0..arity).map(|_| self.ctx.fresh_var()).collect();
        let payload = info.payload.as_ref().map(|p| p.substitute_params(&args));
        let owner = Type::Instantiation {
            path: info.owner,
            args,
        };
        Some((owner, payload))
    }

    fn constructor_type(&mut self, path: Path) -> Option<Type> {
        let (owner, payload) = self.constructor_instance(path)?;
        Some(match payload {
            Some(payload) => Type::function(payload, owner),
            None => owner,
        })
    }

    fn infer_function(&mut self, function: &mut IrFunction) -> Type {
        let mark = self.locals.len();
        let domain = match &function.param {
            Some(param) => {
                let domain = param.hint.clone().unwrap_or_else(|| self.ctx.fresh_var());
                self.bind_mono(param.path, domain.clone());
                self.locals.push(param.path);
                domain
            }
            None => Type::Unit,
        };
        for capture in &mut function.captures {
            capture.ty = match self.env.get(&capture.value) {
                Some(scheme) => scheme.ty.clone(),
                None => self.ctx.fresh_var(),
            };
        }
        let codomain = self.infer_expr(&mut function.body);
        self.locals.truncate(mark);
        Type::function(domain, codomain)
    }

    fn infer_record(
        &mut self,
        span: Span,
        path: Path,
        fields: &mut [(Tagged<Name>, IrNode)],
    ) -> Type {
        let universe = self.ctx.universe();
        let Some(arity) = universe.get(path).map(|d| d.arity) else {
            for (_, value) in fields.iter_mut() {
                self.infer_expr(value);
            }
            return self.ctx.fresh_var();
        };
        let args: Vec<Type> = (0..arity).map(|_| self.ctx.fresh_var()).collect();
        let instance = Type::Instantiation { path, args };
        let declared = match self.ctx.structural_head(&instance) {
            Some(Type::Record { fields, .. }) => Some(fields),
            None | Some(Type::Unresolved) => None,
            Some(other) => {
                self.sink.push(
                    Diagnostic::error(ErrorCode::E3004)
                        .with_message(format!(
                            "`{}` is not a record type",
                            other.display(self.interner)
                        ))
                        .with_span(span),
                );
                None
            }
        };

        let mut seen: FxHashSet<Name> = FxHashSet::default();
        for (field, value) in fields.iter_mut() {
            let value_ty = self.infer_expr(value);
            if !seen.insert(field.value) {
                self.sink.push(
                    Diagnostic::error(ErrorCode::E3008)
                        .with_message(format!(
                            "field `{}` specified more than once",
                            self.interner.lookup(field.value)
                        ))
                        .with_span(field.span),
                );
                continue;
            }
            let Some(declared) = &declared else {
                continue;
            };
            match declared.iter().find(|(name, _)| *name == field.value) {
                Some((_, field_ty)) => self.unify_at(value.span, field_ty, &value_ty),
                None => self.sink.push(
                    Diagnostic::error(ErrorCode::E3004)
                        .with_message(format!(
                            "record `{}` has no field `{}`",
                            self.interner.lookup(path.name),
                            self.interner.lookup(field.value)
                        ))
                        .with_span(field.span),
                ),
            }
        }

        if let Some(declared) = &declared {
            let missing: Vec<&str> = declared
                .iter()
                .filter(|(name, _)| !seen.contains(name))
                .map(|(name, _)| self.interner.lookup(*name))
                .collect();
            if !missing.is_empty() {
                self.sink.push(
                    Diagnostic::error(ErrorCode::E3008)
                        .with_message(format!(
                            "missing field(s) in `{}` literal: {}",
                            self.interner.lookup(path.name),
                            missing.join(", ")
                        ))
                        .with_span(span),
                );
            }
        }
        instance
    }

    fn project(&mut self, value_ty: &Type, field: Tagged<Name>) -> Type {
        let head = self.ctx.structural_head(value_ty);
        match head {
            Some(Type::Record { fields, .. }) => {
                if let Some((_, ty)) = fields.iter().find(|(name, _)| *name == field.value) {
                    return ty.clone();
                }
                self.sink.push(
                    Diagnostic::error(ErrorCode::E3004)
                        .with_message(format!(
                            "type `{}` has no field `{}`",
                            self.ctx.resolve(value_ty).display(self.interner),
                            self.interner.lookup(field.value)
                        ))
                        .with_span(field.span),
                );
            }
            // Unknown definitions and error values were reported already.
            None | Some(Type::Unresolved) => {}
            Some(Type::Var(_)) => self.sink.push(
                Diagnostic::error(ErrorCode::E3004)
                    .with_message(format!(
                        "cannot access field `{}` on a value of unknown type",
                        self.interner.lookup(field.value)
                    ))
                    .with_span(field.span)
                    .with_note("annotate the value with its record type"),
            ),
            Some(other) => self.sink.push(
                Diagnostic::error(ErrorCode::E3004)
                    .with_message(format!(
                        "type `{}` has no field `{}`",
                        other.display(self.interner),
                        self.interner.lookup(field.value)
                    ))
                    .with_span(field.span),
            ),
        }
        self.ctx.fresh_var()
    }
}
