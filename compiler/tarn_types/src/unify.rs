//! Unification over [`Type`] with a substitution map.
//!
//! User-defined types are compared nominally first: two instantiations of
//! the same path only unify their arguments. Anything else expands one
//! layer of the definition and tries again. A visited set of the pairs
//! being compared makes a revisit succeed, so mutually recursive
//! definitions terminate.

use rustc_hash::{FxHashMap, FxHashSet};
use tarn_diagnostic::{type_mismatch, Diagnostic, ErrorCode};
use tarn_ir::{Path, Span, StringInterner, Type, TypeVar};
use tarn_stack::ensure_sufficient_stack;

use crate::universe::{TypeError, Universe};

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum UnifyError {
    #[error("type mismatch")]
    Mismatch { expected: Type, found: Type },
    #[error("infinite type")]
    InfiniteType { var: TypeVar, ty: Type },
    #[error("wrong number of type arguments")]
    Arity {
        path: Path,
        expected: u32,
        found: usize,
    },
}

impl UnifyError {
    pub fn to_diagnostic(&self, span: Span, interner: &StringInterner) -> Diagnostic {
        match self {
            UnifyError::Mismatch { expected, found } => type_mismatch(
                span,
                &expected.display(interner).to_string(),
                &found.display(interner).to_string(),
            ),
            UnifyError::InfiniteType { var, ty } => Diagnostic::error(ErrorCode::E3002)
                .with_message(format!(
                    "infinite type: `{}` occurs in `{}`",
                    Type::Var(*var).display(interner),
                    ty.display(interner)
                ))
                .with_span(span),
            UnifyError::Arity {
                path,
                expected,
                found,
            } => arity_diagnostic(span, interner, *path, *expected, *found),
        }
    }

    /// Unknown definitions were reported when the name failed to resolve,
    /// so only arity problems survive.
    pub fn from_type_error(error: TypeError) -> Option<UnifyError> {
        match error {
            TypeError::Arity {
                path,
                expected,
                found,
            } => Some(UnifyError::Arity {
                path,
                expected,
                found,
            }),
            TypeError::Undefined(_) => None,
        }
    }
}

pub fn arity_diagnostic(
    span: Span,
    interner: &StringInterner,
    path: Path,
    expected: u32,
    found: usize,
) -> Diagnostic {
    Diagnostic::error(ErrorCode::E3003)
        .with_message(format!(
            "type `{}` takes {expected} argument(s) but {found} were supplied",
            interner.lookup(path.name)
        ))
        .with_span(span)
}

pub struct InferenceContext<'u> {
    universe: &'u Universe,
    next_var: u32,
    substitutions: FxHashMap<TypeVar, Type>,
}

impl<'u> InferenceContext<'u> {
    pub fn new(universe: &'u Universe) -> Self {
        InferenceContext {
            universe,
            next_var: 0,
            substitutions: FxHashMap::default(),
        }
    }

    pub fn universe(&self) -> &'u Universe {
        self.universe
    }

    pub fn fresh_var(&mut self) -> Type {
        let var = TypeVar(self.next_var);
        self.next_var += 1;
        Type::Var(var)
    }

    /// Follow variable bindings at the head of `ty` only.
    pub fn shallow(&self, ty: &Type) -> Type {
        let mut current = ty;
        while let Type::Var(var) = current {
            match self.substitutions.get(var) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone()
    }

    /// Apply the substitution everywhere in `ty`. Instantiations are
    /// resolved argument-wise and never expanded.
    pub fn resolve(&self, ty: &Type) -> Type {
        ensure_sufficient_stack(|| match ty {
            Type::Var(var) => match self.substitutions.get(var) {
                Some(bound) => self.resolve(bound),
                None => ty.clone(),
            },
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => ty.clone(),
            Type::Record { name, fields } => Type::Record {
                name: *name,
                fields: fields
                    .iter()
                    .map(|(field, ty)| (*field, self.resolve(ty)))
                    .collect(),
            },
            Type::Array(element) => Type::array(self.resolve(element)),
            Type::Product(items) => Type::Product(items.iter().map(|t| self.resolve(t)).collect()),
            Type::Sum { name, variants } => Type::Sum {
                name: *name,
                variants: variants
                    .iter()
                    .map(|(variant, payload)| (*variant, payload.as_ref().map(|p| self.resolve(p))))
                    .collect(),
            },
            Type::Function(domain, codomain) => {
                Type::function(self.resolve(domain), self.resolve(codomain))
            }
            Type::Instantiation { path, args } => Type::Instantiation {
                path: *path,
                args: args.iter().map(|t| self.resolve(t)).collect(),
            },
        })
    }

    /// Does `var` appear in `ty`, looking through bound variables and
    /// instantiation arguments? Definitions are never expanded.
    pub fn occurs(&self, var: TypeVar, ty: &Type) -> bool {
        ensure_sufficient_stack(|| match ty {
            Type::Var(other) => {
                *other == var
                    || self
                        .substitutions
                        .get(other)
                        .is_some_and(|bound| self.occurs(var, bound))
            }
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => false,
            Type::Record { fields, .. } => fields.iter().any(|(_, t)| self.occurs(var, t)),
            Type::Array(element) => self.occurs(var, element),
            Type::Product(items) | Type::Instantiation { args: items, .. } => {
                items.iter().any(|t| self.occurs(var, t))
            }
            Type::Sum { variants, .. } => variants
                .iter()
                .filter_map(|(_, payload)| payload.as_ref())
                .any(|t| self.occurs(var, t)),
            Type::Function(domain, codomain) => {
                self.occurs(var, domain) || self.occurs(var, codomain)
            }
        })
    }

    /// Unbound variables of `ty` in order of first appearance.
    pub fn free_vars(&self, ty: &Type) -> Vec<TypeVar> {
        let mut seen = FxHashSet::default();
        let mut vars = Vec::new();
        self.collect_free_vars(ty, &mut seen, &mut vars);
        vars
    }

    fn collect_free_vars(&self, ty: &Type, seen: &mut FxHashSet<TypeVar>, vars: &mut Vec<TypeVar>) {
        ensure_sufficient_stack(|| match ty {
            Type::Var(var) => match self.substitutions.get(var) {
                Some(bound) => self.collect_free_vars(bound, seen, vars),
                None => {
                    if seen.insert(*var) {
                        vars.push(*var);
                    }
                }
            },
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => {}
            Type::Record { fields, .. } => {
                for (_, field) in fields {
                    self.collect_free_vars(field, seen, vars);
                }
            }
            Type::Array(element) => self.collect_free_vars(element, seen, vars),
            Type::Product(items) | Type::Instantiation { args: items, .. } => {
                for item in items {
                    self.collect_free_vars(item, seen, vars);
                }
            }
            Type::Sum { variants, .. } => {
                for payload in variants.iter().filter_map(|(_, p)| p.as_ref()) {
                    self.collect_free_vars(payload, seen, vars);
                }
            }
            Type::Function(domain, codomain) => {
                self.collect_free_vars(domain, seen, vars);
                self.collect_free_vars(codomain, seen, vars);
            }
        });
    }

    /// Make `expected` and `found` equal. A mismatch anywhere inside is
    /// reported with the two whole types.
    pub fn unify(&mut self, expected: &Type, found: &Type) -> Result<(), UnifyError> {
        let mut visited = FxHashSet::default();
        match self.unify_inner(expected, found, &mut visited) {
            Err(UnifyError::Mismatch { .. }) => Err(UnifyError::Mismatch {
                expected: self.resolve(expected),
                found: self.resolve(found),
            }),
            other => other,
        }
    }

    fn unify_inner(
        &mut self,
        a: &Type,
        b: &Type,
        visited: &mut FxHashSet<(Type, Type)>,
    ) -> Result<(), UnifyError> {
        let a = self.shallow(a);
        let b = self.shallow(b);
        tracing::trace!(?a, ?b, "unify");

        ensure_sufficient_stack(|| match (&a, &b) {
            (Type::Unresolved, _) | (_, Type::Unresolved) => Ok(()),
            (Type::Var(x), Type::Var(y)) if x == y => Ok(()),
            (Type::Var(var), other) | (other, Type::Var(var)) => self.bind(*var, other),

            (Type::Unit, Type::Unit)
            | (Type::Int, Type::Int)
            | (Type::Real, Type::Real)
            | (Type::Bool, Type::Bool)
            | (Type::Text, Type::Text)
            | (Type::Char, Type::Char) => Ok(()),

            (Type::Array(x), Type::Array(y)) => self.unify_inner(x, y, visited),
            (Type::Product(xs), Type::Product(ys)) => {
                if xs.len() != ys.len() {
                    return Err(self.mismatch(&a, &b));
                }
                for (x, y) in xs.iter().zip(ys) {
                    self.unify_inner(x, y, visited)?;
                }
                Ok(())
            }
            (Type::Function(d1, c1), Type::Function(d2, c2)) => {
                self.unify_inner(d1, d2, visited)?;
                self.unify_inner(c1, c2, visited)
            }
            (
                Type::Record {
                    name: n1,
                    fields: f1,
                },
                Type::Record {
                    name: n2,
                    fields: f2,
                },
            ) => {
                if n1 != n2 || f1.len() != f2.len() {
                    return Err(self.mismatch(&a, &b));
                }
                for (field, x) in f1 {
                    let Some((_, y)) = f2.iter().find(|(other, _)| other == field) else {
                        return Err(self.mismatch(&a, &b));
                    };
                    self.unify_inner(x, y, visited)?;
                }
                Ok(())
            }
            (
                Type::Sum {
                    name: n1,
                    variants: v1,
                },
                Type::Sum {
                    name: n2,
                    variants: v2,
                },
            ) => {
                if n1 != n2 || v1.len() != v2.len() {
                    return Err(self.mismatch(&a, &b));
                }
                for ((tag1, p1), (tag2, p2)) in v1.iter().zip(v2) {
                    if tag1 != tag2 {
                        return Err(self.mismatch(&a, &b));
                    }
                    match (p1, p2) {
                        (Some(x), Some(y)) => self.unify_inner(x, y, visited)?,
                        (None, None) => {}
                        _ => return Err(self.mismatch(&a, &b)),
                    }
                }
                Ok(())
            }
            (
                Type::Instantiation {
                    path: p1,
                    args: a1,
                },
                Type::Instantiation {
                    path: p2,
                    args: a2,
                },
            ) if p1 == p2 => {
                if a1.len() != a2.len() {
                    return Err(self.arity_error(*p1, a1.len().max(a2.len())));
                }
                for (x, y) in a1.iter().zip(a2) {
                    self.unify_inner(x, y, visited)?;
                }
                Ok(())
            }
            (Type::Instantiation { .. }, _) | (_, Type::Instantiation { .. }) => {
                let key = (self.resolve(&a), self.resolve(&b));
                if !visited.insert(key) {
                    return Ok(());
                }
                let Some(left) = self.expand_head(&a)? else {
                    return Ok(());
                };
                let Some(right) = self.expand_head(&b)? else {
                    return Ok(());
                };
                self.unify_inner(&left, &right, visited)
            }
            _ => Err(self.mismatch(&a, &b)),
        })
    }

    /// One layer of expansion if `ty` is an instantiation. `None` means the
    /// definition is unknown and `ty` should be treated as an error type.
    pub fn expand_head(&self, ty: &Type) -> Result<Option<Type>, UnifyError> {
        let Type::Instantiation { path, args } = ty else {
            return Ok(Some(ty.clone()));
        };
        match self.universe.expand(*path, args) {
            Ok(expanded) => Ok(Some(expanded)),
            Err(error) => match UnifyError::from_type_error(error) {
                Some(error) => Err(error),
                None => Ok(None),
            },
        }
    }

    /// Expand instantiations at the head until a structural type appears.
    /// Returns `None` for unknown definitions and alias loops.
    pub fn structural_head(&self, ty: &Type) -> Option<Type> {
        let mut seen = FxHashSet::default();
        let mut current = self.shallow(ty);
        while let Type::Instantiation { path, .. } = &current {
            if !seen.insert(*path) {
                return None;
            }
            current = self.shallow(&self.expand_head(&current).ok()??);
        }
        Some(current)
    }

    fn bind(&mut self, var: TypeVar, ty: &Type) -> Result<(), UnifyError> {
        if self.occurs(var, ty) {
            return Err(UnifyError::InfiniteType {
                var,
                ty: self.resolve(ty),
            });
        }
        self.substitutions.insert(var, ty.clone());
        Ok(())
    }

    fn mismatch(&self, expected: &Type, found: &Type) -> UnifyError {
        UnifyError::Mismatch {
            expected: self.resolve(expected),
            found: self.resolve(found),
        }
    }

    fn arity_error(&self, path: Path, found: usize) -> UnifyError {
        UnifyError::Arity {
            path,
            expected: self.universe.get(path).map_or(0, |d| d.arity),
            found,
        }
    }

    /// Replace every variable in `ty` found in `mapping`.
    pub fn substitute_vars(&self, ty: &Type, mapping: &FxHashMap<TypeVar, Type>) -> Type {
        ensure_sufficient_stack(|| match ty {
            Type::Var(var) => {
                if let Some(replacement) = mapping.get(var) {
                    replacement.clone()
                } else if let Some(bound) = self.substitutions.get(var) {
                    self.substitute_vars(bound, mapping)
                } else {
                    ty.clone()
                }
            }
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => ty.clone(),
            Type::Record { name, fields } => Type::Record {
                name: *name,
                fields: fields
                    .iter()
                    .map(|(field, t)| (*field, self.substitute_vars(t, mapping)))
                    .collect(),
            },
            Type::Array(element) => Type::array(self.substitute_vars(element, mapping)),
            Type::Product(items) => Type::Product(
                items
                    .iter()
                    .map(|t| self.substitute_vars(t, mapping))
                    .collect(),
            ),
            Type::Sum { name, variants } => Type::Sum {
                name: *name,
                variants: variants
                    .iter()
                    .map(|(variant, payload)| {
                        (
                            *variant,
                            payload.as_ref().map(|p| self.substitute_vars(p, mapping)),
                        )
                    })
                    .collect(),
            },
            Type::Function(domain, codomain) => Type::function(
                self.substitute_vars(domain, mapping),
                self.substitute_vars(codomain, mapping),
            ),
            Type::Instantiation { path, args } => Type::Instantiation {
                path: *path,
                args: args
                    .iter()
                    .map(|t| self.substitute_vars(t, mapping))
                    .collect(),
            },
        })
    }
}
