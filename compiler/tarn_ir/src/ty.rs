//! Semantic types.
//!
//! Uses of user-defined types are [`Type::Instantiation`] nodes: a path to an
//! [`AbstractType`] plus arguments. The definition's body is substituted in
//! only on demand, one layer at a time, which is what keeps self-referential
//! definitions such as `type list a = Nil | Cons (a, list a)` finite.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Name, Path, StringInterner};

/// Type variable index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TypeVar(pub u32);

#[derive(Clone, Debug)]
pub enum Type {
    /// Slot not yet filled by inference.
    Unresolved,
    Unit,
    Int,
    Real,
    Bool,
    Text,
    Char,
    Var(TypeVar),
    /// Named record. Field order is kept for layout but ignored by equality.
    Record {
        name: Path,
        fields: Vec<(Name, Type)>,
    },
    Array(Box<Type>),
    Product(Vec<Type>),
    /// Named sum; variant order is significant (it assigns tags).
    Sum {
        name: Path,
        variants: Vec<(Name, Option<Type>)>,
    },
    Function(Box<Type>, Box<Type>),
    Instantiation {
        path: Path,
        args: Vec<Type>,
    },
}

impl Type {
    pub fn function(domain: Type, codomain: Type) -> Type {
        Type::Function(Box::new(domain), Box::new(codomain))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn var(index: u32) -> Type {
        Type::Var(TypeVar(index))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Type::Unresolved)
    }

    /// Equality without expanding instantiations. Record fields compare by
    /// name, so `{x, y}` and `{y, x}` are the same type.
    pub fn structurally_equal(&self, other: &Type) -> bool {
        self == other
    }

    /// Replace every `Var(n)` with `args[n]`. Variables without a matching
    /// argument are left alone. Nested instantiations have their arguments
    /// substituted but are not expanded.
    #[must_use]
    pub fn substitute_params(&self, args: &[Type]) -> Type {
        match self {
            Type::Var(TypeVar(n)) => args.get(*n as usize).cloned().unwrap_or_else(|| self.clone()),
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => self.clone(),
            Type::Record { name, fields } => Type::Record {
                name: *name,
                fields: fields
                    .iter()
                    .map(|(field, ty)| (*field, ty.substitute_params(args)))
                    .collect(),
            },
            Type::Array(element) => Type::array(element.substitute_params(args)),
            Type::Product(items) => {
                Type::Product(items.iter().map(|t| t.substitute_params(args)).collect())
            }
            Type::Sum { name, variants } => Type::Sum {
                name: *name,
                variants: variants
                    .iter()
                    .map(|(variant, payload)| {
                        (*variant, payload.as_ref().map(|p| p.substitute_params(args)))
                    })
                    .collect(),
            },
            Type::Function(domain, codomain) => Type::function(
                domain.substitute_params(args),
                codomain.substitute_params(args),
            ),
            Type::Instantiation { path, args: inner } => Type::Instantiation {
                path: *path,
                args: inner.iter().map(|t| t.substitute_params(args)).collect(),
            },
        }
    }

    /// Render with names looked up in `interner`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> TypeDisplay<'a> {
        TypeDisplay { ty: self, interner }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unresolved, Type::Unresolved)
            | (Type::Unit, Type::Unit)
            | (Type::Int, Type::Int)
            | (Type::Real, Type::Real)
            | (Type::Bool, Type::Bool)
            | (Type::Text, Type::Text)
            | (Type::Char, Type::Char) => true,
            (Type::Var(a), Type::Var(b)) => a == b,
            (
                Type::Record {
                    name: a,
                    fields: fa,
                },
                Type::Record {
                    name: b,
                    fields: fb,
                },
            ) => {
                a == b
                    && fa.len() == fb.len()
                    && fa.iter().all(|(field, ty)| {
                        fb.iter()
                            .find(|(other, _)| other == field)
                            .is_some_and(|(_, other_ty)| ty == other_ty)
                    })
            }
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Product(a), Type::Product(b)) => a == b,
            (
                Type::Sum {
                    name: a,
                    variants: va,
                },
                Type::Sum {
                    name: b,
                    variants: vb,
                },
            ) => a == b && va == vb,
            (Type::Function(da, ca), Type::Function(db, cb)) => da == db && ca == cb,
            (
                Type::Instantiation { path: a, args: xa },
                Type::Instantiation { path: b, args: xb },
            ) => a == b && xa == xb,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Type::Var(v) => v.hash(state),
            // Field order does not take part in equality, so only the
            // name and the field count are hashed.
            Type::Record { name, fields } => {
                name.hash(state);
                fields.len().hash(state);
            }
            Type::Array(element) => element.hash(state),
            Type::Product(items) => items.hash(state),
            Type::Sum { name, variants } => {
                name.hash(state);
                variants.hash(state);
            }
            Type::Function(domain, codomain) => {
                domain.hash(state);
                codomain.hash(state);
            }
            Type::Instantiation { path, args } => {
                path.hash(state);
                args.hash(state);
            }
            Type::Unresolved
            | Type::Unit
            | Type::Int
            | Type::Real
            | Type::Bool
            | Type::Text
            | Type::Char => {}
        }
    }
}

/// A possibly parametric type definition. Parameter `n` appears in `base`
/// as `Type::Var(TypeVar(n))`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AbstractType {
    pub arity: u32,
    pub base: Type,
}

impl AbstractType {
    pub fn new(arity: u32, base: Type) -> Self {
        AbstractType { arity, base }
    }

    /// One-layer expansion: the base with parameters replaced by `args`.
    pub fn expand(&self, args: &[Type]) -> Type {
        self.base.substitute_params(args)
    }
}

pub struct TypeDisplay<'a> {
    ty: &'a Type,
    interner: &'a StringInterner,
}

impl TypeDisplay<'_> {
    fn nested<'b>(&'b self, ty: &'b Type) -> TypeDisplay<'b> {
        TypeDisplay {
            ty,
            interner: self.interner,
        }
    }

    fn is_atomic(ty: &Type) -> bool {
        match ty {
            Type::Function(..) => false,
            Type::Instantiation { args, .. } => args.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |n: Name| self.interner.lookup(n);
        match self.ty {
            Type::Unresolved => f.write_str("?"),
            Type::Unit => f.write_str("unit"),
            Type::Int => f.write_str("int"),
            Type::Real => f.write_str("real"),
            Type::Bool => f.write_str("bool"),
            Type::Text => f.write_str("text"),
            Type::Char => f.write_str("char"),
            Type::Var(TypeVar(n)) => write!(f, "'t{n}"),
            Type::Record { name: path, .. } | Type::Sum { name: path, .. } => {
                f.write_str(name(path.name))
            }
            Type::Array(element) => write!(f, "[{}]", self.nested(element)),
            Type::Product(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.nested(item))?;
                }
                f.write_str(")")
            }
            Type::Function(domain, codomain) => {
                if matches!(**domain, Type::Function(..)) {
                    write!(f, "({}) -> {}", self.nested(domain), self.nested(codomain))
                } else {
                    write!(f, "{} -> {}", self.nested(domain), self.nested(codomain))
                }
            }
            Type::Instantiation { path, args } => {
                f.write_str(name(path.name))?;
                for arg in args {
                    if Self::is_atomic(arg) {
                        write!(f, " {}", self.nested(arg))?;
                    } else {
                        write!(f, " ({})", self.nested(arg))?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(interner: &StringInterner, name: &str) -> Path {
        Path::new(interner.intern("main"), interner.intern(name), 0)
    }

    #[test]
    fn record_equality_ignores_field_order() {
        let interner = StringInterner::new();
        let point = path(&interner, "point");
        let x = interner.intern("x");
        let y = interner.intern("y");
        let a = Type::Record {
            name: point,
            fields: vec![(x, Type::Int), (y, Type::Real)],
        };
        let b = Type::Record {
            name: point,
            fields: vec![(y, Type::Real), (x, Type::Int)],
        };
        assert_eq!(a, b);
    }

    #[test]
    fn sum_equality_respects_variant_order() {
        let interner = StringInterner::new();
        let name = path(&interner, "bit");
        let zero = interner.intern("Zero");
        let one = interner.intern("One");
        let a = Type::Sum {
            name,
            variants: vec![(zero, None), (one, None)],
        };
        let b = Type::Sum {
            name,
            variants: vec![(one, None), (zero, None)],
        };
        assert_ne!(a, b);
    }

    #[test]
    fn expansion_substitutes_one_layer() {
        let interner = StringInterner::new();
        let list = path(&interner, "list");
        let self_ref = Type::Instantiation {
            path: list,
            args: vec![Type::var(0)],
        };
        let definition = AbstractType::new(
            1,
            Type::Sum {
                name: list,
                variants: vec![
                    (interner.intern("Nil"), None),
                    (
                        interner.intern("Cons"),
                        Some(Type::Product(vec![Type::var(0), self_ref])),
                    ),
                ],
            },
        );

        let expanded = definition.expand(&[Type::Int]);
        let Type::Sum { variants, .. } = expanded else {
            panic!("expected a sum");
        };
        assert_eq!(
            variants[1].1,
            Some(Type::Product(vec![
                Type::Int,
                Type::Instantiation {
                    path: list,
                    args: vec![Type::Int],
                },
            ]))
        );
    }

    #[test]
    fn display_nests_function_types() {
        let interner = StringInterner::new();
        let ty = Type::function(Type::function(Type::Int, Type::Bool), Type::Text);
        assert_eq!(ty.display(&interner).to_string(), "(int -> bool) -> text");
    }

    #[test]
    fn display_instantiation_arguments() {
        let interner = StringInterner::new();
        let list = path(&interner, "list");
        let ty = Type::Instantiation {
            path: list,
            args: vec![Type::Instantiation {
                path: list,
                args: vec![Type::Int],
            }],
        };
        assert_eq!(ty.display(&interner).to_string(), "list (list int)");
    }
}
