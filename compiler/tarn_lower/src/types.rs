//! Type definitions and type expressions.

use rustc_hash::{FxHashMap, FxHashSet};
use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ast::{QualifiedName, Statement, TypeDefinition, TypeDefinitionStatement, TypeExpr, TypeExpression};
use tarn_ir::{AbstractType, Name, Path, Span, Tagged, Type};
use tarn_resolve::NameKind;
use tarn_stack::ensure_sufficient_stack;
use tarn_types::{ConstructorInfo, TypeError};

use crate::Lowerer;

/// Type parameters in scope, mapped to their `Var` index.
pub(crate) type Params = FxHashMap<Path, u32>;

impl Lowerer<'_, '_> {
    /// Pre-pass over one module body: name every type, convert every
    /// definition, define the variant constructors and reject alias cycles.
    pub(crate) fn define_types(&mut self, statements: &[Tagged<Statement>]) {
        let definitions: Vec<(Path, &TypeDefinitionStatement)> = statements
            .iter()
            .filter_map(|statement| match &statement.value {
                Statement::TypeDefinition(definition) => Some(definition),
                _ => None,
            })
            .map(|definition| {
                let path = self.resolver.define(NameKind::Type, definition.name, self.sink);
                let arity = u32::try_from(definition.params.len()).unwrap_or(u32::MAX);
                // Placeholder so arity checks work before the body is known.
                self.universe.insert(path, AbstractType::new(arity, Type::Unresolved));
                (path, definition)
            })
            .collect();
        if definitions.is_empty() {
            return;
        }

        let mut aliases = Vec::new();
        for (path, definition) in &definitions {
            if matches!(definition.definition.value, TypeDefinition::Alias(_)) {
                aliases.push((*path, definition.name.span));
            }
            self.define_type(*path, definition);
        }

        let cyclic = self.universe.check_alias_cycles();
        for (path, span) in aliases.iter().filter(|(p, _)| cyclic.contains(p)) {
            self.sink.push(
                Diagnostic::error(ErrorCode::E3005)
                    .with_message(format!(
                        "type alias `{}` expands to itself",
                        self.interner.lookup(path.name)
                    ))
                    .with_span(*span)
                    .with_note("use a record or sum type to define a recursive type"),
            );
            self.universe.poison(*path);
        }
    }

    fn define_type(&mut self, path: Path, definition: &TypeDefinitionStatement) {
        let arity = u32::try_from(definition.params.len()).unwrap_or(u32::MAX);
        let mark = self.resolver.enter_scope();
        let mut params = Params::default();
        for (index, param) in (0u32..).zip(&definition.params) {
            let param_path = self.resolver.define(NameKind::Type, *param, self.sink);
            params.insert(param_path, index);
        }

        let mut variants = Vec::new();
        match &definition.definition.value {
            TypeDefinition::Record(fields) => {
                let mut seen: FxHashSet<Name> = FxHashSet::default();
                let mut converted = Vec::with_capacity(fields.len());
                for field in fields {
                    let ty = self.lower_type_with(&field.ty, &params);
                    if seen.insert(field.name.value) {
                        converted.push((field.name.value, ty));
                    } else {
                        self.sink.push(
                            Diagnostic::error(ErrorCode::E3008)
                                .with_message(format!(
                                    "field `{}` is declared more than once",
                                    self.interner.lookup(field.name.value)
                                ))
                                .with_span(field.name.span),
                        );
                    }
                }
                self.universe.insert(
                    path,
                    AbstractType::new(
                        arity,
                        Type::Record {
                            name: path,
                            fields: converted,
                        },
                    ),
                );
            }
            TypeDefinition::Sum(definitions) => {
                for variant in definitions {
                    let payload = variant
                        .payload
                        .as_ref()
                        .map(|ty| self.lower_type_with(ty, &params));
                    variants.push((variant.name, payload));
                }
                let base = Type::Sum {
                    name: path,
                    variants: variants
                        .iter()
                        .map(|(name, payload)| (name.value, payload.clone()))
                        .collect(),
                };
                self.universe.insert(path, AbstractType::new(arity, base));
            }
            TypeDefinition::Alias(ty) => {
                let base = self.lower_type_with(ty, &params);
                self.universe.insert_alias(path, AbstractType::new(arity, base));
            }
        }
        self.resolver.exit_scope(mark);

        // Constructors live beside the type, outside the parameter scope.
        for (tag, (name, payload)) in (0u32..).zip(variants) {
            let constructor = self.resolver.define(NameKind::Value, name, self.sink);
            self.universe.add_constructor(
                constructor,
                ConstructorInfo {
                    owner: path,
                    name: name.value,
                    tag,
                    payload,
                },
            );
        }
    }

    /// A type written in an expression or pattern hint.
    pub(crate) fn lower_type(&mut self, ty: &TypeExpr) -> Type {
        self.lower_type_with(ty, &Params::default())
    }

    fn lower_type_with(&mut self, ty: &TypeExpr, params: &Params) -> Type {
        ensure_sufficient_stack(|| match &ty.value {
            TypeExpression::Function { domain, codomain } => Type::function(
                self.lower_type_with(domain, params),
                self.lower_type_with(codomain, params),
            ),
            TypeExpression::Application { head, args } => {
                let args: Vec<Type> = args
                    .iter()
                    .map(|arg| self.lower_type_with(arg, params))
                    .collect();
                let path = match &head.value {
                    TypeExpression::Identifier(name) => {
                        let name = Tagged::new(head.span, *name);
                        self.resolver.resolve(NameKind::Type, name, self.sink)
                    }
                    TypeExpression::QualifiedPath(name) => {
                        self.resolver.resolve_qualified(NameKind::Type, name, self.sink)
                    }
                    _ => {
                        self.sink.push(
                            Diagnostic::error(ErrorCode::E1005)
                                .with_message("only a named type can be applied to arguments")
                                .with_span(head.span),
                        );
                        return Type::Unresolved;
                    }
                };
                self.named_type(ty.span, path, args, params)
            }
            TypeExpression::Identifier(name) => {
                let path = self
                    .resolver
                    .resolve(NameKind::Type, Tagged::new(ty.span, *name), self.sink);
                self.named_type(ty.span, path, Vec::new(), params)
            }
            TypeExpression::QualifiedPath(name) => {
                let path = self.resolve_type_name(name);
                self.named_type(ty.span, path, Vec::new(), params)
            }
            TypeExpression::Product(items) => Type::Product(
                items
                    .iter()
                    .map(|item| self.lower_type_with(item, params))
                    .collect(),
            ),
            TypeExpression::Array(element) => Type::array(self.lower_type_with(element, params)),
            TypeExpression::Unit => Type::Unit,
            TypeExpression::Error => Type::Unresolved,
        })
    }

    pub(crate) fn resolve_type_name(&mut self, name: &QualifiedName) -> Path {
        self.resolver.resolve_qualified(NameKind::Type, name, self.sink)
    }

    fn named_type(&mut self, span: Span, path: Path, args: Vec<Type>, params: &Params) -> Type {
        if path.is_poisoned() {
            return Type::Unresolved;
        }
        let simple = params
            .get(&path)
            .map(|index| Type::var(*index))
            .or_else(|| self.resolver.prelude().builtin_type(path));
        if let Some(ty) = simple {
            if !args.is_empty() {
                self.push_arity(span, path, 0, args.len());
                return Type::Unresolved;
            }
            return ty;
        }
        match self.universe.instantiate(path, args) {
            Ok(ty) => ty,
            Err(TypeError::Arity {
                path,
                expected,
                found,
            }) => {
                self.push_arity(span, path, expected, found);
                Type::Unresolved
            }
            Err(TypeError::Undefined(_)) => {
                tracing::debug!(path = %path.display(self.interner), "type without definition");
                Type::Unresolved
            }
        }
    }

    fn push_arity(&mut self, span: Span, path: Path, expected: u32, found: usize) {
        self.sink.push(tarn_types::arity_diagnostic(
            span,
            self.interner,
            path,
            expected,
            found,
        ));
    }
}
