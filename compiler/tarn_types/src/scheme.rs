//! Polymorphic type schemes: generalization and instantiation.

use rustc_hash::{FxHashMap, FxHashSet};
use tarn_ir::{Type, TypeVar};

use crate::unify::InferenceContext;

/// `forall vars. ty`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeScheme {
    pub vars: Vec<TypeVar>,
    pub ty: Type,
}

impl TypeScheme {
    pub fn monomorphic(ty: Type) -> Self {
        TypeScheme {
            vars: Vec::new(),
            ty,
        }
    }

    pub fn is_monomorphic(&self) -> bool {
        self.vars.is_empty()
    }
}

impl InferenceContext<'_> {
    /// Variables free in `scheme` that it does not quantify.
    pub fn scheme_free_vars(&self, scheme: &TypeScheme) -> Vec<TypeVar> {
        let mut free = self.free_vars(&scheme.ty);
        free.retain(|v| !scheme.vars.contains(v));
        free
    }

    /// Quantify the variables of `ty` that are not free in the
    /// environment.
    pub fn generalize(&self, ty: &Type, env_vars: &[TypeVar]) -> TypeScheme {
        let ty = self.resolve(ty);
        let env: FxHashSet<TypeVar> = env_vars.iter().copied().collect();
        let vars: Vec<TypeVar> = self
            .free_vars(&ty)
            .into_iter()
            .filter(|v| !env.contains(v))
            .collect();
        TypeScheme { vars, ty }
    }

    /// Fresh variables for the quantified ones. `scheme` is left as is.
    pub fn instantiate(&mut self, scheme: &TypeScheme) -> Type {
        if scheme.is_monomorphic() {
            return scheme.ty.clone();
        }
        let mapping: FxHashMap<TypeVar, Type> = scheme
            .vars
            .iter()
            .map(|v| (*v, self.fresh_var()))
            .collect();
        self.substitute_vars(&scheme.ty, &mapping)
    }
}
