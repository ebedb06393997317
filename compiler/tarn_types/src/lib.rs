//! Type system for Tarn.
//!
//! - [`Universe`]: every type definition of a module, by path
//! - [`InferenceContext`]: fresh variables, unification, substitution
//! - [`TypeScheme`]: generalization and instantiation for let-polymorphism
//! - [`infer_module`]: inference over the lowered IR
//!
//! The [`Type`](tarn_ir::Type) representation itself lives in `tarn_ir`
//! so that lowering and code generation can share it.

mod infer;
mod intrinsics;
mod scheme;
mod unify;
mod universe;

pub use infer::{infer_module, InferenceOutput};
pub use intrinsics::intrinsic_type;
pub use scheme::TypeScheme;
pub use unify::{arity_diagnostic, InferenceContext, UnifyError};
pub use universe::{ConstructorInfo, TypeError, Universe};
