//! Code generation for Tarn.
//!
//! Runs after inference on a module with no error diagnostics:
//!
//! 1. [`resolve_call_hints`] classifies every call (operator, constructor,
//!    direct, through a closure).
//! 2. [`generate`] erases types to [`ReducedType`]s, lifts every function
//!    into an [`EncodedFunction`] and emits stack-machine [`Instruction`]s.
//!
//! Polymorphic values share the [`ReducedType::OpaqueRef`] representation.
//! Call sites use the signature of the callee's type at that site; the
//! machine converts between a concrete representation and `OpaqueRef` at
//! the call boundary.
//!
//! Any failure here is a compiler defect, reported as a [`CodegenError`].

mod emit;
mod erase;
mod error;
mod hints;
mod instruction;

pub use erase::{erase, ReducedType};
pub use error::CodegenError;
pub use hints::resolve_call_hints;
pub use instruction::{
    EncodedFunction, Global, Instruction, Program, Signature, SignatureId,
};

use tarn_ir::ir::IrModule;
use tarn_ir::StringInterner;
use tarn_types::Universe;

/// Generate a program for `module`, whose call hints must be resolved.
#[tracing::instrument(level = "debug", skip_all)]
pub fn generate(module: &IrModule, universe: &Universe) -> Result<Program, CodegenError> {
    emit::Generator::new(universe, None).generate(module)
}

/// Like [`generate`], naming functions and globals after their source
/// bindings.
#[tracing::instrument(level = "debug", skip_all)]
pub fn generate_named(
    module: &IrModule,
    universe: &Universe,
    interner: &StringInterner,
) -> Result<Program, CodegenError> {
    emit::Generator::new(universe, Some(interner)).generate(module)
}
