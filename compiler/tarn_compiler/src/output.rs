//! Result types for the compiler pipeline.

use tarn_codegen::{CodegenError, Program};
use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ir::IrModule;
use tarn_ir::{SharedInterner, TokenList};

/// Pipeline stage, in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Lex,
    Parse,
    Lower,
    Infer,
    Codegen,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Lower => "lower",
            Phase::Infer => "infer",
            Phase::Codegen => "codegen",
        }
    }
}

/// A defect inside the compiler. Aborts the module it happened in.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("code generation failed: {0}")]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::E9001)
            .with_message(format!("internal compiler error: {self}"))
            .with_note("this is a bug in the compiler, not in the program")
    }
}

/// Everything one module's compilation produced.
#[derive(Clone, Debug)]
pub struct CompileOutput {
    pub module_name: String,
    pub tokens: TokenList,
    pub ir: IrModule,
    /// Present when code generation ran and succeeded.
    pub program: Option<Program>,
    /// Every diagnostic of every phase, in the order reported.
    pub diagnostics: Vec<Diagnostic>,
    /// The earliest phase that reported an error.
    pub failed_phase: Option<Phase>,
    /// Set when an internal error aborted the module.
    pub fatal: Option<CompileError>,
    /// Resolves the names in `tokens` and `ir`.
    pub interner: SharedInterner,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.failed_phase.is_none()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}
