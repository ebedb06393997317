//! Single-module pipeline: lex → parse → lower → infer → hints → generate.
//!
//! The front-end phases always all run, so one compilation reports every
//! problem it can find. Code generation runs only on a module with no
//! error diagnostics.

use tarn_diagnostic::Diagnostics;
use tarn_ir::ir::IrModule;
use tarn_ir::SharedInterner;
use tarn_resolve::Resolver;
use tarn_types::Universe;

use crate::config::CompileConfig;
use crate::output::{CompileError, CompileOutput, Phase};

/// Compile one module with a fresh interner.
pub fn compile(source: &str, config: &CompileConfig) -> CompileOutput {
    compile_with_interner(source, config, &SharedInterner::new())
}

/// Compile one module, interning into `interner`.
#[tracing::instrument(level = "debug", skip_all, fields(module = %config.module_name))]
pub fn compile_with_interner(
    source: &str,
    config: &CompileConfig,
    interner: &SharedInterner,
) -> CompileOutput {
    let mut sink = Diagnostics::new();
    let mut tracker = PhaseTracker::default();
    let module_name = interner.intern(&config.module_name);

    let tokens = tarn_lexer::lex(source, interner, &mut sink);
    tracker.finish(Phase::Lex, &sink);

    let parsed = tarn_parse::parse(&tokens, interner, module_name, &mut sink);
    tracker.finish(Phase::Parse, &sink);

    let mut universe = Universe::new();
    let mut ir = {
        let mut resolver = Resolver::new(interner, module_name);
        tarn_lower::lower_module(&parsed, &mut resolver, &mut universe, &mut sink)
    };
    tracker.finish(Phase::Lower, &sink);

    tarn_types::infer_module(&mut ir, &universe, interner, &mut sink);
    tracker.finish(Phase::Infer, &sink);

    let mut program = None;
    let mut fatal = None;
    if config.emit_code && !sink.has_errors() {
        match generate(&mut ir, &universe, interner) {
            Ok(generated) => program = Some(generated),
            Err(error) => {
                tracing::warn!(%error, "module aborted");
                sink.push(error.to_diagnostic());
                tracker.finish(Phase::Codegen, &sink);
                fatal = Some(error);
            }
        }
    }

    tracing::debug!(
        errors = sink.error_count(),
        failed = ?tracker.failed,
        "compiled module"
    );
    CompileOutput {
        module_name: config.module_name.clone(),
        tokens,
        ir,
        program,
        diagnostics: sink.into_vec(),
        failed_phase: tracker.failed,
        fatal,
        interner: interner.clone(),
    }
}

fn generate(
    ir: &mut IrModule,
    universe: &Universe,
    interner: &SharedInterner,
) -> Result<tarn_codegen::Program, CompileError> {
    tarn_codegen::resolve_call_hints(ir, universe);
    Ok(tarn_codegen::generate_named(ir, universe, interner)?)
}

/// Remembers the first phase after which the sink held errors.
#[derive(Default)]
struct PhaseTracker {
    failed: Option<Phase>,
}

impl PhaseTracker {
    fn finish(&mut self, phase: Phase, sink: &Diagnostics) {
        tracing::trace!(phase = phase.name(), diagnostics = sink.len(), "phase done");
        if self.failed.is_none() && sink.has_errors() {
            self.failed = Some(phase);
        }
    }
}
