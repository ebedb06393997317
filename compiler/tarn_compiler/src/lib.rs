//! Tarn compiler driver.
//!
//! Runs the phases of the `tarn_*` crates in order over in-memory sources
//! and packages what they produced:
//!
//! ```text
//! tarn_lexer → tarn_parse → tarn_lower (+ tarn_resolve) → tarn_types → tarn_codegen
//!                                  ↓
//!                            tarn_compiler  ← this crate
//! ```
//!
//! No filesystem access happens here; sources come through a
//! [`SourceProvider`].

mod build;
mod config;
mod output;
mod pipeline;

pub use build::{build, BuildOutput, MemorySources, ModuleOutcome, SourceProvider};
pub use config::CompileConfig;
pub use output::{CompileError, CompileOutput, Phase};
pub use pipeline::{compile, compile_with_interner};

use std::sync::Once;

use tarn_diagnostic::{ColorMode, DiagnosticConfig, Diagnostics, TerminalEmitter};

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `TARN_LOG` or `RUST_LOG` is set, e.g.
/// `TARN_LOG=tarn_types=trace`. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directives = std::env::var("TARN_LOG").or_else(|_| std::env::var("RUST_LOG"));
        if let Ok(directives) = directives {
            let filter = EnvFilter::new(directives);
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Render the diagnostics of `output` against `source`, with the terminal
/// emitter's source snippets and summary line.
pub fn render_diagnostics(
    output: &CompileOutput,
    source: &str,
    config: &DiagnosticConfig,
    color: ColorMode,
) -> String {
    let mut sink = Diagnostics::new();
    sink.extend(output.diagnostics.iter().cloned());

    let mut emitter = TerminalEmitter::new(Vec::new(), &output.module_name, source, color, false);
    if let Err(error) = emitter.emit_all(&sink, config) {
        tracing::warn!(%error, "diagnostic rendering failed");
    }
    String::from_utf8_lossy(&emitter.into_inner()).into_owned()
}
