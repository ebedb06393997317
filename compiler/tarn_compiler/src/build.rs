//! Multi-module builds.
//!
//! Modules compile in the order given, sharing one interner. An internal
//! error in one module cancels the rest; whatever the earlier modules
//! reported is still returned.

use rustc_hash::FxHashMap;
use tarn_ir::SharedInterner;

use crate::config::CompileConfig;
use crate::output::CompileOutput;
use crate::pipeline::compile_with_interner;

/// Where module sources come from.
pub trait SourceProvider {
    fn source(&self, module_name: &str) -> Option<String>;
}

/// Sources held in memory, by module name.
#[derive(Clone, Debug, Default)]
pub struct MemorySources {
    sources: FxHashMap<String, String>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module_name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(module_name.into(), source.into());
    }

    #[must_use]
    pub fn with(mut self, module_name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(module_name, source);
        self
    }
}

impl SourceProvider for MemorySources {
    fn source(&self, module_name: &str) -> Option<String> {
        self.sources.get(module_name).cloned()
    }
}

/// What happened to one module of a build.
#[derive(Clone, Debug)]
pub enum ModuleOutcome {
    Compiled(Box<CompileOutput>),
    /// The provider had no source for the module.
    Missing,
    /// Skipped because an earlier module failed fatally.
    Cancelled,
}

impl ModuleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ModuleOutcome::Compiled(output) if output.succeeded() => "ok",
            ModuleOutcome::Compiled(_) => "failed",
            ModuleOutcome::Missing => "missing",
            ModuleOutcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BuildOutput {
    /// One entry per requested module, in request order.
    pub modules: Vec<(String, ModuleOutcome)>,
}

impl BuildOutput {
    pub fn outcome(&self, module_name: &str) -> Option<&ModuleOutcome> {
        self.modules
            .iter()
            .find(|(name, _)| name == module_name)
            .map(|(_, outcome)| outcome)
    }

    pub fn succeeded(&self) -> bool {
        self.modules
            .iter()
            .all(|(_, outcome)| matches!(outcome, ModuleOutcome::Compiled(output) if output.succeeded()))
    }

    /// Total error diagnostics across compiled modules.
    pub fn error_count(&self) -> usize {
        self.modules
            .iter()
            .map(|(_, outcome)| match outcome {
                ModuleOutcome::Compiled(output) => output.error_count(),
                ModuleOutcome::Missing | ModuleOutcome::Cancelled => 0,
            })
            .sum()
    }
}

/// Compile `modules` in order. `config.module_name` is replaced by each
/// module's name.
#[tracing::instrument(level = "debug", skip_all, fields(modules = modules.len()))]
pub fn build(modules: &[&str], provider: &dyn SourceProvider, config: &CompileConfig) -> BuildOutput {
    build_with(modules, provider, config, compile_with_interner)
}

pub(crate) fn build_with(
    modules: &[&str],
    provider: &dyn SourceProvider,
    config: &CompileConfig,
    mut compile: impl FnMut(&str, &CompileConfig, &SharedInterner) -> CompileOutput,
) -> BuildOutput {
    let interner = SharedInterner::new();
    let mut output = BuildOutput::default();
    let mut cancelled = false;

    for &name in modules {
        if cancelled {
            output.modules.push((name.to_owned(), ModuleOutcome::Cancelled));
            continue;
        }
        let Some(source) = provider.source(name) else {
            tracing::warn!(module = name, "no source");
            output.modules.push((name.to_owned(), ModuleOutcome::Missing));
            continue;
        };
        let module_config = CompileConfig {
            module_name: name.to_owned(),
            ..config.clone()
        };
        let compiled = compile(&source, &module_config, &interner);
        if compiled.fatal.is_some() {
            tracing::warn!(module = name, "fatal error, cancelling remaining modules");
            cancelled = true;
        }
        output
            .modules
            .push((name.to_owned(), ModuleOutcome::Compiled(Box::new(compiled))));
    }
    output
}
