use tarn_diagnostic::DiagnosticConfig;

/// Configuration for a compilation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    /// Name of the module; prefixes every path it defines.
    pub module_name: String,
    /// Run code generation after a clean front end.
    pub emit_code: bool,
    /// How diagnostics are rendered. Collection is never limited.
    pub diagnostics: DiagnosticConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            module_name: "main".to_owned(),
            emit_code: true,
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

impl CompileConfig {
    pub fn for_module(name: impl Into<String>) -> Self {
        CompileConfig {
            module_name: name.into(),
            ..Self::default()
        }
    }
}
