//! The append-only diagnostic sink shared by all phases of one compilation.
//!
//! Entries keep their arrival order and are never changed or removed.
//! Filtering for display (severity threshold, error limit) happens on the
//! way out, through [`Diagnostics::visible`].

use crate::{Diagnostic, Severity};

/// Configuration for diagnostic display.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of errors to show (0 = unlimited).
    pub error_limit: usize,
    /// Least severe diagnostic to show.
    pub min_severity: Severity,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 20,
            min_severity: Severity::Warn,
        }
    }
}

impl DiagnosticConfig {
    /// Show everything, including debug entries.
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            min_severity: Severity::Debug,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    error_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.entries.push(diagnostic);
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Entries to display under `config`, in arrival order.
    pub fn visible<'a>(
        &'a self,
        config: &'a DiagnosticConfig,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        let mut errors_shown = 0usize;
        self.entries
            .iter()
            .filter(|d| d.severity >= config.min_severity)
            .filter(move |d| {
                if !d.is_error() {
                    return true;
                }
                errors_shown += 1;
                config.error_limit == 0 || errors_shown <= config.error_limit
            })
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
