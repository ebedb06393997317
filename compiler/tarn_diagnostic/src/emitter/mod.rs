//! Terminal rendering of diagnostics.
//!
//! ```text
//! error [E2001]: undefined name `y`
//!   --> main.tarn:2:9
//!    |
//!  2 | let x = y + 1;
//!    |         ^
//! ```

use std::io::{self, Write};

use tarn_ir::Span;

use crate::{Diagnostic, DiagnosticConfig, Diagnostics, LineIndex, Severity};

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const DEBUG: &str = "\x1b[1;36m";
    pub const BOLD: &str = "\x1b[1m";
    pub const GUTTER: &str = "\x1b[1;34m";
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Use colors when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Writes diagnostics for one source file.
pub struct TerminalEmitter<'src, W: Write> {
    writer: W,
    colors: bool,
    file_name: &'src str,
    source: &'src str,
    lines: LineIndex,
}

impl<'src, W: Write> TerminalEmitter<'src, W> {
    pub fn new(
        writer: W,
        file_name: &'src str,
        source: &'src str,
        mode: ColorMode,
        is_tty: bool,
    ) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            file_name,
            source,
            lines: LineIndex::build(source),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&mut self, text: &str, color: &str) -> io::Result<()> {
        if self.colors {
            write!(self.writer, "{color}{text}{}", colors::RESET)
        } else {
            write!(self.writer, "{text}")
        }
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => colors::ERROR,
            Severity::Warn => colors::WARNING,
            Severity::Debug => colors::DEBUG,
        }
    }

    pub fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let color = Self::severity_color(diagnostic.severity);
        self.paint(&diagnostic.severity.to_string(), color)?;
        if let Some(code) = diagnostic.code {
            write!(self.writer, " ")?;
            self.paint(&format!("[{code}]"), colors::BOLD)?;
        }
        writeln!(self.writer, ": {}", diagnostic.message)?;

        if let Some(span) = diagnostic.span {
            self.snippet(span, None, color)?;
        }
        for label in &diagnostic.labels {
            self.snippet(label.span, Some(&label.message), colors::GUTTER)?;
        }
        for note in &diagnostic.notes {
            writeln!(self.writer, "   = note: {note}")?;
        }
        writeln!(self.writer)
    }

    /// Location line plus the source line with a caret underline.
    fn snippet(&mut self, span: Span, message: Option<&str>, color: &str) -> io::Result<()> {
        let (line, column) = self.lines.line_col(self.source, span.start);
        writeln!(self.writer, "  --> {}:{line}:{column}", self.file_name)?;

        let text = self.lines.line_text(self.source, line);
        let gutter = line.to_string();
        let pad = " ".repeat(gutter.len());
        self.paint(&format!("{pad} |"), colors::GUTTER)?;
        writeln!(self.writer)?;
        self.paint(&format!("{gutter} |"), colors::GUTTER)?;
        writeln!(self.writer, " {text}")?;

        // Underline only what fits on this line; a span past the end of the
        // input still gets a single caret.
        let line_chars = text.chars().count();
        let start_col = column as usize - 1;
        let width = span.width.max(1) as usize;
        let width = width.min(line_chars.saturating_sub(start_col).max(1));
        self.paint(&format!("{pad} |"), colors::GUTTER)?;
        write!(self.writer, " {}", " ".repeat(start_col))?;
        self.paint(&"^".repeat(width), color)?;
        if let Some(message) = message {
            write!(self.writer, " {message}")?;
        }
        writeln!(self.writer)
    }

    /// Emit every visible diagnostic, then a summary line.
    pub fn emit_all(
        &mut self,
        diagnostics: &Diagnostics,
        config: &DiagnosticConfig,
    ) -> io::Result<()> {
        for diagnostic in diagnostics.visible(config) {
            self.emit(diagnostic)?;
        }
        self.emit_summary(diagnostics)
    }

    fn emit_summary(&mut self, diagnostics: &Diagnostics) -> io::Result<()> {
        let errors = diagnostics.error_count();
        let warnings = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warn)
            .count();
        if errors == 0 && warnings == 0 {
            return Ok(());
        }
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        if errors > 0 {
            self.paint("error", colors::ERROR)?;
            writeln!(
                self.writer,
                ": {errors} error{} and {warnings} warning{} in {}",
                plural(errors),
                plural(warnings),
                self.file_name
            )
        } else {
            self.paint("warning", colors::WARNING)?;
            writeln!(
                self.writer,
                ": {warnings} warning{} in {}",
                plural(warnings),
                self.file_name
            )
        }
    }
}

#[cfg(test)]
mod tests;
