//! Diagnostic system for the Tarn compiler.
//!
//! Every phase reports problems the same way: build a [`Diagnostic`] and
//! append it to the compilation's [`Diagnostics`] sink. Nothing here ever
//! fails or aborts; the driver decides what to do with the collected list.

mod diagnostic;
pub mod emitter;
mod error_code;
mod line_index;
mod sink;

pub use diagnostic::{
    type_mismatch, unclosed_delimiter, unexpected_token, Diagnostic, Label, Severity,
};
pub use emitter::{ColorMode, TerminalEmitter};
pub use error_code::ErrorCode;
pub use line_index::LineIndex;
pub use sink::{DiagnosticConfig, Diagnostics};
