use super::*;
use crate::ErrorCode;
use pretty_assertions::assert_eq;

fn render(source: &str, diagnostics: &Diagnostics) -> String {
    let mut emitter = TerminalEmitter::new(Vec::new(), "main.tarn", source, ColorMode::Never, true);
    emitter
        .emit_all(diagnostics, &DiagnosticConfig::default())
        .unwrap_or_else(|e| panic!("write to Vec failed: {e}"));
    String::from_utf8(emitter.into_inner()).unwrap_or_default()
}

#[test]
fn renders_snippet_with_caret() {
    let source = "let x = y + 1;\n";
    let mut sink = Diagnostics::new();
    sink.push(
        Diagnostic::error(ErrorCode::E2001)
            .with_message("undefined name `y`")
            .with_span(Span::new(8, 1)),
    );

    let expected = "\
error [E2001]: undefined name `y`
  --> main.tarn:1:9
  |
1 | let x = y + 1;
  |         ^

error: 1 error and 0 warnings in main.tarn
";
    assert_eq!(render(source, &sink), expected);
}

#[test]
fn span_past_end_gets_one_caret() {
    let source = "(1";
    let mut sink = Diagnostics::new();
    sink.push(
        Diagnostic::error(ErrorCode::E1003)
            .with_message("unclosed delimiter `(`")
            .with_span(Span::new(2, 1)),
    );

    let output = render(source, &sink);
    assert!(output.contains("--> main.tarn:1:3"));
    assert!(output.contains("  |   ^\n"));
}

#[test]
fn labels_and_notes_are_rendered() {
    let source = "let a = 1;\nlet a = 2;\n";
    let mut sink = Diagnostics::new();
    sink.push(
        Diagnostic::error(ErrorCode::E2002)
            .with_message("`a` is defined twice in the same scope")
            .with_span(Span::new(15, 1))
            .with_label(Span::new(4, 1), "first defined here")
            .with_note("use a nested `let ... in` to shadow"),
    );

    let output = render(source, &sink);
    assert!(output.contains("--> main.tarn:2:5"));
    assert!(output.contains("--> main.tarn:1:5"));
    assert!(output.contains("^ first defined here"));
    assert!(output.contains("= note: use a nested"));
}

#[test]
fn warnings_only_summary() {
    let source = "match x {};";
    let mut sink = Diagnostics::new();
    sink.push(Diagnostic::warning(ErrorCode::E1008).with_message("empty match"));

    let output = render(source, &sink);
    assert!(output.starts_with("warning [E1008]: empty match"));
    assert!(output.ends_with("warning: 1 warning in main.tarn\n"));
}

#[test]
fn colors_wrap_severity() {
    let mut emitter = TerminalEmitter::new(Vec::new(), "m", "", ColorMode::Always, false);
    emitter
        .emit(&Diagnostic::error(ErrorCode::E9001).with_message("boom"))
        .unwrap_or_else(|e| panic!("write to Vec failed: {e}"));
    let output = String::from_utf8(emitter.into_inner()).unwrap_or_default();
    assert!(output.starts_with("\x1b[1;31merror\x1b[0m"));
}
