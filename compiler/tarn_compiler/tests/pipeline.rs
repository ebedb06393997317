//! End-to-end compilation through the public driver API.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tarn_compiler::{build, compile, CompileConfig, MemorySources, ModuleOutcome, Phase};
use tarn_diagnostic::ErrorCode;

fn compile_clean(source: &str) -> tarn_compiler::CompileOutput {
    let output = compile(source, &CompileConfig::default());
    assert!(
        output.succeeded(),
        "{source}\nunexpected diagnostics: {:?}",
        output.diagnostics
    );
    output
}

#[test]
fn list_functions_compile() {
    let source = "\
type list a = Nil | Cons (a, list a);
let map = fn f xs => match xs { Nil => Nil, Cons (h, t) => Cons (f h, map f t) };
let sum = fn | Nil => 0 | Cons (h, t) => h + sum t;
sum (map (fn x => x * 2) (Cons (1, Cons (2, Nil))));
";
    let output = compile_clean(source);
    let Some(program) = &output.program else {
        panic!("no program");
    };
    assert!(program.function_named("map").is_some());
    assert!(program.function_named("sum").is_some());
    assert!(program.entry_function().is_some());
}

#[test]
fn identity_is_used_at_two_types() {
    compile_clean("let id = fn x => x;\n(id 1, id \"one\");");
}

#[test]
fn records_and_field_access() {
    compile_clean(
        "type point = { x: real, y: real };\nlet norm = fn (p: point) => p.x *. p.x +. p.y *. p.y;\nnorm (point { y = 4.0, x = 3.0 });",
    );
}

#[test]
fn tokens_tile_the_source() {
    let source = "let f = fn x => x + 1; // add one\nf 2;";
    let output = compile_clean(source);
    let mut offset = 0;
    for token in output.tokens.iter() {
        assert!(token.span.start >= offset, "{token:?} overlaps its predecessor");
        offset = token.span.start + token.span.width;
    }
    assert_eq!(offset as usize, source.len());
}

#[test]
fn parse_errors_do_not_hide_later_statements() {
    let output = compile("let a = 1 + ;\nlet b = c;", &CompileConfig::default());
    assert_eq!(output.failed_phase, Some(Phase::Parse));
    let codes: Vec<ErrorCode> = output.diagnostics.iter().filter_map(|d| d.code).collect();
    assert!(codes.contains(&ErrorCode::E2001), "{codes:?}");
}

#[test]
fn modules_build_independently() {
    let sources = MemorySources::new()
        .with("shapes", "type shape = Circle real | Square real;")
        .with("main", "let x = 1 + 2;");
    let output = build(&["shapes", "main"], &sources, &CompileConfig::default());
    assert!(output.succeeded());
    assert!(matches!(
        output.outcome("shapes"),
        Some(ModuleOutcome::Compiled(module)) if module.program.is_some()
    ));
}

fn int_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..1000).prop_map(|n| n.to_string()),
        Just("x".to_owned()),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*")], inner.clone())
                .prop_map(|(a, op, b)| format!("({a} {op} {b})")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("(if {c} < 10 then {t} else {e})")),
            (inner.clone(), inner.clone())
                .prop_map(|(v, body)| format!("(let y = {v} in y + {body})")),
            (inner.clone(), inner)
                .prop_map(|(a, b)| format!("(match ({a}, {b}) {{ (0, n) => n, (m, _) => m }})")),
        ]
    })
}

proptest! {
    #[test]
    fn well_typed_programs_generate(body in int_expr()) {
        let source = format!("let f = fn x => {body};\nf 3;");
        let output = compile(&source, &CompileConfig::default());
        prop_assert!(output.succeeded(), "{}: {:?}", source, output.diagnostics);
        prop_assert!(output.program.is_some());
        prop_assert!(output.fatal.is_none());
    }

    #[test]
    fn arbitrary_input_never_panics(source in "[ -~\n]{0,64}") {
        let output = compile(&source, &CompileConfig::default());
        prop_assert_eq!(output.succeeded(), output.error_count() == 0);
        prop_assert!(output.fatal.is_none());
    }
}
