use super::*;
use pretty_assertions::assert_eq;
use tarn_diagnostic::ErrorCode;
use tarn_ir::ir::{ArrayPattern, ConstValue, IrKind, IrNode, Pattern, PatternKind};
use tarn_ir::{Span, Type};

struct Lowered {
    ir: IrModule,
    universe: Universe,
    sink: Diagnostics,
    interner: StringInterner,
}

impl Lowered {
    fn codes(&self) -> Vec<ErrorCode> {
        self.sink.iter().filter_map(|d| d.code).collect()
    }

    fn name(&self, path: Path) -> &'static str {
        self.interner.lookup(path.name)
    }

    /// Every item rendered, one string per item.
    fn items(&self) -> Vec<String> {
        self.ir
            .items
            .iter()
            .map(|item| match item {
                IrItem::Let { pattern, value } => {
                    format!("let {} = {}", self.pat(pattern), self.show(value))
                }
                IrItem::Expression(node) => self.show(node),
            })
            .collect()
    }

    fn last(&self) -> String {
        self.items().pop().unwrap_or_default()
    }

    fn show(&self, node: &IrNode) -> String {
        match &node.value.value {
            IrKind::Let {
                pattern,
                value,
                body,
            } => format!(
                "(let {} = {} in {})",
                self.pat(pattern),
                self.show(value),
                self.show(body)
            ),
            IrKind::Const(value) => show_const(value),
            IrKind::Identifier(path) => self.name(*path).to_owned(),
            IrKind::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|i| self.show(i)).collect();
                format!("({})", items.join(", "))
            }
            IrKind::Record { path, fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| {
                        format!("{} = {}", self.interner.lookup(name.value), self.show(value))
                    })
                    .collect();
                format!("{}{{{}}}", self.name(*path), fields.join(", "))
            }
            IrKind::Project { value, field } => {
                format!("{}.{}", self.show(value), self.interner.lookup(field.value))
            }
            IrKind::Function(function) => {
                let param = match &function.param {
                    Some(param) => match &param.hint {
                        Some(hint) => format!(
                            "({}: {})",
                            self.name(param.path),
                            hint.display(&self.interner)
                        ),
                        None => self.name(param.path).to_owned(),
                    },
                    None => "()".to_owned(),
                };
                let captures = if function.captures.is_empty() {
                    String::new()
                } else {
                    let names: Vec<&str> =
                        function.captures.iter().map(|c| self.name(c.value)).collect();
                    format!(" [{}]", names.join(" "))
                };
                format!("(fn {param}{captures} => {})", self.show(&function.body))
            }
            IrKind::Call {
                callee, argument, ..
            } => format!("({} {})", self.show(callee), self.show(argument)),
            IrKind::If {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(if {} {} {})",
                self.show(condition),
                self.show(then_branch),
                self.show(else_branch)
            ),
            IrKind::Match {
                scrutinee,
                patterns,
                branches,
            } => {
                let arms: Vec<String> = patterns
                    .iter()
                    .zip(branches)
                    .map(|(p, b)| format!("{} => {}", self.pat(p), self.show(b)))
                    .collect();
                format!("(match {} [{}])", self.show(scrutinee), arms.join(", "))
            }
            IrKind::Error => "<error>".to_owned(),
        }
    }

    fn pat(&self, pattern: &Pattern) -> String {
        let list = |items: &[Pattern]| -> Vec<String> { items.iter().map(|p| self.pat(p)).collect() };
        let rest = |rest: &Option<Path>| match rest {
            Some(path) => format!("..{}", self.name(*path)),
            None => "..".to_owned(),
        };
        match &pattern.value.value {
            PatternKind::Wildcard => "_".to_owned(),
            PatternKind::Const(value) => show_const(value),
            PatternKind::Binding(path) => self.name(*path).to_owned(),
            PatternKind::Tuple(items) => format!("({})", list(items).join(", ")),
            PatternKind::Array(array) => {
                let parts = match array {
                    ArrayPattern::Exact(items) => list(items),
                    ArrayPattern::LeadingWithRest { leading, rest: r } => {
                        let mut parts = list(leading);
                        parts.push(rest(r));
                        parts
                    }
                    ArrayPattern::TrailingWithRest { rest: r, trailing } => {
                        let mut parts = vec![rest(r)];
                        parts.extend(list(trailing));
                        parts
                    }
                    ArrayPattern::Surrounding {
                        leading,
                        rest: r,
                        trailing,
                    } => {
                        let mut parts = list(leading);
                        parts.push(rest(r));
                        parts.extend(list(trailing));
                        parts
                    }
                };
                format!("[{}]", parts.join(", "))
            }
            PatternKind::Constructor { path, payload } => match payload {
                Some(payload) => format!("({} {})", self.name(*path), self.pat(payload)),
                None => self.name(*path).to_owned(),
            },
            PatternKind::Hinted { pattern, hint } => {
                format!("({}: {})", self.pat(pattern), hint.display(&self.interner))
            }
            PatternKind::Error => "<error>".to_owned(),
        }
    }

    /// The type definition named `name`.
    fn definition(&self, name: &str) -> Option<&tarn_ir::AbstractType> {
        let name = self.interner.intern(name);
        self.universe
            .definitions()
            .find(|(path, _)| path.name == name)
            .map(|(_, definition)| definition)
    }
}

fn show_const(value: &ConstValue) -> String {
    match value {
        ConstValue::Unit => "()".to_owned(),
        ConstValue::Int(n) => n.to_string(),
        ConstValue::Real(r) => format!("{r:?}"),
        ConstValue::Bool(b) => b.to_string(),
        ConstValue::Text(t) => format!("{t:?}"),
        ConstValue::Char(c) => format!("{c:?}"),
        ConstValue::EmptyArray => "[]".to_owned(),
    }
}

fn lower_source(source: &str) -> Lowered {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut universe = Universe::new();
    let name = interner.intern("main");
    let tokens = tarn_lexer::lex(source, &interner, &mut sink);
    let parsed = tarn_parse::parse(&tokens, &interner, name, &mut sink);
    let ir = {
        let mut resolver = Resolver::new(&interner, name);
        lower_module(&parsed, &mut resolver, &mut universe, &mut sink)
    };
    Lowered {
        ir,
        universe,
        sink,
        interner,
    }
}

fn clean(source: &str) -> Lowered {
    let lowered = lower_source(source);
    assert!(
        lowered.sink.is_empty(),
        "unexpected diagnostics: {:?}",
        lowered.sink.as_slice()
    );
    lowered
}

// Operators and literals

#[test]
fn binary_operators_become_curried_prelude_calls() {
    let lowered = clean("1 + 2 * 3;");
    assert_eq!(lowered.last(), "((add 1) ((mul 2) 3))");
}

#[test]
fn comparison_and_logic_operators() {
    let lowered = clean("1 < 2 && !true;");
    assert_eq!(lowered.last(), "((and ((lt 1) 2)) (not true))");
}

#[test]
fn operator_values_are_identifiers() {
    let lowered = clean("(+);\n(++);\n(!);");
    assert_eq!(lowered.items(), vec!["add", "concat", "not"]);
}

#[test]
fn operator_call_spans_cover_their_operands() {
    let lowered = clean("1 + 22;");
    let IrItem::Expression(node) = &lowered.ir.items[0] else {
        panic!("expected an expression");
    };
    assert_eq!(node.span, Span::new(0, 6));
    let IrKind::Call { callee, .. } = &node.value.value else {
        panic!("expected a call");
    };
    // `1 +`
    assert_eq!(callee.span, Span::new(0, 3));
}

#[test]
fn array_literals_fold_push_and_append() {
    let lowered = clean("let xs = [];\n[1, ..xs, 2];");
    assert_eq!(
        lowered.items(),
        vec![
            "let xs = []".to_owned(),
            "((push ((append ((push []) 1)) xs)) 2)".to_owned(),
        ]
    );
}

#[test]
fn literals_are_cooked() {
    let lowered = clean(r#"0xff; 1_000; 2.5; "a\tb"; 'c'; (); false;"#);
    assert_eq!(
        lowered.items(),
        vec!["255", "1000", "2.5", "\"a\\tb\"", "'c'", "()", "false"]
    );
}

#[test]
fn overflowing_literal_is_an_error_node() {
    let lowered = lower_source("let x = 99999999999999999999;\nlet y = x;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E3006]);
    assert_eq!(
        lowered.items(),
        vec!["let x = <error>".to_owned(), "let y = x".to_owned()]
    );
}

#[test]
fn bad_escape_points_into_the_literal() {
    let lowered = lower_source(r#"let s = "ab\qc";"#);
    assert_eq!(lowered.codes(), vec![ErrorCode::E3007]);
    // `let s = "` is 9 bytes; the escape starts two characters later.
    assert_eq!(lowered.sink.as_slice()[0].span, Some(Span::new(11, 2)));
}

#[test]
fn negative_literal_patterns_are_negated() {
    let lowered = clean("match 1 { -1 => 0, -9223372036854775808 => 1, _ => 2 };");
    assert_eq!(
        lowered.last(),
        "(match 1 [-1 => 0, -9223372036854775808 => 1, _ => 2])"
    );
}

#[test]
fn negated_numeric_literals_fold_to_constants() {
    let lowered = clean("let m = -9223372036854775808;\n-2.5;\n- 0x10;");
    assert_eq!(
        lowered.items(),
        vec!["let m = -9223372036854775808", "-2.5", "-16"]
    );
}

#[test]
fn negated_literal_overflow_spans_the_sign() {
    let lowered = lower_source("let m = -9223372036854775809;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E3006]);
    assert_eq!(lowered.sink.as_slice()[0].span, Some(Span::new(8, 20)));
    assert_eq!(lowered.last(), "let m = <error>");
}

#[test]
fn negating_a_name_is_still_a_call() {
    let lowered = clean("let x = 1;\n-x;");
    assert!(lowered.last().starts_with('('), "{}", lowered.last());
}

// Functions

#[test]
fn multi_parameter_functions_curry() {
    let lowered = clean("let f = fn a (b: int) () => a;");
    assert_eq!(
        lowered.last(),
        "let f = (fn a => (fn (b: int) [a] => (fn () [a] => a)))"
    );
}

#[test]
fn multi_clause_function_matches_a_hidden_argument() {
    let lowered = clean("type t = A | B int;\nlet f = fn | A => 0 | B n => n;");
    assert_eq!(
        lowered.last(),
        "let f = (fn $arg => (match $arg [A => 0, (B n) => n]))"
    );
}

#[test]
fn captures_are_collected_in_first_use_order() {
    let lowered = clean(
        "let g = 1;\n\
         let f = fn a => fn b => fn c => b + a + b + g;",
    );
    // `g` is a global; `a` and `b` are captured by every body between
    // their definition and the use.
    assert_eq!(
        lowered.last(),
        "let f = (fn a => (fn b [a] => (fn c [b a] => ((add ((add ((add b) a)) b)) g))))"
    );
}

#[test]
fn let_in_locals_of_an_outer_function_are_captured() {
    let lowered = clean("let f = fn x => let y = x in fn z => y;");
    assert_eq!(
        lowered.last(),
        "let f = (fn x => (let y = x in (fn z [y] => y)))"
    );
}

// Scoping

#[test]
fn recursive_function_binding_is_allowed() {
    let lowered = clean("let f = fn x => f x;");
    assert_eq!(lowered.last(), "let f = (fn x => (f x))");
}

#[test]
fn direct_self_reference_is_rejected() {
    let lowered = lower_source("let x = x + 1;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2003]);
}

#[test]
fn undefined_names_become_error_nodes() {
    let lowered = lower_source("let y = nope + 1;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2001]);
    assert_eq!(lowered.last(), "let y = ((add <error>) 1)");
}

#[test]
fn shadowing_at_module_scope_collides() {
    let lowered = lower_source("let x = 1;\nlet x = 2;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2002]);
}

#[test]
fn duplicate_bindings_in_one_pattern_collide() {
    let lowered = lower_source("let (a, a) = (1, 2);");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2002]);
}

#[test]
fn match_arms_have_their_own_scope() {
    let lowered = clean("let v = 1;\nmatch v { x => x, y => y };");
    assert_eq!(lowered.last(), "(match v [x => x, y => y])");
}

#[test]
fn prelude_names_can_be_shadowed() {
    let lowered = clean("let add = 1;\nadd;\n1 + 2;");
    let IrItem::Expression(use_site) = &lowered.ir.items[1] else {
        panic!("expected an expression");
    };
    let IrKind::Identifier(local) = &use_site.value.value else {
        panic!("expected an identifier");
    };
    assert_eq!(lowered.interner.lookup(local.module), "main");
    // The operator still refers to the prelude function.
    assert_eq!(lowered.last(), "((add 1) 2)");
}

#[test]
fn nested_modules_are_flattened_and_qualified() {
    let lowered = clean("mod m { let x = 1; mod n { let y = x; } }\nlet z = m::n::y;");
    assert_eq!(
        lowered.items(),
        vec!["let x = 1", "let y = x", "let z = y"]
    );
    let IrItem::Let { value, .. } = &lowered.ir.items[2] else {
        panic!("expected a let");
    };
    let IrKind::Identifier(path) = &value.value.value else {
        panic!("expected an identifier");
    };
    assert_eq!(lowered.interner.lookup(path.module), "main::m::n");
}

#[test]
fn unknown_module_is_reported() {
    let lowered = lower_source("let z = q::y;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2004]);
    assert_eq!(lowered.last(), "let z = <error>");
}

// Types

#[test]
fn type_definitions_fill_the_universe() {
    let lowered = clean(
        "type point = { x: int, y: real };\n\
         type list a = Nil | Cons (a, list a);\n\
         let p = point { x = 1, y = 2.0 };",
    );
    let Some(point) = lowered.definition("point") else {
        panic!("point is not defined");
    };
    assert_eq!(point.arity, 0);
    let Type::Record { fields, .. } = &point.base else {
        panic!("expected a record, got {:?}", point.base);
    };
    let names: Vec<&str> = fields.iter().map(|(n, _)| lowered.interner.lookup(*n)).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(fields[1].1, Type::Real);
    assert_eq!(lowered.last(), "let p = point{x = 1, y = 2.0}");
}

#[test]
fn sum_constructors_are_values_and_patterns() {
    let lowered = clean(
        "type list a = Nil | Cons (a, list a);\n\
         let l = Cons (1, Nil);\n\
         match l { Cons (h, _) => h, Nil => 0 };",
    );
    assert_eq!(
        lowered.items(),
        vec![
            "let l = (Cons (1, Nil))",
            "(match l [(Cons (h, _)) => h, Nil => 0])",
        ]
    );

    let IrItem::Let { value, .. } = &lowered.ir.items[0] else {
        panic!("expected a let");
    };
    let IrKind::Call { callee, .. } = &value.value.value else {
        panic!("expected a call");
    };
    let IrKind::Identifier(cons) = &callee.value.value else {
        panic!("expected the constructor");
    };
    let Some(info) = lowered.universe.constructor(*cons) else {
        panic!("Cons is not registered");
    };
    assert_eq!(info.tag, 1);
    let Some(Type::Product(payload)) = &info.payload else {
        panic!("expected a product payload");
    };
    assert_eq!(payload[0], Type::var(0));
    assert!(matches!(
        &payload[1],
        Type::Instantiation { path, args } if *path == info.owner && args == &vec![Type::var(0)]
    ));
}

#[test]
fn types_can_be_used_before_their_definition() {
    let lowered = clean(
        "type tree = Leaf | Node forest;\n\
         type forest = [tree];",
    );
    assert!(lowered.ir.items.is_empty());
    assert_eq!(lowered.universe.len(), 2);
}

#[test]
fn qualified_constructor_patterns() {
    let lowered = clean(
        "mod opt { type t a = None | Some a; }\n\
         match opt::Some 1 { opt::None => 0, opt::Some x => x };",
    );
    assert_eq!(
        lowered.last(),
        "(match (Some 1) [None => 0, (Some x) => x])"
    );
}

#[test]
fn non_constructor_in_constructor_position_is_rejected() {
    let lowered = lower_source("mod m { let x = 1; }\nmatch 1 { m::x => 0 };");
    assert_eq!(lowered.codes(), vec![ErrorCode::E1006]);
}

#[test]
fn type_argument_count_is_checked() {
    let lowered = lower_source(
        "type box a = { item: a };\n\
         type bad = box int int;\n\
         type worse = int bool;",
    );
    assert_eq!(lowered.codes(), vec![ErrorCode::E3003, ErrorCode::E3003]);
}

#[test]
fn alias_cycles_are_rejected_and_poisoned() {
    let lowered = lower_source(
        "type a = b;\n\
         type b = a;\n\
         type c = int;",
    );
    assert_eq!(lowered.codes(), vec![ErrorCode::E3005, ErrorCode::E3005]);
    assert_eq!(lowered.universe.check_alias_cycles(), Vec::<Path>::new());
}

#[test]
fn unknown_type_names_are_reported_once() {
    let lowered = lower_source("let f = fn (x: nope) => x;");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2001]);
    assert_eq!(lowered.last(), "let f = (fn (x: ?) => x)");
}

#[test]
fn duplicate_record_fields_in_a_definition() {
    let lowered = lower_source("type p = { x: int, x: int };");
    assert_eq!(lowered.codes(), vec![ErrorCode::E3008]);
}

#[test]
fn record_literal_with_unknown_type_is_an_error_node() {
    let lowered = lower_source("let p = nope { x = 1 };");
    assert_eq!(lowered.codes(), vec![ErrorCode::E2001]);
    assert_eq!(lowered.last(), "let p = <error>");
}

#[test]
fn array_patterns_bind_their_rest() {
    let lowered = clean("match [] { [] => 0, [a, ..r] => a, [..r, z] => z, [a, .., z] => a };");
    assert_eq!(
        lowered.last(),
        "(match [] [[] => 0, [a, ..r] => a, [..r, z] => z, [a, .., z] => a])"
    );
}

#[test]
fn hinted_patterns_keep_their_type() {
    let lowered = clean("let (x: int) = 1;");
    assert_eq!(lowered.last(), "let (x: int) = 1");
}

#[test]
fn error_expressions_lower_to_error_nodes() {
    let lowered = lower_source("let x = ;\nlet y = 2;");
    assert!(lowered.codes().contains(&ErrorCode::E1002));
    assert_eq!(lowered.last(), "let y = 2");
}

#[test]
fn intrinsics_are_registered() {
    let lowered = clean("1 + 1;");
    let IrItem::Expression(node) = &lowered.ir.items[0] else {
        panic!("expected an expression");
    };
    let IrKind::Call { callee, .. } = &node.value.value else {
        panic!("expected a call");
    };
    let IrKind::Call { callee: add, .. } = &callee.value.value else {
        panic!("expected the partial application");
    };
    let IrKind::Identifier(add) = &add.value.value else {
        panic!("expected the operator");
    };
    assert_eq!(
        lowered.universe.intrinsic(*add),
        Some(tarn_ir::Intrinsic::AddInt)
    );
}
