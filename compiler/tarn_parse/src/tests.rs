use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tarn_ir::ast::{
    ArrayElement, ArrayPatternExpression, Expr, Literal, Parameter, Pat, PatternExpression,
    QualifiedName, TypeDefinition, TypeExpr, TypeExpression, UnaryOp, ValueExpression,
};

fn parse_source(source: &str) -> (ParsedModule, Diagnostics, StringInterner) {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let tokens = tarn_lexer::lex(source, &interner, &mut sink);
    let module = parse(&tokens, &interner, interner.intern("main"), &mut sink);
    (module, sink, interner)
}

fn codes(sink: &Diagnostics) -> Vec<ErrorCode> {
    sink.iter().filter_map(|d| d.code).collect()
}

/// The single expression statement of `source`, rendered.
fn expr(source: &str) -> String {
    let (module, sink, interner) = parse_source(source);
    assert!(sink.is_empty(), "unexpected diagnostics: {:?}", sink.as_slice());
    assert_eq!(module.statements.len(), 1);
    match &module.statements[0].value {
        Statement::Expression(e) => show(e, &interner),
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

fn qualified(name: &QualifiedName, interner: &StringInterner) -> String {
    let mut parts: Vec<&str> = name.modules.iter().map(|m| interner.lookup(m.value)).collect();
    parts.push(interner.lookup(name.name.value));
    parts.join("::")
}

fn show_literal(literal: Literal, interner: &StringInterner) -> String {
    match literal {
        Literal::Int { raw, .. } | Literal::Real(raw) => interner.lookup(raw).to_string(),
        Literal::Str(raw) => format!("\"{}\"", interner.lookup(raw)),
        Literal::Char(raw) => format!("'{}'", interner.lookup(raw)),
        Literal::Bool(b) => b.to_string(),
        Literal::Unit => "()".to_string(),
    }
}

fn show(e: &Expr, interner: &StringInterner) -> String {
    let s = |e: &Expr| show(e, interner);
    match &e.value {
        ValueExpression::Let {
            pattern,
            value,
            body,
        } => format!("(let {} {} {})", show_pat(pattern, interner), s(value), s(body)),
        ValueExpression::Literal(literal) => show_literal(*literal, interner),
        ValueExpression::Identifier(name) => interner.lookup(*name).to_string(),
        ValueExpression::QualifiedPath(name) => qualified(name, interner),
        ValueExpression::Binary { op, lhs, rhs } => {
            format!("({} {} {})", op.value.as_symbol(), s(lhs), s(rhs))
        }
        ValueExpression::Unary { op, operand } => match op.value {
            UnaryOp::Neg => format!("(neg {})", s(operand)),
            UnaryOp::Not => format!("(not {})", s(operand)),
        },
        ValueExpression::OperatorValue(op) => format!("`{}`", op.as_symbol()),
        ValueExpression::UnaryOperatorValue(UnaryOp::Neg) => "`~-`".to_string(),
        ValueExpression::UnaryOperatorValue(UnaryOp::Not) => "`!`".to_string(),
        ValueExpression::Function { params, body } => {
            let params: Vec<String> = params
                .iter()
                .map(|p| match &p.value {
                    Parameter::Named { name, hint: None } => interner.lookup(name.value).to_string(),
                    Parameter::Named {
                        name,
                        hint: Some(hint),
                    } => format!("({}: {})", interner.lookup(name.value), show_ty(hint, interner)),
                    Parameter::Unit => "()".to_string(),
                })
                .collect();
            format!("(fn {} => {})", params.join(" "), s(body))
        }
        ValueExpression::MultiClauseFunction(arms) => {
            let arms: Vec<String> = arms
                .iter()
                .map(|a| format!("| {} => {}", show_pat(&a.pattern, interner), s(&a.body)))
                .collect();
            format!("(fn {})", arms.join(" "))
        }
        ValueExpression::Call { callee, argument } => {
            format!("(call {} {})", s(callee), s(argument))
        }
        ValueExpression::If {
            condition,
            then_branch,
            else_branch,
        } => format!("(if {} {} {})", s(condition), s(then_branch), s(else_branch)),
        ValueExpression::Match { scrutinee, arms } => {
            let arms: Vec<String> = arms
                .iter()
                .map(|a| format!("{} => {}", show_pat(&a.pattern, interner), s(&a.body)))
                .collect();
            format!("(match {} [{}])", s(scrutinee), arms.join(", "))
        }
        ValueExpression::Tuple(items) => {
            let items: Vec<String> = items.iter().map(s).collect();
            format!("(tuple {})", items.join(" "))
        }
        ValueExpression::Array(elements) => {
            let elements: Vec<String> = elements
                .iter()
                .map(|e| match &e.value {
                    ArrayElement::Single(v) => s(v),
                    ArrayElement::Splice(v) => format!("..{}", s(v)),
                })
                .collect();
            format!("[{}]", elements.join(", "))
        }
        ValueExpression::Record { name, fields } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| format!("{} = {}", interner.lookup(f.name.value), s(&f.value)))
                .collect();
            format!("{}{{{}}}", qualified(name, interner), fields.join(", "))
        }
        ValueExpression::FieldAccess { value, field } => {
            format!("{}.{}", s(value), interner.lookup(field.value))
        }
        ValueExpression::Error => "<error>".to_string(),
    }
}

fn show_pat(p: &Pat, interner: &StringInterner) -> String {
    let s = |p: &Pat| show_pat(p, interner);
    let list = |items: &[Pat]| items.iter().map(s).collect::<Vec<_>>();
    let rest = |rest: &Option<tarn_ir::ast::Ident>| match rest {
        Some(name) => format!("..{}", interner.lookup(name.value)),
        None => "..".to_string(),
    };
    match &p.value {
        PatternExpression::Wildcard => "_".to_string(),
        PatternExpression::Literal { literal, negated } => {
            let text = show_literal(*literal, interner);
            if *negated {
                format!("-{text}")
            } else {
                text
            }
        }
        PatternExpression::Identifier(name) => interner.lookup(*name).to_string(),
        PatternExpression::QualifiedPath(name) => qualified(name, interner),
        PatternExpression::Tuple(items) => format!("({})", list(items).join(", ")),
        PatternExpression::Array(shape) => {
            let parts = match shape {
                ArrayPatternExpression::Exact(items) => list(items),
                ArrayPatternExpression::LeadingWithRest { leading, rest: r } => {
                    let mut parts = list(leading);
                    parts.push(rest(r));
                    parts
                }
                ArrayPatternExpression::TrailingWithRest { rest: r, trailing } => {
                    let mut parts = vec![rest(r)];
                    parts.extend(list(trailing));
                    parts
                }
                ArrayPatternExpression::Surrounding {
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
        PatternExpression::Constructor {
            name,
            payload: None,
        } => qualified(name, interner),
        PatternExpression::Constructor {
            name,
            payload: Some(payload),
        } => format!("({} {})", qualified(name, interner), s(payload)),
        PatternExpression::TypeHinted { pattern, ty } => {
            format!("({}: {})", s(pattern), show_ty(ty, interner))
        }
    }
}

fn show_ty(t: &TypeExpr, interner: &StringInterner) -> String {
    let s = |t: &TypeExpr| show_ty(t, interner);
    match &t.value {
        TypeExpression::Function { domain, codomain } => {
            format!("(-> {} {})", s(domain), s(codomain))
        }
        TypeExpression::Application { head, args } => {
            let args: Vec<String> = args.iter().map(s).collect();
            format!("({} {})", s(head), args.join(" "))
        }
        TypeExpression::Identifier(name) => interner.lookup(*name).to_string(),
        TypeExpression::Product(items) => {
            let items: Vec<String> = items.iter().map(s).collect();
            format!("({})", items.join(", "))
        }
        TypeExpression::QualifiedPath(name) => qualified(name, interner),
        TypeExpression::Array(element) => format!("[{}]", s(element)),
        TypeExpression::Unit => "()".to_string(),
        TypeExpression::Error => "<error>".to_string(),
    }
}

// Expressions

#[test]
fn arithmetic_precedence() {
    assert_eq!(expr("1 + 2 * 3 - 4;"), "(- (+ 1 (* 2 3)) 4)");
    assert_eq!(expr("a || b && c == d;"), "(|| a (&& b (== c d)))");
    assert_eq!(expr("x ++ y + 1;"), "(++ x (+ y 1))");
    assert_eq!(expr("1.5 *. x +. 2.0;"), "(+. (*. 1.5 x) 2.0)");
}

#[test]
fn application_is_left_associative_and_binds_tightest() {
    assert_eq!(expr("f x y.z;"), "(call (call f x) y.z)");
    assert_eq!(expr("f x + g y;"), "(+ (call f x) (call g y))");
}

#[test]
fn unary_operators() {
    assert_eq!(expr("-f x;"), "(neg (call f x))");
    assert_eq!(expr("!a && b;"), "(&& (not a) b)");
    assert_eq!(expr("- -1;"), "(neg (neg 1))");
}

#[test]
fn operators_as_values() {
    assert_eq!(
        expr("(+) (-) (~-) (!);"),
        "(call (call (call `+` `-`) `~-`) `!`)"
    );
    assert_eq!(expr("fold (++) xs;"), "(call (call fold `++`) xs)");
}

#[test]
fn unit_tuples_and_grouping() {
    assert_eq!(expr("f () (1, x,);"), "(call (call f ()) (tuple 1 x))");
    assert_eq!(expr("(1 + 2) * 3;"), "(* (+ 1 2) 3)");
}

#[test]
fn literals() {
    assert_eq!(
        expr(r#"f 0xFF 1_000 "a\n" 'c' true false;"#),
        r#"(call (call (call (call (call (call f 0xFF) 1_000) "a\n") 'c') true) false)"#
    );
}

#[test]
fn chained_comparison_is_reported() {
    let (module, sink, interner) = parse_source("a < b < c;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1009]);
    let Statement::Expression(e) = &module.statements[0].value else {
        panic!("expected expression");
    };
    assert_eq!(show(e, &interner), "(< (< a b) c)");
}

#[test]
fn comparisons_separated_by_logic_are_fine() {
    assert_eq!(expr("a < b && c >= d;"), "(&& (< a b) (>= c d))");
}

#[test]
fn let_in_expression_statement() {
    assert_eq!(expr("let x = 1 in x + 1;"), "(let x 1 (+ x 1))");
    assert_eq!(
        expr("f (let (a, b) = p in a);"),
        "(call f (let (a, b) p a))"
    );
}

#[test]
fn functions() {
    assert_eq!(expr("fn a (b: int) () => a;"), "(fn a (b: int) () => a)");
    assert_eq!(expr("fn x => fn y => x + y;"), "(fn x => (fn y => (+ x y)))");
    assert_eq!(
        expr("fn | Nil => 0 | Cons (h, t) => 1;"),
        "(fn | Nil => 0 | (Cons (h, t)) => 1)"
    );
    assert_eq!(
        expr("fn (f: int -> list int) => f;"),
        "(fn (f: (-> int (list int))) => f)"
    );
}

#[test]
fn if_extends_to_the_right() {
    assert_eq!(expr("if a then b else c + 1;"), "(if a b (+ c 1))");
    assert_eq!(expr("1 + if a then 2 else 3;"), "(+ 1 (if a 2 3))");
}

#[test]
fn match_scrutinee_is_not_a_record_literal() {
    assert_eq!(
        expr("match f x { Some y => y, _ => point { x = 1 }, };"),
        "(match (call f x) [(Some y) => y, _ => point{x = 1}])"
    );
    assert_eq!(
        expr("match (point { x = 1 }) { _ => 0 };"),
        "(match point{x = 1} [_ => 0])"
    );
}

#[test]
fn record_literals_and_field_access() {
    assert_eq!(
        expr("geo::point { x = 1, y = 2 }.x;"),
        "geo::point{x = 1, y = 2}.x"
    );
}

#[test]
fn arrays_with_splices() {
    assert_eq!(expr("[1, ..xs, 2];"), "[1, ..xs, 2]");
    assert_eq!(expr("[];"), "[]");
}

#[test]
fn qualified_paths() {
    assert_eq!(expr("m::n::x + m::Y;"), "(+ m::n::x m::Y)");
}

// Patterns

#[test]
fn pattern_forms() {
    let source = "match v { [] => 0, [a] => 1, [a, ..] => 2, [..r, z] => 3, \
                  [a, ..r, z] => 4, [..r] => 5, -1 => 6, (x: int) => 7, \
                  m::None => 8, Some (Some _) => 9, (a, 'c') => 10, () => 11 };";
    assert_eq!(
        expr(source),
        "(match v [[] => 0, [a] => 1, [a, ..] => 2, [..r, z] => 3, \
         [a, ..r, z] => 4, [..r] => 5, -1 => 6, (x: int) => 7, \
         m::None => 8, (Some (Some _)) => 9, (a, 'c') => 10, () => 11])"
    );
}

#[test]
fn let_statement_with_pattern() {
    let (module, sink, interner) = parse_source("let (a, [b, ..]) = pair;");
    assert!(sink.is_empty());
    let Statement::Let { pattern, value } = &module.statements[0].value else {
        panic!("expected let");
    };
    assert_eq!(show_pat(pattern, &interner), "(a, [b, ..])");
    assert_eq!(show(value, &interner), "pair");
}

#[test]
fn second_rest_is_an_invalid_pattern() {
    let (module, sink, interner) = parse_source("match v { [..a, ..b] => 0 };");
    assert_eq!(codes(&sink), vec![ErrorCode::E1006]);
    let Statement::Expression(e) = &module.statements[0].value else {
        panic!("expected expression");
    };
    assert_eq!(show(e, &interner), "(match v [_ => 0])");
}

#[test]
fn minus_must_precede_a_number_in_patterns() {
    let (_, sink, _) = parse_source("match v { -x => 0 };");
    assert_eq!(codes(&sink), vec![ErrorCode::E1006]);
}

// Statements

#[test]
fn type_definitions() {
    let source = "type point = { x: int, y: real };\n\
                  type list a = Nil | Cons (a, list a);\n\
                  type pair a = (a, a);\n\
                  type bit = | Zero | One;\n\
                  type g = list (list int) -> [int] -> m::t -> ();";
    let (module, sink, interner) = parse_source(source);
    assert!(sink.is_empty(), "{:?}", sink.as_slice());

    let rendered: Vec<String> = module
        .statements
        .iter()
        .map(|statement| {
            let Statement::TypeDefinition(def) = &statement.value else {
                panic!("expected type definition");
            };
            let params: Vec<&str> = def.params.iter().map(|p| interner.lookup(p.value)).collect();
            let body = match &def.definition.value {
                TypeDefinition::Record(fields) => {
                    let fields: Vec<String> = fields
                        .iter()
                        .map(|f| format!("{}: {}", interner.lookup(f.name.value), show_ty(&f.ty, &interner)))
                        .collect();
                    format!("{{{}}}", fields.join(", "))
                }
                TypeDefinition::Sum(variants) => {
                    let variants: Vec<String> = variants
                        .iter()
                        .map(|v| match &v.payload {
                            Some(payload) => format!("{} {}", interner.lookup(v.name.value), show_ty(payload, &interner)),
                            None => interner.lookup(v.name.value).to_string(),
                        })
                        .collect();
                    variants.join(" | ")
                }
                TypeDefinition::Alias(ty) => show_ty(ty, &interner),
            };
            format!("{} [{}] = {}", interner.lookup(def.name.value), params.join(" "), body)
        })
        .collect();

    assert_eq!(
        rendered,
        vec![
            "point [] = {x: int, y: real}",
            "list [a] = Nil | Cons (a, (list a))",
            "pair [a] = (a, a)",
            "bit [] = Zero | One",
            "g [] = (-> (list (list int)) (-> [int] (-> m::t ())))",
        ]
    );
}

#[test]
fn lowercase_variant_is_reported() {
    let (module, sink, _) = parse_source("type t = | a | B;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1004]);
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn nested_modules() {
    let (module, sink, _) = parse_source("mod m { let x = 1; mod n { type t = int; } } let y = m::x;");
    assert!(sink.is_empty(), "{:?}", sink.as_slice());
    assert_eq!(module.statements.len(), 2);
    let Statement::Module { statements, .. } = &module.statements[0].value else {
        panic!("expected module");
    };
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[1].value, Statement::Module { .. }));
}

#[test]
fn unclosed_module_is_reported() {
    let (module, sink, _) = parse_source("mod m { let x = 1;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1003]);
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn statement_spans_cover_the_statement() {
    let (module, _, _) = parse_source("let a = 1;  f a;");
    assert_eq!(module.statements[0].span, Span::new(0, 9));
    assert_eq!(module.statements[1].span, Span::new(12, 3));
}

// Recovery

#[test]
fn missing_semicolon_is_reported_and_parsing_continues() {
    let (module, sink, _) = parse_source("let a = 1\nlet b = 2;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1007]);
    assert_eq!(module.statements.len(), 2);
    assert_eq!(sink.as_slice()[0].span, Some(Span::point(9)));
}

#[test]
fn error_tokens_become_error_expressions() {
    let (module, sink, _) = parse_source("let x = 1m;");
    assert_eq!(codes(&sink), vec![ErrorCode::E0003]);
    let Statement::Let { value, .. } = &module.statements[0].value else {
        panic!("expected let");
    };
    assert_eq!(value.value, ValueExpression::Error);
}

#[test]
fn empty_match_is_a_warning() {
    let (module, sink, _) = parse_source("match x {};");
    assert_eq!(codes(&sink), vec![ErrorCode::E1008]);
    assert!(!sink.has_errors());
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn unclosed_paren_abandons_statement() {
    let (module, sink, interner) = parse_source("let a = (1 + 2;\nlet b = 3;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1003]);
    assert_eq!(sink.as_slice()[0].span, Some(Span::new(14, 1)));
    assert_eq!(module.statements.len(), 1);
    let Statement::Let { pattern, .. } = &module.statements[0].value else {
        panic!("expected let");
    };
    assert_eq!(show_pat(pattern, &interner), "b");
}

#[test]
fn unclosed_paren_at_end_points_past_input() {
    let (_, sink, _) = parse_source("f (1");
    assert_eq!(codes(&sink), vec![ErrorCode::E1003]);
    assert_eq!(sink.as_slice()[0].span, Some(Span::new(4, 1)));
}

#[test]
fn bracket_error_yields_error_node_and_statement_continues() {
    let (module, sink, interner) = parse_source("let a = (1 + ) + 2;\nlet b = 3;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1002]);
    assert_eq!(module.statements.len(), 2);
    let Statement::Let { value, .. } = &module.statements[0].value else {
        panic!("expected let");
    };
    assert_eq!(show(value, &interner), "(+ <error> 2)");
}

#[test]
fn recovery_lands_after_matching_close() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let tokens = tarn_lexer::lex("(1 + + [2, (3)] x) ; let b = 1;", &interner, &mut sink);
    let tokens: Vec<Token> = tokens.significant().iter().copied().collect();
    let mut parser = Parser::new(&tokens, &interner, &mut sink);

    let value = parser.parse_expr();
    assert!(matches!(value, Ok(Tagged { value: ValueExpression::Error, .. })));
    assert_eq!(parser.cursor.current_kind(), TokenKind::Semicolon);
    assert_eq!(codes(&sink), vec![ErrorCode::E1002]);
}

#[test]
fn malformed_statement_never_aborts_module() {
    let (module, sink, _) = parse_source("let x = let y = 1; let z = 2;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1001]);
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn stray_close_brace() {
    let (module, sink, _) = parse_source("}; let a = 1;");
    assert_eq!(codes(&sink), vec![ErrorCode::E1001]);
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn deep_nesting_does_not_overflow() {
    let depth = 5_000;
    let source = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
    let (module, sink, _) = parse_source(&source);
    assert!(sink.is_empty());
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn comments_are_ignored() {
    let (module, sink, _) = parse_source("/// doc\nlet a = /* inline */ 1; // trailing");
    assert!(sink.is_empty());
    assert_eq!(module.statements.len(), 1);
}

#[test]
fn empty_token_list_gets_eof() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let module = parse(&TokenList::new(), &interner, interner.intern("m"), &mut sink);
    assert!(module.statements.is_empty());
    assert!(sink.is_empty());
}

fn balanced() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("x"),
        Just("1"),
        Just("+"),
        Just(","),
        Just("=>"),
        Just("::"),
        Just("fn"),
    ]
    .prop_map(String::from);
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| format!("( {} )", v.join(" "))),
            prop::collection::vec(inner, 0..4).prop_map(|v| format!("[ {} ]", v.join(" "))),
        ]
    })
}

proptest! {
    #[test]
    fn bracketed_failure_resynchronizes_after_matching_close(
        garbage in prop::collection::vec(balanced(), 0..6)
    ) {
        let source = format!("let a = (1 + + {});\nlet b = 2;", garbage.join(" "));
        let (module, sink, interner) = parse_source(&source);

        prop_assert_eq!(codes(&sink), vec![ErrorCode::E1002]);
        prop_assert_eq!(module.statements.len(), 2);
        let Statement::Let { pattern, value } = &module.statements[1].value else {
            panic!("expected let");
        };
        prop_assert_eq!(show_pat(pattern, &interner), "b");
        prop_assert_eq!(show(value, &interner), "2");
    }
}
