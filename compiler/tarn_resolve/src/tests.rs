use super::*;
use pretty_assertions::assert_eq;
use tarn_ir::{Tagged, Type};

fn ident(interner: &StringInterner, name: &str, at: u32) -> Ident {
    Tagged::new(Span::new(at, u32::try_from(name.len()).unwrap_or(0)), interner.intern(name))
}

fn codes(sink: &Diagnostics) -> Vec<ErrorCode> {
    sink.iter().filter_map(|d| d.code).collect()
}

fn qualified(interner: &StringInterner, text: &str) -> QualifiedName {
    let mut parts: Vec<Ident> = text.split("::").map(|p| ident(interner, p, 0)).collect();
    let name = parts.pop().unwrap_or_else(|| ident(interner, "", 0));
    QualifiedName {
        modules: parts,
        name,
    }
}

#[test]
fn exiting_nested_scopes_restores_outer_binding() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let x = ident(&interner, "x", 0);

    let a = resolver.define(NameKind::Value, x, &mut sink);
    resolver.with_scope(|r| {
        let b = r.define(NameKind::Value, x, &mut sink);
        assert_eq!(r.lookup(NameKind::Value, x.value), Ok(b));
        r.with_scope(|r| {
            let c = r.define(NameKind::Value, x, &mut sink);
            assert_eq!(r.lookup(NameKind::Value, x.value), Ok(c));
        });
        assert_eq!(r.lookup(NameKind::Value, x.value), Ok(b));
    });

    assert_eq!(resolver.lookup(NameKind::Value, x.value), Ok(a));
    assert!(sink.is_empty());
}

#[test]
fn same_scope_redefinition_collides() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    resolver.define(NameKind::Value, ident(&interner, "x", 4), &mut sink);
    let second = resolver.define(NameKind::Value, ident(&interner, "x", 20), &mut sink);

    assert_eq!(codes(&sink), vec![ErrorCode::E2002]);
    let diagnostic = &sink.as_slice()[0];
    assert_eq!(diagnostic.span, Some(Span::new(20, 1)));
    assert_eq!(diagnostic.labels[0].span, Span::new(4, 1));
    // The later binding wins so resolution can continue.
    assert_eq!(resolver.lookup(NameKind::Value, interner.intern("x")), Ok(second));
}

#[test]
fn nested_scope_redefinition_is_shadowing() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let x = ident(&interner, "x", 0);

    resolver.define(NameKind::Value, x, &mut sink);
    resolver.with_scope(|r| r.define(NameKind::Value, x, &mut sink));
    resolver.with_function_scope(|r| r.define(NameKind::Value, x, &mut sink));
    assert!(sink.is_empty());
}

#[test]
fn namespaces_are_separate() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let point = ident(&interner, "point", 0);

    let ty = resolver.define(NameKind::Type, point, &mut sink);
    let value = resolver.define(NameKind::Value, point, &mut sink);
    assert!(sink.is_empty());
    assert_ne!(ty, value);
    assert_eq!(resolver.lookup(NameKind::Type, point.value), Ok(ty));
}

#[test]
fn undefined_name_is_reported_and_poisoned() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    let path = resolver.resolve(NameKind::Value, ident(&interner, "nope", 3), &mut sink);
    assert!(path.is_poisoned());
    assert_eq!(codes(&sink), vec![ErrorCode::E2001]);
    assert_eq!(sink.as_slice()[0].message, "cannot find value `nope` in this scope");
}

#[test]
fn paths_are_unique_even_after_exit() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let x = ident(&interner, "x", 0);

    let first = resolver.with_scope(|r| r.define(NameKind::Value, x, &mut sink));
    let second = resolver.with_scope(|r| r.define(NameKind::Value, x, &mut sink));
    assert_ne!(first, second);
    assert!(second.salt > first.salt);
}

#[test]
fn self_reference_in_initializer() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let x = ident(&interner, "x", 0);

    let path = resolver.define(NameKind::Value, x, &mut sink);
    resolver.begin_initializing(&[path]);

    // Inside a function body the reference is fine: it runs later.
    let inner = resolver.with_function_scope(|r| r.resolve(NameKind::Value, x, &mut sink));
    assert_eq!(inner, path);
    assert!(sink.is_empty());

    let direct = resolver.resolve(NameKind::Value, x, &mut sink);
    assert_eq!(direct, path);
    assert_eq!(codes(&sink), vec![ErrorCode::E2003]);

    resolver.end_initializing(&[path]);
    resolver.resolve(NameKind::Value, x, &mut sink);
    assert_eq!(sink.len(), 1);
}

#[test]
fn function_depth_is_recorded() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    let top = resolver.define(NameKind::Value, ident(&interner, "a", 0), &mut sink);
    let (outer, inner) = resolver.with_function_scope(|r| {
        let outer = r.define(NameKind::Value, ident(&interner, "b", 0), &mut sink);
        let inner = r.with_function_scope(|r| {
            r.with_scope(|r| r.define(NameKind::Value, ident(&interner, "c", 0), &mut sink))
        });
        (outer, inner)
    });

    assert_eq!(resolver.function_depth_of(top), Some(0));
    assert_eq!(resolver.function_depth_of(outer), Some(1));
    assert_eq!(resolver.function_depth_of(inner), Some(2));
    assert_eq!(resolver.function_depth(), 0);
    assert_eq!(resolver.scope_depth(), 1);
}

#[test]
fn hidden_names_never_collide() {
    let interner = StringInterner::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));
    let a = resolver.define_hidden("$arg", Span::DUMMY);
    let b = resolver.define_hidden("$arg", Span::DUMMY);
    assert_ne!(a, b);
}

#[test]
fn qualified_lookup_through_nested_modules() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    let (_, (x, t)) = resolver.with_module(ident(&interner, "m", 0), &mut sink, |r, sink| {
        let x = r.define(NameKind::Value, ident(&interner, "x", 0), sink);
        let (_, t) = r.with_module(ident(&interner, "n", 0), sink, |r, sink| {
            r.define(NameKind::Type, ident(&interner, "t", 0), sink)
        });
        (x, t)
    });

    assert_eq!(
        resolver.resolve_qualified(NameKind::Value, &qualified(&interner, "m::x"), &mut sink),
        x
    );
    assert_eq!(
        resolver.resolve_qualified(NameKind::Type, &qualified(&interner, "m::n::t"), &mut sink),
        t
    );
    assert_eq!(interner.lookup(x.module), "main::m");
    assert_eq!(interner.lookup(t.module), "main::m::n");
    assert!(sink.is_empty());

    // Module contents are not visible unqualified.
    assert!(resolver.lookup(NameKind::Value, interner.intern("x")).is_err());

    let missing = resolver.resolve_qualified(NameKind::Value, &qualified(&interner, "m::y"), &mut sink);
    assert!(missing.is_poisoned());
    let unknown = resolver.resolve_qualified(NameKind::Value, &qualified(&interner, "q::x"), &mut sink);
    assert!(unknown.is_poisoned());
    assert_eq!(codes(&sink), vec![ErrorCode::E2001, ErrorCode::E2004]);
}

#[test]
fn prelude_is_in_scope() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    let add = resolver.resolve(NameKind::Value, ident(&interner, "add", 0), &mut sink);
    assert_eq!(add, resolver.prelude().operator(Intrinsic::AddInt));

    let int = resolver.resolve(NameKind::Type, ident(&interner, "int", 0), &mut sink);
    assert_eq!(resolver.prelude().builtin_type(int), Some(Type::Int));
    assert_eq!(resolver.prelude().type_path(BuiltinType::Int), int);

    let qualified_push =
        resolver.resolve_qualified(NameKind::Value, &qualified(&interner, "prelude::push"), &mut sink);
    assert_eq!(qualified_push, resolver.prelude().operator(Intrinsic::Push));
    assert!(sink.is_empty());
}

#[test]
fn module_scope_may_shadow_prelude() {
    let interner = StringInterner::new();
    let mut sink = Diagnostics::new();
    let mut resolver = Resolver::new(&interner, interner.intern("main"));

    let mine = resolver.define(NameKind::Value, ident(&interner, "add", 0), &mut sink);
    assert!(sink.is_empty());
    assert_ne!(mine, resolver.prelude().operator(Intrinsic::AddInt));
    assert_eq!(resolver.lookup(NameKind::Value, interner.intern("add")), Ok(mine));
}
