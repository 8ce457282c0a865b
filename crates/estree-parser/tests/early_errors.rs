//! Static-semantics errors: the duplicate-binding matrix, strict mode,
//! reserved words and context-dependent keywords.

use estree_parser::{parse, ErrorCategory, ErrorKind, ParserOptions, SourceType};

fn script() -> ParserOptions {
    ParserOptions::default()
}

fn webcompat() -> ParserOptions {
    ParserOptions::default().with_webcompat(true)
}

fn module() -> ParserOptions {
    ParserOptions::default().with_source_type(SourceType::Module)
}

#[track_caller]
fn accepts(source: &str, options: ParserOptions) {
    if let Err(err) = parse(source, options) {
        panic!("{source:?} should parse, got: {err}");
    }
}

#[track_caller]
fn rejects(source: &str, options: ParserOptions) -> ErrorKind {
    match parse(source, options) {
        Ok(_) => panic!("{source:?} should not parse"),
        Err(err) => err.kind,
    }
}

#[test]
fn duplicate_lexical_declarations() {
    for source in [
        "let a; let a;",
        "const a = 1; let a;",
        "class a {} let a;",
        "let a; class a {}",
        "{ let a; const a = 1; }",
        "let a; var a;",
        "var a; let a;",
        "switch (x) { case 1: let a; case 2: let a; }",
        "let [a, a] = b;",
        "for (let a, a;;);",
    ] {
        assert_eq!(rejects(source, script()), ErrorKind::DuplicateBinding("a".into()), "{source}");
    }
}

#[test]
fn var_nested_inside_let_block() {
    assert!(matches!(rejects("{ let a; { var a; } }", script()), ErrorKind::DuplicateBinding(_)));
    assert!(matches!(rejects("let a; { var a; }", script()), ErrorKind::DuplicateBinding(_)));
    assert!(matches!(rejects("{ var a; } let a;", script()), ErrorKind::DuplicateBinding(_)));
    accepts("{ let a; } { var a; }", script());
    accepts("let a; function f() { var a; }", script());
}

#[test]
fn legal_redeclarations() {
    accepts("var a; var a;", script());
    accepts("let a; { let a; }", script());
    accepts("function f() {} function f() {}", script());
    accepts("var f; function f() {}", script());
    accepts("function f(a) { var a; }", script());
    accepts("function f() { let f; }", script());
    accepts("try {} catch (e) { var e; }", script());
}

#[test]
fn sibling_block_functions() {
    let source = "{ function f() {} function f() {} }";
    accepts(source, webcompat());
    assert!(matches!(rejects(source, script()), ErrorKind::DuplicateBinding(_)));
    assert!(matches!(
        rejects(&format!("'use strict'; {source}"), webcompat()),
        ErrorKind::DuplicateBinding(_)
    ));

    accepts("switch (x) { case 1: function f() {} case 2: function f() {} }", webcompat());
    // Only plain function declarations get the leniency
    rejects("{ async function f() {} function f() {} }", webcompat());
    rejects("{ function* f() {} function f() {} }", webcompat());
    assert!(matches!(
        rejects("{ function f() {} let f; }", webcompat()),
        ErrorKind::DuplicateBinding(_)
    ));
}

#[test]
fn module_top_level_functions_are_lexical() {
    assert!(matches!(
        rejects("function f() {} function f() {}", module()),
        ErrorKind::DuplicateBinding(_)
    ));
    assert!(matches!(rejects("var f; function f() {}", module()), ErrorKind::DuplicateBinding(_)));
}

#[test]
fn parameter_conflicts() {
    accepts("function f(a, a) {}", script());
    accepts("function* g(a, a) {}", script());
    accepts("async function f(a, a) {}", script());
    assert_eq!(
        rejects("'use strict'; function f(a, a) {}", script()),
        ErrorKind::DuplicateParameter("a".into())
    );
    assert_eq!(rejects("(a, a) => 0", script()), ErrorKind::DuplicateParameter("a".into()));
    assert_eq!(rejects("function f(a, [a]) {}", script()), ErrorKind::DuplicateParameter("a".into()));
    assert_eq!(
        rejects("function f(a, a) { 'use strict' }", script()),
        ErrorKind::DuplicateParameter("a".into())
    );
    assert!(matches!(rejects("function f(a) { let a; }", script()), ErrorKind::DuplicateBinding(_)));
    assert!(matches!(rejects("(a) => { const a = 1; }", script()), ErrorKind::DuplicateBinding(_)));
}

#[test]
fn catch_parameter_interplay() {
    assert!(matches!(
        rejects("try {} catch (e) { let e; }", script()),
        ErrorKind::DuplicateBinding(_)
    ));
    assert!(matches!(
        rejects("try {} catch ([e]) { var e; }", script()),
        ErrorKind::DuplicateBinding(_)
    ));
    assert!(matches!(
        rejects("try {} catch (e) { for (var e of x); }", script()),
        ErrorKind::DuplicateBinding(_)
    ));
    accepts("try {} catch (e) { for (var e in x); }", script());
}

#[test]
fn duplicate_binding_is_a_static_semantics_error() {
    let err = parse("let a; let a;", script()).unwrap_err();
    assert_eq!(err.kind.category(), ErrorCategory::StaticSemantics);
    assert_eq!(err.span.start, 11);
    assert_eq!(err.to_string(), "Identifier 'a' has already been declared (1:11)");
}

#[test]
fn strict_mode_restrictions() {
    let strict = script().with_strict(true);
    assert_eq!(rejects("with (a) {}", strict.clone()), ErrorKind::StrictWith);
    assert_eq!(rejects("delete x;", strict.clone()), ErrorKind::StrictDelete);
    assert_eq!(rejects("010", strict.clone()), ErrorKind::LegacyOctalLiteral);
    assert_eq!(rejects("'\\07'", strict.clone()), ErrorKind::LegacyOctalEscape);
    assert_eq!(rejects("var eval;", strict.clone()), ErrorKind::StrictEvalArguments("eval".into()));
    assert_eq!(rejects("arguments = 1", strict.clone()), ErrorKind::StrictEvalArguments("arguments".into()));
    assert_eq!(rejects("var interface;", strict.clone()), ErrorKind::StrictReservedWord("interface".into()));
    accepts("delete x.y; var interface;", script());

    // Modules are always strict
    assert_eq!(rejects("with (a) {}", module()), ErrorKind::StrictWith);
}

#[test]
fn use_strict_applies_retroactively() {
    assert_eq!(
        rejects("function eval() { 'use strict' }", script()),
        ErrorKind::StrictEvalArguments("eval".into())
    );
    assert_eq!(
        rejects("function f(package) { 'use strict' }", script()),
        ErrorKind::StrictReservedWord("package".into())
    );
    assert_eq!(rejects("function f(a = 1) { 'use strict' }", script()), ErrorKind::IllegalUseStrict);
    assert_eq!(rejects("({ a }) => { 'use strict' }", script()), ErrorKind::IllegalUseStrict);
    accepts("function f(a) { 'use strict' }", script());
}

#[test]
fn yield_and_await_contexts() {
    accepts("var yield, await;", script());
    assert_eq!(rejects("function* g() { var yield; }", script()), ErrorKind::ReservedWord("yield".into()));
    assert_eq!(rejects("async function f() { var await; }", script()), ErrorKind::ReservedWord("await".into()));
    assert_eq!(rejects("function* g(a = yield) {}", script()), ErrorKind::YieldInParameter);
    assert_eq!(rejects("async function f(a = await 1) {}", script()), ErrorKind::AwaitInParameter);
    assert_eq!(rejects("var await;", module()), ErrorKind::ReservedWord("await".into()));
    accepts("await x;", module());
    assert!(parse("await x;", script()).is_err());
    assert_eq!(rejects("for await (x of y);", script()), ErrorKind::ForAwaitOutsideAsync);
    accepts("async function f() { for await (x of y); }", script());
}

#[test]
fn super_and_meta_properties() {
    assert_eq!(rejects("super.x", script()), ErrorKind::InvalidSuper);
    assert_eq!(rejects("class A { constructor() { super(); } }", script()), ErrorKind::InvalidSuperCall);
    accepts("class A extends B { constructor() { super(); } m() { super.m(); } }", script());
    accepts("({ m() { return super.x; } })", script());
    assert_eq!(rejects("new.target", script()), ErrorKind::InvalidNewTarget);
    accepts("function f() { return new.target; }", script());
    assert_eq!(rejects("import.meta", script()), ErrorKind::ImportMetaOutsideModule);
    accepts("import.meta.url", module());
}

#[test]
fn class_body_rules() {
    assert_eq!(rejects("class A { constructor() {} constructor() {} }", script()), ErrorKind::DuplicateConstructor);
    assert_eq!(rejects("class A { get constructor() {} }", script()), ErrorKind::SpecialConstructor);
    assert_eq!(rejects("class A { constructor = 1 }", script()), ErrorKind::ConstructorField);
    assert_eq!(rejects("class A { #constructor }", script()), ErrorKind::PrivateConstructor);
    assert_eq!(rejects("class A { #a; #a; }", script()), ErrorKind::DuplicatePrivateName("a".into()));
    accepts("class A { get #a() {} set #a(v) {} }", script());
    assert_eq!(rejects("class A { m() { this.#b } }", script()), ErrorKind::UndeclaredPrivateName("b".into()));
    accepts("class A { m() { return this.#b } #b = 1 }", script());
    assert_eq!(rejects("class A { #a; m() { delete this.#a } }", script()), ErrorKind::PrivateDelete);
    assert_eq!(rejects("class A { x = arguments }", script()), ErrorKind::ArgumentsInClassInit);
    accepts("class A { x = function () { return arguments } }", script());
}
