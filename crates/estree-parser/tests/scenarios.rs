//! End-to-end parses of the reference scenarios, operator precedence,
//! automatic semicolon insertion and the arrow cover grammar.

use estree_parser::{parse, parse_estree, ErrorCategory, ErrorKind, ParserOptions};
use serde_json::{json, Value};

fn tree(source: &str) -> Value {
    parse_estree(source, ParserOptions::default())
        .unwrap_or_else(|err| panic!("{source:?} failed: {err}"))
}

fn expr(source: &str) -> Value {
    tree(source)["body"][0]["expression"].clone()
}

fn error(source: &str) -> ErrorKind {
    match parse(source, ParserOptions::default()) {
        Ok(_) => panic!("{source:?} should not parse"),
        Err(err) => err.kind,
    }
}

fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

#[test]
fn conditional_alternate_takes_assignment() {
    assert_eq!(
        expr("a ? b : c = d"),
        json!({
            "type": "ConditionalExpression",
            "test": ident("a"),
            "consequent": ident("b"),
            "alternate": {
                "type": "AssignmentExpression",
                "operator": "=",
                "left": ident("c"),
                "right": ident("d")
            }
        })
    );
}

#[test]
fn static_prototype_method_is_rejected() {
    let err = parse("class C { static prototype() {} }", ParserOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStaticMember("prototype".into()));
    assert_eq!(err.kind.category(), ErrorCategory::StaticSemantics);
}

#[test]
fn for_of_with_let_declaration() {
    let stmt = tree("for (let x of y);")["body"][0].clone();
    assert_eq!(stmt["type"], "ForOfStatement");
    assert_eq!(stmt["await"], false);
    assert_eq!(stmt["left"]["type"], "VariableDeclaration");
    assert_eq!(stmt["left"]["kind"], "let");
    assert_eq!(stmt["left"]["declarations"][0]["id"], ident("x"));
    assert_eq!(stmt["left"]["declarations"][0]["init"], Value::Null);
    assert_eq!(stmt["right"], ident("y"));
    assert_eq!(stmt["body"]["type"], "EmptyStatement");
}

#[test]
fn arrow_with_two_parameters() {
    let arrow = expr("(a, b) => a + b");
    assert_eq!(arrow["type"], "ArrowFunctionExpression");
    assert_eq!(arrow["params"], json!([ident("a"), ident("b")]));
    assert_eq!(arrow["expression"], true);
    assert_eq!(arrow["body"]["type"], "BinaryExpression");

    assert_eq!(error("(a, b++) => a"), ErrorKind::InvalidArrowParameters);
}

#[test]
fn dynamic_import_options_need_next() {
    let source = "import('x', { type: 'json' })";
    assert_eq!(error(source), ErrorKind::RequiresNext("import options"));

    let options = ParserOptions::default().with_next(true);
    let import = parse_estree(source, options).unwrap()["body"][0]["expression"].clone();
    assert_eq!(import["type"], "ImportExpression");
    assert_eq!(import["source"]["value"], "x");
    assert_eq!(import["options"]["type"], "ObjectExpression");
    assert_eq!(import["options"]["properties"][0]["key"], ident("type"));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let sum = expr("a + b * c");
    assert_eq!(sum["operator"], "+");
    assert_eq!(sum["left"], ident("a"));
    assert_eq!(sum["right"]["operator"], "*");
}

#[test]
fn left_associative_operators() {
    let diff = expr("a - b - c");
    assert_eq!(diff["left"]["operator"], "-");
    assert_eq!(diff["right"], ident("c"));
}

#[test]
fn exponent_is_right_associative() {
    let pow = expr("a ** b ** c");
    assert_eq!(pow["left"], ident("a"));
    assert_eq!(pow["right"]["operator"], "**");
    assert_eq!(pow["right"]["left"], ident("b"));

    assert_eq!(error("-a ** b"), ErrorKind::UnaryBeforeExponent);
    assert_eq!(expr("(-a) ** b")["left"]["operator"], "-");
    assert_eq!(expr("-(a ** b)")["operator"], "-");
}

#[test]
fn logical_precedence_and_nullish_mixing() {
    let or = expr("a || b && c");
    assert_eq!(or["type"], "LogicalExpression");
    assert_eq!(or["operator"], "||");
    assert_eq!(or["right"]["operator"], "&&");

    assert_eq!(error("a ?? b || c"), ErrorKind::MixedNullish);
    assert_eq!(error("a && b ?? c"), ErrorKind::MixedNullish);
    assert!(parse("(a && b) ?? c", ParserOptions::default()).is_ok());
}

#[test]
fn asi_before_prefix_increment() {
    let program = tree("a\n++b");
    let body = program["body"].as_array().unwrap();
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["expression"], ident("a"));
    assert_eq!(body[1]["expression"]["type"], "UpdateExpression");
    assert_eq!(body[1]["expression"]["prefix"], true);
}

#[test]
fn no_asi_when_the_next_line_continues() {
    let program = tree("a\n+b");
    assert_eq!(program["body"].as_array().unwrap().len(), 1);
    assert_eq!(program["body"][0]["expression"]["operator"], "+");

    // A call across lines is one statement too
    assert_eq!(tree("a\n(b)")["body"][0]["expression"]["type"], "CallExpression");
}

#[test]
fn asi_after_restricted_productions() {
    let program = parse_estree("function f() { return\nx }", ParserOptions::default()).unwrap();
    let body = &program["body"][0]["body"]["body"];
    assert_eq!(body[0]["argument"], Value::Null);
    assert_eq!(body[1]["expression"], ident("x"));

    let program = tree("a: while (x) { break\na }");
    let body = &program["body"][0]["body"]["body"]["body"];
    assert_eq!(body[0]["label"], Value::Null);

    assert!(parse("let x = 1 let y = 2", ParserOptions::default()).is_err());
    assert!(parse("{ x } y", ParserOptions::default()).is_ok());
}

#[test]
fn cover_grammar_expression_or_parameters() {
    // The same prefix is an expression without `=>` and parameters with it.
    let seq = expr("(a, b = c, d)");
    assert_eq!(seq["type"], "SequenceExpression");
    assert_eq!(seq["expressions"][1]["type"], "AssignmentExpression");

    let arrow = expr("(a, b = c, ...d) => 0");
    let params = &arrow["params"];
    assert_eq!(params[0], ident("a"));
    assert_eq!(params[1]["type"], "AssignmentPattern");
    assert_eq!(params[2], json!({ "type": "RestElement", "argument": ident("d") }));

    // A rest element is only valid as the last parameter
    assert!(parse("(a, b = c, ...d)", ParserOptions::default()).is_err());
    assert_eq!(error("(...a, b) => 0"), ErrorKind::RestNotLast);

    for source in ["(f(), b) => 0", "(a.b) => 0", "(a, (b)) => 0", "(1) => 0"] {
        assert!(parse(source, ParserOptions::default()).is_err(), "{source}");
    }
}

#[test]
fn destructuring_assignment_from_literals() {
    let assign = expr("[a, { b: c = 1 }] = d");
    assert_eq!(assign["left"]["type"], "ArrayPattern");
    let prop = &assign["left"]["elements"][1]["properties"][0];
    assert_eq!(prop["value"]["type"], "AssignmentPattern");

    assert_eq!(error("({ a = 1 })"), ErrorKind::InvalidShorthandInit);
    assert!(parse("({ a = 1 } = b)", ParserOptions::default()).is_ok());
    assert_eq!(error("f() = 1"), ErrorKind::InvalidAssignmentTarget);
    assert_eq!(error("a++ = 1"), ErrorKind::InvalidAssignmentTarget);
}

#[test]
fn reparse_of_equivalent_text_is_stable() {
    let first = tree("x = a ? b : c, y");
    let second = tree("x = (a ? b : c), y");
    assert_eq!(first, second);
}

fn nest(open: &str, inner: &str, close: &str, depth: usize) -> String {
    format!("{}{inner}{}", open.repeat(depth), close.repeat(depth))
}

#[test]
fn deep_nesting_parses_without_exhausting_the_stack() {
    let parens = expr(&nest("(", "x", ")", 500));
    assert_eq!(parens, ident("x"));

    let options = ParserOptions::default().with_ranges(true).with_loc(true);
    let arrays = parse_estree(&nest("[", "x", "]", 500), options).unwrap();
    assert_eq!(arrays["body"][0]["expression"]["elements"][0]["type"], "ArrayExpression");

    let blocks = tree(&nest("{", "x;", "}", 500));
    assert_eq!(blocks["body"][0]["type"], "BlockStatement");

    let unary = expr(&format!("{}x", "!".repeat(500)));
    assert_eq!(unary["operator"], "!");

    // Depth is released between siblings
    let siblings = tree(&"[[(x)]];".repeat(2000));
    assert_eq!(siblings["body"].as_array().unwrap().len(), 2000);
}

#[test]
fn excessive_nesting_is_a_syntax_error() {
    for source in [
        nest("(", "x", ")", 5000),
        nest("[", "x", "]", 5000),
        nest("{", "", "}", 5000),
        nest("a = ", "b", "", 5000),
        format!("{}x", "- ".repeat(5000)),
        format!("{}x", "new ".repeat(5000)),
        format!("let {} = y", nest("[", "a", "]", 5000)),
        format!("x{}", " ** x".repeat(5000)),
    ] {
        let err = parse(&source, ParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NestingTooDeep);
        assert_eq!(err.kind.category(), ErrorCategory::Syntax);
    }
}
