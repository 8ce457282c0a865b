//! Option-gated syntax (modules, JSX, `next`, `webcompat`) and the
//! ESTree output options.

use estree_parser::{parse, parse_estree, ErrorKind, ParserOptions, SourceType};
use serde_json::{json, Value};

fn module() -> ParserOptions {
    ParserOptions::default().with_source_type(SourceType::Module)
}

fn jsx() -> ParserOptions {
    ParserOptions::default().with_jsx(true)
}

fn first(source: &str, options: ParserOptions) -> Value {
    let tree = parse_estree(source, options).unwrap_or_else(|err| panic!("{source:?} failed: {err}"));
    tree["body"][0].clone()
}

#[test]
fn options_deserialize_from_camel_case() {
    let options: ParserOptions = serde_json::from_value(json!({
        "sourceType": "module",
        "preserveParens": true,
        "ranges": true,
        "jsx": true
    }))
    .unwrap();
    assert_eq!(options.source_type, SourceType::Module);
    assert!(options.preserve_parens && options.ranges && options.jsx);
    assert!(!options.loc && !options.next && !options.webcompat);

    let defaults: ParserOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, ParserOptions::default());
}

#[test]
fn module_declarations() {
    let source = "import d, * as ns from 'a';\n\
                  import { x as y, 'z w' as z } from 'b';\n\
                  export default class {}\n\
                  export { y as 'q r', z };\n\
                  export * as all from 'c';";
    let tree = parse_estree(source, module()).unwrap();
    let body = tree["body"].as_array().unwrap();

    assert_eq!(body[0]["specifiers"][0]["type"], "ImportDefaultSpecifier");
    assert_eq!(body[0]["specifiers"][1]["type"], "ImportNamespaceSpecifier");
    assert_eq!(body[1]["specifiers"][1]["imported"]["type"], "Literal");
    assert_eq!(body[1]["specifiers"][1]["imported"]["value"], "z w");

    assert_eq!(body[2]["type"], "ExportDefaultDeclaration");
    assert_eq!(body[2]["declaration"]["type"], "ClassDeclaration");
    assert_eq!(body[2]["declaration"]["id"], Value::Null);

    assert_eq!(body[3]["specifiers"][0]["exported"]["value"], "q r");
    assert_eq!(body[3]["source"], Value::Null);
    assert_eq!(body[4]["type"], "ExportAllDeclaration");
    assert_eq!(body[4]["exported"]["name"], "all");
}

#[test]
fn module_only_syntax() {
    for source in ["import a from 'a';", "export {};", "import.meta"] {
        assert!(parse(source, ParserOptions::default()).is_err(), "{source}");
        assert!(parse(source, module()).is_ok(), "{source}");
    }
    assert_eq!(
        parse("export { a }; export { b as a };", module()).unwrap_err().kind,
        ErrorKind::DuplicateExport("a".into())
    );
    assert_eq!(
        parse("if (x) { import a from 'a'; }", module()).unwrap_err().kind,
        ErrorKind::ModuleSyntaxNotTopLevel
    );
}

#[test]
fn exported_local_bindings_are_reported() {
    let source = "export const [a, b] = c;\n\
                  export function f() {}\n\
                  export { a as x, g };\n\
                  export { h } from 'h';\n\
                  export default 1;";
    let program = parse(source, module()).unwrap();
    let names: Vec<&str> = program.exported_bindings.iter().map(|id| id.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "f", "a", "g"]);
    assert_eq!(program.exported_bindings[4].span.start as usize, source.find("g }").unwrap());

    // Not checked against declarations, and absent from scripts
    assert!(parse("export { missing };", module()).is_ok());
    assert!(parse("x", ParserOptions::default()).unwrap().exported_bindings.is_empty());
}

#[test]
fn top_level_await_in_modules() {
    let stmt = first("await x;", module());
    assert_eq!(stmt["expression"]["type"], "AwaitExpression");

    let stmt = first("for await (const x of y);", module());
    assert_eq!(stmt["await"], true);
}

#[test]
fn jsx_is_opt_in() {
    assert!(parse("<div />", ParserOptions::default()).is_err());
    let stmt = first("<div />", jsx());
    assert_eq!(stmt["expression"]["type"], "JSXElement");
    assert_eq!(stmt["expression"]["openingElement"]["selfClosing"], true);
    assert_eq!(stmt["expression"]["closingElement"], Value::Null);
}

#[test]
fn jsx_element_tree() {
    let source = r#"<svg:rect data-x="1" {...rest} on={go}>a &amp; b<>{x}</></svg:rect>"#;
    let element = first(source, jsx())["expression"].clone();

    let opening = &element["openingElement"];
    assert_eq!(opening["name"]["type"], "JSXNamespacedName");
    assert_eq!(opening["name"]["namespace"]["name"], "svg");
    let attrs = opening["attributes"].as_array().unwrap();
    assert_eq!(attrs[0]["name"]["name"], "data-x");
    assert_eq!(attrs[0]["value"]["value"], "1");
    assert_eq!(attrs[1]["type"], "JSXSpreadAttribute");
    assert_eq!(attrs[2]["value"]["type"], "JSXExpressionContainer");

    let children = element["children"].as_array().unwrap();
    assert_eq!(children[0], json!({ "type": "JSXText", "value": "a & b" }));
    assert_eq!(children[1]["type"], "JSXFragment");
    assert_eq!(children[1]["children"][0]["expression"]["name"], "x");
    assert_eq!(element["closingElement"]["name"]["name"]["name"], "rect");
}

#[test]
fn jsx_errors() {
    assert_eq!(
        parse("<a></b>", jsx()).unwrap_err().kind,
        ErrorKind::JsxMismatchedTag("a".into())
    );
    assert!(parse("<a>", jsx()).is_err());
    assert!(parse("<a b={} />", jsx()).is_err());
}

#[test]
fn jsx_in_expression_positions() {
    let stmt = first("const el = cond ? <A /> : <B>{...items}</B>;", jsx());
    let init = &stmt["declarations"][0]["init"];
    assert_eq!(init["consequent"]["type"], "JSXElement");
    assert_eq!(init["alternate"]["children"][0]["type"], "JSXSpreadChild");

    // `<` stays a comparison after an operand
    let stmt = first("a < b > c", jsx());
    assert_eq!(stmt["expression"]["type"], "BinaryExpression");
}

#[test]
fn decorators_need_next() {
    assert_eq!(
        parse("@dec class A {}", ParserOptions::default()).unwrap_err().kind,
        ErrorKind::RequiresNext("decorators")
    );
    let next = module().with_next(true);
    let tree = parse_estree(
        "export @a.b @c(1) @(d) class A { @e m() {} }\nexport default @f class {}",
        next,
    )
    .unwrap();
    let class = &tree["body"][0]["declaration"];
    let decorators = class["decorators"].as_array().unwrap();
    assert_eq!(decorators.len(), 3);
    assert_eq!(decorators[0]["expression"]["type"], "MemberExpression");
    assert_eq!(decorators[1]["expression"]["type"], "CallExpression");
    assert_eq!(class["body"]["body"][0]["decorators"][0]["expression"]["name"], "e");
    assert_eq!(tree["body"][1]["declaration"]["decorators"][0]["expression"]["name"], "f");
}

#[test]
fn decorators_before_export() {
    let next = module().with_next(true).with_ranges(true);
    let source = "@a export class A {}\n@b.c export default class {}";
    let tree = parse_estree(source, next.clone()).unwrap();

    let named = &tree["body"][0];
    assert_eq!(named["type"], "ExportNamedDeclaration");
    assert_eq!(named["start"], 0);
    assert_eq!(named["declaration"]["start"], 10);
    assert_eq!(named["declaration"]["decorators"][0]["expression"]["name"], "a");

    let default = &tree["body"][1];
    assert_eq!(default["type"], "ExportDefaultDeclaration");
    assert_eq!(default["declaration"]["decorators"][0]["expression"]["type"], "MemberExpression");

    for source in ["@a export @b class A {}", "@a export const x = 1;", "@a export { x };"] {
        assert!(parse(source, next.clone()).is_err(), "{source}");
    }
    assert!(parse("@a export class A {}", ParserOptions::default().with_next(true)).is_err());
}

#[test]
fn import_attributes_need_next() {
    let source = "export { a } from 'a' with { type: 'json' };";
    assert_eq!(
        parse(source, module()).unwrap_err().kind,
        ErrorKind::RequiresNext("import attributes")
    );
    let stmt = first(source, module().with_next(true));
    assert_eq!(stmt["attributes"][0]["value"]["value"], "json");
}

#[test]
fn webcompat_annex_b() {
    let lenient = ParserOptions::default().with_webcompat(true);
    assert!(parse("if (x) function f() {}", ParserOptions::default()).is_err());
    let stmt = first("if (x) function f() {}", lenient.clone());
    assert_eq!(stmt["consequent"]["type"], "FunctionDeclaration");

    let source = "for (var i = 0 in x);";
    assert_eq!(
        parse(source, ParserOptions::default()).unwrap_err().kind,
        ErrorKind::ForInOfInitializer("for-in")
    );
    let stmt = first(source, lenient.clone());
    assert_eq!(stmt["left"]["declarations"][0]["init"]["value"], 0);

    let source = "x = 1 <!-- comment\n--> also a comment\ny";
    assert!(parse(source, ParserOptions::default()).is_err());
    let tree = parse_estree(source, lenient.clone()).unwrap();
    assert_eq!(tree["body"].as_array().unwrap().len(), 2);

    // Never in modules
    assert!(parse("x\n--> y", module().with_webcompat(true)).is_err());
}

#[test]
fn ranges_and_locations_across_lines() {
    let options = ParserOptions::default().with_ranges(true).with_loc(true);
    let tree = parse_estree("let a = 1;\r\nfoo(a)", options).unwrap();
    assert_eq!(tree["range"], json!([0, 18]));
    let call = &tree["body"][1]["expression"];
    assert_eq!(call["range"], json!([12, 18]));
    assert_eq!(
        call["loc"],
        json!({ "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 6 } })
    );
    assert_eq!(call["arguments"][0]["start"], 16);
}

#[test]
fn error_positions_are_line_and_column() {
    let err = parse("let x = 1;\n  x ++ = 2", ParserOptions::default()).unwrap_err();
    assert_eq!(err.position.line, 2);
    assert_eq!(err.position.column, 2);

    let report = err.render("let x = 1;\n  x ++ = 2");
    assert!(report.contains("2 |   x ++ = 2"), "{report}");
}

#[test]
fn hashbang_and_unicode_escapes() {
    let stmt = first("#!/usr/bin/env node\n\\u0061 = 1", ParserOptions::default());
    assert_eq!(stmt["expression"]["left"]["name"], "a");
    assert_eq!(
        parse("\\u0076ar x;", ParserOptions::default()).unwrap_err().kind,
        ErrorKind::EscapedKeyword
    );
}
