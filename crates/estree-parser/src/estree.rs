//! ESTree JSON view of the AST.
//!
//! The typed AST keeps everything (spans, parentheses, decorators). This
//! module walks it once and builds a `serde_json::Value` in the standard
//! ESTree shape, honouring the output options:
//!
//! - `ranges`: `start`, `end` and `range` on every node
//! - `loc`: `loc: {start: {line, column}, end: {line, column}}`
//! - `raw`: `raw` source text on `Literal` and `JSXText`
//! - `preserveParens`: `ParenthesizedExpression` nodes
//!
//! Keys are emitted in the conventional ESTree order (`type`, positions, then
//! fields), which relies on serde_json's `preserve_order` feature.

use serde_json::{json, Map, Value};

use crate::ast::*;
use crate::context::ParserOptions;
use crate::parser::with_stack;
use crate::span::{LineIndex, Span};

impl Program {
    /// Convert to an ESTree `Program` node.
    ///
    /// `source` must be the text this program was parsed from; it is used
    /// for `raw` values and line/column positions.
    pub fn to_estree(&self, source: &str, options: &ParserOptions) -> Value {
        EstreeWriter::new(source, options).program(self)
    }
}

struct EstreeWriter<'s> {
    source: &'s str,
    options: &'s ParserOptions,
    /// Only built when `loc` is requested.
    lines: Option<LineIndex<'s>>,
}

impl<'s> EstreeWriter<'s> {
    fn new(source: &'s str, options: &'s ParserOptions) -> Self {
        Self {
            source,
            options,
            lines: options.loc.then(|| LineIndex::new(source)),
        }
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    fn node_map<const N: usize>(
        &self,
        ty: &'static str,
        span: Span,
        fields: [(&'static str, Value); N],
    ) -> Map<String, Value> {
        let mut map = Map::with_capacity(N + 5);
        map.insert("type".to_owned(), Value::from(ty));
        if self.options.ranges {
            map.insert("start".to_owned(), Value::from(span.start));
            map.insert("end".to_owned(), Value::from(span.end));
        }
        if let Some(lines) = &self.lines {
            let start = lines.position(span.start);
            let end = lines.position(span.end);
            map.insert("loc".to_owned(), json!({ "start": start, "end": end }));
        }
        if self.options.ranges {
            map.insert("range".to_owned(), json!([span.start, span.end]));
        }
        for (key, value) in fields {
            map.insert(key.to_owned(), value);
        }
        map
    }

    fn node<const N: usize>(
        &self,
        ty: &'static str,
        span: Span,
        fields: [(&'static str, Value); N],
    ) -> Value {
        Value::Object(self.node_map(ty, span, fields))
    }

    fn list<T>(&self, items: &[T], f: impl Fn(&Self, &T) -> Value) -> Value {
        Value::Array(items.iter().map(|item| f(self, item)).collect())
    }

    fn opt<T>(&self, item: Option<&T>, f: impl Fn(&Self, &T) -> Value) -> Value {
        item.map_or(Value::Null, |item| f(self, item))
    }

    fn identifier(&self, id: &Identifier) -> Value {
        self.node("Identifier", id.span, [("name", Value::from(id.name.as_str()))])
    }

    /// A `Literal` with an optional `raw` and any extra fields (`regex`, `bigint`).
    fn literal<const N: usize>(
        &self,
        span: Span,
        value: Value,
        extra: [(&'static str, Value); N],
    ) -> Value {
        let mut map = self.node_map("Literal", span, [("value", value)]);
        if self.options.raw {
            map.insert("raw".to_owned(), Value::from(span.slice(self.source)));
        }
        for (key, value) in extra {
            map.insert(key.to_owned(), value);
        }
        Value::Object(map)
    }

    fn string_literal(&self, lit: &StringLiteral) -> Value {
        self.literal(lit.span, Value::from(lit.value.as_str()), [])
    }

    fn decorators(&self, map: &mut Map<String, Value>, decorators: &[Decorator]) {
        if !decorators.is_empty() {
            let list = self.list(decorators, |w, d| {
                w.node("Decorator", d.span, [("expression", w.expr(&d.expr))])
            });
            map.insert("decorators".to_owned(), list);
        }
    }

    // =========================================================================
    // Program and Statements
    // =========================================================================

    fn program(&self, program: &Program) -> Value {
        self.node(
            "Program",
            program.span,
            [
                ("body", self.list(&program.body, Self::stmt)),
                ("sourceType", Value::from(program.source_type.as_str())),
            ],
        )
    }

    fn stmt(&self, stmt: &Stmt) -> Value {
        with_stack(|| self.write_stmt(stmt))
    }

    fn write_stmt(&self, stmt: &Stmt) -> Value {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Var(decl) => self.var_decl(decl, span),
            StmtKind::Function(func) => self.function("FunctionDeclaration", func),
            StmtKind::Class(class) => self.class("ClassDeclaration", class),
            StmtKind::Expr(expr) => {
                self.node("ExpressionStatement", span, [("expression", self.expr(expr))])
            }
            StmtKind::Directive { expr, value } => self.node(
                "ExpressionStatement",
                span,
                [
                    ("expression", self.expr(expr)),
                    ("directive", Value::from(value.as_str())),
                ],
            ),
            StmtKind::Block(body) => self.block(body, span),
            StmtKind::Empty => self.node("EmptyStatement", span, []),
            StmtKind::Debugger => self.node("DebuggerStatement", span, []),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => self.node(
                "IfStatement",
                span,
                [
                    ("test", self.expr(test)),
                    ("consequent", self.stmt(consequent)),
                    ("alternate", self.opt(alternate.as_deref(), Self::stmt)),
                ],
            ),
            StmtKind::Switch {
                discriminant,
                cases,
            } => self.node(
                "SwitchStatement",
                span,
                [
                    ("discriminant", self.expr(discriminant)),
                    ("cases", self.list(cases, Self::switch_case)),
                ],
            ),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                let init = match init {
                    Some(ForInit::Var(decl)) => self.var_decl(decl, decl.span),
                    Some(ForInit::Expr(expr)) => self.expr(expr),
                    None => Value::Null,
                };
                self.node(
                    "ForStatement",
                    span,
                    [
                        ("init", init),
                        ("test", self.opt(test.as_ref(), Self::expr)),
                        ("update", self.opt(update.as_ref(), Self::expr)),
                        ("body", self.stmt(body)),
                    ],
                )
            }
            StmtKind::ForIn { left, right, body } => self.node(
                "ForInStatement",
                span,
                [
                    ("left", self.for_head(left)),
                    ("right", self.expr(right)),
                    ("body", self.stmt(body)),
                ],
            ),
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            } => self.node(
                "ForOfStatement",
                span,
                [
                    ("await", Value::from(*is_await)),
                    ("left", self.for_head(left)),
                    ("right", self.expr(right)),
                    ("body", self.stmt(body)),
                ],
            ),
            StmtKind::While { test, body } => self.node(
                "WhileStatement",
                span,
                [("test", self.expr(test)), ("body", self.stmt(body))],
            ),
            StmtKind::DoWhile { body, test } => self.node(
                "DoWhileStatement",
                span,
                [("body", self.stmt(body)), ("test", self.expr(test))],
            ),
            StmtKind::Break { label } => self.node(
                "BreakStatement",
                span,
                [("label", self.opt(label.as_ref(), Self::identifier))],
            ),
            StmtKind::Continue { label } => self.node(
                "ContinueStatement",
                span,
                [("label", self.opt(label.as_ref(), Self::identifier))],
            ),
            StmtKind::Return { arg } => self.node(
                "ReturnStatement",
                span,
                [("argument", self.opt(arg.as_ref(), Self::expr))],
            ),
            StmtKind::Throw { arg } => {
                self.node("ThrowStatement", span, [("argument", self.expr(arg))])
            }
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => self.node(
                "TryStatement",
                span,
                [
                    ("block", self.block_stmt(block)),
                    ("handler", self.opt(handler.as_ref(), Self::catch_clause)),
                    ("finalizer", self.opt(finalizer.as_ref(), Self::block_stmt)),
                ],
            ),
            StmtKind::With { object, body } => self.node(
                "WithStatement",
                span,
                [("object", self.expr(object)), ("body", self.stmt(body))],
            ),
            StmtKind::Labeled { label, body } => self.node(
                "LabeledStatement",
                span,
                [("body", self.stmt(body)), ("label", self.identifier(label))],
            ),
            StmtKind::Import(decl) => self.import_decl(decl, span),
            StmtKind::Export(decl) => self.export_decl(decl, span),
        }
    }

    fn block(&self, body: &[Stmt], span: Span) -> Value {
        self.node("BlockStatement", span, [("body", self.list(body, Self::stmt))])
    }

    fn block_stmt(&self, block: &BlockStmt) -> Value {
        self.block(&block.body, block.span)
    }

    fn var_decl(&self, decl: &VarDecl, span: Span) -> Value {
        let declarations = self.list(&decl.decls, |w, d| {
            w.node(
                "VariableDeclarator",
                d.span,
                [
                    ("id", w.pattern(&d.binding)),
                    ("init", w.opt(d.init.as_ref(), Self::expr)),
                ],
            )
        });
        self.node(
            "VariableDeclaration",
            span,
            [
                ("declarations", declarations),
                ("kind", Value::from(decl.kind.as_str())),
            ],
        )
    }

    fn for_head(&self, head: &ForHead) -> Value {
        match head {
            ForHead::Var(decl) => self.var_decl(decl, decl.span),
            ForHead::Pattern(pattern) => self.pattern(pattern),
        }
    }

    fn switch_case(&self, case: &SwitchCase) -> Value {
        self.node(
            "SwitchCase",
            case.span,
            [
                ("consequent", self.list(&case.consequent, Self::stmt)),
                ("test", self.opt(case.test.as_ref(), Self::expr)),
            ],
        )
    }

    fn catch_clause(&self, clause: &CatchClause) -> Value {
        self.node(
            "CatchClause",
            clause.span,
            [
                ("param", self.opt(clause.param.as_ref(), Self::pattern)),
                ("body", self.block_stmt(&clause.body)),
            ],
        )
    }

    // =========================================================================
    // Modules
    // =========================================================================

    fn module_export_name(&self, name: &ModuleExportName) -> Value {
        match name {
            ModuleExportName::Ident(id) => self.identifier(id),
            ModuleExportName::String(lit) => self.string_literal(lit),
        }
    }

    fn attributes(&self, attributes: &[ImportAttribute]) -> Value {
        self.list(attributes, |w, attr| {
            w.node(
                "ImportAttribute",
                attr.span,
                [
                    ("key", w.module_export_name(&attr.key)),
                    ("value", w.string_literal(&attr.value)),
                ],
            )
        })
    }

    fn import_decl(&self, decl: &ImportDecl, span: Span) -> Value {
        let specifiers = self.list(&decl.specifiers, |w, spec| match spec {
            ImportSpecifier::Default { local, span } => {
                w.node("ImportDefaultSpecifier", *span, [("local", w.identifier(local))])
            }
            ImportSpecifier::Namespace { local, span } => {
                w.node("ImportNamespaceSpecifier", *span, [("local", w.identifier(local))])
            }
            ImportSpecifier::Named {
                imported,
                local,
                span,
            } => w.node(
                "ImportSpecifier",
                *span,
                [
                    ("imported", w.module_export_name(imported)),
                    ("local", w.identifier(local)),
                ],
            ),
        });
        self.node(
            "ImportDeclaration",
            span,
            [
                ("specifiers", specifiers),
                ("source", self.string_literal(&decl.source)),
                ("attributes", self.attributes(&decl.attributes)),
            ],
        )
    }

    fn export_decl(&self, decl: &ExportDecl, span: Span) -> Value {
        match decl {
            ExportDecl::Named {
                specifiers,
                source,
                attributes,
            } => {
                let specifiers = self.list(specifiers, |w, spec| {
                    w.node(
                        "ExportSpecifier",
                        spec.span,
                        [
                            ("local", w.module_export_name(&spec.local)),
                            ("exported", w.module_export_name(&spec.exported)),
                        ],
                    )
                });
                self.node(
                    "ExportNamedDeclaration",
                    span,
                    [
                        ("declaration", Value::Null),
                        ("specifiers", specifiers),
                        ("source", self.opt(source.as_ref(), Self::string_literal)),
                        ("attributes", self.attributes(attributes)),
                    ],
                )
            }
            ExportDecl::Decl(stmt) => self.node(
                "ExportNamedDeclaration",
                span,
                [
                    ("declaration", self.stmt(stmt)),
                    ("specifiers", Value::Array(Vec::new())),
                    ("source", Value::Null),
                    ("attributes", Value::Array(Vec::new())),
                ],
            ),
            ExportDecl::Default(default) => {
                let declaration = match default {
                    ExportDefault::Function(func) => self.function("FunctionDeclaration", func),
                    ExportDefault::Class(class) => self.class("ClassDeclaration", class),
                    ExportDefault::Expr(expr) => self.expr(expr),
                };
                self.node("ExportDefaultDeclaration", span, [("declaration", declaration)])
            }
            ExportDecl::All {
                exported,
                source,
                attributes,
            } => self.node(
                "ExportAllDeclaration",
                span,
                [
                    ("exported", self.opt(exported.as_ref(), Self::module_export_name)),
                    ("source", self.string_literal(source)),
                    ("attributes", self.attributes(attributes)),
                ],
            ),
        }
    }

    // =========================================================================
    // Functions and Classes
    // =========================================================================

    fn function(&self, ty: &'static str, func: &Function) -> Value {
        self.node(
            ty,
            func.span,
            [
                ("id", self.opt(func.id.as_ref(), Self::identifier)),
                ("expression", Value::Bool(false)),
                ("generator", Value::from(func.is_generator)),
                ("async", Value::from(func.is_async)),
                ("params", self.list(&func.params, Self::pattern)),
                ("body", self.block_stmt(&func.body)),
            ],
        )
    }

    fn arrow(&self, arrow: &ArrowFunction) -> Value {
        let (expression, body) = match &arrow.body {
            ArrowBody::Expr(expr) => (true, self.expr(expr)),
            ArrowBody::Block(block) => (false, self.block_stmt(block)),
        };
        self.node(
            "ArrowFunctionExpression",
            arrow.span,
            [
                ("id", Value::Null),
                ("expression", Value::from(expression)),
                ("generator", Value::Bool(false)),
                ("async", Value::from(arrow.is_async)),
                ("params", self.list(&arrow.params, Self::pattern)),
                ("body", body),
            ],
        )
    }

    fn class(&self, ty: &'static str, class: &Class) -> Value {
        let body = self.node(
            "ClassBody",
            class.body_span,
            [("body", self.list(&class.body, Self::class_member))],
        );
        let mut map = self.node_map(
            ty,
            class.span,
            [
                ("id", self.opt(class.id.as_ref(), Self::identifier)),
                ("superClass", self.opt(class.super_class.as_deref(), Self::expr)),
                ("body", body),
            ],
        );
        self.decorators(&mut map, &class.decorators);
        Value::Object(map)
    }

    fn class_member(&self, member: &ClassMember) -> Value {
        match &member.kind {
            ClassMemberKind::Method {
                key,
                value,
                kind,
                computed,
                is_static,
                decorators,
            } => {
                let kind = match kind {
                    MethodKind::Constructor => "constructor",
                    MethodKind::Method => "method",
                    MethodKind::Get => "get",
                    MethodKind::Set => "set",
                };
                let mut map = self.node_map(
                    "MethodDefinition",
                    member.span,
                    [
                        ("static", Value::from(*is_static)),
                        ("computed", Value::from(*computed)),
                        ("key", self.expr(key)),
                        ("kind", Value::from(kind)),
                        ("value", self.function("FunctionExpression", value)),
                    ],
                );
                self.decorators(&mut map, decorators);
                Value::Object(map)
            }
            ClassMemberKind::Property {
                key,
                value,
                computed,
                is_static,
                decorators,
            } => {
                let mut map = self.node_map(
                    "PropertyDefinition",
                    member.span,
                    [
                        ("static", Value::from(*is_static)),
                        ("computed", Value::from(*computed)),
                        ("key", self.expr(key)),
                        ("value", self.opt(value.as_ref(), Self::expr)),
                    ],
                );
                self.decorators(&mut map, decorators);
                Value::Object(map)
            }
            ClassMemberKind::StaticBlock(body) => {
                self.node("StaticBlock", member.span, [("body", self.list(body, Self::stmt))])
            }
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    fn pattern(&self, pattern: &Pattern) -> Value {
        with_stack(|| self.write_pattern(pattern))
    }

    fn write_pattern(&self, pattern: &Pattern) -> Value {
        let span = pattern.span;
        match &pattern.kind {
            PatternKind::Ident(name) => {
                self.node("Identifier", span, [("name", Value::from(name.as_str()))])
            }
            PatternKind::Array(elements) => {
                let elements = self.list(elements, |w, e| w.opt(e.as_ref(), Self::pattern));
                self.node("ArrayPattern", span, [("elements", elements)])
            }
            PatternKind::Object(props) => {
                let properties = self.list(props, |w, prop| match prop {
                    ObjectPatternProperty::Property {
                        key,
                        value,
                        computed,
                        shorthand,
                        span,
                    } => w.node(
                        "Property",
                        *span,
                        [
                            ("method", Value::Bool(false)),
                            ("shorthand", Value::from(*shorthand)),
                            ("computed", Value::from(*computed)),
                            ("key", w.expr(key)),
                            ("value", w.pattern(value)),
                            ("kind", Value::from("init")),
                        ],
                    ),
                    ObjectPatternProperty::Rest(rest) => w.pattern(rest),
                });
                self.node("ObjectPattern", span, [("properties", properties)])
            }
            PatternKind::Assign { left, right } => self.node(
                "AssignmentPattern",
                span,
                [("left", self.pattern(left)), ("right", self.expr(right))],
            ),
            PatternKind::Rest(arg) => {
                self.node("RestElement", span, [("argument", self.pattern(arg))])
            }
            PatternKind::Expr(expr) => self.expr(expr),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&self, expr: &Expr) -> Value {
        with_stack(|| self.write_expr(expr))
    }

    fn write_expr(&self, expr: &Expr) -> Value {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Null => self.literal(span, Value::Null, []),
            ExprKind::Bool(value) => self.literal(span, Value::from(*value), []),
            ExprKind::Number(value) => self.literal(span, number(*value), []),
            ExprKind::String(value) => self.literal(span, Value::from(value.as_str()), []),
            ExprKind::BigInt(digits) => self.literal(
                span,
                Value::Null,
                [("bigint", Value::from(digits.replace('_', "")))],
            ),
            ExprKind::Regex { pattern, flags } => self.literal(
                span,
                Value::Null,
                [("regex", json!({ "pattern": pattern, "flags": flags }))],
            ),
            ExprKind::Template(template) => self.template(template),

            ExprKind::Ident(name) => {
                self.node("Identifier", span, [("name", Value::from(name.as_str()))])
            }
            ExprKind::PrivateName(name) => {
                self.node("PrivateIdentifier", span, [("name", Value::from(name.as_str()))])
            }
            ExprKind::This => self.node("ThisExpression", span, []),
            ExprKind::Super => self.node("Super", span, []),

            ExprKind::Array(elements) => {
                let elements = self.list(elements, |w, e| w.opt(e.as_ref(), Self::expr));
                self.node("ArrayExpression", span, [("elements", elements)])
            }
            ExprKind::Object(props) => {
                let properties = self.list(props, |w, prop| match prop {
                    ObjectProperty::Property(prop) => w.property(prop),
                    ObjectProperty::Spread(spread) => w.expr(spread),
                });
                self.node("ObjectExpression", span, [("properties", properties)])
            }
            ExprKind::Function(func) => self.function("FunctionExpression", func),
            ExprKind::Arrow(arrow) => self.arrow(arrow),
            ExprKind::Class(class) => self.class("ClassExpression", class),

            ExprKind::Unary { op, arg } => self.node(
                "UnaryExpression",
                span,
                [
                    ("operator", Value::from(op.as_str())),
                    ("prefix", Value::Bool(true)),
                    ("argument", self.expr(arg)),
                ],
            ),
            ExprKind::Binary { op, left, right } => self.node(
                if op.is_logical() {
                    "LogicalExpression"
                } else {
                    "BinaryExpression"
                },
                span,
                [
                    ("left", self.expr(left)),
                    ("operator", Value::from(op.as_str())),
                    ("right", self.expr(right)),
                ],
            ),
            ExprKind::Assign { op, left, right } => self.node(
                "AssignmentExpression",
                span,
                [
                    ("operator", Value::from(op.as_str())),
                    ("left", self.pattern(left)),
                    ("right", self.expr(right)),
                ],
            ),
            ExprKind::Update { op, prefix, arg } => self.node(
                "UpdateExpression",
                span,
                [
                    ("operator", Value::from(op.as_str())),
                    ("prefix", Value::from(*prefix)),
                    ("argument", self.expr(arg)),
                ],
            ),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => self.node(
                "ConditionalExpression",
                span,
                [
                    ("test", self.expr(test)),
                    ("consequent", self.expr(consequent)),
                    ("alternate", self.expr(alternate)),
                ],
            ),
            ExprKind::Sequence(exprs) => {
                self.node("SequenceExpression", span, [("expressions", self.list(exprs, Self::expr))])
            }

            ExprKind::Member {
                object,
                property,
                computed,
                optional,
            } => self.node(
                "MemberExpression",
                span,
                [
                    ("object", self.expr(object)),
                    ("property", self.expr(property)),
                    ("computed", Value::from(*computed)),
                    ("optional", Value::from(*optional)),
                ],
            ),
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.node(
                "CallExpression",
                span,
                [
                    ("callee", self.expr(callee)),
                    ("arguments", self.list(args, Self::expr)),
                    ("optional", Value::from(*optional)),
                ],
            ),
            ExprKind::Chain(inner) => {
                self.node("ChainExpression", span, [("expression", self.expr(inner))])
            }
            ExprKind::New { callee, args } => self.node(
                "NewExpression",
                span,
                [
                    ("callee", self.expr(callee)),
                    ("arguments", self.list(args, Self::expr)),
                ],
            ),
            ExprKind::TaggedTemplate { tag, quasi } => self.node(
                "TaggedTemplateExpression",
                span,
                [("tag", self.expr(tag)), ("quasi", self.template(quasi))],
            ),

            ExprKind::Spread(arg) => {
                self.node("SpreadElement", span, [("argument", self.expr(arg))])
            }
            ExprKind::Yield { arg, delegate } => self.node(
                "YieldExpression",
                span,
                [
                    ("delegate", Value::from(*delegate)),
                    ("argument", self.opt(arg.as_deref(), Self::expr)),
                ],
            ),
            ExprKind::Await(arg) => {
                self.node("AwaitExpression", span, [("argument", self.expr(arg))])
            }
            ExprKind::Import { source, options } => self.node(
                "ImportExpression",
                span,
                [
                    ("source", self.expr(source)),
                    ("options", self.opt(options.as_deref(), Self::expr)),
                ],
            ),
            ExprKind::MetaProperty { meta, property } => self.node(
                "MetaProperty",
                span,
                [
                    ("meta", self.identifier(meta)),
                    ("property", self.identifier(property)),
                ],
            ),
            ExprKind::Paren(inner) => {
                if self.options.preserve_parens {
                    self.node("ParenthesizedExpression", span, [("expression", self.expr(inner))])
                } else {
                    self.expr(inner)
                }
            }

            ExprKind::JsxElement(element) => self.jsx_element(element),
            ExprKind::JsxFragment(fragment) => self.jsx_fragment(fragment),
        }
    }

    fn property(&self, prop: &Property) -> Value {
        let kind = match prop.kind {
            PropertyKind::Get => "get",
            PropertyKind::Set => "set",
            PropertyKind::Init | PropertyKind::Method => "init",
        };
        self.node(
            "Property",
            prop.span,
            [
                ("method", Value::from(prop.kind == PropertyKind::Method)),
                ("shorthand", Value::from(prop.shorthand)),
                ("computed", Value::from(prop.computed)),
                ("key", self.expr(&prop.key)),
                ("value", self.expr(&prop.value)),
                ("kind", Value::from(kind)),
            ],
        )
    }

    fn template(&self, template: &Template) -> Value {
        let quasis = self.list(&template.quasis, |w, quasi| {
            w.node(
                "TemplateElement",
                quasi.span,
                [
                    (
                        "value",
                        json!({ "raw": quasi.raw, "cooked": quasi.cooked }),
                    ),
                    ("tail", Value::from(quasi.tail)),
                ],
            )
        });
        self.node(
            "TemplateLiteral",
            template.span,
            [
                ("expressions", self.list(&template.exprs, Self::expr)),
                ("quasis", quasis),
            ],
        )
    }

    // =========================================================================
    // JSX
    // =========================================================================

    fn jsx_identifier(&self, id: &JsxIdentifier) -> Value {
        self.node("JSXIdentifier", id.span, [("name", Value::from(id.name.as_str()))])
    }

    fn jsx_namespaced(&self, namespace: &JsxIdentifier, name: &JsxIdentifier) -> Value {
        self.node(
            "JSXNamespacedName",
            namespace.span.merge(name.span),
            [
                ("namespace", self.jsx_identifier(namespace)),
                ("name", self.jsx_identifier(name)),
            ],
        )
    }

    fn jsx_element_name(&self, name: &JsxElementName) -> Value {
        match name {
            JsxElementName::Ident(id) => self.jsx_identifier(id),
            JsxElementName::Namespaced { namespace, name } => self.jsx_namespaced(namespace, name),
            JsxElementName::Member(parts) => {
                let Some((first, rest)) = parts.split_first() else {
                    return Value::Null;
                };
                let start = first.span.start;
                rest.iter().fold(self.jsx_identifier(first), |object, part| {
                    self.node(
                        "JSXMemberExpression",
                        Span::new(start, part.span.end),
                        [("object", object), ("property", self.jsx_identifier(part))],
                    )
                })
            }
        }
    }

    fn jsx_element(&self, element: &JsxElement) -> Value {
        with_stack(|| self.write_jsx_element(element))
    }

    fn write_jsx_element(&self, element: &JsxElement) -> Value {
        let opening = &element.opening;
        let attributes = self.list(&opening.attributes, Self::jsx_attribute);
        let opening = self.node(
            "JSXOpeningElement",
            opening.span,
            [
                ("name", self.jsx_element_name(&opening.name)),
                ("attributes", attributes),
                ("selfClosing", Value::from(opening.self_closing)),
            ],
        );
        let closing = self.opt(element.closing.as_ref(), |w, closing| {
            w.node(
                "JSXClosingElement",
                closing.span,
                [("name", w.jsx_element_name(&closing.name))],
            )
        });
        self.node(
            "JSXElement",
            element.span,
            [
                ("openingElement", opening),
                ("closingElement", closing),
                ("children", self.list(&element.children, Self::jsx_child)),
            ],
        )
    }

    fn jsx_fragment(&self, fragment: &JsxFragment) -> Value {
        self.node(
            "JSXFragment",
            fragment.span,
            [
                ("openingFragment", self.node("JSXOpeningFragment", fragment.opening_span, [])),
                ("closingFragment", self.node("JSXClosingFragment", fragment.closing_span, [])),
                ("children", self.list(&fragment.children, Self::jsx_child)),
            ],
        )
    }

    fn jsx_attribute(&self, attr: &JsxAttribute) -> Value {
        match attr {
            JsxAttribute::Attribute { name, value, span } => {
                let name = match name {
                    JsxAttrName::Ident(id) => self.jsx_identifier(id),
                    JsxAttrName::Namespaced { namespace, name } => {
                        self.jsx_namespaced(namespace, name)
                    }
                };
                let value = self.opt(value.as_ref(), |w, value| match value {
                    JsxAttrValue::String(lit) => w.string_literal(lit),
                    JsxAttrValue::Expr(container) => w.jsx_expr_container(container),
                    JsxAttrValue::Element(element) => w.jsx_element(element),
                    JsxAttrValue::Fragment(fragment) => w.jsx_fragment(fragment),
                });
                self.node("JSXAttribute", *span, [("name", name), ("value", value)])
            }
            JsxAttribute::Spread { argument, span } => {
                self.node("JSXSpreadAttribute", *span, [("argument", self.expr(argument))])
            }
        }
    }

    fn jsx_expr_container(&self, container: &JsxExprContainer) -> Value {
        let expression = match &container.expr {
            Some(expr) => self.expr(expr),
            None => {
                let span = container.span;
                let inner = Span::new(span.start + 1, span.end.saturating_sub(1).max(span.start + 1));
                self.node("JSXEmptyExpression", inner, [])
            }
        };
        self.node("JSXExpressionContainer", container.span, [("expression", expression)])
    }

    fn jsx_child(&self, child: &JsxChild) -> Value {
        match child {
            JsxChild::Text { value, span } => {
                let mut map = self.node_map("JSXText", *span, [("value", Value::from(value.as_str()))]);
                if self.options.raw {
                    map.insert("raw".to_owned(), Value::from(span.slice(self.source)));
                }
                Value::Object(map)
            }
            JsxChild::Element(element) => self.jsx_element(element),
            JsxChild::Fragment(fragment) => self.jsx_fragment(fragment),
            JsxChild::Expr(container) => self.jsx_expr_container(container),
            JsxChild::Spread { expr, span } => {
                self.node("JSXSpreadChild", *span, [("expression", self.expr(expr))])
            }
        }
    }
}

/// Integral numbers print without a fraction (`1`, not `1.0`); values JSON
/// cannot represent (`Infinity` from `1e400`) become `null`.
fn number(value: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE && !(value == 0.0 && value.is_sign_negative()) {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SourceType;

    fn estree(source: &str, options: ParserOptions) -> Value {
        crate::parse_estree(source, options).unwrap()
    }

    fn first_expr(source: &str, options: ParserOptions) -> Value {
        estree(source, options)["body"][0]["expression"].clone()
    }

    #[test]
    fn test_program_shape() {
        let program = estree("x;", ParserOptions::default());
        assert_eq!(
            program,
            json!({
                "type": "Program",
                "body": [{
                    "type": "ExpressionStatement",
                    "expression": { "type": "Identifier", "name": "x" }
                }],
                "sourceType": "script"
            })
        );
    }

    #[test]
    fn test_key_order_follows_estree() {
        let program = estree("a;", ParserOptions::default().with_ranges(true));
        let keys: Vec<_> = program.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["type", "start", "end", "range", "body", "sourceType"]);
    }

    #[test]
    fn test_ranges_and_loc() {
        let options = ParserOptions::default().with_ranges(true).with_loc(true);
        let expr = first_expr("\n  foo", options);
        assert_eq!(expr["start"], 3);
        assert_eq!(expr["end"], 6);
        assert_eq!(expr["range"], json!([3, 6]));
        assert_eq!(
            expr["loc"],
            json!({ "start": { "line": 2, "column": 2 }, "end": { "line": 2, "column": 5 } })
        );
    }

    #[test]
    fn test_loc_columns_use_utf16_units() {
        let options = ParserOptions::default().with_loc(true);
        let program = estree("'😀'; x", options);
        assert_eq!(program["body"][1]["loc"]["start"], json!({ "line": 1, "column": 6 }));
    }

    #[test]
    fn test_literals() {
        let options = ParserOptions::default().with_raw(true);
        assert_eq!(
            first_expr("0x10", options.clone()),
            json!({ "type": "Literal", "value": 16, "raw": "0x10" })
        );
        assert_eq!(first_expr("1.5", options.clone())["value"], json!(1.5));
        assert_eq!(first_expr("'a\\n'", options.clone())["value"], "a\n");
        assert_eq!(first_expr("'a\\n'", options.clone())["raw"], "'a\\n'");
        assert_eq!(
            first_expr("/ab+/gi", options.clone()),
            json!({
                "type": "Literal",
                "value": null,
                "raw": "/ab+/gi",
                "regex": { "pattern": "ab+", "flags": "gi" }
            })
        );
        assert_eq!(
            first_expr("1_000n", options),
            json!({ "type": "Literal", "value": null, "raw": "1_000n", "bigint": "1000" })
        );
    }

    #[test]
    fn test_raw_is_opt_in() {
        let expr = first_expr("null", ParserOptions::default());
        assert_eq!(expr, json!({ "type": "Literal", "value": null }));
    }

    #[test]
    fn test_directive() {
        let program = estree("'use strict'; x", ParserOptions::default());
        assert_eq!(program["body"][0]["directive"], "use strict");
        assert!(program["body"][1].get("directive").is_none());
    }

    #[test]
    fn test_logical_and_binary() {
        let expr = first_expr("a ?? b", ParserOptions::default());
        assert_eq!(expr["type"], "LogicalExpression");
        assert_eq!(expr["operator"], "??");
        let expr = first_expr("a | b", ParserOptions::default());
        assert_eq!(expr["type"], "BinaryExpression");
    }

    #[test]
    fn test_parentheses() {
        let expr = first_expr("(a)", ParserOptions::default());
        assert_eq!(expr["type"], "Identifier");

        let options = ParserOptions::default().with_preserve_parens(true).with_ranges(true);
        let expr = first_expr("((a))", options);
        assert_eq!(expr["type"], "ParenthesizedExpression");
        assert_eq!(expr["range"], json!([0, 5]));
        assert_eq!(expr["expression"]["type"], "ParenthesizedExpression");
        assert_eq!(expr["expression"]["expression"]["name"], "a");
    }

    #[test]
    fn test_optional_chain() {
        let expr = first_expr("a?.b()", ParserOptions::default());
        assert_eq!(expr["type"], "ChainExpression");
        assert_eq!(expr["expression"]["type"], "CallExpression");
        assert_eq!(expr["expression"]["optional"], false);
        assert_eq!(expr["expression"]["callee"]["optional"], true);
    }

    #[test]
    fn test_template_values() {
        let expr = first_expr("tag`a\\u{g}${x}b`", ParserOptions::default());
        let quasis = &expr["quasi"]["quasis"];
        assert_eq!(quasis[0]["value"], json!({ "raw": "a\\u{g}", "cooked": null }));
        assert_eq!(quasis[1]["value"], json!({ "raw": "b", "cooked": "b" }));
        assert_eq!(quasis[1]["tail"], true);
    }

    #[test]
    fn test_dynamic_import() {
        let expr = first_expr("import('x')", ParserOptions::default());
        assert_eq!(expr["type"], "ImportExpression");
        assert_eq!(expr["options"], Value::Null);
    }

    #[test]
    fn test_object_property_kinds() {
        let expr = first_expr("({ a, b() {}, get c() {} })", ParserOptions::default());
        let props = &expr["properties"];
        assert_eq!(props[0]["shorthand"], true);
        assert_eq!(props[1]["method"], true);
        assert_eq!(props[1]["kind"], "init");
        assert_eq!(props[2]["kind"], "get");
    }

    #[test]
    fn test_module_nodes_carry_attributes() {
        let options = ParserOptions::default()
            .with_source_type(SourceType::Module)
            .with_next(true);
        let program = estree(
            "import a from 'a' with { type: 'json' }; export * from 'b';",
            options,
        );
        assert_eq!(program["sourceType"], "module");
        let attrs = &program["body"][0]["attributes"];
        assert_eq!(attrs[0]["type"], "ImportAttribute");
        assert_eq!(attrs[0]["key"]["name"], "type");
        assert_eq!(attrs[0]["value"]["value"], "json");
        assert_eq!(program["body"][1]["attributes"], json!([]));
    }

    #[test]
    fn test_decorators_only_when_present() {
        let options = ParserOptions::default().with_next(true);
        let program = estree("@dec class A { @m x = 1; y() {} }", options);
        let class = &program["body"][0];
        assert_eq!(class["decorators"][0]["expression"]["name"], "dec");
        let members = &class["body"]["body"];
        assert_eq!(members[0]["type"], "PropertyDefinition");
        assert_eq!(members[0]["decorators"][0]["expression"]["name"], "m");
        assert!(members[1].get("decorators").is_none());
    }

    #[test]
    fn test_jsx_nodes() {
        let options = ParserOptions::default().with_jsx(true).with_ranges(true).with_raw(true);
        let expr = first_expr("<A.B c='d'>t{}</A.B>", options);
        assert_eq!(expr["type"], "JSXElement");
        let name = &expr["openingElement"]["name"];
        assert_eq!(name["type"], "JSXMemberExpression");
        assert_eq!(name["range"], json!([1, 4]));
        assert_eq!(expr["openingElement"]["attributes"][0]["value"]["raw"], "'d'");
        let children = &expr["children"];
        assert_eq!(children[0], json!({
            "type": "JSXText", "start": 11, "end": 12, "range": [11, 12], "value": "t", "raw": "t"
        }));
        assert_eq!(children[1]["expression"]["type"], "JSXEmptyExpression");
        assert_eq!(children[1]["expression"]["range"], json!([13, 13]));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(3.0), json!(3));
        assert_eq!(number(0.25), json!(0.25));
        assert_eq!(number(f64::INFINITY), Value::Null);
    }
}
