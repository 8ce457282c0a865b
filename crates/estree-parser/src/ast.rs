//! AST node types for ECMAScript and JSX.
//!
//! Every node is an Expression, Pattern, or Statement (plus a few helper
//! structs for functions, classes, modules and JSX). The shapes follow
//! ESTree closely so the JSON view in [`crate::estree`] is a direct walk.
//!
//! Parentheses are always recorded as [`ExprKind::Paren`]; the ESTree view
//! drops them unless `preserveParens` is set.

use std::fmt;

use crate::context::SourceType;
use crate::span::Span;

/// The root of a parsed script or module.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub source_type: SourceType,
    pub span: Span,
    /// Local bindings named by `export` declarations and `export { .. }`
    /// clauses without `from`, in source order. Empty for scripts. Not
    /// checked against declarations, and not part of the ESTree view.
    pub exported_bindings: Vec<Identifier>,
}

/// A named node: binding names, labels, function and class ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A string literal outside expression position (module sources, JSX attributes).
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Look through any number of parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparenthesized(),
            _ => self,
        }
    }
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // === Literals ===
    /// Null literal
    Null,
    /// Boolean literal
    Bool(bool),
    /// Number literal
    Number(f64),
    /// BigInt literal, digits without the `n` suffix
    BigInt(String),
    /// String literal (cooked value)
    String(String),
    /// Regular expression
    Regex { pattern: String, flags: String },
    /// Template literal
    Template(Template),

    // === Identifiers ===
    /// Identifier reference
    Ident(String),
    /// `#x` (only as the left operand of `in`, or a member property)
    PrivateName(String),
    /// `this` keyword
    This,
    /// `super` keyword (only as a callee or member object)
    Super,

    // === Compound Expressions ===
    /// Array literal: `[a, , ...b]`
    Array(Vec<Option<Expr>>),
    /// Object literal: `{a: 1, b, ...c}`
    Object(Vec<ObjectProperty>),
    /// Function expression: `function() {}`
    Function(Box<Function>),
    /// Arrow function: `() => {}`
    Arrow(Box<ArrowFunction>),
    /// Class expression: `class {}`
    Class(Box<Class>),

    // === Operations ===
    /// Unary operation: `!x`, `-x`, `typeof x`
    Unary { op: UnaryOp, arg: Box<Expr> },
    /// Binary or logical operation: `a + b`, `a && b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Assignment: `a = b`, `[a] = b`, `a += b`
    Assign {
        op: AssignOp,
        left: Box<Pattern>,
        right: Box<Expr>,
    },
    /// Update expression: `++a`, `a++`
    Update {
        op: UpdateOp,
        prefix: bool,
        arg: Box<Expr>,
    },
    /// Conditional: `a ? b : c`
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    /// Sequence: `a, b, c`
    Sequence(Vec<Expr>),

    // === Member Access ===
    /// Member expression: `a.b`, `a[b]`, `a.#b`, `a?.b`
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
        optional: bool,
    },
    /// Call expression: `f(a)`, `f?.(a)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    /// The outermost node of an optional chain: `a?.b.c`
    Chain(Box<Expr>),
    /// New expression: `new Foo(a)`
    New { callee: Box<Expr>, args: Vec<Expr> },
    /// Tagged template: `` tag`hello` ``
    TaggedTemplate { tag: Box<Expr>, quasi: Template },

    // === Special ===
    /// Spread in arrays, calls and object literals: `...x`
    Spread(Box<Expr>),
    /// Yield expression: `yield x`, `yield* x`
    Yield {
        arg: Option<Box<Expr>>,
        delegate: bool,
    },
    /// Await expression: `await x`
    Await(Box<Expr>),
    /// Dynamic import: `import(x)`, `import(x, options)`
    Import {
        source: Box<Expr>,
        options: Option<Box<Expr>>,
    },
    /// `new.target`, `import.meta`
    MetaProperty { meta: Identifier, property: Identifier },
    /// Parenthesized expression: `(a)`
    Paren(Box<Expr>),

    // === JSX ===
    JsxElement(Box<JsxElement>),
    JsxFragment(Box<JsxFragment>),
}

/// A template literal: quasis interleaved with expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub quasis: Vec<TemplateElement>,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

/// One literal chunk of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    /// `None` for an invalid escape in a tagged template.
    pub cooked: Option<String>,
    pub raw: String,
    pub tail: bool,
    pub span: Span,
}

/// Entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Property(Property),
    /// `...expr` (an [`ExprKind::Spread`] node)
    Spread(Expr),
}

/// Object literal property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Expr,
    pub value: Expr,
    pub kind: PropertyKind,
    pub computed: bool,
    pub shorthand: bool,
    pub span: Span,
}

/// Property kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
    Method,
}

// =============================================================================
// Patterns
// =============================================================================

/// A binding or assignment target.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A lone identifier.
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, PatternKind::Ident(_))
    }

    /// Append every name this pattern binds, in source order.
    pub fn bound_names(&self, out: &mut Vec<Identifier>) {
        match &self.kind {
            PatternKind::Ident(name) => out.push(Identifier::new(name.clone(), self.span)),
            PatternKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    element.bound_names(out);
                }
            }
            PatternKind::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectPatternProperty::Property { value, .. } => value.bound_names(out),
                        ObjectPatternProperty::Rest(rest) => rest.bound_names(out),
                    }
                }
            }
            PatternKind::Assign { left, .. } => left.bound_names(out),
            PatternKind::Rest(arg) => arg.bound_names(out),
            PatternKind::Expr(_) => {}
        }
    }
}

/// Pattern kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// Identifier: `x`
    Ident(String),
    /// Array pattern: `[a, , b]`
    Array(Vec<Option<Pattern>>),
    /// Object pattern: `{a, b: c, ...d}`
    Object(Vec<ObjectPatternProperty>),
    /// Default value: `a = 1`
    Assign { left: Box<Pattern>, right: Box<Expr> },
    /// Rest element: `...a`
    Rest(Box<Pattern>),
    /// Member expression target (assignment only): `a.b`
    Expr(Box<Expr>),
}

/// Entry of an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPatternProperty {
    Property {
        key: Expr,
        value: Pattern,
        computed: bool,
        shorthand: bool,
        span: Span,
    },
    /// `...rest` (a [`PatternKind::Rest`] pattern)
    Rest(Pattern),
}

// =============================================================================
// Functions and Classes
// =============================================================================

/// A function declaration, expression, or method value.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStmt,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

/// Arrow function.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub span: Span,
}

/// Arrow function body.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(BlockStmt),
}

/// A braced statement list with its own span (function bodies, try blocks).
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Class declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Identifier>,
    pub super_class: Option<Box<Expr>>,
    pub body: Vec<ClassMember>,
    pub decorators: Vec<Decorator>,
    /// Span of `{ ... }`.
    pub body_span: Span,
    pub span: Span,
}

/// Class member.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub span: Span,
}

/// Class member kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    /// Method, getter, setter or constructor
    Method {
        key: Expr,
        value: Function,
        kind: MethodKind,
        computed: bool,
        is_static: bool,
        decorators: Vec<Decorator>,
    },
    /// Field: `x = 1;`, `static #y;`
    Property {
        key: Expr,
        value: Option<Expr>,
        computed: bool,
        is_static: bool,
        decorators: Vec<Decorator>,
    },
    /// Static initialization block: `static { }`
    StaticBlock(Vec<Stmt>),
}

/// Method kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

/// `@expr` before a class or class member.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub expr: Expr,
    pub span: Span,
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    // === Declarations ===
    /// `var`, `let`, `const`
    Var(VarDecl),
    /// Function declaration
    Function(Box<Function>),
    /// Class declaration
    Class(Box<Class>),

    // === Basic Statements ===
    /// Expression statement
    Expr(Expr),
    /// Directive prologue entry: `"use strict";`. `value` is the raw text between the quotes.
    Directive { expr: Expr, value: String },
    /// Block statement: `{ ... }`
    Block(Vec<Stmt>),
    /// Empty statement: `;`
    Empty,
    /// Debugger statement
    Debugger,

    // === Control Flow ===
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        left: ForHead,
        right: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    While { test: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, test: Expr },
    Break { label: Option<Identifier> },
    Continue { label: Option<Identifier> },
    Return { arg: Option<Expr> },
    Throw { arg: Expr },
    Try {
        block: BlockStmt,
        handler: Option<CatchClause>,
        finalizer: Option<BlockStmt>,
    },
    With { object: Expr, body: Box<Stmt> },
    Labeled { label: Identifier, body: Box<Stmt> },

    // === Modules ===
    Import(Box<ImportDecl>),
    Export(Box<ExportDecl>),
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// `var a = 1, b`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub decls: Vec<VarDeclarator>,
    pub span: Span,
}

/// Variable declarator: `x = 1`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub binding: Pattern,
    pub init: Option<Expr>,
    pub span: Span,
}

/// First clause of a classic `for`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Expr),
}

/// Left side of `for-in` / `for-of`.
#[derive(Debug, Clone, PartialEq)]
pub enum ForHead {
    Var(VarDecl),
    Pattern(Pattern),
}

/// Switch case.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
    pub span: Span,
}

/// Catch clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStmt,
    pub span: Span,
}

// =============================================================================
// Modules
// =============================================================================

/// `import ... from "source"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StringLiteral,
    pub attributes: Vec<ImportAttribute>,
}

/// Import specifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import foo from "mod"`
    Default { local: Identifier, span: Span },
    /// `import * as foo from "mod"`
    Namespace { local: Identifier, span: Span },
    /// `import { foo as bar } from "mod"`
    Named {
        imported: ModuleExportName,
        local: Identifier,
        span: Span,
    },
}

/// An export/import name: an IdentifierName or a string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleExportName {
    Ident(Identifier),
    String(StringLiteral),
}

impl ModuleExportName {
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Ident(id) => &id.name,
            ModuleExportName::String(s) => &s.value,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ModuleExportName::Ident(id) => id.span,
            ModuleExportName::String(s) => s.span,
        }
    }
}

/// `with { type: "json" }` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportAttribute {
    pub key: ModuleExportName,
    pub value: StringLiteral,
    pub span: Span,
}

/// Export declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// `export { a, b as c }` or `export { a } from "mod"`
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<StringLiteral>,
        attributes: Vec<ImportAttribute>,
    },
    /// `export const x = 1`, `export function f() {}`
    Decl(Stmt),
    /// `export default ...`
    Default(ExportDefault),
    /// `export * from "mod"`, `export * as ns from "mod"`
    All {
        exported: Option<ModuleExportName>,
        source: StringLiteral,
        attributes: Vec<ImportAttribute>,
    },
}

/// What follows `export default`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDefault {
    Function(Box<Function>),
    Class(Box<Class>),
    Expr(Expr),
}

/// Export specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
    pub span: Span,
}

// =============================================================================
// JSX
// =============================================================================

/// `<a b="c">...</a>` or `<a />`
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub opening: JsxOpeningElement,
    pub children: Vec<JsxChild>,
    pub closing: Option<JsxClosingElement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxOpeningElement {
    pub name: JsxElementName,
    pub attributes: Vec<JsxAttribute>,
    pub self_closing: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxClosingElement {
    pub name: JsxElementName,
    pub span: Span,
}

/// `<>...</>`
#[derive(Debug, Clone, PartialEq)]
pub struct JsxFragment {
    pub opening_span: Span,
    pub children: Vec<JsxChild>,
    pub closing_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxIdentifier {
    pub name: String,
    pub span: Span,
}

/// Tag name: `div`, `svg:path`, `Foo.Bar.Baz`
#[derive(Debug, Clone, PartialEq)]
pub enum JsxElementName {
    Ident(JsxIdentifier),
    Namespaced {
        namespace: JsxIdentifier,
        name: JsxIdentifier,
    },
    /// At least two segments.
    Member(Vec<JsxIdentifier>),
}

impl fmt::Display for JsxElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsxElementName::Ident(id) => f.write_str(&id.name),
            JsxElementName::Namespaced { namespace, name } => {
                write!(f, "{}:{}", namespace.name, name.name)
            }
            JsxElementName::Member(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&part.name)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttribute {
    Attribute {
        name: JsxAttrName,
        value: Option<JsxAttrValue>,
        span: Span,
    },
    /// `{...props}`
    Spread { argument: Expr, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrName {
    Ident(JsxIdentifier),
    Namespaced {
        namespace: JsxIdentifier,
        name: JsxIdentifier,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    String(StringLiteral),
    Expr(JsxExprContainer),
    Element(Box<JsxElement>),
    Fragment(Box<JsxFragment>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text { value: String, span: Span },
    Element(Box<JsxElement>),
    Fragment(Box<JsxFragment>),
    Expr(JsxExprContainer),
    /// `{...children}`
    Spread { expr: Expr, span: Span },
}

/// `{expr}`; `expr` is `None` for `{}` or `{/* comment */}`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxExprContainer {
    pub expr: Option<Expr>,
    pub span: Span,
}

// =============================================================================
// Operators
// =============================================================================

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// Binary operators (logical operators included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,

    // Logical
    And,
    Or,
    NullishCoalesce,

    // Other
    In,
    Instanceof,
}

impl BinaryOp {
    /// `&&`, `||` and `??` become `LogicalExpression` in ESTree.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::NullishCoalesce)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalesce => "??",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
    /// `**=`
    PowAssign,
    /// `&=`
    BitAndAssign,
    /// `|=`
    BitOrAssign,
    /// `^=`
    BitXorAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    UShrAssign,
    /// `&&=`
    AndAssign,
    /// `||=`
    OrAssign,
    /// `??=`
    NullishAssign,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::PowAssign => "**=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
            AssignOp::AndAssign => "&&=",
            AssignOp::OrAssign => "||=",
            AssignOp::NullishAssign => "??=",
        }
    }
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Pattern {
        Pattern::new(
            PatternKind::Ident(name.into()),
            Span::new(start, start + name.len() as u32),
        )
    }

    #[test]
    fn test_bound_names_walks_nested_patterns() {
        // [a, {b: c = 1}, ...d]
        let object = Pattern::new(
            PatternKind::Object(vec![ObjectPatternProperty::Property {
                key: Expr::new(ExprKind::Ident("b".into()), Span::new(5, 6)),
                value: Pattern::new(
                    PatternKind::Assign {
                        left: Box::new(ident("c", 8)),
                        right: Box::new(Expr::new(ExprKind::Number(1.0), Span::new(12, 13))),
                    },
                    Span::new(8, 13),
                ),
                computed: false,
                shorthand: false,
                span: Span::new(5, 13),
            }]),
            Span::new(4, 14),
        );
        let rest = Pattern::new(PatternKind::Rest(Box::new(ident("d", 19))), Span::new(16, 20));
        let array = Pattern::new(
            PatternKind::Array(vec![Some(ident("a", 1)), Some(object), None, Some(rest)]),
            Span::new(0, 21),
        );

        let mut names = Vec::new();
        array.bound_names(&mut names);
        let names: Vec<_> = names.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[test]
    fn test_unparenthesized() {
        let inner = Expr::new(ExprKind::Ident("x".into()), Span::new(2, 3));
        let once = Expr::new(ExprKind::Paren(Box::new(inner.clone())), Span::new(1, 4));
        let twice = Expr::new(ExprKind::Paren(Box::new(once)), Span::new(0, 5));
        assert_eq!(twice.unparenthesized(), &inner);
    }

    #[test]
    fn test_jsx_name_display() {
        let id = |name: &str| JsxIdentifier { name: name.into(), span: Span::default() };
        let member = JsxElementName::Member(vec![id("Foo"), id("Bar")]);
        assert_eq!(member.to_string(), "Foo.Bar");
        let ns = JsxElementName::Namespaced { namespace: id("svg"), name: id("path") };
        assert_eq!(ns.to_string(), "svg:path");
    }
}
