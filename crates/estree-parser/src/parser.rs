//! ECMAScript parser.
//!
//! Uses a recursive descent parser with Pratt parsing for expressions.
//! This file holds the token plumbing, statements, binding patterns and
//! module declarations; expressions, functions/classes and JSX live in
//! their own modules as further `impl Parser` blocks.
//!
//! Every parsing function takes the current [`Context`] by value and
//! returns `Result<_, ParseError>`; the first error aborts the parse.

use crate::ast::*;
use crate::context::{Context, ParserOptions};
use crate::cover::{self, CoverErrors};
use crate::error::{ErrorKind, ParseError};
use crate::function::PrivateScope;
use crate::lexer::Lexer;
use crate::scope::{BindingKind, DeclFlags, ExportTracker, ScopeKind, ScopeTree};
use crate::span::Span;
use crate::token::{describe, is_strict_reserved, Token, TokenKind};

/// Deepest nesting of expressions, statements, patterns or JSX elements.
const MAX_DEPTH: u32 = 1024;

/// Grow onto a fresh stack segment when less than this remains.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Run `f` on a stack with at least the red zone left, growing it if needed.
pub(crate) fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

/// A label in scope.
#[derive(Debug, Clone)]
pub(crate) struct Label {
    pub name: String,
    /// Labels an iteration statement, so `continue` may target it.
    pub is_loop: bool,
}

/// The parser.
pub struct Parser<'a> {
    /// The lexer.
    pub(crate) lexer: Lexer<'a>,
    /// Current token.
    pub(crate) current: Token,
    /// End offset of the previously consumed token.
    pub(crate) prev_end: u32,
    /// Parser options.
    pub(crate) options: ParserOptions,
    /// Source code.
    pub(crate) source: &'a str,
    pub(crate) scopes: ScopeTree,
    pub(crate) exports: ExportTracker,
    /// Labels of the enclosing statements in the current function.
    pub(crate) labels: Vec<Label>,
    /// Labels directly in front of the statement being parsed.
    pub(crate) fresh_labels: usize,
    /// One entry per enclosing class body.
    pub(crate) private_scopes: Vec<PrivateScope>,
    /// Start offset of an expression that may still turn out to be an arrow.
    pub(crate) potential_arrow_at: Option<u32>,
    /// First `yield` expression since the last function or parenthesized list.
    pub(crate) yield_pos: Option<Span>,
    /// First `await` expression since the last function or parenthesized list.
    pub(crate) await_pos: Option<Span>,
    /// First `await` used as an identifier, for `async (await) => x`.
    pub(crate) await_ident_pos: Option<Span>,
    /// Current nesting depth, bounded by [`MAX_DEPTH`].
    depth: u32,
}

impl<'a> Parser<'a> {
    /// Create a new parser and scan the first token.
    pub fn new(source: &'a str, options: ParserOptions) -> Result<Self, ParseError> {
        let html_comments = options.webcompat && !options.is_module();
        let mut lexer = Lexer::new(source).with_html_comments(html_comments);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            prev_end: 0,
            scopes: ScopeTree::new(options.webcompat),
            exports: ExportTracker::default(),
            options,
            source,
            labels: Vec::new(),
            fresh_labels: 0,
            private_scopes: Vec::new(),
            potential_arrow_at: None,
            yield_pos: None,
            await_pos: None,
            await_ident_pos: None,
            depth: 0,
        })
    }

    /// Parse the entire source into a [`Program`].
    pub fn parse(mut self) -> Result<Program, ParseError> {
        self.parse_program()
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    /// Parse one nesting level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(ErrorKind::NestingTooDeep, self.current.span));
        }
        self.depth += 1;
        let result = with_stack(|| f(self));
        self.depth -= 1;
        result
    }

    /// Get the current token kind.
    pub(crate) fn peek(&self) -> &TokenKind {
        &self.current.kind
    }

    /// Look one token past the current one.
    pub(crate) fn peek_next(&self) -> Token {
        self.lexer.peek()
    }

    /// Advance to the next token and return the previous.
    pub(crate) fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        self.prev_end = self.current.span.end;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Check if the current token matches the given kind.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    /// Check if at end of file.
    pub(crate) fn is_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// Consume a token if it matches, returning true if consumed.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume a token if it matches, otherwise return an error.
    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            return self.advance();
        }
        if self.is_eof() {
            return Err(ParseError::new(ErrorKind::UnexpectedEof, self.current.span));
        }
        Err(ParseError::new(
            ErrorKind::Expected {
                expected: describe(kind),
                found: describe(self.peek()),
            },
            self.current.span,
        ))
    }

    /// Automatic semicolon insertion: an explicit `;`, or a `}`, end of
    /// input, or line break in front of the current token.
    pub(crate) fn can_insert_semicolon(&self) -> bool {
        matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) || self.current.newline_before
    }

    /// Consume a semicolon (with ASI support).
    pub(crate) fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon)? || self.can_insert_semicolon() {
            return Ok(());
        }
        Err(self.unexpected())
    }

    /// Error for the current token.
    pub(crate) fn unexpected(&self) -> ParseError {
        let kind = match self.peek() {
            TokenKind::Eof => ErrorKind::UnexpectedEof,
            TokenKind::EscapedKeyword(_) => ErrorKind::EscapedKeyword,
            kind => ErrorKind::UnexpectedToken(describe(kind)),
        };
        ParseError::new(kind, self.current.span)
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    /// The current token is an identifier or a contextual word.
    pub(crate) fn at_identifier(&self) -> bool {
        self.peek().identifier_name().is_some()
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Rules shared by identifier references, labels and bindings.
    pub(crate) fn check_identifier(&mut self, ctx: Context, name: &str, span: Span) -> Result<(), ParseError> {
        match name {
            "yield" if ctx.yield_reserved() => {
                let kind = if ctx.strict {
                    ErrorKind::StrictReservedWord(name.to_string())
                } else {
                    ErrorKind::ReservedWord(name.to_string())
                };
                Err(ParseError::new(kind, span))
            }
            "await" if ctx.await_reserved() => {
                Err(ParseError::new(ErrorKind::ReservedWord(name.to_string()), span))
            }
            "await" => {
                self.await_ident_pos.get_or_insert(span);
                Ok(())
            }
            _ if ctx.strict && is_strict_reserved(name) => Err(ParseError::new(
                ErrorKind::StrictReservedWord(name.to_string()),
                span,
            )),
            _ => Ok(()),
        }
    }

    /// A name about to be bound: identifier rules plus `eval`/`arguments`.
    pub(crate) fn check_binding_name(&mut self, ctx: Context, name: &str, span: Span) -> Result<(), ParseError> {
        self.check_identifier(ctx, name, span)?;
        if ctx.strict && matches!(name, "eval" | "arguments") {
            return Err(ParseError::new(
                ErrorKind::StrictEvalArguments(name.to_string()),
                span,
            ));
        }
        Ok(())
    }

    /// Consume a binding identifier.
    pub(crate) fn parse_binding_identifier(&mut self, ctx: Context, lexical: bool) -> Result<Identifier, ParseError> {
        let span = self.current.span;
        let Some(name) = self.peek().identifier_name().map(str::to_string) else {
            if self.peek().is_reserved() {
                return Err(ParseError::new(ErrorKind::ReservedWord(describe(self.peek())), span));
            }
            return Err(self.unexpected());
        };
        self.check_binding_name(ctx, &name, span)?;
        if lexical && name == "let" {
            return Err(ParseError::new(ErrorKind::LetInLexicalBinding, span));
        }
        self.advance()?;
        Ok(Identifier::new(name, span))
    }

    // =========================================================================
    // Program Parsing
    // =========================================================================

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let root = self.scopes.create(ScopeKind::Program, None);
        let ctx = Context::program(root, &self.options);
        let (body, _) = self.parse_directives_and_statements(ctx, &TokenKind::Eof)?;
        Ok(Program {
            body,
            source_type: self.options.source_type,
            span: Span::new(0, self.source.len() as u32),
            exported_bindings: self.exports.take_bindings(),
        })
    }

    /// Parse a statement list that may open with a directive prologue.
    /// Returns the statements and whether a `"use strict"` directive was seen.
    pub(crate) fn parse_directives_and_statements(
        &mut self,
        mut ctx: Context,
        end: &TokenKind,
    ) -> Result<(Vec<Stmt>, bool), ParseError> {
        let mut body = Vec::new();
        let mut use_strict = false;
        let mut octal_directive = None;
        let mut in_prologue = true;

        while !self.check(end) {
            if !in_prologue || !matches!(self.peek(), TokenKind::String(_)) {
                in_prologue = false;
                body.push(self.parse_statement_list_item(ctx)?);
                continue;
            }

            let token = self.current.clone();
            let stmt = self.parse_statement_list_item(ctx)?;
            let span = stmt.span;
            match stmt.kind {
                StmtKind::Expr(expr) if is_directive(&expr, &token) => {
                    let raw = token.span.slice(self.source);
                    let value = raw[1..raw.len() - 1].to_string();
                    if token.legacy_octal {
                        octal_directive.get_or_insert(token.span);
                    }
                    if value == "use strict" {
                        if let Some(octal) = octal_directive {
                            return Err(ParseError::new(ErrorKind::LegacyOctalEscape, octal));
                        }
                        use_strict = true;
                        ctx = ctx.with_strict();
                    }
                    body.push(Stmt::new(StmtKind::Directive { expr, value }, span));
                }
                kind => {
                    in_prologue = false;
                    body.push(Stmt::new(kind, span));
                }
            }
        }
        Ok((body, use_strict))
    }

    // =========================================================================
    // Statement Parsing
    // =========================================================================

    /// Parse a statement or declaration.
    pub(crate) fn parse_statement_list_item(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        match self.peek() {
            TokenKind::Function => self.parse_function_declaration(ctx, start, false),
            TokenKind::Async if self.at_async_function() => {
                self.advance()?;
                self.parse_function_declaration(ctx, start, true)
            }
            TokenKind::Class => self.parse_class_declaration(ctx, start, Vec::new()),
            TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                match self.peek() {
                    TokenKind::Class => self.parse_class_declaration(ctx, start, decorators),
                    TokenKind::Export => self.parse_export_declaration(ctx, start, decorators),
                    _ => Err(self.unexpected()),
                }
            }
            TokenKind::Const => self.parse_lexical_statement(ctx, VarKind::Const),
            TokenKind::Let if self.at_let_declaration() => self.parse_lexical_statement(ctx, VarKind::Let),
            TokenKind::Import if !self.at_import_expression() => self.parse_import_declaration(ctx, start),
            TokenKind::Export => self.parse_export_declaration(ctx, start, Vec::new()),
            _ => self.parse_statement(ctx),
        }
    }

    /// `async function` with no line break in between.
    pub(crate) fn at_async_function(&self) -> bool {
        let next = self.peek_next();
        matches!(self.peek(), TokenKind::Async)
            && matches!(next.kind, TokenKind::Function)
            && !next.newline_before
    }

    /// `let` starting a lexical declaration rather than an expression.
    fn at_let_declaration(&self) -> bool {
        let next = self.peek_next();
        next.kind.identifier_name().is_some()
            || matches!(next.kind, TokenKind::LBracket | TokenKind::LBrace)
    }

    /// `import(` and `import.` start expressions, not declarations.
    fn at_import_expression(&self) -> bool {
        matches!(self.peek_next().kind, TokenKind::LParen | TokenKind::Dot)
    }

    /// Parse a statement (no declarations).
    pub(crate) fn parse_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        self.nested(|p| p.parse_statement_inner(ctx))
    }

    fn parse_statement_inner(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let fresh = std::mem::take(&mut self.fresh_labels);
        let start = self.current.span.start;

        match self.peek() {
            TokenKind::LBrace => self.parse_block_statement(ctx),
            TokenKind::Var => {
                let decl = self.parse_var_declarations(ctx, VarKind::Var, false)?;
                self.declare_var_decl(ctx, &decl, false)?;
                self.expect_semicolon()?;
                Ok(Stmt::new(StmtKind::Var(decl), self.span_from(start)))
            }
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::new(StmtKind::Empty, self.span_from(start)))
            }
            TokenKind::If => self.parse_if_statement(ctx),
            TokenKind::For => {
                self.mark_loop_labels(fresh);
                self.parse_for_statement(ctx)
            }
            TokenKind::While => {
                self.mark_loop_labels(fresh);
                self.parse_while_statement(ctx)
            }
            TokenKind::Do => {
                self.mark_loop_labels(fresh);
                self.parse_do_while_statement(ctx)
            }
            TokenKind::Break => self.parse_break_statement(ctx),
            TokenKind::Continue => self.parse_continue_statement(ctx),
            TokenKind::Return => self.parse_return_statement(ctx),
            TokenKind::Throw => self.parse_throw_statement(ctx),
            TokenKind::Try => self.parse_try_statement(ctx),
            TokenKind::Switch => self.parse_switch_statement(ctx),
            TokenKind::With => self.parse_with_statement(ctx),
            TokenKind::Debugger => {
                self.advance()?;
                self.expect_semicolon()?;
                Ok(Stmt::new(StmtKind::Debugger, self.span_from(start)))
            }

            // Declarations are not allowed in statement position
            TokenKind::Function => Err(ParseError::new(
                ErrorKind::FunctionInStatementPosition,
                self.current.span,
            )),
            TokenKind::Async if self.at_async_function() => Err(ParseError::new(
                ErrorKind::FunctionInStatementPosition,
                self.current.span,
            )),
            TokenKind::Class | TokenKind::Enum => Err(self.unexpected()),
            TokenKind::Const => Err(ParseError::new(
                ErrorKind::LexicalInStatementPosition,
                self.current.span,
            )),
            TokenKind::Let if matches!(self.peek_next().kind, TokenKind::LBracket) => Err(
                ParseError::new(ErrorKind::LexicalInStatementPosition, self.current.span),
            ),
            TokenKind::Import | TokenKind::Export
                if !matches!(self.peek(), TokenKind::Import) || !self.at_import_expression() =>
            {
                Err(self.module_syntax_error(ctx))
            }

            _ if self.at_identifier() && matches!(self.peek_next().kind, TokenKind::Colon) => {
                self.parse_labeled_statement(ctx, fresh)
            }
            _ => self.parse_expression_statement(ctx),
        }
    }

    fn mark_loop_labels(&mut self, fresh: usize) {
        let len = self.labels.len();
        for label in &mut self.labels[len - fresh..] {
            label.is_loop = true;
        }
    }

    fn module_syntax_error(&self, ctx: Context) -> ParseError {
        let kind = if ctx.module {
            ErrorKind::ModuleSyntaxNotTopLevel
        } else {
            ErrorKind::ModuleSyntaxInScript
        };
        ParseError::new(kind, self.current.span)
    }

    fn parse_expression_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let expr = self.parse_expression(ctx)?;
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Expr(expr), self.span_from(start)))
    }

    fn parse_labeled_statement(&mut self, ctx: Context, fresh: usize) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let span = self.current.span;
        let name = self.peek().identifier_name().unwrap_or_default().to_string();
        self.check_identifier(ctx, &name, span)?;
        self.advance()?; // label
        self.advance()?; // :

        if self.labels.iter().any(|label| label.name == name) {
            return Err(ParseError::new(ErrorKind::DuplicateLabel(name), span));
        }
        self.labels.push(Label {
            name: name.clone(),
            is_loop: false,
        });

        let body = if self.check(&TokenKind::Function) {
            // Labelled function declarations are a sloppy-mode leftover
            if ctx.strict || matches!(self.peek_next().kind, TokenKind::Star) {
                return Err(ParseError::new(
                    ErrorKind::FunctionInStatementPosition,
                    self.current.span,
                ));
            }
            let function_start = self.current.span.start;
            self.parse_function_declaration(ctx, function_start, false)?
        } else {
            self.fresh_labels = fresh + 1;
            self.parse_statement(ctx)?
        };
        self.labels.pop();

        Ok(Stmt::new(
            StmtKind::Labeled {
                label: Identifier::new(name, span),
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    /// Parse a block statement in a fresh block scope.
    fn parse_block_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let block = self.parse_block(ctx)?;
        Ok(Stmt::new(StmtKind::Block(block.body), block.span))
    }

    /// `{ ... }` with its own block scope.
    pub(crate) fn parse_block(&mut self, ctx: Context) -> Result<BlockStmt, ParseError> {
        let scope = self.scopes.create(ScopeKind::Block, Some(ctx.scope));
        self.parse_block_in_scope(ctx.with_scope(scope).nested())
    }

    /// `{ ... }` whose scope the caller has already set up.
    pub(crate) fn parse_block_in_scope(&mut self, ctx: Context) -> Result<BlockStmt, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item(ctx)?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(BlockStmt {
            body,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Variable Declarations
    // =========================================================================

    fn parse_lexical_statement(&mut self, ctx: Context, kind: VarKind) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let decl = self.parse_var_declarations(ctx, kind, false)?;
        self.declare_var_decl(ctx, &decl, false)?;
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Var(decl), self.span_from(start)))
    }

    /// Parse `var|let|const` and its declarators. Names are not declared
    /// here; in a `for` head that waits until `in`/`of` has been seen.
    pub(crate) fn parse_var_declarations(
        &mut self,
        ctx: Context,
        kind: VarKind,
        in_for_head: bool,
    ) -> Result<VarDecl, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // var, let, const
        let lexical = kind != VarKind::Var;

        let mut decls = Vec::new();
        loop {
            let decl_start = self.current.span.start;
            let binding = self.parse_binding_target(ctx, lexical)?;
            let init = if self.eat(&TokenKind::Eq)? {
                Some(self.parse_assign_expr(ctx)?)
            } else {
                None
            };
            let decl = VarDeclarator {
                binding,
                init,
                span: self.span_from(decl_start),
            };
            if !in_for_head {
                check_declarator_init(kind, &decl)?;
            }
            decls.push(decl);
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }

        Ok(VarDecl {
            kind,
            decls,
            span: self.span_from(start),
        })
    }

    /// Declare every name bound by a variable declaration.
    pub(crate) fn declare_var_decl(&mut self, ctx: Context, decl: &VarDecl, for_of: bool) -> Result<(), ParseError> {
        let kind = match decl.kind {
            VarKind::Var => BindingKind::Var,
            VarKind::Let => BindingKind::Let,
            VarKind::Const => BindingKind::Const,
        };
        let flags = DeclFlags {
            strict: ctx.strict,
            for_of,
        };
        let mut names = Vec::new();
        for declarator in &decl.decls {
            declarator.binding.bound_names(&mut names);
        }
        for id in names {
            self.scopes.declare_binding(ctx.scope, &id.name, kind, id.span, flags)?;
        }
        Ok(())
    }

    // =========================================================================
    // Binding Patterns
    // =========================================================================

    /// Identifier, array pattern or object pattern.
    pub(crate) fn parse_binding_target(&mut self, ctx: Context, lexical: bool) -> Result<Pattern, ParseError> {
        match self.peek() {
            TokenKind::LBracket => self.nested(|p| p.parse_array_binding(ctx, lexical)),
            TokenKind::LBrace => self.nested(|p| p.parse_object_binding(ctx, lexical)),
            _ => {
                let id = self.parse_binding_identifier(ctx, lexical)?;
                Ok(Pattern::new(PatternKind::Ident(id.name), id.span))
            }
        }
    }

    /// A binding target with an optional `= default`.
    pub(crate) fn parse_binding_element(&mut self, ctx: Context, lexical: bool) -> Result<Pattern, ParseError> {
        let start = self.current.span.start;
        let target = self.parse_binding_target(ctx, lexical)?;
        if !self.eat(&TokenKind::Eq)? {
            return Ok(target);
        }
        let default = self.parse_assign_expr(ctx.with_allow_in(true))?;
        Ok(Pattern::new(
            PatternKind::Assign {
                left: Box::new(target),
                right: Box::new(default),
            },
            self.span_from(start),
        ))
    }

    /// `...target`, which must be the last element.
    pub(crate) fn parse_binding_rest(&mut self, ctx: Context, lexical: bool) -> Result<Pattern, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::Spread)?;
        let target = self.parse_binding_target(ctx, lexical)?;
        if self.check(&TokenKind::Eq) {
            return Err(ParseError::new(ErrorKind::RestInitializer, self.current.span));
        }
        Ok(Pattern::new(PatternKind::Rest(Box::new(target)), self.span_from(start)))
    }

    fn parse_array_binding(&mut self, ctx: Context, lexical: bool) -> Result<Pattern, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            if self.check(&TokenKind::Spread) {
                elements.push(Some(self.parse_binding_rest(ctx, lexical)?));
                if self.check(&TokenKind::Comma) {
                    return Err(ParseError::new(ErrorKind::RestNotLast, self.current.span));
                }
                break;
            }
            elements.push(Some(self.parse_binding_element(ctx, lexical)?));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RBracket)?;
        Ok(Pattern::new(PatternKind::Array(elements), self.span_from(start)))
    }

    fn parse_object_binding(&mut self, ctx: Context, lexical: bool) -> Result<Pattern, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let prop_start = self.current.span.start;
            if self.eat(&TokenKind::Spread)? {
                let id = self.parse_binding_identifier(ctx, lexical)?;
                let arg = Pattern::new(PatternKind::Ident(id.name), id.span);
                props.push(ObjectPatternProperty::Rest(Pattern::new(
                    PatternKind::Rest(Box::new(arg)),
                    self.span_from(prop_start),
                )));
                if self.check(&TokenKind::Comma) {
                    return Err(ParseError::new(ErrorKind::RestNotLast, self.current.span));
                }
                break;
            }

            let key_token = self.current.clone();
            let (key, computed) = self.parse_property_key(ctx)?;
            let (value, shorthand) = if self.eat(&TokenKind::Colon)? {
                (self.parse_binding_element(ctx, lexical)?, false)
            } else {
                // Shorthand `{a}` or `{a = 1}`
                let Some(name) = key_token.kind.identifier_name().map(str::to_string) else {
                    return Err(self.unexpected());
                };
                self.check_binding_name(ctx, &name, key_token.span)?;
                if lexical && name == "let" {
                    return Err(ParseError::new(ErrorKind::LetInLexicalBinding, key_token.span));
                }
                let target = Pattern::new(PatternKind::Ident(name), key_token.span);
                let value = if self.eat(&TokenKind::Eq)? {
                    let default = self.parse_assign_expr(ctx.with_allow_in(true))?;
                    Pattern::new(
                        PatternKind::Assign {
                            left: Box::new(target),
                            right: Box::new(default),
                        },
                        self.span_from(prop_start),
                    )
                } else {
                    target
                };
                (value, true)
            };

            props.push(ObjectPatternProperty::Property {
                key,
                value,
                computed,
                shorthand,
                span: self.span_from(prop_start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(Pattern::new(PatternKind::Object(props), self.span_from(start)))
    }

    // =========================================================================
    // Control Flow
    // =========================================================================

    /// `( expression )` as used by `if`, `while`, `switch` and `with`.
    fn parse_paren_expression(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let expr = self.parse_expression(ctx.with_allow_in(true))?;
        self.expect(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // if
        let test = self.parse_paren_expression(ctx)?;
        let consequent = self.parse_if_branch(ctx)?;
        let alternate = if self.eat(&TokenKind::Else)? {
            Some(Box::new(self.parse_if_branch(ctx)?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                test,
                consequent: Box::new(consequent),
                alternate,
            },
            self.span_from(start),
        ))
    }

    /// `if (x) function f() {}` is tolerated in sloppy web-compatible code;
    /// the function gets a block scope of its own.
    fn parse_if_branch(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let annex_b = self.check(&TokenKind::Function)
            && self.options.webcompat
            && !ctx.strict
            && !matches!(self.peek_next().kind, TokenKind::Star);
        if !annex_b {
            return self.parse_statement(ctx);
        }
        let scope = self.scopes.create(ScopeKind::Block, Some(ctx.scope));
        let start = self.current.span.start;
        self.parse_function_declaration(ctx.with_scope(scope), start, false)
    }

    fn parse_while_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // while
        let test = self.parse_paren_expression(ctx)?;
        let body = self.parse_statement(ctx.enter_iteration())?;
        Ok(Stmt::new(
            StmtKind::While {
                test,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    fn parse_do_while_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // do
        let body = self.parse_statement(ctx.enter_iteration())?;
        self.expect(&TokenKind::While)?;
        let test = self.parse_paren_expression(ctx)?;
        // The semicolon after `do ... while (x)` is always optional
        self.eat(&TokenKind::Semicolon)?;
        Ok(Stmt::new(
            StmtKind::DoWhile {
                body: Box::new(body),
                test,
            },
            self.span_from(start),
        ))
    }

    fn parse_for_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // for

        let is_await = if self.check(&TokenKind::Await) {
            if !ctx.in_async {
                return Err(ParseError::new(ErrorKind::ForAwaitOutsideAsync, self.current.span));
            }
            self.advance()?;
            true
        } else {
            false
        };
        self.expect(&TokenKind::LParen)?;
        let head_ctx = ctx.with_allow_in(false);

        if self.check(&TokenKind::Semicolon) {
            if is_await {
                return Err(self.unexpected());
            }
            return self.parse_for_rest(ctx, start, None);
        }

        let declaration = match self.peek() {
            TokenKind::Var => Some(VarKind::Var),
            TokenKind::Const => Some(VarKind::Const),
            TokenKind::Let if self.at_let_declaration() => Some(VarKind::Let),
            _ => None,
        };

        if let Some(kind) = declaration {
            let scope = if kind == VarKind::Var {
                ctx.scope
            } else {
                self.scopes.create(ScopeKind::For, Some(ctx.scope))
            };
            let body_ctx = ctx.with_scope(scope);
            let decl = self.parse_var_declarations(head_ctx.with_scope(scope), kind, true)?;

            if self.check(&TokenKind::Of) || self.check(&TokenKind::In) {
                let is_of = self.check(&TokenKind::Of);
                let keyword = if is_of { "for-of" } else { "for-in" };
                if decl.decls.len() != 1 {
                    return Err(ParseError::new(ErrorKind::ForInOfMultipleBindings(keyword), decl.span));
                }
                let declarator = &decl.decls[0];
                if declarator.init.is_some() {
                    // `for (var x = 1 in y)` survives in sloppy web code
                    let legacy = self.options.webcompat
                        && !is_of
                        && !ctx.strict
                        && kind == VarKind::Var
                        && declarator.binding.is_identifier();
                    if !legacy {
                        return Err(ParseError::new(ErrorKind::ForInOfInitializer(keyword), declarator.span));
                    }
                }
                self.declare_var_decl(body_ctx, &decl, is_of)?;
                return self.parse_for_in_of(ctx, body_ctx, start, ForHead::Var(decl), is_of, is_await);
            }

            if is_await {
                return Err(self.unexpected());
            }
            for declarator in &decl.decls {
                check_declarator_init(kind, declarator)?;
            }
            self.declare_var_decl(body_ctx, &decl, false)?;
            return self.parse_for_rest(body_ctx, start, Some(ForInit::Var(decl)));
        }

        // Expression or assignment pattern head
        let head_token = self.current.clone();
        let mut errors = CoverErrors::default();
        let init = self.parse_assign_expr_cover(head_ctx, Some(&mut errors))?;

        if self.check(&TokenKind::Of) || self.check(&TokenKind::In) {
            let is_of = self.check(&TokenKind::Of);
            // A for-of head may not start with `let`, nor be a bare `async`
            let bare_async = matches!(head_token.kind, TokenKind::Async) && init.span == head_token.span;
            if is_of && (matches!(head_token.kind, TokenKind::Let) || (bare_async && !is_await)) {
                return Err(ParseError::new(ErrorKind::InvalidForTarget("for-of"), head_token.span));
            }
            errors.check_pattern()?;
            let keyword = if is_of { "for-of" } else { "for-in" };
            let target = cover::to_assignment_pattern(init, ctx.strict).map_err(|err| match err.kind {
                ErrorKind::InvalidAssignmentTarget => ParseError::new(ErrorKind::InvalidForTarget(keyword), err.span),
                _ => err,
            })?;
            return self.parse_for_in_of(ctx, ctx, start, ForHead::Pattern(target), is_of, is_await);
        }

        if is_await {
            return Err(self.unexpected());
        }
        errors.check_expression()?;
        let init = if self.check(&TokenKind::Comma) {
            let mut exprs = vec![init];
            while self.eat(&TokenKind::Comma)? {
                exprs.push(self.parse_assign_expr(head_ctx)?);
            }
            let span = exprs[0].span.merge(exprs[exprs.len() - 1].span);
            Expr::new(ExprKind::Sequence(exprs), span)
        } else {
            init
        };
        self.parse_for_rest(ctx, start, Some(ForInit::Expr(init)))
    }

    /// `; test; update) body` of a classic `for`.
    fn parse_for_rest(&mut self, ctx: Context, start: u32, init: Option<ForInit>) -> Result<Stmt, ParseError> {
        let expr_ctx = ctx.with_allow_in(true);
        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(expr_ctx)?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression(expr_ctx)?)
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_statement(ctx.enter_iteration())?;
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    /// `in right) body` or `of right) body`.
    fn parse_for_in_of(
        &mut self,
        ctx: Context,
        body_ctx: Context,
        start: u32,
        left: ForHead,
        is_of: bool,
        is_await: bool,
    ) -> Result<Stmt, ParseError> {
        if is_await && !is_of {
            return Err(self.unexpected());
        }
        self.advance()?; // in, of
        let right_ctx = ctx.with_allow_in(true);
        let right = if is_of {
            self.parse_assign_expr(right_ctx)?
        } else {
            self.parse_expression(right_ctx)?
        };
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement(body_ctx.enter_iteration())?);
        let kind = if is_of {
            StmtKind::ForOf {
                left,
                right,
                body,
                is_await,
            }
        } else {
            StmtKind::ForIn { left, right, body }
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// Optional label after `break`/`continue` on the same line.
    fn parse_jump_label(&mut self, ctx: Context) -> Result<Option<Identifier>, ParseError> {
        if self.current.newline_before || !self.at_identifier() {
            return Ok(None);
        }
        let span = self.current.span;
        let name = self.peek().identifier_name().unwrap_or_default().to_string();
        self.check_identifier(ctx, &name, span)?;
        self.advance()?;
        Ok(Some(Identifier::new(name, span)))
    }

    fn parse_break_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let keyword = self.advance()?;
        let label = self.parse_jump_label(ctx)?;
        match &label {
            Some(label) => {
                if !self.labels.iter().any(|l| l.name == label.name) {
                    return Err(ParseError::new(ErrorKind::UndefinedLabel(label.name.clone()), label.span));
                }
            }
            None if !ctx.in_iteration && !ctx.in_switch => {
                return Err(ParseError::new(ErrorKind::IllegalBreak, keyword.span));
            }
            None => {}
        }
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Break { label }, self.span_from(start)))
    }

    fn parse_continue_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let keyword = self.advance()?;
        if !ctx.in_iteration {
            return Err(ParseError::new(ErrorKind::IllegalContinue, keyword.span));
        }
        let label = self.parse_jump_label(ctx)?;
        if let Some(label) = &label {
            match self.labels.iter().rev().find(|l| l.name == label.name) {
                None => {
                    return Err(ParseError::new(ErrorKind::UndefinedLabel(label.name.clone()), label.span));
                }
                Some(target) if !target.is_loop => {
                    return Err(ParseError::new(
                        ErrorKind::ContinueTargetNotLoop(label.name.clone()),
                        label.span,
                    ));
                }
                Some(_) => {}
            }
        }
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Continue { label }, self.span_from(start)))
    }

    fn parse_return_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        let keyword = self.advance()?;
        if !ctx.in_function {
            return Err(ParseError::new(ErrorKind::IllegalReturn, keyword.span));
        }
        let arg = if self.check(&TokenKind::Semicolon) || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression(ctx.with_allow_in(true))?)
        };
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Return { arg }, self.span_from(start)))
    }

    fn parse_throw_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // throw
        if self.current.newline_before {
            return Err(ParseError::new(ErrorKind::NewlineAfterThrow, self.current.span));
        }
        let arg = self.parse_expression(ctx.with_allow_in(true))?;
        self.expect_semicolon()?;
        Ok(Stmt::new(StmtKind::Throw { arg }, self.span_from(start)))
    }

    fn parse_try_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // try
        let block = self.parse_block(ctx)?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.current.span.start;
            self.advance()?;
            let catch_scope = self.scopes.create(ScopeKind::Catch, Some(ctx.scope));
            let param = if self.eat(&TokenKind::LParen)? {
                let param = self.parse_binding_target(ctx.with_scope(catch_scope), false)?;
                if param.is_identifier() {
                    self.scopes.set_simple_catch(catch_scope);
                }
                let mut names = Vec::new();
                param.bound_names(&mut names);
                for id in names {
                    self.scopes.declare_unbound_variable(catch_scope, &id.name, BindingKind::CatchParam, id.span);
                }
                self.scopes.check_conflicts(catch_scope, false)?;
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body_scope = self.scopes.create(ScopeKind::Block, Some(catch_scope));
            let body = self.parse_block_in_scope(ctx.with_scope(body_scope).nested())?;
            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally)? {
            Some(self.parse_block(ctx)?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(ParseError::new(ErrorKind::MissingCatchOrFinally, self.current.span));
        }
        Ok(Stmt::new(
            StmtKind::Try {
                block,
                handler,
                finalizer,
            },
            self.span_from(start),
        ))
    }

    fn parse_switch_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // switch
        let discriminant = self.parse_paren_expression(ctx)?;
        self.expect(&TokenKind::LBrace)?;

        let scope = self.scopes.create(ScopeKind::Switch, Some(ctx.scope));
        let case_ctx = ctx.with_scope(scope).enter_switch();
        let mut cases = Vec::new();
        let mut seen_default = false;

        while !self.check(&TokenKind::RBrace) {
            let case_start = self.current.span.start;
            let test = match self.peek() {
                TokenKind::Case => {
                    self.advance()?;
                    Some(self.parse_expression(ctx.with_allow_in(true))?)
                }
                TokenKind::Default => {
                    if seen_default {
                        return Err(ParseError::new(ErrorKind::MultipleDefaults, self.current.span));
                    }
                    seen_default = true;
                    self.advance()?;
                    None
                }
                _ => return Err(self.unexpected()),
            };
            self.expect(&TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(self.peek(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace) {
                if self.is_eof() {
                    return Err(self.unexpected());
                }
                consequent.push(self.parse_statement_list_item(case_ctx)?);
            }
            cases.push(SwitchCase {
                test,
                consequent,
                span: self.span_from(case_start),
            });
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(Stmt::new(
            StmtKind::Switch { discriminant, cases },
            self.span_from(start),
        ))
    }

    fn parse_with_statement(&mut self, ctx: Context) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        if ctx.strict {
            return Err(ParseError::new(ErrorKind::StrictWith, self.current.span));
        }
        self.advance()?; // with
        let object = self.parse_paren_expression(ctx)?;
        let body = self.parse_statement(ctx)?;
        Ok(Stmt::new(
            StmtKind::With {
                object,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Module Declarations
    // =========================================================================

    fn check_module_item(&self, ctx: Context) -> Result<(), ParseError> {
        if !ctx.module || !ctx.top_level {
            return Err(self.module_syntax_error(ctx));
        }
        Ok(())
    }

    /// Parse an import declaration.
    fn parse_import_declaration(&mut self, ctx: Context, start: u32) -> Result<Stmt, ParseError> {
        self.check_module_item(ctx)?;
        self.advance()?; // import

        let mut specifiers = Vec::new();
        if !matches!(self.peek(), TokenKind::String(_)) {
            // Default import, optionally followed by a namespace or named list
            let mut more = true;
            if self.at_identifier() {
                let local = self.parse_binding_identifier(ctx, true)?;
                specifiers.push(ImportSpecifier::Default {
                    span: local.span,
                    local,
                });
                more = self.eat(&TokenKind::Comma)?;
            }

            match self.peek() {
                _ if !more => {}
                TokenKind::Star => {
                    let star = self.advance()?;
                    self.expect(&TokenKind::As)?;
                    let local = self.parse_binding_identifier(ctx, true)?;
                    specifiers.push(ImportSpecifier::Namespace {
                        span: star.span.merge(local.span),
                        local,
                    });
                }
                TokenKind::LBrace => {
                    self.advance()?;
                    while !self.check(&TokenKind::RBrace) {
                        specifiers.push(self.parse_import_specifier(ctx)?);
                        if !self.check(&TokenKind::RBrace) {
                            self.expect(&TokenKind::Comma)?;
                        }
                    }
                    self.advance()?;
                }
                _ => return Err(self.unexpected()),
            }
            self.expect(&TokenKind::From)?;
        }

        let source = self.parse_module_source()?;
        let attributes = self.parse_import_attributes()?;
        self.expect_semicolon()?;

        let flags = DeclFlags {
            strict: true,
            for_of: false,
        };
        for specifier in &specifiers {
            let local = match specifier {
                ImportSpecifier::Default { local, .. }
                | ImportSpecifier::Namespace { local, .. }
                | ImportSpecifier::Named { local, .. } => local,
            };
            self.scopes
                .declare_binding(ctx.scope, &local.name, BindingKind::Import, local.span, flags)?;
        }

        Ok(Stmt::new(
            StmtKind::Import(Box::new(ImportDecl {
                specifiers,
                source,
                attributes,
            })),
            self.span_from(start),
        ))
    }

    /// `a`, `a as b`, `"a-b" as c`, `default as d`
    fn parse_import_specifier(&mut self, ctx: Context) -> Result<ImportSpecifier, ParseError> {
        let start = self.current.span.start;
        let is_plain_identifier = self.at_identifier();
        let imported = self.parse_module_export_name()?;

        let local = if self.eat(&TokenKind::As)? {
            self.parse_binding_identifier(ctx, true)?
        } else {
            let ModuleExportName::Ident(id) = &imported else {
                return Err(self.unexpected());
            };
            if !is_plain_identifier {
                return Err(ParseError::new(ErrorKind::ReservedWord(id.name.clone()), id.span));
            }
            self.check_binding_name(ctx, &id.name, id.span)?;
            id.clone()
        };

        Ok(ImportSpecifier::Named {
            imported,
            local,
            span: self.span_from(start),
        })
    }

    /// An IdentifierName (keywords included) or a string literal.
    fn parse_module_export_name(&mut self) -> Result<ModuleExportName, ParseError> {
        let span = self.current.span;
        if let TokenKind::String(value) = self.peek() {
            let value = value.clone();
            self.advance()?;
            return Ok(ModuleExportName::String(StringLiteral { value, span }));
        }
        let Some(name) = self.peek().name_text().map(str::to_string) else {
            return Err(self.unexpected());
        };
        self.advance()?;
        Ok(ModuleExportName::Ident(Identifier::new(name, span)))
    }

    fn parse_module_source(&mut self) -> Result<StringLiteral, ParseError> {
        let span = self.current.span;
        let TokenKind::String(value) = self.peek() else {
            return Err(ParseError::new(
                ErrorKind::Expected {
                    expected: "string".to_string(),
                    found: describe(self.peek()),
                },
                span,
            ));
        };
        let value = value.clone();
        self.advance()?;
        Ok(StringLiteral { value, span })
    }

    /// `with { type: "json" }` after a module source.
    fn parse_import_attributes(&mut self) -> Result<Vec<ImportAttribute>, ParseError> {
        if !self.check(&TokenKind::With) {
            return Ok(Vec::new());
        }
        if !self.options.next {
            return Err(ParseError::new(ErrorKind::RequiresNext("import attributes"), self.current.span));
        }
        self.advance()?; // with
        self.expect(&TokenKind::LBrace)?;

        let mut attributes: Vec<ImportAttribute> = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let start = self.current.span.start;
            let key = self.parse_module_export_name()?;
            if attributes.iter().any(|attr| attr.key.name() == key.name()) {
                return Err(ParseError::new(
                    ErrorKind::DuplicateImportAttribute(key.name().to_string()),
                    key.span(),
                ));
            }
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_module_source()?;
            attributes.push(ImportAttribute {
                key,
                value,
                span: self.span_from(start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance()?;
        Ok(attributes)
    }

    /// Parse an export declaration. `decorators` were written before
    /// `export` and must then decorate the exported class.
    fn parse_export_declaration(
        &mut self,
        ctx: Context,
        start: u32,
        decorators: Vec<Decorator>,
    ) -> Result<Stmt, ParseError> {
        self.check_module_item(ctx)?;
        self.advance()?; // export
        if !decorators.is_empty() {
            return self.parse_decorated_export(ctx, start, decorators);
        }

        let export = match self.peek() {
            TokenKind::Star => {
                self.advance()?;
                let exported = if self.eat(&TokenKind::As)? {
                    let name = self.parse_module_export_name()?;
                    self.exports.record_exported_name(name.name(), name.span())?;
                    Some(name)
                } else {
                    None
                };
                self.expect(&TokenKind::From)?;
                let source = self.parse_module_source()?;
                let attributes = self.parse_import_attributes()?;
                self.expect_semicolon()?;
                ExportDecl::All {
                    exported,
                    source,
                    attributes,
                }
            }
            TokenKind::Default => {
                let keyword = self.advance()?;
                self.exports.record_exported_name("default", keyword.span)?;
                ExportDecl::Default(self.parse_export_default(ctx)?)
            }
            TokenKind::LBrace => self.parse_export_named()?,
            _ => {
                let decl = match self.peek() {
                    TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                        let kind = match self.peek() {
                            TokenKind::Var => VarKind::Var,
                            TokenKind::Let => VarKind::Let,
                            _ => VarKind::Const,
                        };
                        let decl_start = self.current.span.start;
                        let decl = self.parse_var_declarations(ctx, kind, false)?;
                        self.declare_var_decl(ctx, &decl, false)?;
                        self.expect_semicolon()?;
                        Stmt::new(StmtKind::Var(decl), self.span_from(decl_start))
                    }
                    TokenKind::Function | TokenKind::Class | TokenKind::At => {
                        self.parse_statement_list_item(ctx)?
                    }
                    TokenKind::Async if self.at_async_function() => self.parse_statement_list_item(ctx)?,
                    _ => return Err(self.unexpected()),
                };
                self.record_declaration_exports(&decl)?;
                ExportDecl::Decl(decl)
            }
        };

        Ok(Stmt::new(StmtKind::Export(Box::new(export)), self.span_from(start)))
    }

    /// `@dec export class A {}` or `@dec export default class {}`. The class
    /// span starts at `class`; no further decorators may follow `export`.
    fn parse_decorated_export(
        &mut self,
        ctx: Context,
        start: u32,
        decorators: Vec<Decorator>,
    ) -> Result<Stmt, ParseError> {
        let export = if self.check(&TokenKind::Default) {
            let keyword = self.advance()?;
            self.exports.record_exported_name("default", keyword.span)?;
            let class = self.parse_class(ctx, self.current.span.start, decorators, false)?;
            if let Some(id) = &class.id {
                self.declare_class_name(ctx, id)?;
            }
            ExportDecl::Default(ExportDefault::Class(Box::new(class)))
        } else {
            let decl = self.parse_class_declaration(ctx, self.current.span.start, decorators)?;
            self.record_declaration_exports(&decl)?;
            ExportDecl::Decl(decl)
        };
        Ok(Stmt::new(StmtKind::Export(Box::new(export)), self.span_from(start)))
    }

    fn record_declaration_exports(&mut self, decl: &Stmt) -> Result<(), ParseError> {
        let mut names = Vec::new();
        match &decl.kind {
            StmtKind::Var(var) => {
                for declarator in &var.decls {
                    declarator.binding.bound_names(&mut names);
                }
            }
            StmtKind::Function(function) => names.extend(function.id.clone()),
            StmtKind::Class(class) => names.extend(class.id.clone()),
            _ => {}
        }
        for id in names {
            self.exports.record_exported_name(&id.name, id.span)?;
            self.exports.record_exported_binding(&id.name, id.span);
        }
        Ok(())
    }

    /// What follows `export default`.
    fn parse_export_default(&mut self, ctx: Context) -> Result<ExportDefault, ParseError> {
        let start = self.current.span.start;
        match self.peek() {
            TokenKind::Function => {
                let function = self.parse_function_export_default(ctx, start, false)?;
                Ok(ExportDefault::Function(Box::new(function)))
            }
            TokenKind::Async if self.at_async_function() => {
                self.advance()?;
                let function = self.parse_function_export_default(ctx, start, true)?;
                Ok(ExportDefault::Function(Box::new(function)))
            }
            TokenKind::Class | TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                let class = self.parse_class(ctx, start, decorators, false)?;
                if let Some(id) = &class.id {
                    self.declare_class_name(ctx, id)?;
                }
                Ok(ExportDefault::Class(Box::new(class)))
            }
            _ => {
                let expr = self.parse_assign_expr(ctx.with_allow_in(true))?;
                self.expect_semicolon()?;
                Ok(ExportDefault::Expr(expr))
            }
        }
    }

    /// `export { a, b as c }` with an optional `from` clause.
    fn parse_export_named(&mut self) -> Result<ExportDecl, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut specifiers = Vec::new();
        // Tokens that may not name a local binding
        let mut keyword_locals = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let start = self.current.span.start;
            let local_is_identifier = self.at_identifier();
            let local = self.parse_module_export_name()?;
            if !local_is_identifier {
                keyword_locals.push(local.clone());
            }
            let exported = if self.eat(&TokenKind::As)? {
                self.parse_module_export_name()?
            } else {
                local.clone()
            };
            self.exports.record_exported_name(exported.name(), exported.span())?;
            specifiers.push(ExportSpecifier {
                local,
                exported,
                span: self.span_from(start),
            });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance()?;

        let (source, attributes) = if self.eat(&TokenKind::From)? {
            let source = self.parse_module_source()?;
            (Some(source), self.parse_import_attributes()?)
        } else {
            for local in &keyword_locals {
                match local {
                    ModuleExportName::String(s) => {
                        return Err(ParseError::new(ErrorKind::StringExportWithoutFrom, s.span));
                    }
                    ModuleExportName::Ident(id) => {
                        return Err(ParseError::new(ErrorKind::ReservedWord(id.name.clone()), id.span));
                    }
                }
            }
            for specifier in &specifiers {
                let name = specifier.local.name();
                let span = specifier.local.span();
                if is_strict_reserved(name) || name == "await" {
                    return Err(ParseError::new(ErrorKind::ReservedWord(name.to_string()), span));
                }
                self.exports.record_exported_binding(name, span);
            }
            (None, Vec::new())
        };
        self.expect_semicolon()?;

        Ok(ExportDecl::Named {
            specifiers,
            source,
            attributes,
        })
    }
}

/// `const` and destructuring declarations need an initializer outside
/// `for-in`/`for-of` heads.
fn check_declarator_init(kind: VarKind, decl: &VarDeclarator) -> Result<(), ParseError> {
    if decl.init.is_some() {
        return Ok(());
    }
    if kind == VarKind::Const {
        return Err(ParseError::new(ErrorKind::MissingInitializer("const"), decl.span));
    }
    if !decl.binding.is_identifier() {
        return Err(ParseError::new(ErrorKind::MissingInitializer("destructuring"), decl.span));
    }
    Ok(())
}

/// A directive is a lone, unparenthesized string literal statement.
fn is_directive(expr: &Expr, token: &Token) -> bool {
    matches!(expr.kind, ExprKind::String(_)) && expr.span == token.span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SourceType;

    fn parse(source: &str) -> Result<Program, ParseError> {
        Parser::new(source, ParserOptions::default())?.parse()
    }

    fn parse_module(source: &str) -> Result<Program, ParseError> {
        Parser::new(source, ParserOptions::module())?.parse()
    }

    fn error(source: &str) -> ErrorKind {
        parse(source).unwrap_err().kind
    }

    #[test]
    fn test_variable_declaration() {
        let program = parse("let x = 1, [y] = z;").unwrap();
        let StmtKind::Var(decl) = &program.body[0].kind else { panic!("expected var") };
        assert_eq!(decl.kind, VarKind::Let);
        assert_eq!(decl.decls.len(), 2);
        assert_eq!(program.body[0].span, Span::new(0, 19));
    }

    #[test]
    fn test_missing_initializers() {
        assert_eq!(error("const x;"), ErrorKind::MissingInitializer("const"));
        assert_eq!(error("let [a];"), ErrorKind::MissingInitializer("destructuring"));
        assert!(parse("for (const x of y);").is_ok());
    }

    #[test]
    fn test_directives() {
        let program = parse("'use strict'; 'other'\nx").unwrap();
        assert!(matches!(&program.body[0].kind, StmtKind::Directive { value, .. } if value == "use strict"));
        assert!(matches!(program.body[1].kind, StmtKind::Directive { .. }));
        assert!(matches!(program.body[2].kind, StmtKind::Expr(_)));

        // Parenthesized strings are not directives
        let program = parse("('use strict'); with (a) {}").unwrap();
        assert!(matches!(program.body[0].kind, StmtKind::Expr(_)));

        assert_eq!(error("'use strict'; with (a) {}"), ErrorKind::StrictWith);
        assert_eq!(error("'\\01'; 'use strict';"), ErrorKind::LegacyOctalEscape);
        assert_eq!(error("'use strict'; 010"), ErrorKind::LegacyOctalLiteral);
    }

    #[test]
    fn test_labels() {
        assert!(parse("a: for (;;) { b: for (;;) continue a; }").is_ok());
        assert!(parse("a: b: while (x) continue a;").is_ok());
        assert_eq!(error("a: a: x;"), ErrorKind::DuplicateLabel("a".into()));
        assert_eq!(error("while (x) break b;"), ErrorKind::UndefinedLabel("b".into()));
        assert_eq!(
            error("a: { while (x) continue a; }"),
            ErrorKind::ContinueTargetNotLoop("a".into())
        );
        assert!(parse("a: { break a; }").is_ok());
        assert_eq!(error("break;"), ErrorKind::IllegalBreak);
        assert_eq!(error("continue;"), ErrorKind::IllegalContinue);
        assert_eq!(error("return;"), ErrorKind::IllegalReturn);
    }

    #[test]
    fn test_for_heads() {
        let program = parse("for (let x of y);").unwrap();
        let StmtKind::ForOf { left: ForHead::Var(decl), .. } = &program.body[0].kind else {
            panic!("expected for-of")
        };
        assert_eq!(decl.kind, VarKind::Let);

        assert!(parse("for ([a, b] of c);").is_ok());
        assert_eq!(error("for (var x = 1 in y);"), ErrorKind::ForInOfInitializer("for-in"));
        let webcompat = ParserOptions::default().with_webcompat(true);
        assert!(Parser::new("for (var x = 1 in y);", webcompat.clone()).unwrap().parse().is_ok());
        let strict = Parser::new("'use strict'; for (var x = 1 in y);", webcompat).unwrap().parse();
        assert_eq!(strict.unwrap_err().kind, ErrorKind::ForInOfInitializer("for-in"));
        assert_eq!(error("for (let x = 1 of y);"), ErrorKind::ForInOfInitializer("for-of"));
        assert_eq!(error("for (let x, y of z);"), ErrorKind::ForInOfMultipleBindings("for-of"));
        assert_eq!(error("for (f() of y);"), ErrorKind::InvalidForTarget("for-of"));
        assert!(matches!(error("for await (x of y);"), ErrorKind::ForAwaitOutsideAsync));
        assert!(parse("for (let in x);").is_ok());
    }

    #[test]
    fn test_try_and_switch() {
        assert!(parse("try {} catch {} finally {}").is_ok());
        assert_eq!(error("try {}"), ErrorKind::MissingCatchOrFinally);
        assert_eq!(error("switch (x) { default: default: }"), ErrorKind::MultipleDefaults);
        assert!(matches!(error("try {} catch ([e, e]) {}"), ErrorKind::DuplicateBinding(_)));
        assert!(matches!(error("try {} catch (e) { let e; }"), ErrorKind::DuplicateBinding(_)));
        assert!(parse("try {} catch (e) { var e; }").is_ok());
    }

    #[test]
    fn test_statement_position_declarations() {
        assert_eq!(error("if (x) let [a] = b;"), ErrorKind::LexicalInStatementPosition);
        assert_eq!(error("while (x) function f() {}"), ErrorKind::FunctionInStatementPosition);
        assert_eq!(error("throw\nx;"), ErrorKind::NewlineAfterThrow);
    }

    #[test]
    fn test_imports_and_exports() {
        let program = parse_module(
            "import a, { b as c, \"d-e\" as f } from 'm';\nimport * as ns from 'n';\nexport { a as default2, c };\nexport * as g from 'o';",
        )
        .unwrap();
        assert_eq!(program.source_type, SourceType::Module);
        assert_eq!(program.body.len(), 4);

        assert_eq!(parse("import a from 'm';").unwrap_err().kind, ErrorKind::ModuleSyntaxInScript);
        assert_eq!(
            parse_module("{ export var x; }").unwrap_err().kind,
            ErrorKind::ModuleSyntaxNotTopLevel
        );
        assert_eq!(
            parse_module("export var x; export { x };").unwrap_err().kind,
            ErrorKind::DuplicateExport("x".into())
        );
        assert_eq!(
            parse_module("export { 'a' };").unwrap_err().kind,
            ErrorKind::StringExportWithoutFrom
        );
        assert!(parse_module("export { 'a' } from 'm';").is_ok());
        assert!(matches!(
            parse_module("import a from 'm'; let a;").unwrap_err().kind,
            ErrorKind::DuplicateBinding(_)
        ));
    }

    #[test]
    fn test_import_attributes_need_next() {
        assert_eq!(
            parse_module("import j from './a.json' with { type: 'json' };").unwrap_err().kind,
            ErrorKind::RequiresNext("import attributes")
        );
        let options = ParserOptions::module().with_next(true);
        let program = Parser::new("import j from './a.json' with { type: 'json' };", options.clone())
            .unwrap()
            .parse()
            .unwrap();
        let StmtKind::Import(import) = &program.body[0].kind else { panic!("expected import") };
        assert_eq!(import.attributes.len(), 1);

        let err = Parser::new("import j from 'a' with { type: 'json', type: 'css' };", options)
            .unwrap()
            .parse()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateImportAttribute("type".into()));
    }
}
