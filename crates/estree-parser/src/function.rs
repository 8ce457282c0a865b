//! Functions, arrows, classes and decorators.
//!
//! Every function body gets two scopes: a parameter list and the body
//! itself, so body declarations can be checked against the parameters.
//! Labels and the `yield`/`await` bookkeeping are saved on entry and
//! restored on exit; none of it crosses a function boundary.

use std::mem;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::context::{Context, FunctionFlags};
use crate::error::{ErrorKind, ParseError};
use crate::parser::{Label, Parser};
use crate::scope::{BindingKind, DeclFlags, ScopeId, ScopeKind};
use crate::span::Span;
use crate::token::TokenKind;

/// Private names declared in one class body, plus the uses that have not
/// been matched to a declaration yet.
#[derive(Debug, Default)]
pub(crate) struct PrivateScope {
    declared: FxHashMap<String, PrivateEntry>,
    unresolved: Vec<(String, Span)>,
}

/// What a private name is bound to so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrivateEntry {
    /// Field or method.
    Plain,
    Getter { is_static: bool },
    Setter { is_static: bool },
    /// Getter and setter pair.
    Accessor,
}

/// How a private name is being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrivateKind {
    Plain,
    Getter,
    Setter,
}

impl PrivateScope {
    fn declare(&mut self, name: &str, kind: PrivateKind, is_static: bool, span: Span) -> Result<(), ParseError> {
        let entry = match (self.declared.get(name), kind) {
            (None, PrivateKind::Plain) => PrivateEntry::Plain,
            (None, PrivateKind::Getter) => PrivateEntry::Getter { is_static },
            (None, PrivateKind::Setter) => PrivateEntry::Setter { is_static },
            (Some(PrivateEntry::Getter { is_static: s }), PrivateKind::Setter)
            | (Some(PrivateEntry::Setter { is_static: s }), PrivateKind::Getter)
                if *s == is_static =>
            {
                PrivateEntry::Accessor
            }
            _ => {
                return Err(ParseError::new(
                    ErrorKind::DuplicatePrivateName(name.to_string()),
                    span,
                ))
            }
        };
        self.declared.insert(name.to_string(), entry);
        Ok(())
    }
}

/// Per-function state that must not leak into or out of a nested body.
struct FunctionState {
    labels: Vec<Label>,
    fresh_labels: usize,
    positions: (Option<Span>, Option<Span>, Option<Span>),
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Function Parsing
    // =========================================================================

    fn enter_function_state(&mut self) -> FunctionState {
        FunctionState {
            labels: mem::take(&mut self.labels),
            fresh_labels: mem::take(&mut self.fresh_labels),
            positions: self.take_await_yield_positions(),
        }
    }

    fn exit_function_state(&mut self, state: FunctionState) {
        self.labels = state.labels;
        self.fresh_labels = state.fresh_labels;
        self.restore_await_yield_positions(state.positions);
    }

    /// `function name() {}` in statement position. The current token is `function`.
    pub(crate) fn parse_function_declaration(
        &mut self,
        ctx: Context,
        start: u32,
        is_async: bool,
    ) -> Result<Stmt, ParseError> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star)?;
        let id = self.parse_binding_identifier(ctx, false)?;
        self.register_function(ctx, &id, is_async, is_generator)?;

        let flags = FunctionFlags {
            is_async,
            is_generator,
            ..FunctionFlags::default()
        };
        let function = self.parse_function_rest(ctx, start, Some(id), flags)?;
        let span = function.span;
        Ok(Stmt::new(StmtKind::Function(Box::new(function)), span))
    }

    /// `export default function () {}`: the name is optional.
    pub(crate) fn parse_function_export_default(
        &mut self,
        ctx: Context,
        start: u32,
        is_async: bool,
    ) -> Result<Function, ParseError> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star)?;
        let id = if self.check(&TokenKind::LParen) {
            None
        } else {
            let id = self.parse_binding_identifier(ctx, false)?;
            self.register_function(ctx, &id, is_async, is_generator)?;
            Some(id)
        };

        let flags = FunctionFlags {
            is_async,
            is_generator,
            ..FunctionFlags::default()
        };
        self.parse_function_rest(ctx, start, id, flags)
    }

    fn register_function(
        &mut self,
        ctx: Context,
        id: &Identifier,
        is_async: bool,
        is_generator: bool,
    ) -> Result<(), ParseError> {
        let kind = if is_async || is_generator {
            BindingKind::SpecialFunction
        } else {
            BindingKind::Function
        };
        let flags = DeclFlags {
            strict: ctx.strict,
            for_of: false,
        };
        self.scopes
            .register_function_name(ctx.scope, &id.name, kind, id.span, flags, ctx.module)
    }

    /// `function name() {}` as an expression. The current token is `function`.
    /// The name follows the function's own `yield`/`await` rules.
    pub(crate) fn parse_function_expression(
        &mut self,
        ctx: Context,
        start: u32,
        is_async: bool,
    ) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star)?;

        let id = if self.at_identifier() {
            let mut name_ctx = ctx;
            name_ctx.in_generator = is_generator;
            name_ctx.in_async = is_async;
            Some(self.parse_binding_identifier(name_ctx, false)?)
        } else {
            None
        };

        let flags = FunctionFlags {
            is_async,
            is_generator,
            ..FunctionFlags::default()
        };
        let function = self.parse_function_rest(ctx, start, id, flags)?;
        let span = function.span;
        Ok(Expr::new(ExprKind::Function(Box::new(function)), span))
    }

    /// Method of an object literal or class body. The current token is `(`.
    pub(crate) fn parse_method(
        &mut self,
        ctx: Context,
        kind: MethodKind,
        is_async: bool,
        is_generator: bool,
        derived_class: bool,
    ) -> Result<Function, ParseError> {
        let start = self.current.span.start;
        let flags = FunctionFlags {
            is_async,
            is_generator,
            is_arrow: false,
            is_method: true,
            is_derived_constructor: derived_class && kind == MethodKind::Constructor,
        };
        let function = self.parse_function_rest(ctx, start, None, flags)?;

        match kind {
            MethodKind::Get if !function.params.is_empty() => {
                Err(ParseError::new(ErrorKind::GetterArity, function.span))
            }
            MethodKind::Set
                if function.params.len() != 1
                    || matches!(function.params[0].kind, PatternKind::Rest(_)) =>
            {
                Err(ParseError::new(ErrorKind::SetterArity, function.span))
            }
            _ => Ok(function),
        }
    }

    /// Parameters and body of a function; the current token is `(`.
    fn parse_function_rest(
        &mut self,
        ctx: Context,
        start: u32,
        id: Option<Identifier>,
        flags: FunctionFlags,
    ) -> Result<Function, ParseError> {
        let state = self.enter_function_state();
        let param_scope = self.scopes.create(ScopeKind::ParamList, Some(ctx.scope));
        let fctx = ctx.enter_function(param_scope, flags);

        let params = self.parse_formal_params(fctx)?;
        let body = self.parse_function_body(fctx, &params, flags, id.as_ref())?;

        self.exit_function_state(state);
        Ok(Function {
            id,
            params,
            body,
            is_async: flags.is_async,
            is_generator: flags.is_generator,
            span: self.span_from(start),
        })
    }

    /// `( a, [b], c = 1, ...d )`, with each bound name recorded in the
    /// parameter scope.
    pub(crate) fn parse_formal_params(&mut self, ctx: Context) -> Result<Vec<Pattern>, ParseError> {
        let pctx = ctx.with_params(true);
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Spread) {
                params.push(self.parse_binding_rest(pctx, false)?);
                if !self.check(&TokenKind::RParen) {
                    return Err(ParseError::new(ErrorKind::RestNotLast, self.current.span));
                }
                break;
            }
            params.push(self.parse_binding_element(pctx, false)?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;

        self.declare_params(ctx.scope, &params);
        Ok(params)
    }

    fn declare_params(&mut self, scope: ScopeId, params: &[Pattern]) {
        let mut names = Vec::new();
        for param in params {
            param.bound_names(&mut names);
        }
        for name in names {
            self.scopes
                .declare_unbound_variable(scope, &name.name, BindingKind::Param, name.span);
        }
    }

    /// `{ ... }` of a function or arrow, in a body scope under the parameter
    /// scope `fctx.scope`. Applies the rules that depend on both the
    /// parameters and a `"use strict"` directive.
    fn parse_function_body(
        &mut self,
        fctx: Context,
        params: &[Pattern],
        flags: FunctionFlags,
        id: Option<&Identifier>,
    ) -> Result<BlockStmt, ParseError> {
        let param_scope = fctx.scope;
        let body_scope = self.scopes.create(ScopeKind::FunctionBody, Some(param_scope));
        let start = self.current.span.start;
        self.expect(&TokenKind::LBrace)?;
        let (body, use_strict) =
            self.parse_directives_and_statements(fctx.with_scope(body_scope).nested(), &TokenKind::RBrace)?;
        self.expect(&TokenKind::RBrace)?;
        let span = self.span_from(start);

        let simple = params.iter().all(Pattern::is_identifier);
        if use_strict && !simple {
            return Err(ParseError::new(ErrorKind::IllegalUseStrict, span));
        }

        // The directive makes the name and parameters strict after the fact
        if use_strict && !fctx.strict {
            let strict_ctx = fctx.with_strict();
            if let Some(id) = id {
                self.check_binding_name(strict_ctx, &id.name, id.span)?;
            }
            let mut names = Vec::new();
            for param in params {
                param.bound_names(&mut names);
            }
            for name in names {
                self.check_binding_name(strict_ctx, &name.name, name.span)?;
            }
        }

        if fctx.strict || use_strict || !simple || flags.is_arrow || flags.is_method {
            self.scopes.check_parameter_list(param_scope)?;
        }
        Ok(BlockStmt { body, span })
    }

    /// Body of an arrow whose parameters are already parsed. The current
    /// token is `=>`.
    pub(crate) fn parse_arrow_function(
        &mut self,
        ctx: Context,
        start: u32,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::Arrow)?;
        let state = self.enter_function_state();
        let param_scope = self.scopes.create(ScopeKind::ParamList, Some(ctx.scope));
        let flags = FunctionFlags {
            is_async,
            is_arrow: true,
            ..FunctionFlags::default()
        };
        let fctx = ctx.enter_function(param_scope, flags);

        let mut names = Vec::new();
        for param in &params {
            param.bound_names(&mut names);
        }
        for name in &names {
            self.check_binding_name(fctx, &name.name, name.span)?;
        }
        self.declare_params(param_scope, &params);

        let body = if self.check(&TokenKind::LBrace) {
            ArrowBody::Block(self.parse_function_body(fctx, &params, flags, None)?)
        } else {
            self.scopes.check_parameter_list(param_scope)?;
            let expr = self.parse_assign_expr(fctx.with_allow_in(ctx.allow_in))?;
            ArrowBody::Expr(Box::new(expr))
        };

        self.exit_function_state(state);
        Ok(Expr::new(
            ExprKind::Arrow(Box::new(ArrowFunction {
                params,
                body,
                is_async,
                span: self.span_from(start),
            })),
            self.span_from(start),
        ))
    }

    // =========================================================================
    // Decorators
    // =========================================================================

    /// `@a`, `@a.b(c)`, `@(expr)`; empty when not at `@`.
    pub(crate) fn parse_decorators(&mut self, ctx: Context) -> Result<Vec<Decorator>, ParseError> {
        let mut decorators = Vec::new();
        while self.check(&TokenKind::At) {
            if !self.options.next {
                return Err(ParseError::new(ErrorKind::RequiresNext("decorators"), self.current.span));
            }
            let start = self.current.span.start;
            self.advance()?; // @
            let expr = if self.check(&TokenKind::LParen) {
                let paren_start = self.current.span.start;
                self.advance()?;
                let inner = self.parse_expression(ctx.with_allow_in(true))?;
                self.expect(&TokenKind::RParen)?;
                Expr::new(ExprKind::Paren(Box::new(inner)), self.span_from(paren_start))
            } else {
                self.parse_decorator_path(ctx)?
            };
            decorators.push(Decorator {
                expr,
                span: self.span_from(start),
            });
        }
        Ok(decorators)
    }

    /// `a.b.c` with an optional trailing call.
    fn parse_decorator_path(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let expr_start = self.current.span.start;
        let span = self.current.span;
        let Some(name) = self.peek().identifier_name().map(str::to_string) else {
            return Err(self.unexpected());
        };
        self.check_identifier_reference(ctx, &name, span)?;
        self.advance()?;
        let mut expr = Expr::new(ExprKind::Ident(name), span);

        while self.eat(&TokenKind::Dot)? {
            let prop_span = self.current.span;
            let property = match self.peek() {
                TokenKind::PrivateName(name) => {
                    let name = name.clone();
                    self.use_private_name(&name, prop_span)?;
                    ExprKind::PrivateName(name)
                }
                kind => match kind.name_text() {
                    Some(name) => ExprKind::Ident(name.to_string()),
                    None => return Err(self.unexpected()),
                },
            };
            self.advance()?;
            expr = Expr::new(
                ExprKind::Member {
                    object: Box::new(expr),
                    property: Box::new(Expr::new(property, prop_span)),
                    computed: false,
                    optional: false,
                },
                self.span_from(expr_start),
            );
        }

        if self.check(&TokenKind::LParen) {
            let args = self.parse_arguments(ctx)?;
            expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                    optional: false,
                },
                self.span_from(expr_start),
            );
        }
        Ok(expr)
    }

    // =========================================================================
    // Class Parsing
    // =========================================================================

    /// `class Name {}` in statement position.
    pub(crate) fn parse_class_declaration(
        &mut self,
        ctx: Context,
        start: u32,
        decorators: Vec<Decorator>,
    ) -> Result<Stmt, ParseError> {
        let class = self.parse_class(ctx, start, decorators, true)?;
        if let Some(id) = &class.id {
            self.declare_class_name(ctx, id)?;
        }
        let span = class.span;
        Ok(Stmt::new(StmtKind::Class(Box::new(class)), span))
    }

    /// Bind a class declaration's name in the enclosing scope.
    pub(crate) fn declare_class_name(&mut self, ctx: Context, id: &Identifier) -> Result<(), ParseError> {
        let flags = DeclFlags {
            strict: ctx.strict,
            for_of: false,
        };
        self.scopes
            .declare_binding(ctx.scope, &id.name, BindingKind::Class, id.span, flags)
    }

    /// Parse a class. The current token is `class`. All of a class is strict.
    pub(crate) fn parse_class(
        &mut self,
        ctx: Context,
        start: u32,
        decorators: Vec<Decorator>,
        name_required: bool,
    ) -> Result<Class, ParseError> {
        self.expect(&TokenKind::Class)?;
        let cctx = ctx.with_strict();

        let id = if self.at_identifier() {
            Some(self.parse_binding_identifier(cctx, true)?)
        } else if name_required {
            return Err(self.unexpected());
        } else {
            None
        };

        let super_class = if self.eat(&TokenKind::Extends)? {
            Some(Box::new(self.parse_heritage(cctx)?))
        } else {
            None
        };
        let derived = super_class.is_some();

        let body_start = self.current.span.start;
        self.expect(&TokenKind::LBrace)?;
        self.private_scopes.push(PrivateScope::default());

        let mut body = Vec::new();
        let mut has_constructor = false;
        while !self.check(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Semicolon)? {
                continue;
            }
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_class_member(cctx, derived, &mut has_constructor)?);
        }
        self.expect(&TokenKind::RBrace)?;
        let body_span = self.span_from(body_start);
        self.exit_private_scope()?;

        Ok(Class {
            id,
            super_class,
            body,
            decorators,
            body_span,
            span: self.span_from(start),
        })
    }

    /// Parse a class member (method, field or static block).
    fn parse_class_member(
        &mut self,
        ctx: Context,
        derived: bool,
        has_constructor: &mut bool,
    ) -> Result<ClassMember, ParseError> {
        let start = self.current.span.start;
        let decorators = self.parse_decorators(ctx)?;

        let is_static = self.check(&TokenKind::Static) && self.modifier_applies(false);
        if is_static {
            self.advance()?;
            if self.check(&TokenKind::LBrace) {
                if !decorators.is_empty() {
                    return Err(self.unexpected());
                }
                let body = self.parse_static_block(ctx)?;
                return Ok(ClassMember {
                    kind: ClassMemberKind::StaticBlock(body),
                    span: self.span_from(start),
                });
            }
        }

        let mut is_async = false;
        let mut is_generator = false;
        let mut kind = MethodKind::Method;
        if self.check(&TokenKind::Async) && self.modifier_applies(true) {
            self.advance()?;
            is_async = true;
        }
        if self.eat(&TokenKind::Star)? {
            is_generator = true;
        }
        let accessor = match self.peek() {
            TokenKind::Get => Some(MethodKind::Get),
            TokenKind::Set => Some(MethodKind::Set),
            _ => None,
        };
        if let Some(accessor) = accessor {
            if !is_async && !is_generator && self.modifier_applies(false) {
                self.advance()?;
                kind = accessor;
            }
        }

        let (key, computed) = self.parse_property_key(ctx)?;
        let private = match &key.kind {
            ExprKind::PrivateName(name) if name == "constructor" => {
                return Err(ParseError::new(ErrorKind::PrivateConstructor, key.span));
            }
            ExprKind::PrivateName(name) => Some(name.clone()),
            _ => None,
        };
        if is_static && !computed && key_is(&key, "prototype") {
            return Err(ParseError::new(
                ErrorKind::InvalidStaticMember("prototype".to_string()),
                key.span,
            ));
        }

        let is_method = is_async || is_generator || kind != MethodKind::Method || self.check(&TokenKind::LParen);
        if is_method {
            if !is_static && !computed && key_is(&key, "constructor") {
                if kind != MethodKind::Method || is_async || is_generator {
                    return Err(ParseError::new(ErrorKind::SpecialConstructor, key.span));
                }
                if *has_constructor {
                    return Err(ParseError::new(ErrorKind::DuplicateConstructor, key.span));
                }
                *has_constructor = true;
                kind = MethodKind::Constructor;
            }
            if let Some(name) = &private {
                let private_kind = match kind {
                    MethodKind::Get => PrivateKind::Getter,
                    MethodKind::Set => PrivateKind::Setter,
                    _ => PrivateKind::Plain,
                };
                self.declare_private_name(name, private_kind, is_static, key.span)?;
            }

            let value = self.parse_method(ctx, kind, is_async, is_generator, derived)?;
            return Ok(ClassMember {
                kind: ClassMemberKind::Method {
                    key,
                    value,
                    kind,
                    computed,
                    is_static,
                    decorators,
                },
                span: self.span_from(start),
            });
        }

        if !computed && key_is(&key, "constructor") {
            let kind = if is_static {
                ErrorKind::InvalidStaticMember("constructor".to_string())
            } else {
                ErrorKind::ConstructorField
            };
            return Err(ParseError::new(kind, key.span));
        }
        if let Some(name) = &private {
            self.declare_private_name(name, PrivateKind::Plain, is_static, key.span)?;
        }

        let value = if self.eat(&TokenKind::Eq)? {
            let scope = self.scopes.create(ScopeKind::FunctionBody, Some(ctx.scope));
            let state = self.enter_function_state();
            let value = self.parse_assign_expr(ctx.enter_class_init(scope, false))?;
            self.exit_function_state(state);
            Some(value)
        } else {
            None
        };
        self.expect_semicolon()?;

        Ok(ClassMember {
            kind: ClassMemberKind::Property {
                key,
                value,
                computed,
                is_static,
                decorators,
            },
            span: self.span_from(start),
        })
    }

    /// `static { ... }` after `static`.
    fn parse_static_block(&mut self, ctx: Context) -> Result<Vec<Stmt>, ParseError> {
        let scope = self.scopes.create(ScopeKind::FunctionBody, Some(ctx.scope));
        let bctx = ctx.enter_class_init(scope, true);
        let state = self.enter_function_state();

        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item(bctx)?);
        }
        self.expect(&TokenKind::RBrace)?;

        self.exit_function_state(state);
        Ok(body)
    }

    // =========================================================================
    // Private Names
    // =========================================================================

    fn declare_private_name(
        &mut self,
        name: &str,
        kind: PrivateKind,
        is_static: bool,
        span: Span,
    ) -> Result<(), ParseError> {
        match self.private_scopes.last_mut() {
            Some(scope) => scope.declare(name, kind, is_static, span),
            None => Err(ParseError::new(
                ErrorKind::UndeclaredPrivateName(name.to_string()),
                span,
            )),
        }
    }

    /// A reference to `#name`. It is resolved when the enclosing class
    /// body ends, since members may be declared after their first use.
    pub(crate) fn use_private_name(&mut self, name: &str, span: Span) -> Result<(), ParseError> {
        match self.private_scopes.last_mut() {
            Some(scope) => {
                scope.unresolved.push((name.to_string(), span));
                Ok(())
            }
            None => Err(ParseError::new(
                ErrorKind::UndeclaredPrivateName(name.to_string()),
                span,
            )),
        }
    }

    /// Close a class body. Names it does not declare belong to an
    /// enclosing class, or are errors at the outermost one.
    fn exit_private_scope(&mut self) -> Result<(), ParseError> {
        let Some(scope) = self.private_scopes.pop() else {
            return Ok(());
        };
        for (name, span) in scope.unresolved {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.private_scopes.last_mut() {
                Some(parent) => parent.unresolved.push((name, span)),
                None => {
                    return Err(ParseError::new(ErrorKind::UndeclaredPrivateName(name), span));
                }
            }
        }
        Ok(())
    }
}

/// A non-computed key spelled `name`, as an identifier or a string.
fn key_is(key: &Expr, name: &str) -> bool {
    matches!(&key.kind, ExprKind::Ident(n) | ExprKind::String(n) if n == name)
}
