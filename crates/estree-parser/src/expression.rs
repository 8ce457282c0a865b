//! Expression parsing.
//!
//! Precedence is handled by a chain of functions from assignment down to
//! primary expressions, with Pratt parsing for binary operators. Object and
//! array literals and parenthesized lists are cover grammars: they are
//! parsed as expressions and rewritten by [`crate::cover`] when an `=` or
//! `=>` shows they were patterns. The [`CoverErrors`] threaded through the
//! chain carry the problems that depend on that decision.

use crate::ast::*;
use crate::context::Context;
use crate::cover::{self, CoverErrors, ParenCover};
use crate::error::{ErrorKind, ParseError};
use crate::parser::Parser;
use crate::span::Span;
use crate::token::TokenKind;

/// Saved `yield`/`await` positions around a construct that may become
/// arrow parameters.
type AwaitYieldPositions = (Option<Span>, Option<Span>, Option<Span>);

impl<'a> Parser<'a> {
    // =========================================================================
    // Expression Parsing
    // =========================================================================

    /// Parse an expression (including comma sequences).
    pub(crate) fn parse_expression(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let first = self.parse_assign_expr(ctx)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma)? {
            exprs.push(self.parse_assign_expr(ctx)?);
        }
        let span = exprs[0].span.merge(exprs[exprs.len() - 1].span);
        Ok(Expr::new(ExprKind::Sequence(exprs), span))
    }

    /// Parse an assignment expression.
    pub(crate) fn parse_assign_expr(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        self.parse_assign_expr_cover(ctx, None)
    }

    /// Parse an assignment expression that may sit inside a larger cover.
    /// Cover problems are handed to `outer` when given, otherwise the
    /// result must be a valid expression.
    pub(crate) fn parse_assign_expr_cover(
        &mut self,
        ctx: Context,
        outer: Option<&mut CoverErrors>,
    ) -> Result<Expr, ParseError> {
        self.nested(|p| p.parse_assign_expr_inner(ctx, outer))
    }

    fn parse_assign_expr_inner(
        &mut self,
        ctx: Context,
        outer: Option<&mut CoverErrors>,
    ) -> Result<Expr, ParseError> {
        if ctx.in_generator && self.check(&TokenKind::Yield) {
            return self.parse_yield_expr(ctx);
        }

        let start = self.current.span.start;
        self.potential_arrow_at = Some(start);
        let mut errors = CoverErrors::default();
        let left = self.parse_conditional_expr(ctx, &mut errors)?;

        let Some(op) = get_assign_op(self.peek()) else {
            match outer {
                Some(outer) => outer.merge(errors),
                None => errors.check_expression()?,
            }
            return Ok(left);
        };

        let target = if op == AssignOp::Assign {
            errors.check_pattern()?;
            cover::to_assignment_pattern(left, ctx.strict)?
        } else {
            errors.check_expression()?;
            cover::to_simple_target(left, ctx.strict, ErrorKind::InvalidAssignmentTarget)?
        };
        self.advance()?;
        let right = self.parse_assign_expr(ctx)?;
        let span = Span::new(start, right.span.end);
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                left: Box::new(target),
                right: Box::new(right),
            },
            span,
        ))
    }

    /// `yield`, `yield x`, `yield* x` inside a generator.
    fn parse_yield_expr(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let keyword = self.advance()?;
        if ctx.in_params {
            return Err(ParseError::new(ErrorKind::YieldInParameter, keyword.span));
        }
        self.yield_pos.get_or_insert(keyword.span);

        let mut delegate = false;
        let arg = if self.current.newline_before {
            None
        } else if self.eat(&TokenKind::Star)? {
            delegate = true;
            Some(Box::new(self.parse_assign_expr(ctx)?))
        } else if self.peek().can_start_expr() {
            Some(Box::new(self.parse_assign_expr(ctx)?))
        } else {
            None
        };

        Ok(Expr::new(
            ExprKind::Yield { arg, delegate },
            self.span_from(keyword.span.start),
        ))
    }

    /// Parse a conditional (ternary) expression.
    fn parse_conditional_expr(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let test = self.parse_binary_expr(ctx, 0, errors)?;
        if matches!(test.kind, ExprKind::Arrow(_)) || !self.check(&TokenKind::Question) {
            return Ok(test);
        }

        errors.check_expression()?;
        self.advance()?; // ?
        let consequent = self.parse_assign_expr(ctx.with_allow_in(true))?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assign_expr(ctx)?;

        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
            self.span_from(start),
        ))
    }

    /// Parse binary expressions using Pratt parsing (precedence climbing).
    fn parse_binary_expr(&mut self, ctx: Context, min_prec: u8, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let mut left = if let TokenKind::PrivateName(name) = self.peek() {
            // `#x in obj`
            let name = name.clone();
            let span = self.current.span;
            let before_in = matches!(self.peek_next().kind, TokenKind::In);
            if !before_in || min_prec > 8 || !ctx.allow_in {
                return Err(self.unexpected());
            }
            self.use_private_name(&name, span)?;
            self.advance()?;
            Expr::new(ExprKind::PrivateName(name), span)
        } else {
            self.parse_unary_expr(ctx, errors)?
        };
        if matches!(left.kind, ExprKind::Arrow(_)) {
            return Ok(left);
        }

        loop {
            let prec = match self.peek().binary_precedence() {
                Some(prec) if prec >= min_prec => prec,
                _ => break,
            };
            let Some(op) = get_binary_op(self.peek()) else {
                break;
            };
            if op == BinaryOp::In && !ctx.allow_in {
                break;
            }

            errors.check_expression()?;
            let is_right_assoc = self.peek().is_right_associative();
            self.advance()?;

            if op == BinaryOp::Pow && matches!(left.kind, ExprKind::Unary { .. } | ExprKind::Await(_)) {
                return Err(ParseError::new(ErrorKind::UnaryBeforeExponent, left.span));
            }

            let next_prec = if is_right_assoc { prec } else { prec + 1 };
            let mut right_errors = CoverErrors::default();
            let right = self.nested(|p| p.parse_binary_expr(ctx, next_prec, &mut right_errors))?;
            right_errors.check_expression()?;

            check_nullish_mixing(op, &left, &right)?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }

        if matches!(left.kind, ExprKind::PrivateName(_)) {
            return Err(ParseError::new(
                ErrorKind::UnexpectedToken(format!("#{}", private_name(&left))),
                left.span,
            ));
        }
        Ok(left)
    }

    /// Parse unary expressions: `!x`, `-x`, `typeof x`, `++x`, `await x`, etc.
    fn parse_unary_expr(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;

        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let arg = self.parse_operand(ctx)?;
            if op == UnaryOp::Delete {
                check_delete_operand(&arg, ctx.strict)?;
            }
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    arg: Box::new(arg),
                },
                self.span_from(start),
            ));
        }

        let update = match self.peek() {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance()?;
            let arg = self.parse_operand(ctx)?;
            check_update_target(&arg, ctx.strict)?;
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    arg: Box::new(arg),
                },
                self.span_from(start),
            ));
        }

        if self.check(&TokenKind::Await) && ctx.in_async && !ctx.in_static_block {
            let keyword = self.advance()?;
            if ctx.in_params {
                return Err(ParseError::new(ErrorKind::AwaitInParameter, keyword.span));
            }
            self.await_pos.get_or_insert(keyword.span);
            let arg = self.parse_operand(ctx)?;
            return Ok(Expr::new(ExprKind::Await(Box::new(arg)), self.span_from(start)));
        }

        self.parse_postfix_expr(ctx, errors)
    }

    /// Operand of a prefix operator: a unary expression that is never a pattern.
    fn parse_operand(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let mut errors = CoverErrors::default();
        let arg = self.nested(|p| p.parse_unary_expr(ctx, &mut errors))?;
        errors.check_expression()?;
        Ok(arg)
    }

    /// Parse postfix expressions: `x++`, `x--`
    fn parse_postfix_expr(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let expr = self.parse_lhs_expr(ctx, errors)?;
        if matches!(expr.kind, ExprKind::Arrow(_)) || self.current.newline_before {
            return Ok(expr);
        }

        let op = match self.peek() {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        errors.check_expression()?;
        check_update_target(&expr, ctx.strict)?;
        self.advance()?;
        Ok(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                arg: Box::new(expr),
            },
            self.span_from(start),
        ))
    }

    /// Left-hand-side expression: `new`, calls, member access.
    fn parse_lhs_expr(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let expr = if self.check(&TokenKind::New) {
            self.parse_new_expr(ctx)?
        } else {
            self.parse_primary_expr(ctx, errors)?
        };
        if matches!(expr.kind, ExprKind::Arrow(_)) {
            return Ok(expr);
        }
        self.parse_subscripts(ctx, expr, start, false, errors)
    }

    /// Class heritage: `extends` is followed by a left-hand-side expression.
    pub(crate) fn parse_heritage(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let mut errors = CoverErrors::default();
        let expr = self.nested(|p| p.parse_lhs_expr(ctx, &mut errors))?;
        errors.check_expression()?;
        if matches!(expr.kind, ExprKind::Arrow(_)) {
            return Err(ParseError::new(ErrorKind::UnexpectedToken("=>".to_string()), expr.span));
        }
        Ok(expr)
    }

    /// `new Foo(args)`, `new Foo`, `new.target`
    fn parse_new_expr(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let keyword = self.advance()?; // new

        if self.eat(&TokenKind::Dot)? {
            let span = self.current.span;
            if !matches!(self.peek(), TokenKind::Identifier(name) if name == "target") || self.current.escaped {
                let found = self.peek().name_text().unwrap_or_default().to_string();
                return Err(ParseError::new(ErrorKind::InvalidMetaProperty(format!("new.{found}")), span));
            }
            if !ctx.allow_new_target {
                return Err(ParseError::new(ErrorKind::InvalidNewTarget, Span::new(start, span.end)));
            }
            self.advance()?;
            return Ok(Expr::new(
                ExprKind::MetaProperty {
                    meta: Identifier::new("new", keyword.span),
                    property: Identifier::new("target", span),
                },
                self.span_from(start),
            ));
        }

        let callee_start = self.current.span.start;
        let callee = match self.peek() {
            TokenKind::New => self.nested(|p| p.parse_new_expr(ctx))?,
            // `new import(x)` is not a thing
            TokenKind::Import if !matches!(self.peek_next().kind, TokenKind::Dot) => {
                return Err(ParseError::new(ErrorKind::InvalidDynamicImport, self.current.span));
            }
            _ => {
                let mut errors = CoverErrors::default();
                let callee = self.parse_primary_expr(ctx, &mut errors)?;
                errors.check_expression()?;
                callee
            }
        };
        if matches!(callee.kind, ExprKind::Arrow(_)) {
            return Err(ParseError::new(ErrorKind::UnexpectedToken("=>".to_string()), callee.span));
        }
        let mut errors = CoverErrors::default();
        let callee = self.parse_subscripts(ctx, callee, callee_start, true, &mut errors)?;

        let args = if self.check(&TokenKind::LParen) {
            self.parse_arguments(ctx)?
        } else {
            Vec::new()
        };

        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            self.span_from(start),
        ))
    }

    /// Member access, calls, optional chains and tagged templates.
    /// With `no_call` (a `new` callee) the first `(` ends the chain.
    fn parse_subscripts(
        &mut self,
        ctx: Context,
        mut expr: Expr,
        start: u32,
        no_call: bool,
        errors: &mut CoverErrors,
    ) -> Result<Expr, ParseError> {
        let mut in_chain = false;

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    errors.check_expression()?;
                    self.advance()?;
                    let property = self.parse_member_property()?;
                    expr = member(expr, property, false, false, self.span_from(start));
                }
                TokenKind::QuestionDot => {
                    if no_call {
                        return Err(ParseError::new(ErrorKind::InvalidOptionalChain, self.current.span));
                    }
                    errors.check_expression()?;
                    self.advance()?;
                    in_chain = true;
                    match self.peek() {
                        TokenKind::LParen => {
                            let args = self.parse_arguments(ctx)?;
                            expr = call(expr, args, true, self.span_from(start));
                        }
                        TokenKind::LBracket => {
                            let property = self.parse_computed_property(ctx)?;
                            expr = member(expr, property, true, true, self.span_from(start));
                        }
                        TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                            return Err(ParseError::new(ErrorKind::InvalidOptionalChain, self.current.span));
                        }
                        _ => {
                            let property = self.parse_member_property()?;
                            expr = member(expr, property, false, true, self.span_from(start));
                        }
                    }
                }
                TokenKind::LBracket => {
                    errors.check_expression()?;
                    let property = self.parse_computed_property(ctx)?;
                    expr = member(expr, property, true, false, self.span_from(start));
                }
                TokenKind::LParen if !no_call => {
                    errors.check_expression()?;
                    let args = self.parse_arguments(ctx)?;
                    expr = call(expr, args, false, self.span_from(start));
                }
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                    if in_chain {
                        return Err(ParseError::new(ErrorKind::InvalidOptionalChain, self.current.span));
                    }
                    errors.check_expression()?;
                    let quasi = self.parse_template(ctx, true)?;
                    expr = Expr::new(
                        ExprKind::TaggedTemplate {
                            tag: Box::new(expr),
                            quasi,
                        },
                        self.span_from(start),
                    );
                }
                _ => break,
            }
        }

        if in_chain {
            let span = expr.span;
            expr = Expr::new(ExprKind::Chain(Box::new(expr)), span);
        }
        Ok(expr)
    }

    /// `[expr]` after an object.
    fn parse_computed_property(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBracket)?;
        let property = self.parse_expression(ctx.with_allow_in(true))?;
        self.expect(&TokenKind::RBracket)?;
        Ok(property)
    }

    /// The name after `.` or `?.`: any IdentifierName or a private name.
    fn parse_member_property(&mut self) -> Result<Expr, ParseError> {
        let span = self.current.span;
        if let TokenKind::PrivateName(name) = self.peek() {
            let name = name.clone();
            self.use_private_name(&name, span)?;
            self.advance()?;
            return Ok(Expr::new(ExprKind::PrivateName(name), span));
        }
        let Some(name) = self.peek().name_text().map(str::to_string) else {
            return Err(self.unexpected());
        };
        self.advance()?;
        Ok(Expr::new(ExprKind::Ident(name), span))
    }

    /// Parse call arguments: `(a, ...b)`
    pub(crate) fn parse_arguments(&mut self, ctx: Context) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let arg_ctx = ctx.with_allow_in(true);
        let mut args = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Spread) {
                let start = self.current.span.start;
                self.advance()?;
                let arg = self.parse_assign_expr(arg_ctx)?;
                args.push(Expr::new(ExprKind::Spread(Box::new(arg)), self.span_from(start)));
            } else {
                args.push(self.parse_assign_expr(arg_ctx)?);
            }
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    // =========================================================================
    // Primary Expressions
    // =========================================================================

    /// Parse primary expressions: literals, identifiers, parenthesized, etc.
    fn parse_primary_expr(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let token = self.current.clone();
        let start = token.span.start;
        let can_be_arrow = self.potential_arrow_at == Some(start);

        match &token.kind {
            TokenKind::Number(n) => {
                if token.legacy_octal && ctx.strict {
                    return Err(ParseError::new(ErrorKind::LegacyOctalLiteral, token.span));
                }
                let value = *n;
                self.advance()?;
                Ok(Expr::new(ExprKind::Number(value), token.span))
            }
            TokenKind::BigInt(digits) => {
                let digits = digits.clone();
                self.advance()?;
                Ok(Expr::new(ExprKind::BigInt(digits), token.span))
            }
            TokenKind::String(value) => {
                if token.legacy_octal && ctx.strict {
                    return Err(ParseError::new(ErrorKind::LegacyOctalEscape, token.span));
                }
                let value = value.clone();
                self.advance()?;
                Ok(Expr::new(ExprKind::String(value), token.span))
            }
            TokenKind::True | TokenKind::False => {
                let value = matches!(token.kind, TokenKind::True);
                self.advance()?;
                Ok(Expr::new(ExprKind::Bool(value), token.span))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Null, token.span))
            }
            TokenKind::This => {
                self.advance()?;
                Ok(Expr::new(ExprKind::This, token.span))
            }
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                let template = self.parse_template(ctx, false)?;
                let span = template.span;
                Ok(Expr::new(ExprKind::Template(template), span))
            }

            // `/` in operand position starts a regular expression
            TokenKind::Slash | TokenKind::SlashEq => {
                let mut regex = self.lexer.rescan_regex(start)?;
                regex.newline_before = token.newline_before;
                self.current = regex;
                let token = self.advance()?;
                let TokenKind::Regex { pattern, flags } = token.kind else {
                    return Err(ParseError::new(ErrorKind::UnterminatedRegExp, token.span));
                };
                Ok(Expr::new(ExprKind::Regex { pattern, flags }, token.span))
            }

            TokenKind::LParen => self.parse_paren_or_arrow(ctx, can_be_arrow),
            TokenKind::LBracket => self.parse_array_literal(ctx, errors),
            TokenKind::LBrace => self.parse_object_literal(ctx, errors),

            TokenKind::Function => self.parse_function_expression(ctx, start, false),
            TokenKind::Class => {
                let class = self.parse_class(ctx, start, Vec::new(), false)?;
                let span = class.span;
                Ok(Expr::new(ExprKind::Class(Box::new(class)), span))
            }
            TokenKind::At => {
                let decorators = self.parse_decorators(ctx)?;
                if !self.check(&TokenKind::Class) {
                    return Err(self.unexpected());
                }
                let class = self.parse_class(ctx, start, decorators, false)?;
                let span = class.span;
                Ok(Expr::new(ExprKind::Class(Box::new(class)), span))
            }
            TokenKind::Super => self.parse_super(ctx),
            TokenKind::Import => self.parse_import_expr(ctx),
            TokenKind::Async => self.parse_async_expr(ctx, can_be_arrow),

            TokenKind::Lt if self.options.jsx => self.parse_jsx_expression(ctx),

            _ if self.at_identifier() => {
                let name = self.peek().identifier_name().unwrap_or_default().to_string();
                self.advance()?;

                if can_be_arrow && self.check(&TokenKind::Arrow) {
                    if self.current.newline_before {
                        return Err(ParseError::new(ErrorKind::NewlineBeforeArrow, self.current.span));
                    }
                    self.check_binding_name(ctx, &name, token.span)?;
                    let param = Pattern::new(PatternKind::Ident(name), token.span);
                    return self.parse_arrow_function(ctx, start, vec![param], false);
                }

                self.check_identifier_reference(ctx, &name, token.span)?;
                Ok(Expr::new(ExprKind::Ident(name), token.span))
            }

            _ => Err(self.unexpected()),
        }
    }

    /// An identifier used as a value.
    pub(crate) fn check_identifier_reference(&mut self, ctx: Context, name: &str, span: Span) -> Result<(), ParseError> {
        self.check_identifier(ctx, name, span)?;
        if name == "arguments" && ctx.in_class_init {
            return Err(ParseError::new(ErrorKind::ArgumentsInClassInit, span));
        }
        Ok(())
    }

    /// `super(...)`, `super.x`, `super[x]`
    fn parse_super(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let keyword = self.advance()?;
        match self.peek() {
            TokenKind::LParen if !ctx.allow_super_call => {
                Err(ParseError::new(ErrorKind::InvalidSuperCall, keyword.span))
            }
            TokenKind::LParen => Ok(Expr::new(ExprKind::Super, keyword.span)),
            TokenKind::Dot | TokenKind::LBracket if ctx.allow_super_property => {
                Ok(Expr::new(ExprKind::Super, keyword.span))
            }
            _ => Err(ParseError::new(ErrorKind::InvalidSuper, keyword.span)),
        }
    }

    /// `import(source)`, `import(source, options)`, `import.meta`
    fn parse_import_expr(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let keyword = self.advance()?; // import

        if self.eat(&TokenKind::Dot)? {
            let span = self.current.span;
            if !matches!(self.peek(), TokenKind::Identifier(name) if name == "meta") || self.current.escaped {
                let found = self.peek().name_text().unwrap_or_default().to_string();
                return Err(ParseError::new(ErrorKind::InvalidMetaProperty(format!("import.{found}")), span));
            }
            if !ctx.module {
                return Err(ParseError::new(ErrorKind::ImportMetaOutsideModule, Span::new(start, span.end)));
            }
            self.advance()?;
            return Ok(Expr::new(
                ExprKind::MetaProperty {
                    meta: Identifier::new("import", keyword.span),
                    property: Identifier::new("meta", span),
                },
                self.span_from(start),
            ));
        }

        self.expect(&TokenKind::LParen)?;
        if self.check(&TokenKind::RParen) {
            return Err(ParseError::new(ErrorKind::InvalidDynamicImport, self.current.span));
        }
        let arg_ctx = ctx.with_allow_in(true);
        let source = self.parse_assign_expr(arg_ctx)?;

        let mut options = None;
        if self.check(&TokenKind::Comma) {
            if !self.options.next {
                return Err(ParseError::new(ErrorKind::RequiresNext("import options"), self.current.span));
            }
            self.advance()?;
            if !self.check(&TokenKind::RParen) {
                options = Some(Box::new(self.parse_assign_expr(arg_ctx)?));
                self.eat(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;

        Ok(Expr::new(
            ExprKind::Import {
                source: Box::new(source),
                options,
            },
            self.span_from(start),
        ))
    }

    /// Everything that starts with `async`: async functions, async arrows,
    /// a call to a function named `async`, or the identifier itself.
    fn parse_async_expr(&mut self, ctx: Context, can_be_arrow: bool) -> Result<Expr, ParseError> {
        let token = self.current.clone();
        let start = token.span.start;
        let next = self.peek_next();

        if matches!(next.kind, TokenKind::Function) && !next.newline_before {
            self.advance()?; // async
            return self.parse_function_expression(ctx, start, true);
        }

        // async x => ...
        if can_be_arrow && !next.newline_before && next.kind.identifier_name().is_some() {
            self.advance()?; // async
            let param_span = self.current.span;
            let name = self.peek().identifier_name().unwrap_or_default().to_string();
            if name == "await" {
                return Err(ParseError::new(ErrorKind::ReservedWord(name), param_span));
            }
            self.check_binding_name(ctx, &name, param_span)?;
            self.advance()?;
            if !self.check(&TokenKind::Arrow) || self.current.newline_before {
                return Err(self.unexpected());
            }
            let param = Pattern::new(PatternKind::Ident(name), param_span);
            return self.parse_arrow_function(ctx, start, vec![param], true);
        }

        self.advance()?; // async
        let callee = Expr::new(ExprKind::Ident("async".to_string()), token.span);

        if !self.check(&TokenKind::LParen) {
            self.check_identifier_reference(ctx, "async", token.span)?;
            if can_be_arrow && self.check(&TokenKind::Arrow) {
                if self.current.newline_before {
                    return Err(ParseError::new(ErrorKind::NewlineBeforeArrow, self.current.span));
                }
                let param = Pattern::new(PatternKind::Ident("async".to_string()), token.span);
                return self.parse_arrow_function(ctx, start, vec![param], false);
            }
            return Ok(callee);
        }

        // `async(...)`: arrow parameters or call arguments. A line break
        // between `async` and `(` rules out the arrow.
        let arrow_allowed = can_be_arrow && !self.current.newline_before;
        let saved = self.take_await_yield_positions();
        let list = self.parse_paren_cover(ctx)?;

        if arrow_allowed && self.check(&TokenKind::Arrow) {
            if self.current.newline_before {
                return Err(ParseError::new(ErrorKind::NewlineBeforeArrow, self.current.span));
            }
            if let Some(span) = self.yield_pos {
                return Err(ParseError::new(ErrorKind::YieldInParameter, span));
            }
            if let Some(span) = self.await_pos.or(self.await_ident_pos) {
                return Err(ParseError::new(ErrorKind::AwaitInParameter, span));
            }
            self.restore_await_yield_positions(saved);
            let params = list.into_params()?;
            return self.parse_arrow_function(ctx, start, params, true);
        }

        self.merge_await_yield_positions(saved);
        let args = list.into_arguments()?;
        Ok(call(callee, args, false, self.span_from(start)))
    }

    /// `(expr)` or arrow parameters `(a, b) => ...`.
    fn parse_paren_or_arrow(&mut self, ctx: Context, can_be_arrow: bool) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let saved = self.take_await_yield_positions();
        let list = self.parse_paren_cover(ctx)?;

        if can_be_arrow && self.check(&TokenKind::Arrow) {
            if self.current.newline_before {
                return Err(ParseError::new(ErrorKind::NewlineBeforeArrow, self.current.span));
            }
            if let Some(span) = self.yield_pos {
                return Err(ParseError::new(ErrorKind::YieldInParameter, span));
            }
            if let Some(span) = self.await_pos {
                return Err(ParseError::new(ErrorKind::AwaitInParameter, span));
            }
            self.restore_await_yield_positions(saved);
            let params = list.into_params()?;
            return self.parse_arrow_function(ctx, start, params, false);
        }

        self.merge_await_yield_positions(saved);
        list.into_expression()
    }

    /// The items between `(` and `)`, undecided between expression and parameters.
    fn parse_paren_cover(&mut self, ctx: Context) -> Result<ParenCover, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LParen)?;
        let item_ctx = ctx.with_allow_in(true);

        let mut items = Vec::new();
        let mut errors = CoverErrors::default();
        let mut trailing_comma = None;

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Spread) {
                let spread_start = self.current.span.start;
                self.advance()?;
                let arg = self.parse_assign_expr_cover(item_ctx, Some(&mut errors))?;
                items.push(Expr::new(ExprKind::Spread(Box::new(arg)), self.span_from(spread_start)));
            } else {
                items.push(self.parse_assign_expr_cover(item_ctx, Some(&mut errors))?);
            }
            if self.check(&TokenKind::RParen) {
                break;
            }
            let comma = self.expect(&TokenKind::Comma)?;
            if self.check(&TokenKind::RParen) {
                trailing_comma = Some(comma.span);
            }
        }

        self.expect(&TokenKind::RParen)?;
        Ok(ParenCover {
            items,
            trailing_comma,
            errors,
            span: self.span_from(start),
        })
    }

    pub(crate) fn take_await_yield_positions(&mut self) -> AwaitYieldPositions {
        (
            self.yield_pos.take(),
            self.await_pos.take(),
            self.await_ident_pos.take(),
        )
    }

    pub(crate) fn restore_await_yield_positions(&mut self, saved: AwaitYieldPositions) {
        (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;
    }

    /// Keep the earliest of the saved and current positions.
    fn merge_await_yield_positions(&mut self, saved: AwaitYieldPositions) {
        self.yield_pos = saved.0.or(self.yield_pos);
        self.await_pos = saved.1.or(self.await_pos);
        self.await_ident_pos = saved.2.or(self.await_ident_pos);
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// Array literal: `[a, , ...b]`
    fn parse_array_literal(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LBracket)?;
        let item_ctx = ctx.with_allow_in(true);
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            let is_spread = self.check(&TokenKind::Spread);
            let element = if is_spread {
                let spread_start = self.current.span.start;
                self.advance()?;
                let arg = self.parse_assign_expr_cover(item_ctx, Some(&mut *errors))?;
                Expr::new(ExprKind::Spread(Box::new(arg)), self.span_from(spread_start))
            } else {
                self.parse_assign_expr_cover(item_ctx, Some(&mut *errors))?
            };
            elements.push(Some(element));

            if self.check(&TokenKind::RBracket) {
                break;
            }
            let comma = self.expect(&TokenKind::Comma)?;
            if is_spread && self.check(&TokenKind::RBracket) {
                errors.trailing_rest_comma.get_or_insert(comma.span);
            }
        }

        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(ExprKind::Array(elements), self.span_from(start)))
    }

    /// Object literal: `{a: 1, b, [c]: 2, d() {}, get e() {}, ...f}`
    fn parse_object_literal(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Spread) {
                let spread_start = self.current.span.start;
                self.advance()?;
                let arg = self.parse_assign_expr_cover(ctx.with_allow_in(true), Some(&mut *errors))?;
                props.push(ObjectProperty::Spread(Expr::new(
                    ExprKind::Spread(Box::new(arg)),
                    self.span_from(spread_start),
                )));
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                let comma = self.expect(&TokenKind::Comma)?;
                if self.check(&TokenKind::RBrace) {
                    errors.trailing_rest_comma.get_or_insert(comma.span);
                }
                continue;
            }

            let prop = self.parse_object_property(ctx, errors)?;
            props.push(ObjectProperty::Property(prop));
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::Object(props), self.span_from(start)))
    }

    /// One `key: value`, shorthand, method or accessor entry.
    fn parse_object_property(&mut self, ctx: Context, errors: &mut CoverErrors) -> Result<Property, ParseError> {
        let start = self.current.span.start;
        let mut is_async = false;
        let mut is_generator = false;
        let mut kind = PropertyKind::Init;

        // Modifiers are only modifiers when a key follows them
        if self.check(&TokenKind::Async) && self.modifier_applies(true) {
            self.advance()?;
            is_async = true;
        }
        if self.eat(&TokenKind::Star)? {
            is_generator = true;
        }
        let accessor = match self.peek() {
            TokenKind::Get => Some(PropertyKind::Get),
            TokenKind::Set => Some(PropertyKind::Set),
            _ => None,
        };
        if let Some(accessor) = accessor {
            if !is_async && !is_generator && self.modifier_applies(false) {
                self.advance()?;
                kind = accessor;
            }
        }

        let key_token = self.current.clone();
        let (key, computed) = self.parse_property_key(ctx)?;
        if matches!(key.kind, ExprKind::PrivateName(_)) {
            return Err(ParseError::new(ErrorKind::UnexpectedToken(describe_key(&key)), key.span));
        }

        if is_async || is_generator || kind != PropertyKind::Init || self.check(&TokenKind::LParen) {
            let method_kind = match kind {
                PropertyKind::Get => MethodKind::Get,
                PropertyKind::Set => MethodKind::Set,
                _ => MethodKind::Method,
            };
            let value = self.parse_method(ctx, method_kind, is_async, is_generator, false)?;
            let span = value.span;
            return Ok(Property {
                key,
                value: Expr::new(ExprKind::Function(Box::new(value)), span),
                kind: if kind == PropertyKind::Init { PropertyKind::Method } else { kind },
                computed,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        if self.eat(&TokenKind::Colon)? {
            let value = self.parse_assign_expr_cover(ctx.with_allow_in(true), Some(&mut *errors))?;
            return Ok(Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed,
                shorthand: false,
                span: self.span_from(start),
            });
        }

        // Shorthand: `{a}` or, as a pattern only, `{a = 1}`
        let Some(name) = key_token.kind.identifier_name().map(str::to_string) else {
            return Err(self.unexpected());
        };
        self.check_identifier_reference(ctx, &name, key_token.span)?;
        let value = if self.check(&TokenKind::Eq) {
            errors.shorthand_init.get_or_insert(self.current.span);
            self.advance()?;
            let default = self.parse_assign_expr(ctx.with_allow_in(true))?;
            Expr::new(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    left: Box::new(Pattern::new(PatternKind::Ident(name), key_token.span)),
                    right: Box::new(default),
                },
                self.span_from(start),
            )
        } else {
            Expr::new(ExprKind::Ident(name), key_token.span)
        };

        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: true,
            span: self.span_from(start),
        })
    }

    /// Whether the `async`/`get`/`set`/`static` word at the current token
    /// is a modifier rather than the property name itself. `async` must be
    /// followed by the name on the same line.
    pub(crate) fn modifier_applies(&self, same_line: bool) -> bool {
        let next = self.peek_next();
        if same_line && next.newline_before {
            return false;
        }
        !matches!(
            next.kind,
            TokenKind::LParen
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::RBrace
                | TokenKind::Eq
                | TokenKind::Semicolon
                | TokenKind::Eof
        )
    }

    /// A property name: identifier or keyword, string, number, `[expr]`,
    /// or a private name (which callers may reject). Returns the key and
    /// whether it was computed.
    pub(crate) fn parse_property_key(&mut self, ctx: Context) -> Result<(Expr, bool), ParseError> {
        let token = self.current.clone();
        let kind = match &token.kind {
            TokenKind::LBracket => {
                self.advance()?;
                let key = self.parse_assign_expr(ctx.with_allow_in(true))?;
                self.expect(&TokenKind::RBracket)?;
                return Ok((key, true));
            }
            TokenKind::String(value) => {
                if token.legacy_octal && ctx.strict {
                    return Err(ParseError::new(ErrorKind::LegacyOctalEscape, token.span));
                }
                ExprKind::String(value.clone())
            }
            TokenKind::Number(value) => {
                if token.legacy_octal && ctx.strict {
                    return Err(ParseError::new(ErrorKind::LegacyOctalLiteral, token.span));
                }
                ExprKind::Number(*value)
            }
            TokenKind::BigInt(digits) => ExprKind::BigInt(digits.clone()),
            TokenKind::PrivateName(name) => ExprKind::PrivateName(name.clone()),
            kind => match kind.name_text() {
                Some(name) => ExprKind::Ident(name.to_string()),
                None => return Err(self.unexpected()),
            },
        };
        self.advance()?;
        Ok((Expr::new(kind, token.span), false))
    }

    /// Parse a template literal. Untagged templates reject invalid escapes;
    /// tagged ones keep them with a `None` cooked value.
    pub(crate) fn parse_template(&mut self, ctx: Context, tagged: bool) -> Result<Template, ParseError> {
        let start = self.current.span.start;
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();

        loop {
            let token = self.current.clone();
            let span = token.span;
            let (part, tail) = match token.kind {
                TokenKind::TemplateNoSub(part) | TokenKind::TemplateTail(part) => (part, true),
                TokenKind::TemplateHead(part) | TokenKind::TemplateMiddle(part) => (part, false),
                _ => return Err(self.unexpected()),
            };
            // The element excludes the backtick or `}` before it and the
            // backtick or `${` after it
            let end_delimiter = if tail { 1 } else { 2 };
            let element_span = Span::new(span.start + 1, span.end - end_delimiter);
            if part.cooked.is_none() && !tagged {
                return Err(ParseError::new(ErrorKind::InvalidTemplateEscape, element_span));
            }
            quasis.push(TemplateElement {
                cooked: part.cooked,
                raw: part.raw,
                tail,
                span: element_span,
            });
            self.advance()?;
            if tail {
                break;
            }

            exprs.push(self.parse_expression(ctx.with_allow_in(true))?);
            if !self.check(&TokenKind::RBrace) {
                return Err(self.unexpected());
            }
            self.current = self.lexer.scan_template_continuation(self.current.span.start)?;
        }

        Ok(Template {
            quasis,
            exprs,
            span: self.span_from(start),
        })
    }
}

/// Get the assignment operator for a token.
fn get_assign_op(kind: &TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::AddAssign,
        TokenKind::MinusEq => AssignOp::SubAssign,
        TokenKind::StarEq => AssignOp::MulAssign,
        TokenKind::SlashEq => AssignOp::DivAssign,
        TokenKind::PercentEq => AssignOp::ModAssign,
        TokenKind::StarStarEq => AssignOp::PowAssign,
        TokenKind::AmpEq => AssignOp::BitAndAssign,
        TokenKind::PipeEq => AssignOp::BitOrAssign,
        TokenKind::CaretEq => AssignOp::BitXorAssign,
        TokenKind::LtLtEq => AssignOp::ShlAssign,
        TokenKind::GtGtEq => AssignOp::ShrAssign,
        TokenKind::GtGtGtEq => AssignOp::UShrAssign,
        TokenKind::AmpAmpEq => AssignOp::AndAssign,
        TokenKind::PipePipeEq => AssignOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
        _ => return None,
    };
    Some(op)
}

/// Get the binary operator for a token.
fn get_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::StrictEq,
        TokenKind::BangEqEq => BinaryOp::StrictNotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::LtLt => BinaryOp::Shl,
        TokenKind::GtGt => BinaryOp::Shr,
        TokenKind::GtGtGt => BinaryOp::UShr,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::QuestionQuestion => BinaryOp::NullishCoalesce,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    };
    Some(op)
}

fn member(object: Expr, property: Expr, computed: bool, optional: bool, span: Span) -> Expr {
    Expr::new(
        ExprKind::Member {
            object: Box::new(object),
            property: Box::new(property),
            computed,
            optional,
        },
        span,
    )
}

fn call(callee: Expr, args: Vec<Expr>, optional: bool, span: Span) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(callee),
            args,
            optional,
        },
        span,
    )
}

/// `??` cannot share an unparenthesized operand with `&&` or `||`.
fn check_nullish_mixing(op: BinaryOp, left: &Expr, right: &Expr) -> Result<(), ParseError> {
    let conflicts = |operand: &Expr| match &operand.kind {
        ExprKind::Binary { op: inner, .. } => match op {
            BinaryOp::NullishCoalesce => matches!(inner, BinaryOp::And | BinaryOp::Or),
            BinaryOp::And | BinaryOp::Or => *inner == BinaryOp::NullishCoalesce,
            _ => false,
        },
        _ => false,
    };
    if conflicts(left) || conflicts(right) {
        return Err(ParseError::new(ErrorKind::MixedNullish, left.span.merge(right.span)));
    }
    Ok(())
}

/// `delete x` is a strict mode error, `delete this.#x` always is.
fn check_delete_operand(arg: &Expr, strict: bool) -> Result<(), ParseError> {
    let target = match &arg.unparenthesized().kind {
        ExprKind::Chain(inner) => inner.as_ref(),
        _ => arg.unparenthesized(),
    };
    match &target.kind {
        ExprKind::Ident(_) if strict => Err(ParseError::new(ErrorKind::StrictDelete, arg.span)),
        ExprKind::Member { property, .. } if matches!(property.kind, ExprKind::PrivateName(_)) => {
            Err(ParseError::new(ErrorKind::PrivateDelete, arg.span))
        }
        _ => Ok(()),
    }
}

/// `++x` / `x--` need an identifier or member expression.
fn check_update_target(arg: &Expr, strict: bool) -> Result<(), ParseError> {
    match &arg.unparenthesized().kind {
        ExprKind::Ident(name) if strict && matches!(name.as_str(), "eval" | "arguments") => Err(
            ParseError::new(ErrorKind::StrictEvalArguments(name.clone()), arg.span),
        ),
        ExprKind::Ident(_) | ExprKind::Member { .. } => Ok(()),
        _ => Err(ParseError::new(ErrorKind::InvalidUpdateTarget, arg.span)),
    }
}

fn private_name(expr: &Expr) -> &str {
    match &expr.kind {
        ExprKind::PrivateName(name) => name,
        _ => "",
    }
}

fn describe_key(key: &Expr) -> String {
    format!("#{}", private_name(key))
}
