//! Cover grammar resolution.
//!
//! Object and array literals, parenthesized lists and `async(...)` argument
//! lists are parsed once as expressions. When the token that follows decides
//! they were really patterns (`=`, `=>`, `of`, `in`), the finished nodes are
//! rewritten into [`Pattern`]s here. Nothing is rescanned.
//!
//! A few constructs are only valid in one reading. Those are remembered in
//! [`CoverErrors`] while parsing and reported once the reading is known.

use crate::ast::*;
use crate::error::{ErrorKind, ParseError};
use crate::parser::with_stack;
use crate::span::Span;

/// Problems that only count under one interpretation of a cover.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoverErrors {
    /// `{a = 1}`: fine as a pattern, an error as an object literal.
    pub shorthand_init: Option<Span>,
    /// `[...a,]`: fine as an array literal, an error as a pattern.
    pub trailing_rest_comma: Option<Span>,
}

impl CoverErrors {
    /// Keep the first occurrence of each problem.
    pub fn merge(&mut self, other: CoverErrors) {
        self.shorthand_init = self.shorthand_init.or(other.shorthand_init);
        self.trailing_rest_comma = self.trailing_rest_comma.or(other.trailing_rest_comma);
    }

    /// The cover turned out to be an expression.
    pub fn check_expression(&self) -> Result<(), ParseError> {
        if let Some(span) = self.shorthand_init {
            return Err(ParseError::new(ErrorKind::InvalidShorthandInit, span));
        }
        Ok(())
    }

    /// The cover turned out to be a pattern.
    pub fn check_pattern(&self) -> Result<(), ParseError> {
        match self.trailing_rest_comma {
            Some(span) => Err(ParseError::new(ErrorKind::RestNotLast, span)),
            None => Ok(()),
        }
    }
}

/// A parenthesized list whose meaning depends on what follows the `)`:
/// a parenthesized expression, arrow parameters, or (after `async`) call
/// arguments.
#[derive(Debug)]
pub struct ParenCover {
    /// Items in order; `...x` is kept as [`ExprKind::Spread`].
    pub items: Vec<Expr>,
    /// A comma directly before the closing `)`.
    pub trailing_comma: Option<Span>,
    pub errors: CoverErrors,
    /// From `(` to `)` inclusive.
    pub span: Span,
}

impl ParenCover {
    /// `(a, b)` as a parenthesized expression.
    pub fn into_expression(self) -> Result<Expr, ParseError> {
        self.errors.check_expression()?;
        if let Some(spread) = self.items.iter().find(|item| matches!(item.kind, ExprKind::Spread(_))) {
            return Err(unexpected("...", Span::new(spread.span.start, spread.span.start + 3)));
        }
        if self.items.is_empty() || self.trailing_comma.is_some() {
            return Err(unexpected(")", Span::new(self.span.end - 1, self.span.end)));
        }

        let mut items = self.items;
        let inner = if items.len() == 1 {
            items.remove(0)
        } else {
            let span = items[0].span.merge(items[items.len() - 1].span);
            Expr::new(ExprKind::Sequence(items), span)
        };
        Ok(Expr::new(ExprKind::Paren(Box::new(inner)), self.span))
    }

    /// `(a, [b], c = 1, ...d)` as arrow parameters.
    pub fn into_params(self) -> Result<Vec<Pattern>, ParseError> {
        self.errors.check_pattern()?;
        tracing::trace!(params = self.items.len(), "reinterpreting parenthesized list as arrow parameters");

        let last = self.items.len().saturating_sub(1);
        let mut params = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.into_iter().enumerate() {
            let span = item.span;
            match item.kind {
                ExprKind::Spread(arg) => {
                    if i != last {
                        return Err(ParseError::new(ErrorKind::RestNotLast, span));
                    }
                    if let Some(comma) = self.trailing_comma {
                        return Err(ParseError::new(ErrorKind::RestNotLast, comma));
                    }
                    params.push(binding_rest(*arg, span)?);
                }
                kind => params.push(to_binding_pattern(Expr::new(kind, span))?),
            }
        }
        Ok(params)
    }

    /// `async(a, ...b)` as call arguments.
    pub fn into_arguments(self) -> Result<Vec<Expr>, ParseError> {
        self.errors.check_expression()?;
        Ok(self.items)
    }
}

fn unexpected(text: &str, span: Span) -> ParseError {
    ParseError::new(ErrorKind::UnexpectedToken(text.to_string()), span)
}

// =============================================================================
// Assignment targets
// =============================================================================

/// Convert the left side of `=` (or a `for-in`/`for-of` head) into a pattern.
pub fn to_assignment_pattern(expr: Expr, strict: bool) -> Result<Pattern, ParseError> {
    assignment_target(expr, strict, false)
}

/// Left side of a compound assignment or operand of `++`/`--`: an
/// identifier or a member expression, possibly parenthesized.
pub fn to_simple_target(expr: Expr, strict: bool, kind: ErrorKind) -> Result<Pattern, ParseError> {
    let span = expr.span;
    match expr.kind {
        ExprKind::Ident(name) => {
            check_strict_target(&name, span, strict)?;
            Ok(Pattern::new(PatternKind::Ident(name), span))
        }
        ExprKind::Member { .. } => Ok(Pattern::new(PatternKind::Expr(Box::new(expr)), span)),
        ExprKind::Paren(inner) => to_simple_target(*inner, strict, kind),
        _ => Err(ParseError::new(kind, span)),
    }
}

fn check_strict_target(name: &str, span: Span, strict: bool) -> Result<(), ParseError> {
    if strict && matches!(name, "eval" | "arguments") {
        return Err(ParseError::new(ErrorKind::StrictEvalArguments(name.to_string()), span));
    }
    Ok(())
}

fn assignment_target(expr: Expr, strict: bool, nested: bool) -> Result<Pattern, ParseError> {
    with_stack(|| rewrite_assignment_target(expr, strict, nested))
}

fn rewrite_assignment_target(expr: Expr, strict: bool, nested: bool) -> Result<Pattern, ParseError> {
    let span = expr.span;
    let invalid = if nested {
        ErrorKind::InvalidDestructuringTarget
    } else {
        ErrorKind::InvalidAssignmentTarget
    };
    match expr.kind {
        ExprKind::Ident(_) | ExprKind::Member { .. } => {
            to_simple_target(expr, strict, invalid)
        }
        ExprKind::Paren(inner) => match inner.unparenthesized().kind {
            ExprKind::Ident(_) | ExprKind::Member { .. } => to_simple_target(*inner, strict, invalid),
            _ => Err(ParseError::new(invalid, span)),
        },
        ExprKind::Array(elements) => {
            let last = elements.len().saturating_sub(1);
            let mut out = Vec::with_capacity(elements.len());
            for (i, element) in elements.into_iter().enumerate() {
                let Some(element) = element else {
                    out.push(None);
                    continue;
                };
                let element_span = element.span;
                let pattern = match element.kind {
                    ExprKind::Spread(arg) => {
                        if i != last {
                            return Err(ParseError::new(ErrorKind::RestNotLast, element_span));
                        }
                        if matches!(arg.kind, ExprKind::Assign { .. }) {
                            return Err(ParseError::new(ErrorKind::RestInitializer, arg.span));
                        }
                        let arg = assignment_target(*arg, strict, true)?;
                        Pattern::new(PatternKind::Rest(Box::new(arg)), element_span)
                    }
                    kind => assignment_target(Expr::new(kind, element_span), strict, true)?,
                };
                out.push(Some(pattern));
            }
            Ok(Pattern::new(PatternKind::Array(out), span))
        }
        ExprKind::Object(props) => {
            let last = props.len().saturating_sub(1);
            let mut out = Vec::with_capacity(props.len());
            for (i, prop) in props.into_iter().enumerate() {
                match prop {
                    ObjectProperty::Property(prop) => {
                        if prop.kind != PropertyKind::Init {
                            return Err(ParseError::new(ErrorKind::InvalidDestructuringTarget, prop.span));
                        }
                        out.push(ObjectPatternProperty::Property {
                            key: prop.key,
                            value: assignment_target(prop.value, strict, true)?,
                            computed: prop.computed,
                            shorthand: prop.shorthand,
                            span: prop.span,
                        });
                    }
                    ObjectProperty::Spread(spread) => {
                        if i != last {
                            return Err(ParseError::new(ErrorKind::RestNotLast, spread.span));
                        }
                        let ExprKind::Spread(arg) = spread.kind else {
                            return Err(ParseError::new(invalid, spread.span));
                        };
                        // `{...x}` rest must be a simple target
                        let arg = to_simple_target(*arg, strict, ErrorKind::InvalidDestructuringTarget)?;
                        out.push(ObjectPatternProperty::Rest(Pattern::new(
                            PatternKind::Rest(Box::new(arg)),
                            spread.span,
                        )));
                    }
                }
            }
            Ok(Pattern::new(PatternKind::Object(out), span))
        }
        ExprKind::Assign { op: AssignOp::Assign, left, right } if nested => {
            Ok(Pattern::new(PatternKind::Assign { left, right }, span))
        }
        _ => Err(ParseError::new(invalid, span)),
    }
}

// =============================================================================
// Binding patterns (arrow parameters)
// =============================================================================

/// Convert one arrow parameter. Member expressions and parenthesized
/// targets are not bindings.
pub fn to_binding_pattern(expr: Expr) -> Result<Pattern, ParseError> {
    with_stack(|| rewrite_binding_pattern(expr))
}

fn rewrite_binding_pattern(expr: Expr) -> Result<Pattern, ParseError> {
    let span = expr.span;
    match expr.kind {
        ExprKind::Ident(name) => Ok(Pattern::new(PatternKind::Ident(name), span)),
        ExprKind::Array(elements) => {
            let last = elements.len().saturating_sub(1);
            let mut out = Vec::with_capacity(elements.len());
            for (i, element) in elements.into_iter().enumerate() {
                let Some(element) = element else {
                    out.push(None);
                    continue;
                };
                let element_span = element.span;
                let pattern = match element.kind {
                    ExprKind::Spread(arg) => {
                        if i != last {
                            return Err(ParseError::new(ErrorKind::RestNotLast, element_span));
                        }
                        binding_rest(*arg, element_span)?
                    }
                    kind => to_binding_pattern(Expr::new(kind, element_span))?,
                };
                out.push(Some(pattern));
            }
            Ok(Pattern::new(PatternKind::Array(out), span))
        }
        ExprKind::Object(props) => {
            let last = props.len().saturating_sub(1);
            let mut out = Vec::with_capacity(props.len());
            for (i, prop) in props.into_iter().enumerate() {
                match prop {
                    ObjectProperty::Property(prop) => {
                        if prop.kind != PropertyKind::Init {
                            return Err(ParseError::new(ErrorKind::InvalidDestructuringTarget, prop.span));
                        }
                        out.push(ObjectPatternProperty::Property {
                            key: prop.key,
                            value: to_binding_pattern(prop.value)?,
                            computed: prop.computed,
                            shorthand: prop.shorthand,
                            span: prop.span,
                        });
                    }
                    ObjectProperty::Spread(spread) => {
                        if i != last {
                            return Err(ParseError::new(ErrorKind::RestNotLast, spread.span));
                        }
                        let rest_span = spread.span;
                        let ExprKind::Spread(arg) = spread.kind else {
                            return Err(ParseError::new(ErrorKind::InvalidDestructuringTarget, rest_span));
                        };
                        let ExprKind::Ident(name) = arg.kind else {
                            return Err(ParseError::new(ErrorKind::InvalidDestructuringTarget, arg.span));
                        };
                        let arg = Pattern::new(PatternKind::Ident(name), arg.span);
                        out.push(ObjectPatternProperty::Rest(Pattern::new(
                            PatternKind::Rest(Box::new(arg)),
                            rest_span,
                        )));
                    }
                }
            }
            Ok(Pattern::new(PatternKind::Object(out), span))
        }
        ExprKind::Assign { op: AssignOp::Assign, left, right } => {
            check_binding(&left)?;
            Ok(Pattern::new(PatternKind::Assign { left, right }, span))
        }
        _ => Err(ParseError::new(ErrorKind::InvalidArrowParameters, span)),
    }
}

fn binding_rest(arg: Expr, span: Span) -> Result<Pattern, ParseError> {
    if matches!(arg.kind, ExprKind::Assign { .. }) {
        return Err(ParseError::new(ErrorKind::RestInitializer, arg.span));
    }
    let arg = to_binding_pattern(arg)?;
    Ok(Pattern::new(PatternKind::Rest(Box::new(arg)), span))
}

/// A pattern that was built as an assignment target must not contain
/// member expressions once it is reused as a binding.
fn check_binding(pattern: &Pattern) -> Result<(), ParseError> {
    match &pattern.kind {
        PatternKind::Ident(_) => Ok(()),
        PatternKind::Expr(_) => Err(ParseError::new(ErrorKind::InvalidDestructuringTarget, pattern.span)),
        PatternKind::Array(elements) => elements.iter().flatten().try_for_each(check_binding),
        PatternKind::Object(props) => props.iter().try_for_each(|prop| match prop {
            ObjectPatternProperty::Property { value, .. } => check_binding(value),
            ObjectPatternProperty::Rest(rest) => check_binding(rest),
        }),
        PatternKind::Assign { left, .. } => check_binding(left),
        PatternKind::Rest(arg) => check_binding(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Expr {
        Expr::new(ExprKind::Ident(name.into()), Span::new(start, start + name.len() as u32))
    }

    fn member(start: u32) -> Expr {
        Expr::new(
            ExprKind::Member {
                object: Box::new(ident("a", start)),
                property: Box::new(ident("b", start + 2)),
                computed: false,
                optional: false,
            },
            Span::new(start, start + 3),
        )
    }

    fn spread(arg: Expr) -> Expr {
        let span = Span::new(arg.span.start - 3, arg.span.end);
        Expr::new(ExprKind::Spread(Box::new(arg)), span)
    }

    fn default(name: &str, start: u32) -> Expr {
        let left = Pattern::new(PatternKind::Ident(name.into()), Span::new(start, start + 1));
        let right = ident("c", start + 4);
        Expr::new(
            ExprKind::Assign {
                op: AssignOp::Assign,
                left: Box::new(left),
                right: Box::new(right),
            },
            Span::new(start, start + 5),
        )
    }

    fn cover(items: Vec<Expr>) -> ParenCover {
        ParenCover {
            items,
            trailing_comma: None,
            errors: CoverErrors::default(),
            span: Span::new(0, 20),
        }
    }

    #[test]
    fn test_paren_list_as_params() {
        // (a, b = c, ...d)
        let params = cover(vec![ident("a", 1), default("b", 4), spread(ident("d", 14))])
            .into_params()
            .unwrap();
        assert_eq!(params.len(), 3);
        assert!(params[0].is_identifier());
        assert!(matches!(params[1].kind, PatternKind::Assign { .. }));
        assert!(matches!(params[2].kind, PatternKind::Rest(_)));
    }

    #[test]
    fn test_paren_list_as_expression() {
        let expr = cover(vec![ident("a", 1), default("b", 4)]).into_expression().unwrap();
        let ExprKind::Paren(inner) = expr.kind else { panic!("expected paren") };
        assert!(matches!(inner.kind, ExprKind::Sequence(ref items) if items.len() == 2));

        assert!(cover(vec![ident("a", 1), spread(ident("d", 8))]).into_expression().is_err());
        assert!(cover(Vec::new()).into_expression().is_err());
    }

    #[test]
    fn test_rest_must_be_last() {
        let err = cover(vec![spread(ident("a", 4)), ident("b", 8)]).into_params().unwrap_err();
        assert_eq!(err.kind, ErrorKind::RestNotLast);

        let mut trailing = cover(vec![spread(ident("a", 4))]);
        trailing.trailing_comma = Some(Span::new(5, 6));
        assert!(trailing.into_params().is_err());
    }

    #[test]
    fn test_non_pattern_param_fails() {
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(ident("f", 1)),
                args: Vec::new(),
                optional: false,
            },
            Span::new(1, 4),
        );
        let err = cover(vec![ident("a", 0), call]).into_params().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArrowParameters);

        // member expressions are assignment targets, not bindings
        assert!(cover(vec![member(1)]).into_params().is_err());
    }

    #[test]
    fn test_shorthand_init_only_valid_as_pattern() {
        let mut errors = CoverErrors::default();
        errors.merge(CoverErrors {
            shorthand_init: Some(Span::new(3, 4)),
            ..CoverErrors::default()
        });
        assert_eq!(
            errors.check_expression().unwrap_err().kind,
            ErrorKind::InvalidShorthandInit
        );
        assert!(errors.check_pattern().is_ok());
    }

    #[test]
    fn test_assignment_targets() {
        assert!(to_assignment_pattern(member(0), true).is_ok());
        let paren = Expr::new(ExprKind::Paren(Box::new(ident("a", 1))), Span::new(0, 3));
        assert!(to_assignment_pattern(paren, false).unwrap().is_identifier());

        let object = Expr::new(ExprKind::Object(Vec::new()), Span::new(1, 3));
        let paren_object = Expr::new(ExprKind::Paren(Box::new(object)), Span::new(0, 4));
        assert_eq!(
            to_assignment_pattern(paren_object, false).unwrap_err().kind,
            ErrorKind::InvalidAssignmentTarget
        );

        let err = to_assignment_pattern(ident("eval", 0), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StrictEvalArguments("eval".into()));
        assert!(to_assignment_pattern(ident("eval", 0), false).is_ok());
    }

    #[test]
    fn test_array_literal_to_pattern() {
        // [a, , b.c, ...d]
        let array = Expr::new(
            ExprKind::Array(vec![Some(ident("a", 1)), None, Some(member(6)), Some(spread(ident("d", 14)))]),
            Span::new(0, 16),
        );
        let pattern = to_assignment_pattern(array, false).unwrap();
        let PatternKind::Array(elements) = pattern.kind else { panic!("expected array") };
        assert!(elements[1].is_none());
        assert!(matches!(elements[2].as_ref().unwrap().kind, PatternKind::Expr(_)));
        assert!(matches!(elements[3].as_ref().unwrap().kind, PatternKind::Rest(_)));
    }
}
