//! JSX parsing.
//!
//! JSX switches the lexer between three modes: ordinary tokens inside
//! tags and `{}` containers, raw text between tags, and unescaped strings
//! for attribute values. The parser picks the mode at each step since only
//! it knows which one applies.

use std::mem;

use crate::ast::*;
use crate::context::Context;
use crate::error::{ErrorKind, ParseError};
use crate::parser::Parser;
use crate::token::{describe, Token, TokenKind};

/// Lexer mode for the next token.
#[derive(Debug, Clone, Copy)]
enum JsxScan {
    Child,
    AttributeValue,
}

/// Where the token after a closing `>` is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum After {
    /// Back in JavaScript.
    Expression,
    /// Still inside a parent's children.
    Child,
}

// =============================================================================
// JSX Parsing (extension methods on Parser)
// =============================================================================

impl<'a> Parser<'a> {
    /// `<` in operand position with JSX enabled.
    pub(crate) fn parse_jsx_expression(&mut self, ctx: Context) -> Result<Expr, ParseError> {
        self.parse_jsx_element_or_fragment(ctx, After::Expression)
    }

    /// Parse a JSX element or fragment starting at `<`.
    fn parse_jsx_element_or_fragment(&mut self, ctx: Context, after: After) -> Result<Expr, ParseError> {
        let start = self.current.span.start;

        // Consume `<`
        self.advance()?;

        // Check for fragment: `<>`
        if is_gt(self.peek()) {
            return self.parse_jsx_fragment(ctx, start, after);
        }

        // Parse element: `<Tag ...>`
        self.parse_jsx_element(ctx, start, after)
    }

    /// Parse a JSX fragment: `<>children</>`
    fn parse_jsx_fragment(&mut self, ctx: Context, start: u32, after: After) -> Result<Expr, ParseError> {
        self.expect_jsx_gt(After::Child)?;
        let opening_span = self.span_from(start);

        let children = self.parse_jsx_children(ctx)?;

        let close_start = self.current.span.start;
        self.expect_jsx_close_fragment(after)?;
        let closing_span = self.span_from(close_start);

        let span = self.span_from(start);
        Ok(Expr::new(
            ExprKind::JsxFragment(Box::new(JsxFragment {
                opening_span,
                children,
                closing_span,
                span,
            })),
            span,
        ))
    }

    /// Parse a JSX element: `<Tag attrs>children</Tag>` or `<Tag attrs />`
    fn parse_jsx_element(&mut self, ctx: Context, start: u32, after: After) -> Result<Expr, ParseError> {
        let name = self.parse_jsx_element_name()?;
        let attributes = self.parse_jsx_attributes(ctx)?;

        // Self-closing: `<Tag ... />`
        if self.eat(&TokenKind::Slash)? {
            self.expect_jsx_gt(after)?;
            let span = self.span_from(start);
            return Ok(Expr::new(
                ExprKind::JsxElement(Box::new(JsxElement {
                    opening: JsxOpeningElement {
                        name,
                        attributes,
                        self_closing: true,
                        span,
                    },
                    children: Vec::new(),
                    closing: None,
                    span,
                })),
                span,
            ));
        }

        self.expect_jsx_gt(After::Child)?;
        let opening_span = self.span_from(start);

        let children = self.parse_jsx_children(ctx)?;

        // Parse closing tag: `</Tag>`
        let close_start = self.current.span.start;
        let closing_name = self.expect_jsx_close_tag(&name, after)?;
        let span = self.span_from(start);

        Ok(Expr::new(
            ExprKind::JsxElement(Box::new(JsxElement {
                opening: JsxOpeningElement {
                    name,
                    attributes,
                    self_closing: false,
                    span: opening_span,
                },
                children,
                closing: Some(JsxClosingElement {
                    name: closing_name,
                    span: self.span_from(close_start),
                }),
                span,
            })),
            span,
        ))
    }

    /// Parse a JSX element name: `div`, `Foo`, `Foo.Bar`, `foo:bar`
    fn parse_jsx_element_name(&mut self) -> Result<JsxElementName, ParseError> {
        let first = self.expect_jsx_identifier()?;

        // Namespaced name: `foo:bar`
        if self.eat(&TokenKind::Colon)? {
            let name = self.expect_jsx_identifier()?;
            return Ok(JsxElementName::Namespaced {
                namespace: first,
                name,
            });
        }

        // Member expression: `Foo.Bar.Baz`
        if self.check(&TokenKind::Dot) {
            let mut parts = vec![first];
            while self.eat(&TokenKind::Dot)? {
                parts.push(self.expect_jsx_identifier()?);
            }
            return Ok(JsxElementName::Member(parts));
        }

        Ok(JsxElementName::Ident(first))
    }

    /// Parse JSX attributes: `key="value" onClick={handler} {...spread}`
    fn parse_jsx_attributes(&mut self, ctx: Context) -> Result<Vec<JsxAttribute>, ParseError> {
        let mut attributes = Vec::new();

        loop {
            // Stop at `>`, `/>`, or EOF
            if is_gt(self.peek()) || self.check(&TokenKind::Slash) || self.is_eof() {
                break;
            }

            let attr_start = self.current.span.start;

            // Spread attribute: `{...expr}`
            if self.eat(&TokenKind::LBrace)? {
                self.expect(&TokenKind::Spread)?;
                let argument = self.parse_assign_expr(ctx.with_allow_in(true))?;
                self.expect(&TokenKind::RBrace)?;
                attributes.push(JsxAttribute::Spread {
                    argument,
                    span: self.span_from(attr_start),
                });
                continue;
            }

            // Named attribute: `name`, `name="value"` or `name={expr}`
            let name = self.parse_jsx_attr_name()?;
            let value = if self.check(&TokenKind::Eq) {
                self.advance_jsx(JsxScan::AttributeValue)?;
                Some(self.parse_jsx_attr_value(ctx)?)
            } else {
                // Boolean attribute: `<input disabled />`
                None
            };

            attributes.push(JsxAttribute::Attribute {
                name,
                value,
                span: self.span_from(attr_start),
            });
        }

        Ok(attributes)
    }

    /// Parse a JSX attribute name: `className` or `xmlns:xlink`
    fn parse_jsx_attr_name(&mut self) -> Result<JsxAttrName, ParseError> {
        let name = self.expect_jsx_identifier()?;

        if self.eat(&TokenKind::Colon)? {
            let local = self.expect_jsx_identifier()?;
            return Ok(JsxAttrName::Namespaced {
                namespace: name,
                name: local,
            });
        }

        Ok(JsxAttrName::Ident(name))
    }

    /// Parse a JSX attribute value: `"string"`, `{expr}`, `<Element />`
    fn parse_jsx_attr_value(&mut self, ctx: Context) -> Result<JsxAttrValue, ParseError> {
        match self.peek() {
            TokenKind::String(value) => {
                let value = value.clone();
                let token = self.advance()?;
                Ok(JsxAttrValue::String(StringLiteral {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::LBrace => {
                let start = self.current.span.start;
                self.advance()?;
                if self.check(&TokenKind::RBrace) {
                    // `attr={}` has nothing to assign
                    return Err(self.unexpected());
                }
                let expr = self.parse_assign_expr(ctx.with_allow_in(true))?;
                self.expect(&TokenKind::RBrace)?;
                Ok(JsxAttrValue::Expr(JsxExprContainer {
                    expr: Some(expr),
                    span: self.span_from(start),
                }))
            }
            TokenKind::Lt => {
                let expr = self.nested(|p| p.parse_jsx_element_or_fragment(ctx, After::Expression))?;
                match expr.kind {
                    ExprKind::JsxElement(element) => Ok(JsxAttrValue::Element(element)),
                    ExprKind::JsxFragment(fragment) => Ok(JsxAttrValue::Fragment(fragment)),
                    _ => Err(ParseError::new(ErrorKind::UnexpectedToken("<".to_string()), expr.span)),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parse JSX children until `</` is encountered. The current token is
    /// the first child token.
    fn parse_jsx_children(&mut self, ctx: Context) -> Result<Vec<JsxChild>, ParseError> {
        let mut children = Vec::new();

        loop {
            match self.peek() {
                TokenKind::JsxText(value) => {
                    let value = value.clone();
                    let span = self.current.span;
                    self.advance_jsx(JsxScan::Child)?;
                    children.push(JsxChild::Text { value, span });
                }
                TokenKind::Lt => {
                    // `</` closes the parent
                    if matches!(self.peek_next().kind, TokenKind::Slash) {
                        break;
                    }
                    let child = self.nested(|p| p.parse_jsx_element_or_fragment(ctx, After::Child))?;
                    match child.kind {
                        ExprKind::JsxElement(element) => children.push(JsxChild::Element(element)),
                        ExprKind::JsxFragment(fragment) => children.push(JsxChild::Fragment(fragment)),
                        _ => return Err(ParseError::new(ErrorKind::UnexpectedToken("<".to_string()), child.span)),
                    }
                }
                TokenKind::LBrace => children.push(self.parse_jsx_child_container(ctx)?),
                _ => return Err(self.unexpected()),
            }
        }

        Ok(children)
    }

    /// `{expr}`, `{...expr}` or an empty `{}` between tags.
    fn parse_jsx_child_container(&mut self, ctx: Context) -> Result<JsxChild, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // {

        let child = if self.eat(&TokenKind::Spread)? {
            let expr = self.parse_expression(ctx.with_allow_in(true))?;
            self.expect_jsx_container_end()?;
            JsxChild::Spread {
                expr,
                span: self.span_from(start),
            }
        } else if self.check(&TokenKind::RBrace) {
            self.expect_jsx_container_end()?;
            JsxChild::Expr(JsxExprContainer {
                expr: None,
                span: self.span_from(start),
            })
        } else {
            let expr = self.parse_expression(ctx.with_allow_in(true))?;
            self.expect_jsx_container_end()?;
            JsxChild::Expr(JsxExprContainer {
                expr: Some(expr),
                span: self.span_from(start),
            })
        };
        Ok(child)
    }

    /// `}` of a child container; the next token is another child.
    fn expect_jsx_container_end(&mut self) -> Result<(), ParseError> {
        if !self.check(&TokenKind::RBrace) {
            return Err(self.unexpected());
        }
        self.advance_jsx(JsxScan::Child)?;
        Ok(())
    }

    /// Expect a closing tag `</Tag>` matching the opening tag name.
    fn expect_jsx_close_tag(
        &mut self,
        expected: &JsxElementName,
        after: After,
    ) -> Result<JsxElementName, ParseError> {
        self.expect(&TokenKind::Lt)?;
        self.expect(&TokenKind::Slash)?;
        let name_start = self.current.span.start;
        let name = self.parse_jsx_element_name()?;
        if name.to_string() != expected.to_string() {
            return Err(ParseError::new(
                ErrorKind::JsxMismatchedTag(expected.to_string()),
                self.span_from(name_start),
            ));
        }
        self.expect_jsx_gt(after)?;
        Ok(name)
    }

    /// Expect a closing fragment `</>`.
    fn expect_jsx_close_fragment(&mut self, after: After) -> Result<(), ParseError> {
        self.expect(&TokenKind::Lt)?;
        self.expect(&TokenKind::Slash)?;
        if !is_gt(self.peek()) {
            return Err(ParseError::new(ErrorKind::JsxMismatchedTag(String::new()), self.current.span));
        }
        self.expect_jsx_gt(after)
    }

    /// Expect a JSX identifier. Keywords count, and `-` may appear after
    /// the first character (`data-id`).
    fn expect_jsx_identifier(&mut self) -> Result<JsxIdentifier, ParseError> {
        let start = self.current.span.start;
        let Some(name) = self.peek().name_text() else {
            return Err(self.unexpected());
        };
        let mut name = name.to_string();
        name.push_str(&self.lexer.scan_jsx_name_tail());
        self.current.span.end = self.lexer.pos() as u32;
        self.advance()?;
        Ok(JsxIdentifier {
            name,
            span: self.span_from(start),
        })
    }

    /// Consume a `>` that closes a tag. The lexer may have merged it with
    /// what follows (`>>`, `>=`), so only its first character is taken.
    fn expect_jsx_gt(&mut self, after: After) -> Result<(), ParseError> {
        if !is_gt(self.peek()) {
            return Err(ParseError::new(
                ErrorKind::Expected {
                    expected: "'>'".to_string(),
                    found: describe(self.peek()),
                },
                self.current.span,
            ));
        }
        let end = self.current.span.start + 1;
        self.lexer.reset(end);
        self.current.span.end = end;
        match after {
            After::Child => self.advance_jsx(JsxScan::Child)?,
            After::Expression => self.advance()?,
        };
        Ok(())
    }

    /// Like [`advance`](Parser::advance), with the next token scanned in a
    /// JSX lexer mode.
    fn advance_jsx(&mut self, scan: JsxScan) -> Result<Token, ParseError> {
        let next = match scan {
            JsxScan::Child => self.lexer.scan_jsx_child()?,
            JsxScan::AttributeValue => self.lexer.scan_jsx_attribute_value()?,
        };
        self.prev_end = self.current.span.end;
        Ok(mem::replace(&mut self.current, next))
    }
}

/// `>` or a longer token that starts with it.
fn is_gt(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::GtGt
            | TokenKind::GtGtEq
            | TokenKind::GtGtGt
            | TokenKind::GtGtGtEq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParserOptions;
    use crate::span::Span;

    fn parse_jsx(source: &str) -> Result<Expr, ParseError> {
        let options = ParserOptions::default().with_jsx(true);
        let program = Parser::new(source, options)?.parse()?;
        match program.body.into_iter().next().map(|stmt| stmt.kind) {
            Some(StmtKind::Expr(expr)) => Ok(expr),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn element(expr: Expr) -> JsxElement {
        match expr.kind {
            ExprKind::JsxElement(element) => *element,
            other => panic!("expected JSX element, got {other:?}"),
        }
    }

    #[test]
    fn test_self_closing_element() {
        let el = element(parse_jsx("<input disabled data-id=\"a&amp;b\" />").unwrap());
        assert!(el.opening.self_closing);
        assert!(el.closing.is_none());
        assert_eq!(el.opening.attributes.len(), 2);
        let JsxAttribute::Attribute { name, value, .. } = &el.opening.attributes[1] else {
            panic!("expected attribute")
        };
        assert!(matches!(name, JsxAttrName::Ident(id) if id.name == "data-id"));
        assert!(matches!(value, Some(JsxAttrValue::String(s)) if s.value == "a&b"));
    }

    #[test]
    fn test_children() {
        let el = element(parse_jsx("<div>hello {name} <b>!</b>{/* note */}{...rest}</div>").unwrap());
        assert_eq!(el.children.len(), 6);
        assert!(matches!(&el.children[0], JsxChild::Text { value, .. } if value == "hello "));
        assert!(matches!(&el.children[1], JsxChild::Expr(c) if c.expr.is_some()));
        assert!(matches!(&el.children[3], JsxChild::Element(_)));
        assert!(matches!(&el.children[4], JsxChild::Expr(c) if c.expr.is_none()));
        assert!(matches!(&el.children[5], JsxChild::Spread { .. }));
        assert_eq!(el.closing.unwrap().name.to_string(), "div");
    }

    #[test]
    fn test_names() {
        let el = element(parse_jsx("<Foo.Bar.Baz></Foo.Bar.Baz>").unwrap());
        assert!(matches!(el.opening.name, JsxElementName::Member(ref parts) if parts.len() == 3));
        let el = element(parse_jsx("<svg:path />").unwrap());
        assert_eq!(el.opening.name.to_string(), "svg:path");
        let el = element(parse_jsx("<a class=\"x\" for={y} />").unwrap());
        assert_eq!(el.opening.attributes.len(), 2);
    }

    #[test]
    fn test_fragment_and_nesting() {
        let expr = parse_jsx("<><a>1</a><></></>").unwrap();
        let ExprKind::JsxFragment(fragment) = expr.kind else { panic!("expected fragment") };
        assert_eq!(fragment.children.len(), 2);
        assert_eq!(fragment.span, Span::new(0, 18));
    }

    #[test]
    fn test_merged_gt_tokens() {
        let el = element(parse_jsx("<a>=</a>").unwrap());
        assert!(matches!(&el.children[0], JsxChild::Text { value, .. } if value == "="));

        let expr = parse_jsx("<a></a>>1").unwrap();
        let ExprKind::Binary { op, left, .. } = expr.kind else { panic!("expected comparison") };
        assert_eq!(op, BinaryOp::Gt);
        assert!(matches!(left.kind, ExprKind::JsxElement(_)));
    }

    #[test]
    fn test_jsx_errors() {
        assert!(matches!(
            parse_jsx("<a></b>").unwrap_err().kind,
            ErrorKind::JsxMismatchedTag(ref name) if name == "a"
        ));
        assert!(matches!(parse_jsx("<a>").unwrap_err().kind, ErrorKind::UnterminatedJsx));
        assert!(parse_jsx("<a b={} />").is_err());
        assert!(matches!(parse_jsx("<a>}</a>").unwrap_err().kind, ErrorKind::InvalidCharacter('}')));
    }

    #[test]
    fn test_jsx_disabled_by_default() {
        let program = Parser::new("<a />", ParserOptions::default()).unwrap().parse();
        assert!(program.is_err());
    }
}
