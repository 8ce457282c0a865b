//! estree-parser: ECMAScript parser producing ESTree-shaped syntax trees
//!
//! # Design Principles
//!
//! 1. **Everything is an Expression, Pattern, or Statement**
//!    - Expressions: `foo(1)`, `a + b`, `x.y`
//!    - Patterns: `a`, `[a, b]`, `{x: y}`
//!    - Statements: `let a = 1;`, `if (x) {}`, `return x;`
//!
//! 2. **Lexing on-demand**
//!    - Lexer is called during parsing, not upfront
//!    - Enables context-sensitive tokenization (regex vs division, templates, JSX text)
//!
//! 3. **Early errors while parsing**
//!    - A scope arena tracks every binding as it is declared
//!    - Parenthesized lists and object/array literals are parsed once as
//!      a cover and reinterpreted as patterns when `=>` or `=` follows
//!    - The first error aborts the parse; no partial tree is returned
//!
//! 4. **Typed AST, JSON on demand**
//!    - [`Program`] is a plain Rust tree with spans on every node
//!    - [`Program::to_estree`] renders the standard ESTree JSON shape
//!
//! # Example
//!
//! ```
//! use estree_parser::{parse_estree, ParserOptions, SourceType};
//!
//! let options = ParserOptions::default().with_source_type(SourceType::Module);
//! let tree = parse_estree("export const x = 1 + 2;", options).unwrap();
//! assert_eq!(tree["body"][0]["type"], "ExportNamedDeclaration");
//! ```

mod ast;
mod context;
mod cover;
mod error;
mod estree;
mod expression;
mod function;
mod jsx;
mod lexer;
mod parser;
mod scope;
mod span;
mod token;

// Re-exports
pub use ast::*;
pub use context::{ParserOptions, SourceType};
pub use error::{ErrorCategory, ErrorKind, ParseError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::{LineIndex, Position, Span};
pub use token::{Token, TokenKind};

/// Parse ECMAScript source text into an AST.
///
/// On failure the returned error carries its line/column position.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len(), goal = options.source_type.as_str()))]
pub fn parse(source: &str, options: ParserOptions) -> Result<Program, ParseError> {
    Parser::new(source, options)
        .and_then(Parser::parse)
        .map_err(|err| {
            let err = err.with_position(&LineIndex::new(source));
            tracing::debug!(kind = ?err.kind, offset = err.span.start, "parse failed");
            err
        })
}

/// Parse and render the ESTree JSON view in one step.
pub fn parse_estree(source: &str, options: ParserOptions) -> Result<serde_json::Value, ParseError> {
    let program = parse(source, options.clone())?;
    Ok(program.to_estree(source, &options))
}

/// Parse, handing any error to `on_error` together with the source text.
///
/// This is the hook for hosts that format diagnostics themselves, e.g.
/// `parse_with(src, opts, |err, src| eprint!("{}", err.render(src)))`.
pub fn parse_with<F>(source: &str, options: ParserOptions, on_error: F) -> Option<Program>
where
    F: FnOnce(&ParseError, &str),
{
    match parse(source, options) {
        Ok(program) => Some(program),
        Err(err) => {
            on_error(&err, source);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_has_position() {
        let err = parse("let a;\nlet a;", ParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateBinding("a".into()));
        assert_eq!(err.position, Position { line: 2, column: 4 });
    }

    #[test]
    fn test_parse_with_reports_once() {
        let mut reports = Vec::new();
        let program = parse_with("(", ParserOptions::default(), |err, src| {
            reports.push(err.render(src));
        });
        assert!(program.is_none());
        assert_eq!(reports.len(), 1);
        assert!(reports[0].starts_with("error: "));

        let program = parse_with("x", ParserOptions::default(), |_, _| panic!("unexpected error"));
        assert!(program.is_some());
    }
}
