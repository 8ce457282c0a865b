//! Parse errors.
//!
//! Every failure is a [`ParseError`]: one [`ErrorKind`] from a closed set,
//! the offending byte span, and a line/column position. The first error
//! aborts the parse; nothing is accumulated.

use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use thiserror::Error;

use crate::span::{LineIndex, Position, Span};

/// Broad class of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed token: literal, escape, comment.
    Lexical,
    /// The token stream does not match the grammar.
    Syntax,
    /// Grammatically fine but forbidden by an early-error rule.
    StaticSemantics,
}

/// What went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // === Lexical ===
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unterminated template literal")]
    UnterminatedTemplate,
    #[error("Unterminated regular expression")]
    UnterminatedRegExp,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Invalid escape sequence")]
    InvalidEscape,
    #[error("Invalid Unicode escape sequence")]
    InvalidUnicodeEscape,
    #[error("Invalid hexadecimal escape sequence")]
    InvalidHexEscape,
    #[error("Invalid escape sequence in template")]
    InvalidTemplateEscape,
    #[error("Invalid or unexpected number")]
    InvalidNumber,
    #[error("Numeric separators are not allowed here")]
    InvalidNumericSeparator,
    #[error("Identifier starts immediately after numeric literal")]
    IdentifierAfterNumber,
    #[error("Invalid regular expression flags '{0}'")]
    InvalidRegExpFlags(String),
    #[error("Invalid or unexpected token '{0}'")]
    InvalidCharacter(char),
    #[error("Octal literals are not allowed in strict mode")]
    LegacyOctalLiteral,
    #[error("Octal escape sequences are not allowed in strict mode")]
    LegacyOctalEscape,
    #[error("Keywords cannot contain escape characters")]
    EscapedKeyword,
    #[error("Unterminated JSX contents")]
    UnterminatedJsx,

    // === Syntax ===
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Expected '{expected}' but found '{found}'")]
    Expected { expected: String, found: String },
    #[error("Invalid left-hand side in assignment")]
    InvalidAssignmentTarget,
    #[error("Invalid left-hand side expression in update operation")]
    InvalidUpdateTarget,
    #[error("Invalid left-hand side in {0} loop")]
    InvalidForTarget(&'static str),
    #[error("Invalid destructuring assignment target")]
    InvalidDestructuringTarget,
    #[error("Invalid arrow function parameter list")]
    InvalidArrowParameters,
    #[error("Invalid shorthand property initializer")]
    InvalidShorthandInit,
    #[error("Rest element must be last element")]
    RestNotLast,
    #[error("Rest element may not have a default initializer")]
    RestInitializer,
    #[error("Unary operator used immediately before exponentiation expression; parenthesize the operand")]
    UnaryBeforeExponent,
    #[error("Cannot mix '??' with '&&' or '||' without parentheses")]
    MixedNullish,
    #[error("Illegal newline after throw")]
    NewlineAfterThrow,
    #[error("Line terminator not permitted before arrow")]
    NewlineBeforeArrow,
    #[error("{0} loop variable declaration may not have an initializer")]
    ForInOfInitializer(&'static str),
    #[error("Only a single variable declaration is allowed in a {0} loop")]
    ForInOfMultipleBindings(&'static str),
    #[error("Missing initializer in {0} declaration")]
    MissingInitializer(&'static str),
    #[error("Lexical declaration cannot appear in a single-statement context")]
    LexicalInStatementPosition,
    #[error("Function declarations are not allowed in a single-statement context")]
    FunctionInStatementPosition,
    #[error("Invalid optional chain")]
    InvalidOptionalChain,
    #[error("Cannot use 'import.meta' outside a module")]
    ImportMetaOutsideModule,
    #[error("Cannot use import/export statements outside a module")]
    ModuleSyntaxInScript,
    #[error("'import' and 'export' may only appear at the top level")]
    ModuleSyntaxNotTopLevel,
    #[error("'{0}' is not a valid meta property")]
    InvalidMetaProperty(String),
    #[error("'for await' is only valid in async functions and the top level of modules")]
    ForAwaitOutsideAsync,
    #[error("More than one default clause in switch statement")]
    MultipleDefaults,
    #[error("Missing catch or finally after try")]
    MissingCatchOrFinally,
    #[error("Invalid dynamic import")]
    InvalidDynamicImport,
    #[error("Duplicate import attribute '{0}'")]
    DuplicateImportAttribute(String),
    #[error("A string literal cannot be used as an exported binding without 'from'")]
    StringExportWithoutFrom,
    #[error("Expected corresponding JSX closing tag for '{0}'")]
    JsxMismatchedTag(String),
    #[error("{0} requires the 'next' option")]
    RequiresNext(&'static str),
    #[error("Maximum nesting depth exceeded")]
    NestingTooDeep,

    // === Static semantics ===
    #[error("Identifier '{0}' has already been declared")]
    DuplicateBinding(String),
    #[error("Duplicate parameter name '{0}' not allowed in this context")]
    DuplicateParameter(String),
    #[error("Duplicate export of '{0}'")]
    DuplicateExport(String),
    #[error("Label '{0}' has already been declared")]
    DuplicateLabel(String),
    #[error("Undefined label '{0}'")]
    UndefinedLabel(String),
    #[error("Illegal continue statement: '{0}' does not denote an iteration statement")]
    ContinueTargetNotLoop(String),
    #[error("Illegal break statement")]
    IllegalBreak,
    #[error("Illegal continue statement: no surrounding iteration statement")]
    IllegalContinue,
    #[error("Illegal return statement")]
    IllegalReturn,
    #[error("Unexpected reserved word '{0}'")]
    ReservedWord(String),
    #[error("Unexpected strict mode reserved word '{0}'")]
    StrictReservedWord(String),
    #[error("Unexpected '{0}' in strict mode")]
    StrictEvalArguments(String),
    #[error("let is disallowed as a lexically bound name")]
    LetInLexicalBinding,
    #[error("Yield expression not allowed in formal parameter")]
    YieldInParameter,
    #[error("Await expression not allowed in formal parameter")]
    AwaitInParameter,
    #[error("'super' keyword unexpected here")]
    InvalidSuper,
    #[error("'super' call is only valid in a derived class constructor")]
    InvalidSuperCall,
    #[error("new.target expression is not allowed here")]
    InvalidNewTarget,
    #[error("Strict mode code may not include a with statement")]
    StrictWith,
    #[error("Delete of an unqualified identifier in strict mode")]
    StrictDelete,
    #[error("Private fields can not be deleted")]
    PrivateDelete,
    #[error("Illegal 'use strict' directive in function with non-simple parameter list")]
    IllegalUseStrict,
    #[error("Classes may not have a static property named '{0}'")]
    InvalidStaticMember(String),
    #[error("A class may only have one constructor")]
    DuplicateConstructor,
    #[error("Class constructor may not be an accessor, generator or async method")]
    SpecialConstructor,
    #[error("Classes may not have a field named 'constructor'")]
    ConstructorField,
    #[error("Getter must not have any formal parameters")]
    GetterArity,
    #[error("Setter must have exactly one formal parameter")]
    SetterArity,
    #[error("Private name '#{0}' has already been declared")]
    DuplicatePrivateName(String),
    #[error("Private field '#{0}' must be declared in an enclosing class")]
    UndeclaredPrivateName(String),
    #[error("Classes may not have a private element named '#constructor'")]
    PrivateConstructor,
    #[error("'arguments' is not allowed in class field initializer or static initialization block")]
    ArgumentsInClassInit,
}

impl ErrorKind {
    /// Which part of the grammar raised this error.
    pub fn category(&self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            UnterminatedString | UnterminatedTemplate | UnterminatedRegExp
            | UnterminatedComment | InvalidEscape | InvalidUnicodeEscape | InvalidHexEscape
            | InvalidTemplateEscape | InvalidNumber | InvalidNumericSeparator
            | IdentifierAfterNumber | InvalidRegExpFlags(_) | InvalidCharacter(_)
            | LegacyOctalLiteral | LegacyOctalEscape | EscapedKeyword | UnterminatedJsx => {
                ErrorCategory::Lexical
            }
            UnexpectedToken(_) | UnexpectedEof | Expected { .. } | InvalidAssignmentTarget
            | InvalidUpdateTarget | InvalidForTarget(_) | InvalidDestructuringTarget
            | InvalidArrowParameters | InvalidShorthandInit | RestNotLast | RestInitializer
            | UnaryBeforeExponent | MixedNullish | NewlineAfterThrow | NewlineBeforeArrow
            | ForInOfInitializer(_) | ForInOfMultipleBindings(_) | MissingInitializer(_)
            | LexicalInStatementPosition | FunctionInStatementPosition | InvalidOptionalChain
            | ImportMetaOutsideModule | ModuleSyntaxInScript | ModuleSyntaxNotTopLevel
            | InvalidMetaProperty(_) | ForAwaitOutsideAsync | MultipleDefaults
            | MissingCatchOrFinally | InvalidDynamicImport | DuplicateImportAttribute(_)
            | StringExportWithoutFrom | JsxMismatchedTag(_) | RequiresNext(_)
            | NestingTooDeep => {
                ErrorCategory::Syntax
            }
            _ => ErrorCategory::StaticSemantics,
        }
    }
}

/// A positioned parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub span: Span,
    /// Line/column of `span.start`. Line 0 means "not yet resolved".
    pub position: Position,
}

impl ParseError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            position: Position::default(),
        }
    }

    /// Fill in the line/column from a line index.
    #[must_use]
    pub fn with_position(mut self, index: &LineIndex<'_>) -> Self {
        self.position = index.position(self.span.start);
        self
    }

    /// The human-readable message, without position.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Render a compiler-style report: header, the offending line, and a caret underline.
    pub fn render(&self, source: &str) -> String {
        let index = LineIndex::new(source);
        let pos = index.position(self.span.start);
        let line = index.line_text(pos.line);
        let gutter = pos.line.to_string();
        let pad = " ".repeat(gutter.len());

        let prefix: String = line
            .chars()
            .take(pos.column as usize)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let end_pos = index.position(self.span.end);
        let width = if end_pos.line == pos.line {
            (end_pos.column.saturating_sub(pos.column)).max(1)
        } else {
            (line.chars().count() as u32).saturating_sub(pos.column).max(1)
        };

        format!(
            "error: {}\n{pad}--> {}:{}\n{pad} |\n{gutter} | {line}\n{pad} | {prefix}{}\n",
            self.kind,
            pos.line,
            pos.column,
            "^".repeat(width as usize),
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position.line == 0 {
            write!(f, "{} at offset {}", self.kind, self.span.start)
        } else {
            write!(
                f,
                "{} ({}:{})",
                self.kind, self.position.line, self.position.column
            )
        }
    }
}

impl std::error::Error for ParseError {}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.kind.category() {
            ErrorCategory::Lexical => "estree_parser::lexical",
            ErrorCategory::Syntax => "estree_parser::syntax",
            ErrorCategory::StaticSemantics => "estree_parser::early_error",
        };
        Some(Box::new(code))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let start = self.span.start as usize;
        let len = self.span.len() as usize;
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.kind.to_string()),
            start,
            len,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_points_at_span() {
        let source = "let a;\nlet a;";
        let err = ParseError::new(ErrorKind::DuplicateBinding("a".into()), Span::new(11, 12));
        let report = err.render(source);
        assert!(report.starts_with("error: Identifier 'a' has already been declared"));
        assert!(report.contains("--> 2:4"));
        assert!(report.contains("2 | let a;"));
        assert!(report.ends_with("|     ^\n"));
    }

    #[test]
    fn test_display_with_and_without_position() {
        let source = "x\n  ?";
        let err = ParseError::new(ErrorKind::UnexpectedEof, Span::new(4, 5));
        assert_eq!(err.to_string(), "Unexpected end of input at offset 4");
        let err = err.with_position(&LineIndex::new(source));
        assert_eq!(err.to_string(), "Unexpected end of input (2:2)");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorKind::InvalidNumber.category(), ErrorCategory::Lexical);
        assert_eq!(ErrorKind::UnexpectedEof.category(), ErrorCategory::Syntax);
        assert_eq!(
            ErrorKind::DuplicateExport("x".into()).category(),
            ErrorCategory::StaticSemantics
        );
    }

    #[test]
    fn test_miette_label_covers_span() {
        let err = ParseError::new(ErrorKind::StrictWith, Span::new(3, 7));
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 3);
        assert_eq!(labels[0].len(), 4);
    }
}
