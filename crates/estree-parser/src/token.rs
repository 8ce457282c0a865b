//! Token types for ECMAScript and JSX.
//!
//! Reserved words get their own variants. Contextual words (`let`, `yield`,
//! `async`, `of`, ...) also get variants so the parser can dispatch on them,
//! but they remain usable as identifiers wherever the grammar allows.

use crate::span::Span;

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator appeared between the previous token and this one.
    pub newline_before: bool,
    /// The identifier or keyword was written with `\u` escapes.
    pub escaped: bool,
    /// Legacy octal literal (`017`, `08`) or octal escape (`"\01"`, `"\8"`).
    /// Harmless in sloppy code, an error in strict code.
    pub legacy_octal: bool,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
            escaped: false,
            legacy_octal: false,
        }
    }
}

/// Cooked and raw text of one template chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    /// `None` when the chunk holds an escape that is only legal in tagged templates.
    pub cooked: Option<String>,
    /// Source text with line terminators normalized to `\n`.
    pub raw: String,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Literals ===
    /// Identifier: `foo`, `_bar`, `$baz`, `a`
    Identifier(String),
    /// A reserved word spelled with escapes: `if`. Only usable as a property name.
    EscapedKeyword(String),
    /// Private name: `#foo`
    PrivateName(String),
    /// String literal (cooked value): `"hello"`, `'world'`
    String(String),
    /// Number literal: `42`, `3.14`, `0xff`, `1_000`
    Number(f64),
    /// BigInt literal, digits without the `n` suffix: `42n`
    BigInt(String),
    /// Regular expression: `/pattern/flags`
    Regex { pattern: String, flags: String },
    /// Template without substitutions: `` `hello` ``
    TemplateNoSub(TemplatePart),
    /// Template head: `` `hello ${``
    TemplateHead(TemplatePart),
    /// Template middle: `` } middle ${``
    TemplateMiddle(TemplatePart),
    /// Template tail: `` } end` ``
    TemplateTail(TemplatePart),
    /// Run of JSX child text, entities already decoded.
    JsxText(String),

    // === Reserved words ===
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // === Contextual words ===
    As,
    Async,
    Await,
    From,
    Get,
    Let,
    Of,
    Set,
    Static,
    Yield,

    // === Punctuation ===
    // Brackets
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    // Delimiters
    Semicolon,  // ;
    Comma,      // ,
    Colon,      // :
    Dot,        // .
    Question,   // ?
    At,         // @ (decorators)

    // Arrows and spreads
    Arrow,      // =>
    Spread,     // ...

    // Optional chaining
    QuestionDot, // ?.

    // === Operators ===
    // Assignment
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    StarStarEq, // **=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    GtGtGtEq,   // >>>=
    AmpAmpEq,   // &&=
    PipePipeEq, // ||=
    QuestionQuestionEq, // ??=

    // Comparison
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    // Arithmetic
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    StarStar,   // **
    PlusPlus,   // ++
    MinusMinus, // --

    // Bitwise
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>

    // Logical
    AmpAmp,     // &&
    PipePipe,   // ||
    Bang,       // !
    QuestionQuestion, // ??

    // === Special ===
    /// End of file
    Eof,
    /// Produced only by lookahead when the scanner would fail.
    Invalid,
}

impl TokenKind {
    /// Check if this token can start an expression.
    pub fn can_start_expr(&self) -> bool {
        self.is_contextual()
            || matches!(
                self,
                TokenKind::Identifier(_)
                    | TokenKind::PrivateName(_)
                    | TokenKind::String(_)
                    | TokenKind::Number(_)
                    | TokenKind::BigInt(_)
                    | TokenKind::Regex { .. }
                    | TokenKind::TemplateNoSub(_)
                    | TokenKind::TemplateHead(_)
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Function
                    | TokenKind::Class
                    | TokenKind::New
                    | TokenKind::This
                    | TokenKind::Super
                    | TokenKind::Null
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Typeof
                    | TokenKind::Void
                    | TokenKind::Delete
                    | TokenKind::Plus
                    | TokenKind::Minus
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::PlusPlus
                    | TokenKind::MinusMinus
                    | TokenKind::Spread
                    | TokenKind::Import
                    | TokenKind::Slash
                    | TokenKind::SlashEq
                    | TokenKind::Lt
                    | TokenKind::At
            )
    }

    /// Check if this is a reserved word (never an identifier).
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            TokenKind::Break
                | TokenKind::Case
                | TokenKind::Catch
                | TokenKind::Class
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Debugger
                | TokenKind::Default
                | TokenKind::Delete
                | TokenKind::Do
                | TokenKind::Else
                | TokenKind::Enum
                | TokenKind::Export
                | TokenKind::Extends
                | TokenKind::False
                | TokenKind::Finally
                | TokenKind::For
                | TokenKind::Function
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Instanceof
                | TokenKind::New
                | TokenKind::Null
                | TokenKind::Return
                | TokenKind::Super
                | TokenKind::Switch
                | TokenKind::This
                | TokenKind::Throw
                | TokenKind::True
                | TokenKind::Try
                | TokenKind::Typeof
                | TokenKind::Var
                | TokenKind::Void
                | TokenKind::While
                | TokenKind::With
        )
    }

    /// Check if this is a contextual word that may also be an identifier.
    pub fn is_contextual(&self) -> bool {
        matches!(
            self,
            TokenKind::As
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::From
                | TokenKind::Get
                | TokenKind::Let
                | TokenKind::Of
                | TokenKind::Set
                | TokenKind::Static
                | TokenKind::Yield
        )
    }

    /// The name of an identifier-like token (plain identifier or contextual word).
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            kind if kind.is_contextual() => keyword_text(kind),
            _ => None,
        }
    }

    /// The text of any token usable as an IdentifierName (property keys,
    /// member names, export names): identifiers and every keyword.
    pub fn name_text(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) | TokenKind::EscapedKeyword(name) => Some(name),
            kind => keyword_text(kind),
        }
    }

    /// Check if this is an assignment operator.
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::PercentEq
                | TokenKind::StarStarEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
                | TokenKind::LtLtEq
                | TokenKind::GtGtEq
                | TokenKind::GtGtGtEq
                | TokenKind::AmpAmpEq
                | TokenKind::PipePipeEq
                | TokenKind::QuestionQuestionEq
        )
    }

    /// Get the precedence of a binary operator (higher = binds tighter).
    /// Returns None if not a binary operator.
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            TokenKind::QuestionQuestion => Some(1),
            TokenKind::PipePipe => Some(2),
            TokenKind::AmpAmp => Some(3),
            TokenKind::Pipe => Some(4),
            TokenKind::Caret => Some(5),
            TokenKind::Amp => Some(6),
            TokenKind::EqEq | TokenKind::EqEqEq | TokenKind::BangEq | TokenKind::BangEqEq => Some(7),
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
            | TokenKind::In | TokenKind::Instanceof => Some(8),
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => Some(9),
            TokenKind::Plus | TokenKind::Minus => Some(10),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(11),
            TokenKind::StarStar => Some(12), // Right associative
            _ => None,
        }
    }

    /// Check if this binary operator is right associative.
    pub fn is_right_associative(&self) -> bool {
        matches!(self, TokenKind::StarStar)
    }
}

/// Look up a keyword from an identifier string.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        "as" => TokenKind::As,
        "async" => TokenKind::Async,
        "await" => TokenKind::Await,
        "from" => TokenKind::From,
        "get" => TokenKind::Get,
        "let" => TokenKind::Let,
        "of" => TokenKind::Of,
        "set" => TokenKind::Set,
        "static" => TokenKind::Static,
        "yield" => TokenKind::Yield,
        _ => return None,
    };
    Some(kind)
}

/// The source text of a keyword token.
pub fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    let text = match kind {
        TokenKind::Break => "break",
        TokenKind::Case => "case",
        TokenKind::Catch => "catch",
        TokenKind::Class => "class",
        TokenKind::Const => "const",
        TokenKind::Continue => "continue",
        TokenKind::Debugger => "debugger",
        TokenKind::Default => "default",
        TokenKind::Delete => "delete",
        TokenKind::Do => "do",
        TokenKind::Else => "else",
        TokenKind::Enum => "enum",
        TokenKind::Export => "export",
        TokenKind::Extends => "extends",
        TokenKind::False => "false",
        TokenKind::Finally => "finally",
        TokenKind::For => "for",
        TokenKind::Function => "function",
        TokenKind::If => "if",
        TokenKind::Import => "import",
        TokenKind::In => "in",
        TokenKind::Instanceof => "instanceof",
        TokenKind::New => "new",
        TokenKind::Null => "null",
        TokenKind::Return => "return",
        TokenKind::Super => "super",
        TokenKind::Switch => "switch",
        TokenKind::This => "this",
        TokenKind::Throw => "throw",
        TokenKind::True => "true",
        TokenKind::Try => "try",
        TokenKind::Typeof => "typeof",
        TokenKind::Var => "var",
        TokenKind::Void => "void",
        TokenKind::While => "while",
        TokenKind::With => "with",
        TokenKind::As => "as",
        TokenKind::Async => "async",
        TokenKind::Await => "await",
        TokenKind::From => "from",
        TokenKind::Get => "get",
        TokenKind::Let => "let",
        TokenKind::Of => "of",
        TokenKind::Set => "set",
        TokenKind::Static => "static",
        TokenKind::Yield => "yield",
        _ => return None,
    };
    Some(text)
}

/// Words reserved only in strict mode code.
pub fn is_strict_reserved(name: &str) -> bool {
    matches!(
        name,
        "implements" | "interface" | "let" | "package" | "private" | "protected" | "public"
            | "static" | "yield"
    )
}

/// A short human-readable description of a token for error messages.
pub fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) | TokenKind::EscapedKeyword(name) => name.clone(),
        TokenKind::PrivateName(name) => format!("#{name}"),
        TokenKind::String(_) => "string".to_string(),
        TokenKind::Number(_) | TokenKind::BigInt(_) => "number".to_string(),
        TokenKind::Regex { .. } => "regular expression".to_string(),
        TokenKind::TemplateNoSub(_)
        | TokenKind::TemplateHead(_)
        | TokenKind::TemplateMiddle(_)
        | TokenKind::TemplateTail(_) => "template".to_string(),
        TokenKind::JsxText(_) => "JSX text".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Invalid => "invalid token".to_string(),
        kind => match keyword_text(kind) {
            Some(text) => text.to_string(),
            None => punctuator_text(kind).to_string(),
        },
    }
}

fn punctuator_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Semicolon => ";",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Dot => ".",
        TokenKind::Question => "?",
        TokenKind::At => "@",
        TokenKind::Arrow => "=>",
        TokenKind::Spread => "...",
        TokenKind::QuestionDot => "?.",
        TokenKind::Eq => "=",
        TokenKind::PlusEq => "+=",
        TokenKind::MinusEq => "-=",
        TokenKind::StarEq => "*=",
        TokenKind::SlashEq => "/=",
        TokenKind::PercentEq => "%=",
        TokenKind::StarStarEq => "**=",
        TokenKind::AmpEq => "&=",
        TokenKind::PipeEq => "|=",
        TokenKind::CaretEq => "^=",
        TokenKind::LtLtEq => "<<=",
        TokenKind::GtGtEq => ">>=",
        TokenKind::GtGtGtEq => ">>>=",
        TokenKind::AmpAmpEq => "&&=",
        TokenKind::PipePipeEq => "||=",
        TokenKind::QuestionQuestionEq => "??=",
        TokenKind::EqEq => "==",
        TokenKind::EqEqEq => "===",
        TokenKind::BangEq => "!=",
        TokenKind::BangEqEq => "!==",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Percent => "%",
        TokenKind::StarStar => "**",
        TokenKind::PlusPlus => "++",
        TokenKind::MinusMinus => "--",
        TokenKind::Amp => "&",
        TokenKind::Pipe => "|",
        TokenKind::Caret => "^",
        TokenKind::Tilde => "~",
        TokenKind::LtLt => "<<",
        TokenKind::GtGt => ">>",
        TokenKind::GtGtGt => ">>>",
        TokenKind::AmpAmp => "&&",
        TokenKind::PipePipe => "||",
        TokenKind::Bang => "!",
        TokenKind::QuestionQuestion => "??",
        _ => "token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for word in ["if", "yield", "let", "with", "enum", "of"] {
            let kind = keyword_from_str(word).unwrap();
            assert_eq!(keyword_text(&kind), Some(word));
        }
        assert_eq!(keyword_from_str("target"), None);
    }

    #[test]
    fn test_contextual_words_are_identifiers() {
        assert_eq!(TokenKind::Let.identifier_name(), Some("let"));
        assert_eq!(TokenKind::If.identifier_name(), None);
        assert_eq!(TokenKind::If.name_text(), Some("if"));
        assert!(TokenKind::Yield.can_start_expr());
    }

    #[test]
    fn test_precedence() {
        assert!(TokenKind::Star.binary_precedence() > TokenKind::Plus.binary_precedence());
        assert!(TokenKind::StarStar.is_right_associative());
        assert_eq!(TokenKind::Comma.binary_precedence(), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&TokenKind::GtGtGtEq), ">>>=");
        assert_eq!(describe(&TokenKind::Identifier("foo".into())), "foo");
        assert_eq!(describe(&TokenKind::Eof), "end of input");
    }
}
