//! Lexer (tokenizer) for ECMAScript and JSX.
//!
//! The lexer converts source text into tokens on demand. The parser drives
//! it and supplies the context the grammar needs: a `/` is scanned as a
//! punctuator and rescanned as a regular expression when the parser is at
//! an operand position, a `}` is rescanned as a template continuation, and
//! JSX children and attribute values have their own entry points.

use crate::error::{ErrorKind, ParseError};
use crate::span::Span;
use crate::token::{keyword_from_str, TemplatePart, Token, TokenKind};

type LexResult<T> = Result<T, ParseError>;

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    /// Source code as bytes (for fast indexing).
    bytes: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// A line terminator was skipped before the current token.
    newline_before: bool,
    /// The current identifier used `\u` escapes.
    escaped: bool,
    /// The current literal used legacy octal syntax.
    legacy_octal: bool,
    /// Recognise `<!--` and `-->` as single-line comments.
    html_comments: bool,
    /// At least one token has been produced.
    seen_token: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            token_start: 0,
            newline_before: false,
            escaped: false,
            legacy_octal: false,
            html_comments: false,
            seen_token: false,
        }
    }

    /// Enable HTML-like comments (script goal with web compatibility).
    #[must_use]
    pub fn with_html_comments(mut self, enabled: bool) -> Self {
        self.html_comments = enabled;
        self
    }

    /// Get the current byte position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor back to `pos` (used to split `>>` inside JSX tags).
    pub fn reset(&mut self, pos: u32) {
        self.pos = pos as usize;
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.newline_before = false;
        self.escaped = false;
        self.legacy_octal = false;
        self.skip_trivia()?;
        self.token_start = self.pos;

        if self.is_eof() {
            return Ok(self.make_token(TokenKind::Eof));
        }

        let ch = self.current();
        let kind = match ch {
            // Identifiers and keywords
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | b'\\' => self.scan_identifier()?,

            // Numbers
            b'0'..=b'9' => self.scan_number()?,

            // Strings
            b'"' | b'\'' => self.scan_string(ch)?,

            // Template literals
            b'`' => {
                self.advance();
                self.scan_template_part(true)?
            }

            // Punctuation and operators
            b'(' => { self.advance(); TokenKind::LParen }
            b')' => { self.advance(); TokenKind::RParen }
            b'{' => { self.advance(); TokenKind::LBrace }
            b'}' => { self.advance(); TokenKind::RBrace }
            b'[' => { self.advance(); TokenKind::LBracket }
            b']' => { self.advance(); TokenKind::RBracket }
            b';' => { self.advance(); TokenKind::Semicolon }
            b',' => { self.advance(); TokenKind::Comma }
            b':' => { self.advance(); TokenKind::Colon }
            b'@' => { self.advance(); TokenKind::At }
            b'~' => { self.advance(); TokenKind::Tilde }
            b'#' => self.scan_private_name()?,

            b'.' => self.scan_dot()?,
            b'?' => self.scan_question(),
            b'+' => self.scan_plus(),
            b'-' => self.scan_minus(),
            b'*' => self.scan_star(),
            b'/' => self.scan_slash(),
            b'%' => self.scan_percent(),
            b'=' => self.scan_equals(),
            b'!' => self.scan_bang(),
            b'<' => self.scan_less_than(),
            b'>' => self.scan_greater_than(),
            b'&' => self.scan_ampersand(),
            b'|' => self.scan_pipe(),
            b'^' => self.scan_caret(),

            _ if ch >= 0x80 => {
                let c = self.current_char();
                if is_id_start(c) {
                    self.scan_identifier()?
                } else {
                    return Err(self.error(ErrorKind::InvalidCharacter(c)));
                }
            }

            _ => {
                let c = char::from(ch);
                return Err(self.error(ErrorKind::InvalidCharacter(c)));
            }
        };

        Ok(self.make_token(kind))
    }

    /// Peek at the next token without consuming it. A token the scanner
    /// would reject comes back as [`TokenKind::Invalid`].
    pub fn peek(&self) -> Token {
        let mut ahead = self.clone();
        match ahead.next_token() {
            Ok(token) => token,
            Err(err) => Token::new(TokenKind::Invalid, err.span),
        }
    }

    /// Rescan the `/` or `/=` token starting at `start` as a regular expression.
    pub fn rescan_regex(&mut self, start: u32) -> LexResult<Token> {
        self.pos = start as usize;
        self.token_start = self.pos;
        self.advance(); // opening /

        let mut in_class = false;
        loop {
            if self.is_eof() {
                return Err(self.error(ErrorKind::UnterminatedRegExp));
            }
            let c = self.current_char();
            if is_line_terminator(c) {
                return Err(self.error(ErrorKind::UnterminatedRegExp));
            }
            match c {
                '\\' => {
                    self.advance();
                    if self.is_eof() || is_line_terminator(self.current_char()) {
                        return Err(self.error(ErrorKind::UnterminatedRegExp));
                    }
                    self.advance_char();
                }
                '[' => {
                    in_class = true;
                    self.advance();
                }
                ']' => {
                    in_class = false;
                    self.advance();
                }
                '/' if !in_class => break,
                _ => self.advance_char(),
            }
        }
        let pattern = self.source[self.token_start + 1..self.pos].to_string();
        self.advance(); // closing /

        let flags_start = self.pos;
        while !self.is_eof() && is_id_part(self.current_char()) {
            self.advance_char();
        }
        let flags = self.source[flags_start..self.pos].to_string();
        validate_regex_flags(&flags).map_err(|kind| {
            ParseError::new(kind, Span::new(flags_start as u32, self.pos as u32))
        })?;

        Ok(self.make_token(TokenKind::Regex { pattern, flags }))
    }

    /// Scan the template continuation that begins with the `}` at `start`.
    pub fn scan_template_continuation(&mut self, start: u32) -> LexResult<Token> {
        self.pos = start as usize + 1;
        self.token_start = start as usize;
        let kind = self.scan_template_part(false)?;
        Ok(self.make_token(kind))
    }

    /// Scan one JSX child: `<`, `{`, or a run of text up to either.
    pub fn scan_jsx_child(&mut self) -> LexResult<Token> {
        self.newline_before = false;
        self.token_start = self.pos;
        if self.is_eof() {
            return Err(self.error(ErrorKind::UnterminatedJsx));
        }
        match self.current() {
            b'<' => {
                self.advance();
                Ok(self.make_token(TokenKind::Lt))
            }
            b'{' => {
                self.advance();
                Ok(self.make_token(TokenKind::LBrace))
            }
            _ => {
                while !self.is_eof() {
                    match self.current() {
                        b'<' | b'{' => break,
                        b'>' | b'}' => {
                            let c = char::from(self.current());
                            self.token_start = self.pos;
                            self.advance();
                            return Err(self.error(ErrorKind::InvalidCharacter(c)));
                        }
                        _ => self.advance_char(),
                    }
                }
                if self.is_eof() {
                    return Err(self.error(ErrorKind::UnterminatedJsx));
                }
                let raw = &self.source[self.token_start..self.pos];
                Ok(self.make_token(TokenKind::JsxText(decode_jsx_entities(raw))))
            }
        }
    }

    /// Scan a JSX attribute value: a quoted string without escapes, or any
    /// ordinary token (`{`, `<`).
    pub fn scan_jsx_attribute_value(&mut self) -> LexResult<Token> {
        self.newline_before = false;
        self.skip_trivia()?;
        self.token_start = self.pos;
        let quote = self.current();
        if quote != b'"' && quote != b'\'' {
            return self.next_token();
        }
        self.advance();
        while !self.is_eof() && self.current() != quote {
            self.advance_char();
        }
        if self.is_eof() {
            return Err(self.error(ErrorKind::UnterminatedString));
        }
        let raw = &self.source[self.token_start + 1..self.pos];
        let value = decode_jsx_entities(raw);
        self.advance();
        Ok(self.make_token(TokenKind::String(value)))
    }

    /// Consume `-name` segments directly after a JSX identifier (`data-id`).
    pub fn scan_jsx_name_tail(&mut self) -> String {
        let start = self.pos;
        while !self.is_eof() {
            let c = self.current_char();
            if c == '-' || is_id_part(c) {
                self.advance_char();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    // === Helper methods ===

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_byte(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn current_char(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_char(&mut self) {
        let len = self.current_char().len_utf8();
        self.pos += len;
    }

    fn make_token(&mut self, kind: TokenKind) -> Token {
        self.seen_token = true;
        Token {
            kind,
            span: Span::new(self.token_start as u32, self.pos as u32),
            newline_before: self.newline_before,
            escaped: self.escaped,
            legacy_octal: self.legacy_octal,
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        let end = self.pos.max(self.token_start + 1).min(self.bytes.len().max(self.token_start));
        ParseError::new(kind, Span::new(self.token_start as u32, end as u32))
    }

    fn error_at(&self, kind: ErrorKind, start: usize) -> ParseError {
        ParseError::new(kind, Span::new(start as u32, self.pos.max(start) as u32))
    }

    // === Trivia ===

    fn skip_trivia(&mut self) -> LexResult<()> {
        if self.pos == 0 && self.source.starts_with("#!") {
            self.skip_line();
        }
        while !self.is_eof() {
            match self.current() {
                b' ' | b'\t' | 0x0B | 0x0C => self.advance(),
                b'\n' | b'\r' => {
                    self.newline_before = true;
                    self.advance();
                }
                b'/' => match self.peek_byte(1) {
                    b'/' => self.skip_line(),
                    b'*' => self.skip_block_comment()?,
                    _ => return Ok(()),
                },
                b'<' if self.html_comments && self.source[self.pos..].starts_with("<!--") => {
                    self.skip_line();
                }
                b'-' if self.html_comments
                    && (self.newline_before || !self.seen_token)
                    && self.source[self.pos..].starts_with("-->") =>
                {
                    self.skip_line();
                }
                c if c >= 0x80 => {
                    let ch = self.current_char();
                    if is_line_terminator(ch) {
                        self.newline_before = true;
                        self.advance_char();
                    } else if is_whitespace(ch) {
                        self.advance_char();
                    } else {
                        return Ok(());
                    }
                }
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        while !self.is_eof() && !is_line_terminator(self.current_char()) {
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) -> LexResult<()> {
        let start = self.pos;
        self.pos += 2;
        loop {
            if self.is_eof() {
                return Err(self.error_at(ErrorKind::UnterminatedComment, start));
            }
            if self.current() == b'*' && self.peek_byte(1) == b'/' {
                self.pos += 2;
                return Ok(());
            }
            if is_line_terminator(self.current_char()) {
                self.newline_before = true;
            }
            self.advance_char();
        }
    }

    // === Identifiers ===

    fn scan_identifier(&mut self) -> LexResult<TokenKind> {
        let (name, escaped) = self.scan_identifier_name()?;
        if !escaped {
            return Ok(keyword_from_str(&name).unwrap_or(TokenKind::Identifier(name)));
        }
        self.escaped = true;
        match keyword_from_str(&name) {
            Some(kw) if kw.is_reserved() => Ok(TokenKind::EscapedKeyword(name)),
            _ => Ok(TokenKind::Identifier(name)),
        }
    }

    /// Scan an IdentifierName, resolving `\u` escapes.
    fn scan_identifier_name(&mut self) -> LexResult<(String, bool)> {
        let mut name = String::new();
        let mut escaped = false;
        let mut first = true;
        while !self.is_eof() {
            let c = self.current_char();
            if c == '\\' {
                let esc_start = self.pos;
                self.advance();
                if self.current() != b'u' {
                    return Err(self.error_at(ErrorKind::InvalidUnicodeEscape, esc_start));
                }
                self.advance();
                let cp = self
                    .read_unicode_escape_body()
                    .map_err(|kind| self.error_at(kind, esc_start))?;
                let ch = char::from_u32(cp)
                    .filter(|&ch| if first { is_id_start(ch) } else { is_id_part(ch) })
                    .ok_or_else(|| self.error_at(ErrorKind::InvalidUnicodeEscape, esc_start))?;
                name.push(ch);
                escaped = true;
            } else if (first && is_id_start(c)) || (!first && is_id_part(c)) {
                name.push(c);
                self.advance_char();
            } else {
                break;
            }
            first = false;
        }
        Ok((name, escaped))
    }

    fn scan_private_name(&mut self) -> LexResult<TokenKind> {
        self.advance(); // #
        let c = self.current_char();
        if self.is_eof() || !(is_id_start(c) || c == '\\') {
            return Err(self.error(ErrorKind::InvalidCharacter('#')));
        }
        let (name, _) = self.scan_identifier_name()?;
        Ok(TokenKind::PrivateName(name))
    }

    // === Numbers ===

    fn scan_number(&mut self) -> LexResult<TokenKind> {
        let start = self.pos;

        if self.current() == b'0' {
            let radix = match self.peek_byte(1) {
                b'x' | b'X' => Some(16),
                b'o' | b'O' => Some(8),
                b'b' | b'B' => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits = self.scan_digits(radix)?;
                if digits.is_empty() {
                    return Err(self.error(ErrorKind::InvalidNumber));
                }
                if self.current() == b'n' {
                    self.advance();
                    self.check_number_end()?;
                    let text = self.source[start..self.pos - 1].replace('_', "");
                    return Ok(TokenKind::BigInt(text));
                }
                self.check_number_end()?;
                return Ok(TokenKind::Number(parse_radix(&digits, radix)));
            }
            if self.peek_byte(1) == b'_' {
                self.advance();
                return Err(self.error(ErrorKind::InvalidNumericSeparator));
            }
            if self.peek_byte(1).is_ascii_digit() {
                return self.scan_legacy_octal(start);
            }
        }

        let mut is_integer = true;
        self.scan_digits(10)?;
        if self.current() == b'.' {
            is_integer = false;
            self.advance();
            if self.current() == b'_' {
                return Err(self.error(ErrorKind::InvalidNumericSeparator));
            }
            self.scan_digits(10)?;
        }
        self.scan_exponent(&mut is_integer)?;

        if self.current() == b'n' {
            if !is_integer {
                return Err(self.error(ErrorKind::InvalidNumber));
            }
            self.advance();
            self.check_number_end()?;
            let text = self.source[start..self.pos - 1].replace('_', "");
            return Ok(TokenKind::BigInt(text));
        }
        self.check_number_end()?;
        self.number_value(start)
    }

    /// `017` (octal) or `089` (decimal with a leading zero). Both are sloppy-only.
    fn scan_legacy_octal(&mut self, start: usize) -> LexResult<TokenKind> {
        self.legacy_octal = true;
        self.advance(); // leading 0
        let mut octal = true;
        while self.current().is_ascii_digit() {
            if self.current() >= b'8' {
                octal = false;
            }
            self.advance();
        }
        if self.current() == b'_' {
            return Err(self.error(ErrorKind::InvalidNumericSeparator));
        }
        if octal {
            self.check_number_end()?;
            return Ok(TokenKind::Number(parse_radix(&self.source[start + 1..self.pos], 8)));
        }
        let mut is_integer = true;
        if self.current() == b'.' {
            self.advance();
            self.scan_digits(10)?;
        }
        self.scan_exponent(&mut is_integer)?;
        self.check_number_end()?;
        self.number_value(start)
    }

    fn scan_exponent(&mut self, is_integer: &mut bool) -> LexResult<()> {
        if matches!(self.current(), b'e' | b'E') {
            *is_integer = false;
            self.advance();
            if matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            if self.scan_digits(10)?.is_empty() {
                return Err(self.error(ErrorKind::InvalidNumber));
            }
        }
        Ok(())
    }

    /// Scan digits of `radix`, validating `_` separators. Returns the digits
    /// without separators.
    fn scan_digits(&mut self, radix: u32) -> LexResult<String> {
        let mut digits = String::new();
        let mut prev_digit = false;
        while !self.is_eof() {
            let c = char::from(self.current());
            if c == '_' {
                let next_is_digit = char::from(self.peek_byte(1)).is_digit(radix);
                if !prev_digit || !next_is_digit {
                    let sep = self.pos;
                    self.advance();
                    return Err(self.error_at(ErrorKind::InvalidNumericSeparator, sep));
                }
                prev_digit = false;
                self.advance();
            } else if c.is_digit(radix) {
                digits.push(c);
                prev_digit = true;
                self.advance();
            } else {
                break;
            }
        }
        Ok(digits)
    }

    /// A numeric literal must not run straight into an identifier or digit.
    fn check_number_end(&mut self) -> LexResult<()> {
        if self.is_eof() {
            return Ok(());
        }
        let c = self.current_char();
        if is_id_start(c) || c == '\\' || c.is_ascii_digit() {
            return Err(self.error(ErrorKind::IdentifierAfterNumber));
        }
        Ok(())
    }

    fn number_value(&self, start: usize) -> LexResult<TokenKind> {
        let text = self.source[start..self.pos].replace('_', "");
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(ErrorKind::InvalidNumber))
    }

    // === Strings and templates ===

    fn scan_string(&mut self, quote: u8) -> LexResult<TokenKind> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            if self.is_eof() {
                return Err(self.error(ErrorKind::UnterminatedString));
            }
            let c = self.current_char();
            match c {
                '\n' | '\r' => return Err(self.error(ErrorKind::UnterminatedString)),
                '\\' => {
                    let esc_start = self.pos;
                    self.advance();
                    match self.read_escape(false) {
                        Ok(Some(piece)) => value.push_str(&piece),
                        Ok(None) => {}
                        Err(kind) => return Err(self.error_at(kind, esc_start)),
                    }
                }
                _ if c as u32 == u32::from(quote) => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                _ => {
                    value.push(c);
                    self.advance_char();
                }
            }
        }
    }

    /// Scan template characters after `` ` `` or `}` up to `${` or the closing backtick.
    fn scan_template_part(&mut self, head: bool) -> LexResult<TokenKind> {
        let chunk_start = self.pos;
        let mut cooked = Some(String::new());
        loop {
            if self.is_eof() {
                return Err(self.error(ErrorKind::UnterminatedTemplate));
            }
            match self.current() {
                b'`' => {
                    let part = self.template_part(chunk_start, cooked);
                    self.advance();
                    return Ok(if head {
                        TokenKind::TemplateNoSub(part)
                    } else {
                        TokenKind::TemplateTail(part)
                    });
                }
                b'$' if self.peek_byte(1) == b'{' => {
                    let part = self.template_part(chunk_start, cooked);
                    self.pos += 2;
                    return Ok(if head {
                        TokenKind::TemplateHead(part)
                    } else {
                        TokenKind::TemplateMiddle(part)
                    });
                }
                b'\\' => {
                    self.advance();
                    match self.read_escape(true) {
                        Ok(Some(piece)) => {
                            if let Some(text) = cooked.as_mut() {
                                text.push_str(&piece);
                            }
                        }
                        Ok(None) => {}
                        Err(_) => cooked = None,
                    }
                }
                b'\r' => {
                    self.advance();
                    if self.current() == b'\n' {
                        self.advance();
                    }
                    if let Some(text) = cooked.as_mut() {
                        text.push('\n');
                    }
                }
                _ => {
                    let c = self.current_char();
                    if let Some(text) = cooked.as_mut() {
                        text.push(c);
                    }
                    self.advance_char();
                }
            }
        }
    }

    fn template_part(&self, start: usize, cooked: Option<String>) -> TemplatePart {
        let raw = self.source[start..self.pos].replace("\r\n", "\n").replace('\r', "\n");
        TemplatePart { cooked, raw }
    }

    /// Read the escape after a backslash. `Ok(None)` is a line continuation.
    fn read_escape(&mut self, in_template: bool) -> Result<Option<String>, ErrorKind> {
        if self.is_eof() {
            return Err(if in_template {
                ErrorKind::UnterminatedTemplate
            } else {
                ErrorKind::UnterminatedString
            });
        }
        let c = self.current_char();
        self.advance_char();
        let piece = match c {
            'n' => "\n".to_string(),
            't' => "\t".to_string(),
            'r' => "\r".to_string(),
            'b' => "\u{8}".to_string(),
            'f' => "\u{c}".to_string(),
            'v' => "\u{b}".to_string(),
            '\r' => {
                if self.current() == b'\n' {
                    self.advance();
                }
                return Ok(None);
            }
            '\n' | '\u{2028}' | '\u{2029}' => return Ok(None),
            'x' => {
                let hi = self.read_hex_digit().ok_or(ErrorKind::InvalidHexEscape)?;
                let lo = self.read_hex_digit().ok_or(ErrorKind::InvalidHexEscape)?;
                char::from_u32(hi * 16 + lo)
                    .ok_or(ErrorKind::InvalidHexEscape)?
                    .to_string()
            }
            'u' => {
                let cp = self.read_unicode_escape_body()?;
                self.code_point_to_string(cp)
            }
            '0' if !self.current().is_ascii_digit() => "\0".to_string(),
            '0'..='7' => {
                if in_template {
                    return Err(ErrorKind::InvalidTemplateEscape);
                }
                self.legacy_octal = true;
                let mut value = c.to_digit(8).unwrap_or(0);
                // up to three octal digits, value below 256
                let max_len = if c <= '3' { 2 } else { 1 };
                for _ in 0..max_len {
                    match char::from(self.current()).to_digit(8) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                char::from_u32(value).unwrap_or('\u{FFFD}').to_string()
            }
            '8' | '9' => {
                if in_template {
                    return Err(ErrorKind::InvalidTemplateEscape);
                }
                self.legacy_octal = true;
                c.to_string()
            }
            other => other.to_string(),
        };
        Ok(Some(piece))
    }

    fn read_hex_digit(&mut self) -> Option<u32> {
        let digit = char::from(self.current()).to_digit(16)?;
        self.advance();
        Some(digit)
    }

    /// Read `XXXX` or `{X...}` after `\u`, returning the code point.
    fn read_unicode_escape_body(&mut self) -> Result<u32, ErrorKind> {
        if self.current() == b'{' {
            self.advance();
            let mut value: u32 = 0;
            let mut count = 0;
            while let Some(d) = char::from(self.current()).to_digit(16) {
                value = value.saturating_mul(16).saturating_add(d);
                count += 1;
                self.advance();
            }
            if count == 0 || self.current() != b'}' || value > 0x10FFFF {
                return Err(ErrorKind::InvalidUnicodeEscape);
            }
            self.advance();
            return Ok(value);
        }
        let mut value = 0;
        for _ in 0..4 {
            let d = self.read_hex_digit().ok_or(ErrorKind::InvalidUnicodeEscape)?;
            value = value * 16 + d;
        }
        Ok(value)
    }

    /// Convert a code point to text, pairing a high surrogate with a
    /// following `\uDC00`-`\uDFFF` escape. Lone surrogates become U+FFFD.
    fn code_point_to_string(&mut self, cp: u32) -> String {
        if (0xD800..0xDC00).contains(&cp)
            && self.current() == b'\\'
            && self.peek_byte(1) == b'u'
        {
            let saved = self.pos;
            self.pos += 2;
            if let Ok(low) = self.read_unicode_escape_body() {
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((cp - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(ch) = char::from_u32(combined) {
                        return ch.to_string();
                    }
                }
            }
            self.pos = saved;
        }
        char::from_u32(cp).unwrap_or('\u{FFFD}').to_string()
    }

    // === Punctuators ===

    fn scan_dot(&mut self) -> LexResult<TokenKind> {
        if self.peek_byte(1).is_ascii_digit() {
            let start = self.pos;
            self.advance();
            self.scan_digits(10)?;
            let mut is_integer = false;
            self.scan_exponent(&mut is_integer)?;
            self.check_number_end()?;
            return self.number_value(start);
        }
        if self.peek_byte(1) == b'.' && self.peek_byte(2) == b'.' {
            self.pos += 3;
            return Ok(TokenKind::Spread);
        }
        self.advance();
        Ok(TokenKind::Dot)
    }

    fn scan_question(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            // `a?.5:b` is a conditional, not an optional chain
            b'.' if !self.peek_byte(1).is_ascii_digit() => {
                self.advance();
                TokenKind::QuestionDot
            }
            b'?' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::QuestionQuestionEq
                } else {
                    TokenKind::QuestionQuestion
                }
            }
            _ => TokenKind::Question,
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'+' => { self.advance(); TokenKind::PlusPlus }
            b'=' => { self.advance(); TokenKind::PlusEq }
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'-' => { self.advance(); TokenKind::MinusMinus }
            b'=' => { self.advance(); TokenKind::MinusEq }
            _ => TokenKind::Minus,
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'*' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::StarStarEq
                } else {
                    TokenKind::StarStar
                }
            }
            b'=' => { self.advance(); TokenKind::StarEq }
            _ => TokenKind::Star,
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'=' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            b'>' => { self.advance(); TokenKind::Arrow }
            _ => TokenKind::Eq,
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            if self.current() == b'=' {
                self.advance();
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'<' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::LtLtEq
                } else {
                    TokenKind::LtLt
                }
            }
            b'=' => { self.advance(); TokenKind::LtEq }
            _ => TokenKind::Lt,
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'>' => {
                self.advance();
                match self.current() {
                    b'>' => {
                        self.advance();
                        if self.current() == b'=' {
                            self.advance();
                            TokenKind::GtGtGtEq
                        } else {
                            TokenKind::GtGtGt
                        }
                    }
                    b'=' => { self.advance(); TokenKind::GtGtEq }
                    _ => TokenKind::GtGt,
                }
            }
            b'=' => { self.advance(); TokenKind::GtEq }
            _ => TokenKind::Gt,
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'&' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::AmpAmpEq
                } else {
                    TokenKind::AmpAmp
                }
            }
            b'=' => { self.advance(); TokenKind::AmpEq }
            _ => TokenKind::Amp,
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        self.advance();
        match self.current() {
            b'|' => {
                self.advance();
                if self.current() == b'=' {
                    self.advance();
                    TokenKind::PipePipeEq
                } else {
                    TokenKind::PipePipe
                }
            }
            b'=' => { self.advance(); TokenKind::PipeEq }
            _ => TokenKind::Pipe,
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        self.advance();
        if self.current() == b'=' {
            self.advance();
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }
}

// === Character classes ===

pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// TAB, VT, FF, SP, NBSP, ZWNBSP and the rest of the Space_Separator category.
fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{0b}' | '\u{0c}' | ' ' | '\u{a0}' | '\u{feff}'
            | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}

// U+309B and U+309C are ID_Start but not XID_Start.
fn is_other_id_start(c: char) -> bool {
    matches!(c, '\u{309b}' | '\u{309c}')
}

pub(crate) fn is_id_start(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphabetic() || c == '$' || c == '_';
    }
    is_other_id_start(c) || unicode_ident::is_xid_start(c)
}

pub(crate) fn is_id_part(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '$' || c == '_';
    }
    matches!(c, '\u{200c}' | '\u{200d}') || is_other_id_start(c) || unicode_ident::is_xid_continue(c)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    digits.chars().fold(0.0, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    })
}

fn validate_regex_flags(flags: &str) -> Result<(), ErrorKind> {
    let mut seen = Vec::with_capacity(flags.len());
    for c in flags.chars() {
        if !"dgimsuvy".contains(c) || seen.contains(&c) {
            return Err(ErrorKind::InvalidRegExpFlags(flags.to_string()));
        }
        seen.push(c);
    }
    if seen.contains(&'u') && seen.contains(&'v') {
        return Err(ErrorKind::InvalidRegExpFlags(flags.to_string()));
    }
    Ok(())
}

/// Decode the XML entities and numeric character references JSX allows in
/// text and attribute strings. Unknown entities are kept verbatim.
pub(crate) fn decode_jsx_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = entity.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|ch| (ch, semi))
        });
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if matches!(token.kind, TokenKind::Eof) {
                break;
            }
            tokens.push(token.kind);
        }
        tokens
    }

    fn lex_error(source: &str) -> ErrorKind {
        let mut lexer = Lexer::new(source);
        loop {
            match lexer.next_token() {
                Ok(token) if token.kind == TokenKind::Eof => panic!("expected error for {source}"),
                Ok(_) => {}
                Err(err) => return err.kind,
            }
        }
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let tokens = tokenize("let x = yield;");
        assert_eq!(tokens[0], TokenKind::Let);
        assert_eq!(tokens[1], TokenKind::Identifier("x".into()));
        assert_eq!(tokens[3], TokenKind::Yield);
    }

    #[test]
    fn test_escaped_identifiers() {
        let mut lexer = Lexer::new("\\u0061b \\u{69}f l\\u0065t");
        let a = lexer.next_token().unwrap();
        assert_eq!(a.kind, TokenKind::Identifier("ab".into()));
        assert!(a.escaped);
        let kw = lexer.next_token().unwrap();
        assert_eq!(kw.kind, TokenKind::EscapedKeyword("if".into()));
        let ctx = lexer.next_token().unwrap();
        assert_eq!(ctx.kind, TokenKind::Identifier("let".into()));
        assert!(ctx.escaped);
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(tokenize("café ü_1"), vec![
            TokenKind::Identifier("café".into()),
            TokenKind::Identifier("ü_1".into()),
        ]);
    }

    #[test]
    fn test_unicode_id_start_and_continue() {
        // Other_ID_Start and connector punctuation
        assert_eq!(tokenize("\u{2118} a\u{203f}b \u{309b}"), vec![
            TokenKind::Identifier("\u{2118}".into()),
            TokenKind::Identifier("a\u{203f}b".into()),
            TokenKind::Identifier("\u{309b}".into()),
        ]);
        assert_eq!(tokenize("x\u{200c}\u{200d}")[0], TokenKind::Identifier("x\u{200c}\u{200d}".into()));
        // Alphabetic but not ID_Start
        assert_eq!(lex_error("\u{24b6}"), ErrorKind::InvalidCharacter('\u{24b6}'));
    }

    #[test]
    fn test_whitespace_is_space_separator_only() {
        assert_eq!(tokenize("a\u{3000}\u{1680}\u{feff}\u{0b}b").len(), 2);
        assert_eq!(lex_error("x\u{85}"), ErrorKind::InvalidCharacter('\u{85}'));
        assert_eq!(lex_error("x\u{180e}"), ErrorKind::InvalidCharacter('\u{180e}'));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("42 3.14 .5 1e3 0xff 0o17 0b101 1_000"), vec![
            TokenKind::Number(42.0),
            TokenKind::Number(3.14),
            TokenKind::Number(0.5),
            TokenKind::Number(1000.0),
            TokenKind::Number(255.0),
            TokenKind::Number(15.0),
            TokenKind::Number(5.0),
            TokenKind::Number(1000.0),
        ]);
        assert_eq!(tokenize("10n 0x1_Fn"), vec![
            TokenKind::BigInt("10".into()),
            TokenKind::BigInt("0x1F".into()),
        ]);
    }

    #[test]
    fn test_legacy_octal_is_flagged() {
        let mut lexer = Lexer::new("017 08 17");
        let octal = lexer.next_token().unwrap();
        assert_eq!(octal.kind, TokenKind::Number(15.0));
        assert!(octal.legacy_octal);
        let decimal = lexer.next_token().unwrap();
        assert_eq!(decimal.kind, TokenKind::Number(8.0));
        assert!(decimal.legacy_octal);
        assert!(!lexer.next_token().unwrap().legacy_octal);
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(lex_error("1__0"), ErrorKind::InvalidNumericSeparator);
        assert_eq!(lex_error("1_"), ErrorKind::InvalidNumericSeparator);
        assert_eq!(lex_error("0_1"), ErrorKind::InvalidNumericSeparator);
        assert_eq!(lex_error("3in x"), ErrorKind::IdentifierAfterNumber);
        assert_eq!(lex_error("1.5n"), ErrorKind::InvalidNumber);
        assert_eq!(lex_error("0x"), ErrorKind::InvalidNumber);
        assert_eq!(lex_error("1e+"), ErrorKind::InvalidNumber);
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            tokenize(r#""a\nb" 'c\x41B\u{43}' "😀""#),
            vec![
                TokenKind::String("a\nb".into()),
                TokenKind::String("cABC".into()),
                TokenKind::String("😀".into()),
            ]
        );
        let mut lexer = Lexer::new(r#""\101""#);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::String("A".into()));
        assert!(token.legacy_octal);
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_error("'abc"), ErrorKind::UnterminatedString);
        assert_eq!(lex_error("'a\nb'"), ErrorKind::UnterminatedString);
        assert_eq!(lex_error(r"'\x4'"), ErrorKind::InvalidHexEscape);
        assert_eq!(lex_error(r"'\u{110000}'"), ErrorKind::InvalidUnicodeEscape);
    }

    #[test]
    fn test_template_parts() {
        let mut lexer = Lexer::new("`a${x}b`");
        let head = lexer.next_token().unwrap();
        assert!(matches!(&head.kind, TokenKind::TemplateHead(p) if p.raw == "a"));
        lexer.next_token().unwrap();
        // `}` comes back as a plain brace until the parser rescans it
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RBrace);

        let mut lexer = Lexer::new("`a${x}b\\u{`");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let brace = lexer.next_token().unwrap();
        let tail = lexer.scan_template_continuation(brace.span.start).unwrap();
        match tail.kind {
            TokenKind::TemplateTail(part) => {
                assert_eq!(part.raw, "b\\u{");
                assert_eq!(part.cooked, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_template_normalizes_carriage_returns() {
        match &tokenize("`a\r\nb`")[0] {
            TokenKind::TemplateNoSub(part) => {
                assert_eq!(part.raw, "a\nb");
                assert_eq!(part.cooked.as_deref(), Some("a\nb"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_regex_rescan() {
        let mut lexer = Lexer::new("/[/]\\//gi");
        let slash = lexer.next_token().unwrap();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regex = lexer.rescan_regex(slash.span.start).unwrap();
        assert_eq!(regex.kind, TokenKind::Regex {
            pattern: "[/]\\/".into(),
            flags: "gi".into(),
        });
        let mut lexer = Lexer::new("/a/gg");
        let slash = lexer.next_token().unwrap();
        assert!(lexer.rescan_regex(slash.span.start).is_err());
    }

    #[test]
    fn test_newline_tracking() {
        let mut lexer = Lexer::new("a /* x\n */ b // c\n c");
        assert!(!lexer.next_token().unwrap().newline_before);
        assert!(lexer.next_token().unwrap().newline_before);
        assert!(lexer.next_token().unwrap().newline_before);
    }

    #[test]
    fn test_hashbang_and_html_comments() {
        assert_eq!(tokenize("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier("x".into())]);
        let mut lexer = Lexer::new("x <!-- y\n--> z\nw").with_html_comments(true);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("x".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("w".into()));
    }

    #[test]
    fn test_private_names_and_optional_chain() {
        assert_eq!(tokenize("#x a?.b c?.5:d"), vec![
            TokenKind::PrivateName("x".into()),
            TokenKind::Identifier("a".into()),
            TokenKind::QuestionDot,
            TokenKind::Identifier("b".into()),
            TokenKind::Identifier("c".into()),
            TokenKind::Question,
            TokenKind::Number(0.5),
            TokenKind::Colon,
            TokenKind::Identifier("d".into()),
        ]);
    }

    #[test]
    fn test_operators() {
        assert_eq!(tokenize(">>>= ??= **= => ..."), vec![
            TokenKind::GtGtGtEq,
            TokenKind::QuestionQuestionEq,
            TokenKind::StarStarEq,
            TokenKind::Arrow,
            TokenKind::Spread,
        ]);
    }

    #[test]
    fn test_jsx_child_text() {
        let mut lexer = Lexer::new("hello &amp; bye<");
        let text = lexer.scan_jsx_child().unwrap();
        assert_eq!(text.kind, TokenKind::JsxText("hello & bye".into()));
        assert_eq!(lexer.scan_jsx_child().unwrap().kind, TokenKind::Lt);
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_jsx_entities("&lt;&#65;&#x42;&bogus;"), "<AB&bogus;");
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("a b");
        lexer.next_token().unwrap();
        assert_eq!(lexer.peek().kind, TokenKind::Identifier("b".into()));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier("b".into()));
        let broken = Lexer::new("'open");
        assert_eq!(broken.peek().kind, TokenKind::Invalid);
    }
}
