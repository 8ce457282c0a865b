//! Source location tracking.
//!
//! Every AST node carries a `Span` of UTF-8 byte offsets. Line/column
//! positions are derived lazily through a [`LineIndex`], which is only
//! built when `loc` output is requested or an error escapes the parser.

use serde::Serialize;

/// A span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Byte offset of the start.
    pub start: u32,
    /// Byte offset of the end (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub const fn merge(self, other: Span) -> Span {
        Span {
            start: if self.start < other.start { self.start } else { other.start },
            end: if self.end > other.end { self.end } else { other.end },
        }
    }

    /// The source text covered by this span.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or_default()
    }
}

/// A line/column pair. Lines are 1-based, columns are 0-based and
/// counted in UTF-16 code units, matching what ESTree consumers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Convert byte offsets to line/column positions.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    /// Build a line index from source code.
    ///
    /// `\n`, `\r`, `\r\n`, U+2028 and U+2029 all terminate a line.
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_starts.push((i + 1) as u32);
                    i += 1;
                }
                b'\r' => {
                    let next = if bytes.get(i + 1) == Some(&b'\n') { i + 2 } else { i + 1 };
                    line_starts.push(next as u32);
                    i = next;
                }
                // U+2028 / U+2029 encode as E2 80 A8 / E2 80 A9
                0xE2 if bytes.get(i + 1) == Some(&0x80)
                    && matches!(bytes.get(i + 2), Some(0xA8 | 0xA9)) =>
                {
                    line_starts.push((i + 3) as u32);
                    i += 3;
                }
                _ => i += 1,
            }
        }
        Self { source, line_starts }
    }

    /// Convert a byte offset to a [`Position`].
    pub fn position(&self, offset: u32) -> Position {
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));
        let line_start = self.line_starts[line] as usize;
        let end = (offset as usize).min(self.source.len());
        let column = match self.source.get(line_start..end) {
            Some(text) if text.is_ascii() => text.len(),
            Some(text) => text.encode_utf16().count(),
            None => end.saturating_sub(line_start),
        };
        Position { line: line as u32 + 1, column: column as u32 }
    }

    /// The text of the (1-based) line, without its terminator.
    pub fn line_text(&self, line: u32) -> &'a str {
        let idx = (line as usize).saturating_sub(1);
        let start = self.line_starts.get(idx).copied().unwrap_or(0) as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.source.len(), |&next| next as usize);
        self.source
            .get(start..end)
            .unwrap_or_default()
            .trim_end_matches(['\n', '\r', '\u{2028}', '\u{2029}'])
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.merge(b), Span::new(5, 15));
    }

    #[test]
    fn test_line_index() {
        let source = "line1\nline2\r\nline3\rline4";
        let index = LineIndex::new(source);

        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(0), Position { line: 1, column: 0 });
        assert_eq!(index.position(5), Position { line: 1, column: 5 });
        assert_eq!(index.position(6), Position { line: 2, column: 0 });
        assert_eq!(index.position(13), Position { line: 3, column: 0 });
        assert_eq!(index.position(19), Position { line: 4, column: 0 });
        assert_eq!(index.line_text(2), "line2");
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let source = "'é😀' + x";
        let index = LineIndex::new(source);
        let x = source.find('x').unwrap() as u32;
        // quote, é (1 unit), 😀 (2 units), quote, space, plus, space
        assert_eq!(index.position(x).column, 8);
    }

    #[test]
    fn test_paragraph_separator_breaks_lines() {
        let source = "a\u{2028}b";
        let index = LineIndex::new(source);
        assert_eq!(index.position(4), Position { line: 2, column: 0 });
    }
}
