//! Source spans and line/column resolution.

use serde::{Deserialize, Serialize};

/// Source code span with byte offsets and 1-indexed line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        end_line: usize,
        start_column: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    /// The slice of `source` this span covers.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// 1-indexed (line, column) of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Build a [`Span`] from a byte range.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_column) = self.position(start);
        let (end_line, end_column) = self.position(end);
        Span::new(start, end, start_line, end_line, start_column, end_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_single_line() {
        let map = SourceMap::new("let a = 1;");
        assert_eq!(map.position(0), (1, 1));
        assert_eq!(map.position(4), (1, 5));
    }

    #[test]
    fn test_position_multi_line() {
        let map = SourceMap::new("let a = 1;\nlet b = 2;");
        assert_eq!(map.position(11), (2, 1));
        assert_eq!(map.position(15), (2, 5));
    }

    #[test]
    fn test_span_text() {
        let source = "let a = 1;";
        let map = SourceMap::new(source);
        let span = map.span(4, 5);
        assert_eq!(span.text(source), "a");
        assert_eq!(span.start_line, 1);
        assert_eq!(span.start_column, 5);
    }
}
