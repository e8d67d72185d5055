//! Line/offset conversion.
//!
//! Maps byte offsets to line numbers and back. Lines are split on `\n`;
//! a trailing `\r` belongs to the line terminator, not the line text.

use text_size::{TextRange, TextSize};

/// A 0-based line/column position; the column counts bytes within the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Precomputed line-start table for one document snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the first character of each line; always starts with 0
    line_starts: Vec<TextSize>,
    /// Total document length
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// 0-based line containing `offset`
    pub fn line_for(&self, offset: TextSize) -> u32 {
        self.line_starts.partition_point(|&s| s <= offset) as u32 - 1
    }

    /// Line and byte column of `offset`, as editors report positions
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self.line_for(offset);
        LineCol {
            line,
            col: u32::from(offset) - u32::from(self.line_starts[line as usize]),
        }
    }

    /// Starting offset of `line`
    pub fn line_start(&self, line: u32) -> TextSize {
        self.line_starts[line as usize]
    }

    /// Span of `line` excluding its terminator (`\n` or `\r\n`)
    pub fn line_span(&self, line: u32, text: &str) -> TextRange {
        let start = self.line_start(line);
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map(|&next| next - TextSize::new(1))
            .unwrap_or(self.len);
        let mut end = end;
        let bytes = text.as_bytes();
        if u32::from(end) > u32::from(start) && bytes[u32::from(end) as usize - 1] == b'\r' {
            end -= TextSize::new(1);
        }
        TextRange::new(start, end)
    }

    /// Text of `line` without its terminator
    pub fn line_text<'t>(&self, line: u32, text: &'t str) -> &'t str {
        let span = self.line_span(line, text);
        &text[span]
    }
}
