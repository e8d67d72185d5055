//! Backtrackable token cursor shared by the date grammars.

use text_size::TextSize;

use super::lexer::{Token, TokenKind};

/// Cursor over a token slice with mark/reset backtracking.
///
/// The grammars try alternatives by saving a mark, attempting a parse, and
/// resetting on failure; a grammar function that returns `None` must leave
/// the cursor wherever its caller can reset it from.
pub(crate) struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    /// Text of the current token, empty at end of input
    pub fn text(&self) -> &'a str {
        self.current().map(|t| t.text).unwrap_or("")
    }

    /// Offset of the current token, or the end of input
    pub fn offset(&self) -> TextSize {
        match self.current() {
            Some(token) => token.offset,
            None => self
                .tokens
                .last()
                .map(|t| t.end())
                .unwrap_or_else(|| TextSize::new(0)),
        }
    }

    /// End offset of the last consumed non-whitespace token
    pub fn end_of_consumed(&self) -> TextSize {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.end())
            .unwrap_or_else(|| TextSize::new(0))
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Case-insensitive check for a specific word token
    pub fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Word) && self.text().eq_ignore_ascii_case(word)
    }

    /// Text of the current token when it is a word
    pub fn current_word(&self) -> Option<&'a str> {
        if self.at(TokenKind::Word) {
            Some(self.text())
        } else {
            None
        }
    }

    /// Numeric value of the current token when it is a number
    pub fn number(&self) -> Option<i64> {
        if self.at(TokenKind::Number) {
            self.text().parse().ok()
        } else {
            None
        }
    }

    /// Digit count of the current number token
    pub fn number_width(&self) -> usize {
        if self.at(TokenKind::Number) {
            self.text().len()
        } else {
            0
        }
    }

    /// Whether the current token sits directly against the previously
    /// consumed one, with no whitespace on either side. True at the start
    /// of input when a token is present.
    pub fn glued(&self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if current.kind == TokenKind::Whitespace {
            return false;
        }
        if self.pos == 0 {
            return true;
        }
        match self.tokens.get(self.pos - 1) {
            Some(prev) => prev.kind != TokenKind::Whitespace && prev.end() == current.offset,
            None => true,
        }
    }

    pub fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn skip_ws(&mut self) {
        while self.at(TokenKind::Whitespace) {
            self.bump();
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
