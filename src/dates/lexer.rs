//! Logos-based lexer for date expressions.
//!
//! Tokenizes one line at a time; the grammars match a prefix of the token
//! stream and stop at the terminator colon. Anything the lexer cannot match
//! becomes an [`TokenKind::Error`] token, which no grammar accepts.

use logos::Logos;
use text_size::TextSize;

use super::duration::TimeUnit;

/// A token with its kind, text, and position within the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

/// Token iterator that tracks byte offsets over the generated lexer
pub(crate) struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => TokenKind::Error,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire line into a Vec
pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogosToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"[A-Za-z]+")]
    Word,

    #[token("-")]
    Dash,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("!")]
    Bang,
}

/// Token kinds seen by the date grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Whitespace,
    Number,
    Word,
    Dash,
    Plus,
    Slash,
    Colon,
    Comma,
    Dot,
    Bang,
    /// Any character outside the date vocabulary
    Error,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::Number => TokenKind::Number,
            LogosToken::Word => TokenKind::Word,
            LogosToken::Dash => TokenKind::Dash,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Slash => TokenKind::Slash,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::Bang => TokenKind::Bang,
        }
    }
}

// ============================================================================
// WORD VOCABULARY (months, weekdays, units)
// ============================================================================

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Month number (1-12) for a full name or a prefix of at least 3 letters
/// ("jun", "sept", "september"), case-insensitively.
pub(crate) fn month_from_name(word: &str) -> Option<u32> {
    if word.len() < 3 {
        return None;
    }
    let lower = word.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

/// Whether `word` is a weekday name or a prefix of at least 3 letters
pub(crate) fn is_weekday_name(word: &str) -> bool {
    if word.len() < 3 {
        return false;
    }
    let lower = word.to_ascii_lowercase();
    WEEKDAYS.iter().any(|d| d.starts_with(&lower))
}

/// Duration unit for a single word ("weeks", "min", "ms", "weekday")
pub(crate) fn unit_from_name(word: &str) -> Option<TimeUnit> {
    let lower = word.to_ascii_lowercase();
    let unit = match lower.as_str() {
        "year" | "years" => TimeUnit::Years,
        "month" | "months" => TimeUnit::Months,
        "week" | "weeks" => TimeUnit::Weeks,
        "day" | "days" => TimeUnit::Days,
        "weekday" | "weekdays" => TimeUnit::Weekdays,
        "hour" | "hours" | "h" => TimeUnit::Hours,
        "minute" | "minutes" | "min" | "mins" => TimeUnit::Minutes,
        "second" | "seconds" | "sec" | "secs" => TimeUnit::Seconds,
        "millisecond" | "milliseconds" | "ms" => TimeUnit::Milliseconds,
        _ => return None,
    };
    Some(unit)
}

/// `true` for "pm", `false` for "am", otherwise `None`
pub(crate) fn meridiem_from_name(word: &str) -> Option<bool> {
    if word.eq_ignore_ascii_case("am") {
        Some(false)
    } else if word.eq_ignore_ascii_case("pm") {
        Some(true)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_extended_date() {
        let tokens = tokenize("2022-06-07T12:30: launch");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            &kinds[..8],
            &[
                TokenKind::Number,
                TokenKind::Dash,
                TokenKind::Number,
                TokenKind::Dash,
                TokenKind::Number,
                TokenKind::Word,
                TokenKind::Number,
                TokenKind::Colon,
            ]
        );
        assert_eq!(tokens[5].text, "T");
    }

    #[test]
    fn test_lex_offsets_are_cumulative() {
        let tokens = tokenize("12/25/2022");
        assert_eq!(u32::from(tokens[0].offset), 0);
        assert_eq!(u32::from(tokens[1].offset), 2);
        assert_eq!(u32::from(tokens[4].offset), 6);
        assert_eq!(u32::from(tokens[4].end()), 10);
    }

    #[test]
    fn test_lex_unknown_characters() {
        let tokens = tokenize("2022: 完了");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn test_month_names_and_abbreviations() {
        assert_eq!(month_from_name("June"), Some(6));
        assert_eq!(month_from_name("jun"), Some(6));
        assert_eq!(month_from_name("sept"), Some(9));
        assert_eq!(month_from_name("SEPTEMBER"), Some(9));
        assert_eq!(month_from_name("ju"), None);
        assert_eq!(month_from_name("banana"), None);
    }

    #[test]
    fn test_weekday_names() {
        assert!(is_weekday_name("Friday"));
        assert!(is_weekday_name("thu"));
        assert!(!is_weekday_name("fr"));
        assert!(!is_weekday_name("june"));
    }

    #[test]
    fn test_units() {
        assert_eq!(unit_from_name("weeks"), Some(TimeUnit::Weeks));
        assert_eq!(unit_from_name("MIN"), Some(TimeUnit::Minutes));
        assert_eq!(unit_from_name("weekdays"), Some(TimeUnit::Weekdays));
        assert_eq!(unit_from_name("fortnight"), None);
    }
}
