//! Diagnostic definitions for parse problems
//!
//! The parser never fails: every problem becomes a structured diagnostic
//! attached to a still-valid `Timeline`. Codes follow a naming convention,
//! `E{category}{number}`:
//! - E01xx: date-resolution problems
//! - E02xx: reference problems
//! - E03xx: header/metadata problems

use std::fmt;

use text_size::TextRange;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// A real problem in the written timeline
    #[default]
    Error,
    /// Suspicious but tolerable input
    Warning,
}

impl Severity {
    /// Whether this severity blocks a clean parse
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Lowercase name, as rendered in formatted diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// Diagnostic codes for parse problems
///
/// Each code represents a specific category of problem, enabling filtering,
/// documentation, and IDE integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // =========================================================================
    // E01xx: Date-resolution problems
    // =========================================================================
    /// Range end resolves earlier than its start
    E0101,

    // =========================================================================
    // E02xx: Reference problems
    // =========================================================================
    /// `!id` reference to an event that does not exist
    E0201,
    /// Relative date with no prior event to anchor on
    E0202,

    // =========================================================================
    // E03xx: Header/metadata problems
    // =========================================================================
    /// Header timezone cannot be resolved
    E0301,
    /// Group `timezone:`/`tz:` property cannot be resolved
    E0302,
    /// Header YAML block cannot be decoded
    E0303,
}

impl DiagnosticCode {
    /// Get the string representation of the code (e.g., "E0101")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
        }
    }

    /// Get a short description of the problem category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 => "date resolution",
            Self::E0201 | Self::E0202 => "reference",
            Self::E0301 | Self::E0302 | Self::E0303 => "header",
        }
    }

    /// Get the default message for this code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "range ends before it starts",
            Self::E0201 => "reference to an unknown event id",
            Self::E0202 => "relative date has no prior event to anchor on",
            Self::E0301 => "unrecognized header timezone",
            Self::E0302 => "unrecognized group timezone",
            Self::E0303 => "malformed header block",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse diagnostic with a source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// Human-readable message
    pub message: String,
    /// Span the problem is anchored to
    pub range: TextRange,
    /// Categorized code
    pub code: DiagnosticCode,
    /// Severity
    pub severity: Severity,
}

impl ParseDiagnostic {
    /// Create a new error-severity diagnostic
    pub fn new(message: impl Into<String>, range: TextRange, code: DiagnosticCode) -> Self {
        Self {
            message: message.into(),
            range,
            code,
            severity: Severity::Error,
        }
    }

    /// Downgrade or upgrade the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Format for display: `E0101: range ends before it starts`
    pub fn format(&self) -> String {
        format!("{}: {}", self.code, self.message)
    }
}

/// A document-level message without a source span
/// (e.g., "no timezone specified, using UTC")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMessage {
    pub message: String,
}

impl DocumentMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert_eq!(Severity::Warning.as_str(), "warning");
    }

    #[test]
    fn test_code_strings() {
        assert_eq!(DiagnosticCode::E0101.as_str(), "E0101");
        assert_eq!(DiagnosticCode::E0301.category_description(), "header");
    }

    #[test]
    fn test_diagnostic_format() {
        let d = ParseDiagnostic::new(
            DiagnosticCode::E0202.default_message(),
            TextRange::new(4.into(), 10.into()),
            DiagnosticCode::E0202,
        );
        assert_eq!(
            d.format(),
            "E0202: relative date has no prior event to anchor on"
        );
        assert!(d.severity.is_error());
    }
}
