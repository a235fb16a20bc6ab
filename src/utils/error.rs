//! Error handling for macro expansion
//!
//! `MacroError` is what a failed macro invocation reports. It never aborts
//! a whole expansion: the host parser turns it into an inline error marker
//! plus a [`Diagnostic`].

use std::fmt;

/// Macro expansion error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    /// A hard-required argument was absent
    MissingArgument { macro_name: String },
    /// A size keyword after a macro name is not one of the known sizes
    UnrecognizedDelimiter { keyword: String },
    /// A numeric argument was not a plain non-negative integer
    InvalidNumber { context: String, found: String },
    /// A `{` (or `[`) that is never closed
    UnbalancedGroup { macro_name: String },
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::MissingArgument { macro_name } => {
                write!(f, "Missing argument for \\{}", macro_name)
            }
            MacroError::UnrecognizedDelimiter { keyword } => {
                write!(f, "Unrecognized size keyword \\{}", keyword)
            }
            MacroError::InvalidNumber { context, found } => {
                write!(f, "Invalid number '{}' for {}", found, context)
            }
            MacroError::UnbalancedGroup { macro_name } => {
                write!(f, "Unbalanced group in argument of \\{}", macro_name)
            }
        }
    }
}

impl std::error::Error for MacroError {}

/// Result type for macro handlers
pub type MacroResult<T> = Result<T, MacroError>;

// Convenience constructors for errors
impl MacroError {
    pub fn missing(macro_name: impl Into<String>) -> Self {
        MacroError::MissingArgument {
            macro_name: macro_name.into(),
        }
    }

    pub fn unrecognized(keyword: impl Into<String>) -> Self {
        MacroError::UnrecognizedDelimiter {
            keyword: keyword.into(),
        }
    }

    pub fn invalid_number(context: impl Into<String>, found: impl Into<String>) -> Self {
        MacroError::InvalidNumber {
            context: context.into(),
            found: found.into(),
        }
    }

    pub fn unbalanced(macro_name: impl Into<String>) -> Self {
        MacroError::UnbalancedGroup {
            macro_name: macro_name.into(),
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MacroError::MissingArgument { .. } => "missing argument",
            MacroError::UnrecognizedDelimiter { .. } => "unrecognized delimiter",
            MacroError::InvalidNumber { .. } => "invalid number",
            MacroError::UnbalancedGroup { .. } => "unbalanced group",
        }
    }
}

/// Errors loading a [`crate::PhysicsOptions`] file.
#[derive(Debug, Clone)]
pub enum OptionsError {
    IoError { message: String },
    ParseError { format: &'static str, message: String },
    UnsupportedFormat { extension: String },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::IoError { message } => write!(f, "IO error: {}", message),
            OptionsError::ParseError { format, message } => {
                write!(f, "Invalid {} options: {}", format, message)
            }
            OptionsError::UnsupportedFormat { extension } => {
                write!(f, "Unsupported options format '.{}'", extension)
            }
        }
    }
}

impl std::error::Error for OptionsError {}

impl From<std::io::Error> for OptionsError {
    fn from(err: std::io::Error) -> Self {
        OptionsError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OptionsError {
    fn from(err: serde_json::Error) -> Self {
        OptionsError::ParseError {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "config-file")]
impl From<toml::de::Error> for OptionsError {
    fn from(err: toml::de::Error) -> Self {
        OptionsError::ParseError {
            format: "TOML",
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Severity level for diagnostics (determines coloring and strict mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// A macro failed and was replaced by an error marker
    Error,
    Warning,
    Info,
}

/// A non-fatal problem recorded during expansion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// Kind as string (e.g. "missing argument")
    pub kind: String,
    pub message: String,
    /// Source text of the failing macro call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }

    /// ANSI color code for this diagnostic's severity.
    pub fn color_code(&self) -> &'static str {
        match self.severity {
            DiagnosticSeverity::Error => "\x1b[31m",   // red
            DiagnosticSeverity::Warning => "\x1b[33m", // yellow
            DiagnosticSeverity::Info => "\x1b[36m",    // cyan
        }
    }
}

impl From<&MacroError> for Diagnostic {
    fn from(err: &MacroError) -> Self {
        Diagnostic::new(DiagnosticSeverity::Error, err.kind(), err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_display() {
        let err = MacroError::missing("pqty");
        assert_eq!(err.to_string(), "Missing argument for \\pqty");
        assert_eq!(err.kind(), "missing argument");
    }

    #[test]
    fn test_invalid_number_display() {
        let err = MacroError::invalid_number("\\zmat rows", "x");
        let msg = err.to_string();
        assert!(msg.contains("'x'"));
        assert!(msg.contains("\\zmat rows"));
    }

    #[test]
    fn test_diagnostic_from_error() {
        let err = MacroError::unrecognized("biggg");
        let diag = Diagnostic::from(&err).with_location("\\qty\\biggg(x)");
        assert!(diag.is_error());
        assert_eq!(
            diag.to_string(),
            "[unrecognized delimiter] \\qty\\biggg(x): Unrecognized size keyword \\biggg"
        );
    }
}
