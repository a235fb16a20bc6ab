//! TeX token definitions.
//!
//! Math input is processed as a stream of categorized tokens, the same way
//! TeX sees it, so braces and control words survive argument scanning.

use std::fmt;

/// The smallest unit the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexToken {
    /// A control sequence like `\qty`; the name excludes the backslash.
    /// `\\` is the control symbol named `\`.
    ControlSeq(String),

    /// `{`
    BeginGroup,

    /// `}`
    EndGroup,

    /// Letters, digits, punctuation and `#`.
    Char(char),

    /// Runs of whitespace, normalized.
    Space,

    /// Everything from `%` to the end of the line.
    Comment(String),

    /// `$`
    MathShift,

    /// `&`
    AlignTab,

    /// `^`
    Superscript,

    /// `_`
    Subscript,

    /// `~`
    ActiveChar(char),
}

impl TexToken {
    /// Space and comment tokens are invisible to argument scanning.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TexToken::Space | TexToken::Comment(_))
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            TexToken::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_cs(&self, name: &str) -> bool {
        matches!(self, TexToken::ControlSeq(n) if n == name)
    }

    pub fn is_char(&self, c: char) -> bool {
        matches!(self, TexToken::Char(x) if *x == c)
    }

    /// Row separator inside a matrix body.
    pub fn is_row_break(&self) -> bool {
        self.is_cs("\\")
    }
}

impl fmt::Display for TexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TexToken::ControlSeq(name) => write!(f, "\\{}", name),
            TexToken::BeginGroup => write!(f, "{{"),
            TexToken::EndGroup => write!(f, "}}"),
            TexToken::Char(c) => write!(f, "{}", c),
            TexToken::Space => write!(f, " "),
            TexToken::Comment(text) => write!(f, "%{}", text),
            TexToken::MathShift => write!(f, "$"),
            TexToken::AlignTab => write!(f, "&"),
            TexToken::Superscript => write!(f, "^"),
            TexToken::Subscript => write!(f, "_"),
            TexToken::ActiveChar(c) => write!(f, "{}", c),
        }
    }
}

/// Tokens of one input, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenList(Vec<TexToken>);

impl TokenList {
    pub fn from_vec(tokens: Vec<TexToken>) -> Self {
        TokenList(tokens)
    }

    pub fn as_slice(&self) -> &[TexToken] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
