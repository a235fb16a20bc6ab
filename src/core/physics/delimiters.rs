//! Delimiter resolution and auto-sizing.
//!
//! A [`DelimiterSpec`] decides the glyphs, roles, size and stretchiness of a
//! fence; `wrap` builds the `OPEN / INNER(content) / CLOSE` row. Measuring is
//! left to the renderer: auto fences only carry a stretchy request.

use lazy_static::lazy_static;
use physics_tex_ir::{Atom, ExpressionNode, Role, SizeLevel};
use regex::Regex;

use crate::utils::error::{MacroError, MacroResult};

/// Symbolic delimiter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
    Vert,
    DoubleVert,
    Angle,
    /// `\lgroup` / `\rgroup`
    Group,
    /// The invisible `.` fence.
    Blank,
    /// Evaluation bar.
    Bar,
    /// Flat fraction separator.
    Slash,
}

impl Delimiter {
    pub fn open_glyph(self) -> &'static str {
        match self {
            Delimiter::Paren => "(",
            Delimiter::Bracket => "[",
            Delimiter::Brace => "{",
            Delimiter::Vert | Delimiter::Bar => "|",
            Delimiter::DoubleVert => "‖",
            Delimiter::Angle => "⟨",
            Delimiter::Group => "⟮",
            Delimiter::Blank => "",
            Delimiter::Slash => "/",
        }
    }

    pub fn close_glyph(self) -> &'static str {
        match self {
            Delimiter::Paren => ")",
            Delimiter::Bracket => "]",
            Delimiter::Brace => "}",
            Delimiter::Angle => "⟩",
            Delimiter::Group => "⟯",
            other => other.open_glyph(),
        }
    }

    /// Delimiter opened by a literal input character (`\qty(`, `\qty[`, `\qty|`).
    pub fn from_opening_char(c: char) -> Option<Self> {
        match c {
            '(' => Some(Delimiter::Paren),
            '[' => Some(Delimiter::Bracket),
            '|' => Some(Delimiter::Vert),
            _ => None,
        }
    }

    /// Input character that closes an auto fence opened with `open`.
    pub fn closing_char(open: char) -> Option<char> {
        match open {
            '(' => Some(')'),
            '[' => Some(']'),
            '|' => Some('|'),
            _ => None,
        }
    }
}

lazy_static! {
    static ref SIZE_KEYWORD: Regex = Regex::new(r"^(big|Big|bigg|Bigg)([lrm])?$").unwrap();
    /// Control words that look like a size but are not one (`\biggg`, `\Bigx`).
    static ref SIZE_LOOKALIKE: Regex = Regex::new(r"^[bB]ig+[a-zA-Z]?$").unwrap();
}

/// Outcome of checking a control word against the size keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKeyword {
    Size(SizeLevel),
    NotASize,
}

/// Classify a control word name (without backslash) as a size keyword.
pub fn size_keyword(name: &str) -> MacroResult<SizeKeyword> {
    if let Some(caps) = SIZE_KEYWORD.captures(name) {
        let level = match &caps[1] {
            "big" => SizeLevel::Big1,
            "Big" => SizeLevel::Big2,
            "bigg" => SizeLevel::Big3,
            _ => SizeLevel::Big4,
        };
        return Ok(SizeKeyword::Size(level));
    }
    if SIZE_LOOKALIKE.is_match(name) {
        return Err(MacroError::unrecognized(name));
    }
    Ok(SizeKeyword::NotASize)
}

/// A resolved fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterSpec {
    pub open: Delimiter,
    pub close: Delimiter,
    pub size: SizeLevel,
    pub open_role: Role,
    pub close_role: Role,
    pub stretchy: bool,
}

/// One element of a fence with interior separators (`⟨a|B|c⟩`).
#[derive(Debug, Clone, PartialEq)]
pub enum FencePart {
    Content(ExpressionNode),
    Middle(&'static str),
}

impl DelimiterSpec {
    /// Resolve a pair.
    ///
    /// - star: plain ORD glyphs, never stretchy
    /// - explicit size: OPEN/CLOSE at that fixed size
    /// - otherwise auto: OPEN/CLOSE, stretchy
    pub fn resolve(
        open: Delimiter,
        close: Delimiter,
        starred: bool,
        explicit_size: Option<SizeLevel>,
    ) -> Self {
        if starred {
            return Self {
                open,
                close,
                size: explicit_size.unwrap_or(SizeLevel::Natural),
                open_role: Role::Ord,
                close_role: Role::Ord,
                stretchy: false,
            };
        }
        match explicit_size {
            Some(size) => Self {
                open,
                close,
                size,
                open_role: Role::Open,
                close_role: Role::Close,
                stretchy: false,
            },
            None => Self {
                open,
                close,
                size: SizeLevel::Auto,
                open_role: Role::Open,
                close_role: Role::Close,
                stretchy: true,
            },
        }
    }

    pub fn pair(delim: Delimiter, starred: bool, explicit_size: Option<SizeLevel>) -> Self {
        Self::resolve(delim, delim, starred, explicit_size)
    }

    /// The same fence with its closing side replaced by the blank
    /// placeholder, for auto fences whose closer never appeared.
    pub fn unclosed(self) -> Self {
        Self {
            close: Delimiter::Blank,
            ..self
        }
    }

    pub fn is_plain(&self) -> bool {
        self.open_role == Role::Ord
    }

    pub fn open_atom(&self) -> Atom {
        Atom::fence(self.open.open_glyph(), self.open_role, self.size, self.stretchy)
    }

    pub fn close_atom(&self) -> Atom {
        Atom::fence(self.close.close_glyph(), self.close_role, self.size, self.stretchy)
    }

    /// A separator inside this fence.
    pub fn middle_atom(&self, glyph: &'static str) -> Atom {
        let role = if self.is_plain() { Role::Ord } else { Role::Middle };
        Atom::fence(glyph, role, self.size, self.stretchy)
    }

    fn shell_role(&self) -> Role {
        if self.is_plain() {
            Role::Ord
        } else {
            Role::Inner
        }
    }

    /// Wrap content: `Row[open, Row(content), close]`.
    ///
    /// Empty content still produces both fences around an empty inner row.
    pub fn wrap(&self, content: ExpressionNode) -> ExpressionNode {
        self.wrap_parts(vec![FencePart::Content(content)])
    }

    /// Wrap several contents with separators between them.
    pub fn wrap_parts(&self, parts: Vec<FencePart>) -> ExpressionNode {
        let role = self.shell_role();
        let mut inner = Vec::new();
        for part in parts {
            match part {
                FencePart::Content(node) => inner.extend(node.into_children()),
                FencePart::Middle(glyph) => inner.push(self.middle_atom(glyph).into()),
            }
        }
        ExpressionNode::row_with_role(
            vec![
                self.open_atom().into(),
                ExpressionNode::row_with_role(inner, role),
                self.close_atom().into(),
            ],
            role,
        )
    }
}
