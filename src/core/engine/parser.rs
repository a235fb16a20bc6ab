//! Minimal host math parser.
//!
//! Parses identifiers, numbers, operators, groups, scripts, `\frac`, font
//! commands, `\left`/`\right` fences and plain symbols. Control words found
//! in the [`MacroTable`] are handed to the physics dispatcher together with
//! the live cursor; the physics code re-enters this parser through
//! [`SubParser`] for every argument.

use physics_tex_ir::{Atom, AtomKind, ExpressionNode, Role, SizeLevel, Variant};
use tracing::warn;

use super::cursor::{Extent, TokenCursor};
use super::symbols;
use super::token::TexToken;
use crate::core::physics::delimiters::{size_keyword, SizeKeyword};
use crate::core::physics::dispatch;
use crate::core::physics::table::{MacroSpec, MacroTable, DEFAULT_TABLE};
use crate::core::physics::PhysicsOptions;
use crate::utils::error::{Diagnostic, DiagnosticSeverity, MacroError};

/// Re-entry interface the macro package uses to parse sub-expressions.
pub trait SubParser<'a> {
    fn cursor(&mut self) -> &mut TokenCursor<'a>;

    fn options(&self) -> &PhysicsOptions;

    /// Parse from the cursor up to token index `end` (exclusive) and leave
    /// the cursor there. Always returns an ordinary row.
    fn parse_until(&mut self, end: usize) -> ExpressionNode;
}

pub struct MathParser<'a> {
    cursor: TokenCursor<'a>,
    options: &'a PhysicsOptions,
    macros: &'a MacroTable,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> MathParser<'a> {
    pub fn new(tokens: &'a [TexToken], options: &'a PhysicsOptions) -> Self {
        Self::with_table(tokens, options, &DEFAULT_TABLE)
    }

    pub fn with_table(
        tokens: &'a [TexToken],
        options: &'a PhysicsOptions,
        macros: &'a MacroTable,
    ) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            options,
            macros,
            diagnostics: Vec::new(),
        }
    }

    /// Parse everything that is left.
    pub fn parse(&mut self) -> ExpressionNode {
        let end = self.cursor.limit();
        self.parse_until(end)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn parse_sequence(&mut self) -> Vec<ExpressionNode> {
        let mut items = Vec::new();
        while let Some(token) = self.cursor.peek() {
            let start = self.cursor.position();
            match token {
                TexToken::BeginGroup => {
                    self.cursor.advance();
                    let close = self.cursor.group_end(start);
                    let end = close.unwrap_or_else(|| self.cursor.limit());
                    items.push(self.parse_until(end));
                    if close.is_some() {
                        self.cursor.advance();
                    }
                }
                TexToken::Superscript | TexToken::Subscript => {
                    self.cursor.advance();
                    let script = self.parse_script();
                    let base = items.pop().unwrap_or_else(ExpressionNode::empty_row);
                    items.push(if matches!(token, TexToken::Superscript) {
                        ExpressionNode::superscript(base, script)
                    } else {
                        ExpressionNode::subscript(base, script)
                    });
                }
                TexToken::Char(c) if c.is_ascii_digit() || *c == '.' => {
                    items.push(self.parse_number());
                }
                TexToken::Char(c) => {
                    self.cursor.advance();
                    items.push(char_atom(*c).into());
                }
                TexToken::ControlSeq(name) => {
                    self.cursor.advance();
                    if let Some(node) = self.parse_control(name, start) {
                        items.push(node);
                    }
                }
                // Stray group ends, alignment tabs, math shifts, ties.
                _ => {
                    self.cursor.advance();
                }
            }
        }
        items
    }

    fn parse_number(&mut self) -> ExpressionNode {
        let mut text = String::new();
        while let Some(TexToken::Char(c)) = self.cursor.peek() {
            if !(c.is_ascii_digit() || *c == '.') {
                break;
            }
            text.push(*c);
            self.cursor.advance();
        }
        Atom::number(text).into()
    }

    /// A script or `\frac` operand: a group or one token.
    fn parse_script(&mut self) -> ExpressionNode {
        let node = match self.cursor.argument_extent() {
            Some(Extent::Braced { open, close }) => {
                self.cursor.jump_to(open + 1);
                let node = self.parse_until(close);
                self.cursor.jump_to(close + 1);
                node
            }
            Some(Extent::Single { start, end }) => {
                self.cursor.jump_to(start);
                self.parse_until(end)
            }
            Some(Extent::Unclosed { open }) => {
                self.cursor.jump_to(open + 1);
                let end = self.cursor.limit();
                self.parse_until(end)
            }
            None => ExpressionNode::empty_row(),
        };
        unwrap_single(node)
    }

    /// Raw source text of a braced argument (for `\text`).
    fn read_text(&mut self) -> String {
        match self.cursor.argument_extent() {
            Some(Extent::Braced { open, close }) => {
                let text = self.cursor.text(open + 1, close);
                self.cursor.jump_to(close + 1);
                text
            }
            Some(Extent::Single { start, end }) => {
                let text = self.cursor.text(start, end);
                self.cursor.jump_to(end);
                text
            }
            _ => String::new(),
        }
    }

    /// Glyph of the delimiter token after `\left`, `\big`, ...
    fn read_delimiter(&mut self) -> Option<&'static str> {
        let text = match self.cursor.peek()? {
            TexToken::Char(c) => c.to_string(),
            TexToken::ControlSeq(name) => format!("\\{}", name),
            _ => return None,
        };
        let glyph = symbols::delimiter_glyph(&text)?;
        self.cursor.advance();
        Some(glyph)
    }

    fn parse_control(&mut self, name: &str, start: usize) -> Option<ExpressionNode> {
        if let Some(spec) = self.macros.get(name) {
            let spec = *spec;
            return Some(self.expand_macro(name, spec, start));
        }

        match name {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_script();
                let denominator = self.parse_script();
                Some(ExpressionNode::fraction(numerator, denominator))
            }
            "mathrm" | "mathbf" | "mathcal" | "mathit" | "boldsymbol" | "operatorname" => {
                let (variant, role) = match name {
                    "mathrm" => (Variant::Upright, None),
                    "mathbf" => (Variant::Bold, None),
                    "mathcal" => (Variant::Calligraphic, None),
                    "mathit" => (Variant::Italic, None),
                    "boldsymbol" => (Variant::BoldItalic, None),
                    _ => (Variant::Upright, Some(Role::Op)),
                };
                let arg = self.parse_script();
                if role.is_some() {
                    let text = arg.atoms().iter().map(|a| a.text.as_str()).collect::<String>();
                    return Some(Atom::ident(text).with_role(Role::Op).into());
                }
                Some(apply_variant(arg, variant))
            }
            "text" | "textrm" | "mbox" => Some(Atom::text(self.read_text()).into()),
            "left" | "right" | "middle" => {
                let role = match name {
                    "left" => Role::Open,
                    "right" => Role::Close,
                    _ => Role::Middle,
                };
                let glyph = self.read_delimiter()?;
                Some(Atom::fence(glyph, role, SizeLevel::Auto, true).into())
            }
            "," | ";" | ":" | "!" | " " | "quad" | "qquad" | "thinspace" | "\\" => None,
            "%" | "&" | "_" | "#" | "$" => Some(Atom::operator(name, Role::Ord).into()),
            _ => {
                if let Ok(SizeKeyword::Size(size)) = size_keyword(name) {
                    let role = match name.chars().last() {
                        Some('l') => Role::Open,
                        Some('r') => Role::Close,
                        Some('m') => Role::Middle,
                        _ => Role::Ord,
                    };
                    let glyph = self.read_delimiter()?;
                    return Some(Atom::fence(glyph, role, size, false).into());
                }
                if let Some((glyph, role)) = symbols::lookup(name) {
                    let atom = if role == Role::Ord {
                        Atom::ident(glyph)
                    } else {
                        Atom::operator(glyph, role)
                    };
                    return Some(atom.into());
                }
                let source = format!("\\{}", name);
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Info,
                        "unknown command",
                        format!("Unknown command {} kept as an identifier", source),
                    )
                    .with_location(source.clone()),
                );
                Some(Atom::ident(source).into())
            }
        }
    }

    fn expand_macro(&mut self, name: &str, spec: MacroSpec, start: usize) -> ExpressionNode {
        let result = dispatch::expand(self, &spec, name);
        if matches!(result, Err(MacroError::UnrecognizedDelimiter { .. })) {
            // The rest of the enclosing expression belongs to the failed call.
            let here = self.cursor.position();
            let end = self.cursor.scope_end(here);
            self.cursor.jump_to(end);
        }
        let source = self.cursor.text(start, self.cursor.position());
        match result {
            Ok(node) => node.with_source(source),
            Err(err) => {
                warn!(macro_name = name, error = %err, "macro expansion failed");
                self.diagnostics
                    .push(Diagnostic::from(&err).with_location(source.clone()));
                ExpressionNode::error(err.to_string(), source)
            }
        }
    }
}

impl<'a> SubParser<'a> for MathParser<'a> {
    fn cursor(&mut self) -> &mut TokenCursor<'a> {
        &mut self.cursor
    }

    fn options(&self) -> &PhysicsOptions {
        self.options
    }

    fn parse_until(&mut self, end: usize) -> ExpressionNode {
        let previous = self.cursor.narrow(end);
        let stop = self.cursor.limit();
        let children = self.parse_sequence();
        self.cursor.jump_to(stop);
        self.cursor.restore(previous);
        ExpressionNode::row(children)
    }
}

fn char_atom(c: char) -> Atom {
    match c {
        c if c.is_alphabetic() => Atom::ident(c.to_string()),
        '+' | '-' | '*' => Atom::operator(c.to_string(), Role::Bin),
        '=' | '<' | '>' => Atom::operator(c.to_string(), Role::Rel),
        ',' | ';' => Atom::operator(c.to_string(), Role::Punct),
        '(' | '[' => Atom::operator(c.to_string(), Role::Open),
        ')' | ']' => Atom::operator(c.to_string(), Role::Close),
        '\'' => Atom::operator("′", Role::Ord),
        _ => Atom::operator(c.to_string(), Role::Ord),
    }
}

/// `Row[x]` → `x` for unlabelled ordinary rows.
pub(crate) fn unwrap_single(node: ExpressionNode) -> ExpressionNode {
    match node {
        ExpressionNode::Row {
            mut children,
            role: Role::Ord,
            label: None,
        } if children.len() == 1 => children.remove(0),
        other => other,
    }
}

/// Set the font variant of every identifier and number in `node`.
pub(crate) fn apply_variant(node: ExpressionNode, variant: Variant) -> ExpressionNode {
    match node {
        ExpressionNode::Atom(atom)
            if matches!(atom.kind, AtomKind::Identifier | AtomKind::Number) =>
        {
            atom.with_variant(variant).into()
        }
        ExpressionNode::Row {
            children,
            role,
            label,
        } => ExpressionNode::Row {
            children: children
                .into_iter()
                .map(|child| apply_variant(child, variant))
                .collect(),
            role,
            label,
        },
        ExpressionNode::Superscript { base, exponent } => ExpressionNode::Superscript {
            base: Box::new(apply_variant(*base, variant)),
            exponent,
        },
        ExpressionNode::Subscript { base, subscript } => ExpressionNode::Subscript {
            base: Box::new(apply_variant(*base, variant)),
            subscript,
        },
        ExpressionNode::Accent { base, accent } => ExpressionNode::Accent {
            base: Box::new(apply_variant(*base, variant)),
            accent,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> ExpressionNode {
        let tokens = tokenize(input);
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.parse()
    }

    #[test]
    fn test_identifiers_and_operators() {
        let node = parse("a + 12");
        assert_eq!(
            node,
            ExpressionNode::row(vec![
                Atom::ident("a").into(),
                Atom::operator("+", Role::Bin).into(),
                Atom::number("12").into(),
            ])
        );
    }

    #[test]
    fn test_scripts_attach_to_previous_item() {
        let node = parse("x_i^2");
        assert_eq!(
            node,
            ExpressionNode::row(vec![ExpressionNode::superscript(
                ExpressionNode::subscript(Atom::ident("x").into(), Atom::ident("i").into()),
                Atom::number("2").into(),
            )])
        );
    }

    #[test]
    fn test_frac_and_symbols() {
        let node = parse("\\frac{\\hbar}{2}");
        assert_eq!(
            node,
            ExpressionNode::row(vec![ExpressionNode::fraction(
                Atom::ident("ħ").into(),
                Atom::number("2").into(),
            )])
        );
    }

    #[test]
    fn test_left_right_fences() {
        let node = parse("\\left( x \\right.");
        let atoms = node.atoms();
        assert_eq!(atoms[0].role, Role::Open);
        assert!(atoms[0].stretchy);
        assert_eq!(atoms[2].text, "");
        assert_eq!(atoms[2].role, Role::Close);
    }

    #[test]
    fn test_big_fence() {
        let node = parse("\\Bigl( x \\Bigr)");
        let atoms = node.atoms();
        assert_eq!(atoms[0].size, SizeLevel::Big2);
        assert_eq!(atoms[0].role, Role::Open);
        assert_eq!(atoms[2].role, Role::Close);
    }

    #[test]
    fn test_mathrm_sets_variant() {
        let node = parse("\\mathrm{d}");
        assert_eq!(
            node,
            ExpressionNode::row(vec![Atom::ident("d").with_variant(Variant::Upright).into()])
        );
    }

    #[test]
    fn test_stray_closers_are_skipped() {
        let node = parse("a } & b");
        assert_eq!(node.atoms().len(), 2);
    }

    #[test]
    fn test_macro_failure_becomes_marker() {
        let tokens = tokenize("a + \\pqty + b");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        let node = parser.parse();
        assert!(matches!(node.children()[2], ExpressionNode::Error { .. }));
        assert_eq!(node.children().len(), 5);
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].kind, "missing argument");
    }

    #[test]
    fn test_unknown_command_is_noted() {
        let tokens = tokenize("\\foo + x");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        let node = parser.parse();
        assert_eq!(node.children()[0], Atom::ident("\\foo").into());
        let diagnostics = parser.into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn test_bad_size_swallows_rest_of_group() {
        let tokens = tokenize("{\\qty\\biggg(x) y} z");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        let node = parser.parse();
        let group = &node.children()[0];
        assert_eq!(group.children().len(), 1);
        assert!(matches!(&group.children()[0], ExpressionNode::Error { source, .. } if source == "\\qty\\biggg(x) y"));
        assert_eq!(node.children()[1], Atom::ident("z").into());
    }
}
