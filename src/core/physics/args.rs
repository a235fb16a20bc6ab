//! Argument consumption protocol.
//!
//! Given a [`MacroSpec`] and a cursor right after the macro name, pull the
//! star flag, the optional argument and the required arguments off the
//! cursor, re-entering the host parser for every sub-expression.

use physics_tex_ir::{ExpressionNode, SizeLevel};

use super::delimiters::{size_keyword, SizeKeyword};
use super::table::{ArgFallback, MacroSpec, OptionalArgKind, Requirement};
use crate::core::engine::{Extent, SubParser, TexToken};
use crate::utils::error::{MacroError, MacroResult};

#[derive(Debug, Clone, PartialEq)]
pub enum OptionalValue {
    /// Order or power; `value` is set when the text is a plain integer.
    Order {
        node: ExpressionNode,
        value: Option<u32>,
    },
    Expression(ExpressionNode),
}

/// Everything one macro invocation consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumedArgs {
    pub starred: bool,
    pub double_starred: bool,
    /// Explicit size keyword seen right after the name (and star).
    pub size: Option<SizeLevel>,
    pub optional: Option<OptionalValue>,
    pub required: Vec<ExpressionNode>,
    /// Raw text of trailing dimension/index slots.
    pub raw: Vec<String>,
}

impl ConsumedArgs {
    pub fn order(&self) -> Option<&ExpressionNode> {
        match &self.optional {
            Some(OptionalValue::Order { node, .. }) => Some(node),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<&ExpressionNode> {
        match &self.optional {
            Some(OptionalValue::Expression(node)) => Some(node),
            _ => None,
        }
    }

    pub fn into_required(self) -> std::vec::IntoIter<ExpressionNode> {
        self.required.into_iter()
    }
}

/// Run the protocol for `spec`; `name` is the control word as invoked.
pub fn consume(
    p: &mut dyn SubParser<'_>,
    spec: &MacroSpec,
    name: &str,
) -> MacroResult<ConsumedArgs> {
    let mut args = ConsumedArgs::default();

    if spec.takes_star && p.cursor().eat_char('*') {
        args.starred = true;
        if spec.double_star && p.cursor().eat_char('*') {
            args.double_starred = true;
        }
    }

    match spec.optional {
        Some(OptionalArgKind::Size) => args.size = read_size(p)?,
        Some(OptionalArgKind::Order) => {
            if let Some((node, text)) = read_bracketed(p, name)? {
                args.optional = Some(OptionalValue::Order {
                    value: parse_order(name, &text)?,
                    node,
                });
            }
        }
        Some(OptionalArgKind::Expression) => {
            if let Some((node, _)) = read_bracketed(p, name)? {
                args.optional = Some(OptionalValue::Expression(node));
            }
        }
        None => {}
    }

    for slot in 0..spec.required {
        let single_ok = match spec.fallback {
            ArgFallback::BracedGroup => false,
            ArgFallback::SingleToken => true,
            ArgFallback::FirstBraced => slot > 0,
        };
        match read_argument(p, single_ok, name)? {
            Some(node) => args.required.push(node),
            None if spec.requirement == Requirement::Soft => {
                args.required.push(ExpressionNode::empty_row())
            }
            None => return Err(MacroError::missing(name)),
        }
    }

    for _ in 0..spec.extra_braced {
        match read_argument(p, false, name)? {
            Some(node) => args.required.push(node),
            None => break,
        }
    }

    for _ in 0..spec.raw_tail {
        args.raw.push(read_raw(p, name)?);
    }

    Ok(args)
}

/// Peek for an explicit size keyword and consume it when present.
///
/// A control word that only looks like a size keyword is consumed and
/// reported as `UnrecognizedDelimiter`. Anything else is left in place.
pub fn read_size(p: &mut dyn SubParser<'_>) -> MacroResult<Option<SizeLevel>> {
    let Some(TexToken::ControlSeq(cs)) = p.cursor().peek() else {
        return Ok(None);
    };
    match size_keyword(cs) {
        Ok(SizeKeyword::Size(level)) => {
            p.cursor().advance();
            Ok(Some(level))
        }
        Ok(SizeKeyword::NotASize) => Ok(None),
        Err(err) => {
            p.cursor().advance();
            Err(err)
        }
    }
}

/// `[ ... ]` parsed as a sub-expression, plus its source text.
pub fn read_bracketed(
    p: &mut dyn SubParser<'_>,
    name: &str,
) -> MacroResult<Option<(ExpressionNode, String)>> {
    if p.cursor().peek_char() != Some('[') {
        return Ok(None);
    }
    let open = p.cursor().peek_index();
    let close = p
        .cursor()
        .closer_end(open, '[', ']')
        .ok_or_else(|| MacroError::unbalanced(name))?;
    let text = p.cursor().text(open + 1, close);
    p.cursor().jump_to(open + 1);
    let node = p.parse_until(close);
    p.cursor().jump_to(close + 1);
    Ok(Some((node, text)))
}

fn parse_order(name: &str, text: &str) -> MacroResult<Option<u32>> {
    let text = text.trim();
    if let Ok(value) = text.parse::<u32>() {
        return Ok(Some(value));
    }
    if text.parse::<i64>().is_ok() {
        // A negative literal.
        return Err(MacroError::invalid_number(format!("order of \\{}", name), text));
    }
    Ok(None)
}

/// One argument: a braced group, or (when `single_ok`) a single token.
///
/// Returns `None` when nothing consumable follows.
pub fn read_argument(
    p: &mut dyn SubParser<'_>,
    single_ok: bool,
    name: &str,
) -> MacroResult<Option<ExpressionNode>> {
    match p.cursor().argument_extent() {
        Some(Extent::Braced { open, close }) => {
            p.cursor().jump_to(open + 1);
            let node = p.parse_until(close);
            p.cursor().jump_to(close + 1);
            Ok(Some(node))
        }
        Some(Extent::Unclosed { .. }) => Err(MacroError::unbalanced(name)),
        Some(Extent::Single { start, end }) if single_ok => {
            p.cursor().jump_to(start);
            Ok(Some(p.parse_until(end)))
        }
        _ => Ok(None),
    }
}

/// Token span `(open, close)` of a braced group, without consuming it.
pub fn braced_span(p: &mut dyn SubParser<'_>, name: &str) -> MacroResult<Option<(usize, usize)>> {
    match p.cursor().argument_extent() {
        Some(Extent::Braced { open, close }) => Ok(Some((open, close))),
        Some(Extent::Unclosed { .. }) => Err(MacroError::unbalanced(name)),
        _ => Ok(None),
    }
}

/// A dimension or index slot, as trimmed source text.
pub fn read_raw(p: &mut dyn SubParser<'_>, name: &str) -> MacroResult<String> {
    match p.cursor().argument_extent() {
        Some(Extent::Braced { open, close }) => {
            let text = p.cursor().text(open + 1, close);
            p.cursor().jump_to(close + 1);
            Ok(text)
        }
        Some(Extent::Single { start, end }) => {
            let text = p.cursor().text(start, end);
            p.cursor().jump_to(end);
            Ok(text)
        }
        Some(Extent::Unclosed { .. }) => Err(MacroError::unbalanced(name)),
        None => Err(MacroError::missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{tokenize, MathParser};
    use crate::core::physics::table::PHYSICS_MACROS;
    use crate::core::physics::PhysicsOptions;
    use physics_tex_ir::Atom;

    fn consume_after_name(input: &str, name: &str) -> (MacroResult<ConsumedArgs>, usize) {
        let tokens = tokenize(input);
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.cursor().advance();
        let spec = PHYSICS_MACROS[name];
        let result = consume(&mut parser, &spec, name);
        let pos = parser.cursor().position();
        (result, pos)
    }

    fn ident_row(name: &str) -> ExpressionNode {
        ExpressionNode::row(vec![Atom::ident(name).into()])
    }

    #[test]
    fn test_star_detection() {
        let (args, _) = consume_after_name("\\pqty*{x}", "pqty");
        let args = args.unwrap();
        assert!(args.starred);
        assert_eq!(args.required, vec![ident_row("x")]);

        let (args, _) = consume_after_name("\\pqty{x}", "pqty");
        assert!(!args.unwrap().starred);
    }

    #[test]
    fn test_single_token_fallback_matches_braced() {
        let (braced, _) = consume_after_name("\\dv{x}", "dv");
        let (single, _) = consume_after_name("\\dv x", "dv");
        assert_eq!(braced.unwrap().required, single.unwrap().required);
    }

    #[test]
    fn test_braced_only_slot_is_missing() {
        let (result, _) = consume_after_name("\\pqty x", "pqty");
        assert_eq!(result, Err(MacroError::missing("pqty")));
    }

    #[test]
    fn test_soft_slot_yields_empty_row() {
        let spec = PHYSICS_MACROS["pqty"].soft();
        let tokens = tokenize("\\pqty");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.cursor().advance();
        let args = consume(&mut parser, &spec, "pqty").unwrap();
        assert_eq!(args.required, vec![ExpressionNode::empty_row()]);
    }

    #[test]
    fn test_explicit_size() {
        let (args, _) = consume_after_name("\\pqty\\Big{x}", "pqty");
        assert_eq!(args.unwrap().size, Some(SizeLevel::Big2));

        let (result, pos) = consume_after_name("\\pqty\\biggg{x}", "pqty");
        assert_eq!(result, Err(MacroError::unrecognized("biggg")));
        assert_eq!(pos, 2);
    }

    #[test]
    fn test_order_argument() {
        let (args, _) = consume_after_name("\\dv[2]{f}{x}", "dv");
        let args = args.unwrap();
        assert!(matches!(
            args.optional,
            Some(OptionalValue::Order { value: Some(2), .. })
        ));
        assert_eq!(args.required.len(), 2);

        let (args, _) = consume_after_name("\\dv[n]{f}{x}", "dv");
        assert!(matches!(
            args.unwrap().optional,
            Some(OptionalValue::Order { value: None, .. })
        ));
    }

    #[test]
    fn test_negative_order_is_invalid() {
        let (result, _) = consume_after_name("\\dv[-1]{f}{x}", "dv");
        assert!(matches!(result, Err(MacroError::InvalidNumber { .. })));
    }

    #[test]
    fn test_extra_slots_need_braces() {
        let (args, pos) = consume_after_name("\\dv{f} x", "dv");
        assert_eq!(args.unwrap().required.len(), 1);
        // Only the space before `x` was skipped.
        assert_eq!(pos, 5);
    }

    #[test]
    fn test_raw_slots() {
        let (args, _) = consume_after_name("\\zmat{2}{3}", "zmat");
        assert_eq!(args.unwrap().raw, vec!["2".to_string(), "3".to_string()]);

        let (result, _) = consume_after_name("\\zmat{2}", "zmat");
        assert_eq!(result, Err(MacroError::missing("zmat")));
    }

    #[test]
    fn test_unclosed_group() {
        let (result, _) = consume_after_name("\\pqty{x", "pqty");
        assert_eq!(result, Err(MacroError::unbalanced("pqty")));
    }
}
