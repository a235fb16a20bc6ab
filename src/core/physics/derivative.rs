//! Derivative and variation assembly.

use physics_tex_ir::{Atom, ExpressionNode, Role, Variant};

use super::args::{read_argument, ConsumedArgs};
use super::delimiters::{Delimiter, DelimiterSpec};
use super::dispatch::{fenced, SlotsExt};
use super::options::PhysicsOptions;
use super::table::DiffSymbol;
use crate::core::engine::parser::unwrap_single;
use crate::core::engine::{symbols, SubParser, TexToken};
use crate::utils::error::MacroResult;

/// The differential glyph for `symbol`.
pub fn diff_symbol(symbol: DiffSymbol, options: &PhysicsOptions) -> Atom {
    match symbol {
        DiffSymbol::Total => {
            let variant = if options.italic_diff {
                Variant::Italic
            } else {
                Variant::Upright
            };
            Atom::ident("d").with_variant(variant)
        }
        DiffSymbol::Partial => Atom::ident("∂"),
        DiffSymbol::Functional => Atom::ident("δ"),
    }
}

/// Build a derivative from its parts.
///
/// With more than one variable the numerator carries the variable count and
/// every variable gets an empty exponent slot; an explicit order only applies
/// to a single variable.
pub fn assemble(
    symbol: &Atom,
    order: Option<ExpressionNode>,
    function: Option<ExpressionNode>,
    variables: Vec<ExpressionNode>,
    flat: bool,
) -> ExpressionNode {
    let implicit_count = variables.len() > 1;
    let order = if implicit_count { None } else { order };
    let numerator_order = match &order {
        Some(order) => Some(order.clone()),
        None if implicit_count => Some(Atom::number(variables.len().to_string()).into()),
        None => None,
    };

    let mut numerator = vec![with_exponent(symbol.clone().into(), numerator_order)];
    if let Some(function) = function {
        numerator.extend(function.into_children());
    }
    let numerator = ExpressionNode::row(numerator);

    let denominator = if variables.is_empty() {
        ExpressionNode::row(vec![symbol.clone().into()])
    } else {
        let groups = variables
            .into_iter()
            .enumerate()
            .map(|(i, variable)| {
                let variable = unwrap_single(variable);
                let variable = match &order {
                    Some(order) if i == 0 => ExpressionNode::superscript(variable, order.clone()),
                    None if implicit_count => {
                        ExpressionNode::superscript(variable, ExpressionNode::empty_row())
                    }
                    _ => variable,
                };
                ExpressionNode::row(vec![symbol.clone().into(), variable])
            })
            .collect();
        ExpressionNode::row(groups)
    };

    if flat {
        let fence = DelimiterSpec::resolve(Delimiter::Blank, Delimiter::Blank, false, None);
        return ExpressionNode::row_with_role(
            vec![
                fence.open_atom().into(),
                numerator,
                fence.middle_atom("/").into(),
                denominator,
                fence.close_atom().into(),
            ],
            Role::Inner,
        );
    }
    ExpressionNode::fraction(numerator, denominator)
}

fn with_exponent(base: ExpressionNode, exponent: Option<ExpressionNode>) -> ExpressionNode {
    match exponent {
        Some(exponent) => ExpressionNode::superscript(base, exponent),
        None => base,
    }
}

/// `\dv`, `\pdv`, `\fdv` after argument consumption.
pub fn expand(p: &mut dyn SubParser<'_>, symbol: DiffSymbol, args: ConsumedArgs) -> ExpressionNode {
    let glyph = diff_symbol(symbol, p.options());
    let order = args.order().cloned().map(unwrap_single);
    let flat = args.starred;

    let mut slots = args.into_required();
    let first = slots.next_or_empty();
    let rest: Vec<ExpressionNode> = slots.collect();
    let (function, variables) = if rest.is_empty() {
        (None, vec![first])
    } else {
        (Some(first), rest)
    };

    let derivative = assemble(&glyph, order, function, variables, flat);
    match fenced(p, &['('], false, None) {
        Some(fence) => ExpressionNode::row(vec![derivative, fence]),
        None => derivative,
    }
}

/// `\dd` and `\var`: the symbol, then a fence, a group or a single symbol.
pub fn differential(
    p: &mut dyn SubParser<'_>,
    symbol: DiffSymbol,
    args: ConsumedArgs,
    name: &str,
) -> MacroResult<ExpressionNode> {
    let glyph = diff_symbol(symbol, p.options());
    let order = args.order().cloned().map(unwrap_single);
    let mut children = vec![with_exponent(glyph.into(), order)];

    if let Some(fence) = fenced(p, &['('], false, None) {
        children.push(fence);
    } else if let Some(group) = read_argument(p, false, name)? {
        children.extend(group.into_children());
    } else if let Some(atom) = single_symbol(p) {
        children.push(atom.into());
    }
    Ok(ExpressionNode::row_with_role(children, Role::Op))
}

/// A letter or a symbol control word (`\dd x`, `\dd\theta`).
fn single_symbol(p: &mut dyn SubParser<'_>) -> Option<Atom> {
    let atom = match p.cursor().peek()? {
        TexToken::Char(c) if c.is_alphabetic() => Atom::ident(c.to_string()),
        TexToken::ControlSeq(name) => match symbols::lookup(name) {
            Some((glyph, Role::Ord)) => Atom::ident(glyph),
            _ => return None,
        },
        _ => return None,
    };
    p.cursor().advance();
    Some(atom)
}
