//! Expansion of physics macros into expression trees.
//!
//! The host parser calls [`expand`] with the cursor right after the control
//! word. Arguments are consumed through [`consume`]; handlers that read
//! their own delimited bodies (`\qty(...)`, `\eval[...]`) look at the cursor
//! directly.

use physics_tex_ir::{Atom, ExpressionNode, Role, SizeLevel, Variant};
use tracing::debug;

use super::args::{consume, read_argument, ConsumedArgs};
use super::delimiters::{Delimiter, DelimiterSpec, FencePart};
use super::table::{Handler, MacroSpec, VectorOperator};
use super::{derivative, matrix};
use crate::core::engine::parser::{apply_variant, unwrap_single};
use crate::core::engine::{SubParser, TexToken};
use crate::utils::error::{MacroError, MacroResult};

/// Expand one macro invocation. `name` is the control word as written.
pub fn expand(
    p: &mut dyn SubParser<'_>,
    spec: &MacroSpec,
    name: &str,
) -> MacroResult<ExpressionNode> {
    debug!(macro_name = name, handler = ?spec.handler, "expanding physics macro");
    let args = consume(p, spec, name)?;

    match spec.handler {
        Handler::Quantity => quantity(p, &args, name),
        Handler::Fence(delim) => {
            let fence = DelimiterSpec::pair(delim, args.starred, args.size);
            Ok(fence.wrap(args.into_required().next_or_empty()))
        }
        Handler::Order => {
            let fence = DelimiterSpec::pair(Delimiter::Paren, args.starred, args.size);
            let big_o = Atom::ident("O")
                .with_variant(Variant::Calligraphic)
                .with_role(Role::Op);
            Ok(ExpressionNode::row(vec![
                big_o.into(),
                fence.wrap(args.into_required().next_or_empty()),
            ]))
        }
        Handler::Evaluated => evaluated(p, &args, name),
        Handler::Commutator(delim) => {
            let fence = DelimiterSpec::pair(delim, args.starred, args.size);
            let mut slots = args.into_required();
            let a = slots.next_or_empty();
            let b = slots.next_or_empty();
            Ok(fence.wrap_parts(vec![
                FencePart::Content(a),
                FencePart::Content(Atom::operator(",", Role::Punct).into()),
                FencePart::Content(b),
            ]))
        }
        Handler::Bra => bra(p, args),
        Handler::Ket => {
            let fence = DelimiterSpec::resolve(Delimiter::Vert, Delimiter::Angle, args.starred, None);
            Ok(fence.wrap(args.into_required().next_or_empty()))
        }
        Handler::BraKet => {
            let fence = DelimiterSpec::pair(Delimiter::Angle, args.starred, None);
            let mut slots = args.into_required();
            let a = slots.next_or_empty();
            let b = slots.next().unwrap_or_else(|| a.clone());
            Ok(fence.wrap_parts(vec![
                FencePart::Content(a),
                FencePart::Middle("|"),
                FencePart::Content(b),
            ]))
        }
        Handler::KetBra => {
            let fence = DelimiterSpec::pair(Delimiter::Vert, args.starred, None);
            let mut slots = args.into_required();
            let a = slots.next_or_empty();
            let b = slots.next().unwrap_or_else(|| a.clone());
            Ok(fence.wrap_parts(vec![
                FencePart::Content(a),
                FencePart::Middle("⟩"),
                FencePart::Middle("⟨"),
                FencePart::Content(b),
            ]))
        }
        Handler::Expectation => {
            let fence = DelimiterSpec::pair(Delimiter::Angle, args.starred, None);
            let mut slots = args.into_required();
            let operator = slots.next_or_empty();
            Ok(match slots.next() {
                Some(state) => fence.wrap_parts(vec![
                    FencePart::Content(state.clone()),
                    FencePart::Middle("|"),
                    FencePart::Content(operator),
                    FencePart::Middle("|"),
                    FencePart::Content(state),
                ]),
                None => fence.wrap(operator),
            })
        }
        Handler::MatrixElement => {
            let fence = DelimiterSpec::pair(Delimiter::Angle, args.starred, None);
            let mut slots = args.into_required();
            Ok(fence.wrap_parts(vec![
                FencePart::Content(slots.next_or_empty()),
                FencePart::Middle("|"),
                FencePart::Content(slots.next_or_empty()),
                FencePart::Middle("|"),
                FencePart::Content(slots.next_or_empty()),
            ]))
        }
        Handler::VectorBold => {
            let variant = if args.starred {
                Variant::BoldItalic
            } else {
                Variant::Bold
            };
            Ok(apply_variant(
                unwrap_single(args.into_required().next_or_empty()),
                variant,
            ))
        }
        Handler::VectorAccent(accent) => {
            let starred = args.starred;
            let base = unwrap_single(args.into_required().next_or_empty());
            let base = if starred {
                base
            } else {
                apply_variant(base, Variant::Bold)
            };
            Ok(ExpressionNode::accent(base, accent))
        }
        Handler::Product(glyph) => Ok(Atom::operator(glyph, Role::Bin).into()),
        Handler::VectorOperator(op) => vector_operator(p, op, &args, name),
        Handler::NamedOperator { text, calligraphic } => {
            let variant = if calligraphic {
                Variant::Calligraphic
            } else {
                Variant::Upright
            };
            let op: ExpressionNode = Atom::ident(text).with_variant(variant).with_role(Role::Op).into();
            let op = match args.order() {
                Some(power) => ExpressionNode::superscript(op, unwrap_single(power.clone())),
                None => op,
            };
            match fenced(p, &['(', '['], args.starred, None) {
                Some(fence) => Ok(ExpressionNode::row(vec![op, fence])),
                None => Ok(op),
            }
        }
        Handler::Derivative(symbol) => Ok(derivative::expand(p, symbol, args)),
        Handler::Differential(symbol) => derivative::differential(p, symbol, args, name),
        Handler::MatrixQuantity { small, fence } => matrix::quantity(p, &args, small, fence, name),
        Handler::IdentityMatrix => matrix::identity(&args, name),
        Handler::ZeroMatrix => matrix::zero(&args, name),
        Handler::PauliMatrix => matrix::pauli(&args, name),
        Handler::DiagonalMatrix { anti } => matrix::diagonal(p, &args, anti, name),
        Handler::XMatrix => matrix::xmatrix(args, name),
    }
}

/// Required-slot iterator that yields empty rows once exhausted.
pub(crate) trait SlotsExt: Iterator<Item = ExpressionNode> {
    fn next_or_empty(&mut self) -> ExpressionNode {
        self.next().unwrap_or_else(ExpressionNode::empty_row)
    }
}

impl<I: Iterator<Item = ExpressionNode>> SlotsExt for I {}

/// An auto fence opened by a literal character at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AutoSpan {
    pub delim: Delimiter,
    /// Index of the opening character.
    pub open: usize,
    /// Index of the closer, or the scope end when `closed` is false.
    pub end: usize,
    pub closed: bool,
}

impl AutoSpan {
    pub(crate) fn find(p: &mut dyn SubParser<'_>, openers: &[char]) -> Option<Self> {
        let c = p.cursor().peek_char()?;
        if !openers.contains(&c) {
            return None;
        }
        let delim = Delimiter::from_opening_char(c)?;
        let close_char = Delimiter::closing_char(c)?;
        let open = p.cursor().peek_index();
        Some(match p.cursor().closer_end(open, c, close_char) {
            Some(close) => Self {
                delim,
                open,
                end: close,
                closed: true,
            },
            None => Self {
                delim,
                open,
                end: p.cursor().scope_end(open + 1),
                closed: false,
            },
        })
    }

    /// Parse the fenced content and step past the closer.
    pub(crate) fn parse(&self, p: &mut dyn SubParser<'_>) -> ExpressionNode {
        p.cursor().jump_to(self.open + 1);
        let content = p.parse_until(self.end);
        if self.closed {
            p.cursor().jump_to(self.end + 1);
        }
        content
    }

    pub(crate) fn spec(&self, starred: bool, size: Option<SizeLevel>) -> DelimiterSpec {
        let spec = DelimiterSpec::pair(self.delim, starred, size);
        if self.closed {
            spec
        } else {
            spec.unclosed()
        }
    }
}

/// Parse an auto fence opened by one of `openers`, if one follows.
pub(crate) fn fenced(
    p: &mut dyn SubParser<'_>,
    openers: &[char],
    starred: bool,
    size: Option<SizeLevel>,
) -> Option<ExpressionNode> {
    let span = AutoSpan::find(p, openers)?;
    let content = span.parse(p);
    Some(span.spec(starred, size).wrap(content))
}

fn quantity(
    p: &mut dyn SubParser<'_>,
    args: &ConsumedArgs,
    name: &str,
) -> MacroResult<ExpressionNode> {
    if let Some(node) = fenced(p, &['(', '[', '|'], args.starred, args.size) {
        return Ok(node);
    }
    if matches!(p.cursor().peek(), Some(TexToken::BeginGroup)) {
        let content = read_argument(p, false, name)?.unwrap_or_else(ExpressionNode::empty_row);
        return Ok(DelimiterSpec::pair(Delimiter::Brace, args.starred, args.size).wrap(content));
    }
    Ok(DelimiterSpec::pair(Delimiter::Paren, args.starred, args.size).wrap(ExpressionNode::empty_row()))
}

fn evaluated(
    p: &mut dyn SubParser<'_>,
    args: &ConsumedArgs,
    name: &str,
) -> MacroResult<ExpressionNode> {
    let (open, content) = if matches!(p.cursor().peek(), Some(TexToken::BeginGroup)) {
        let content = read_argument(p, false, name)?.ok_or_else(|| MacroError::missing(name))?;
        (Delimiter::Blank, content)
    } else if let Some(span) = AutoSpan::find(p, &['(', '[']) {
        (span.delim, span.parse(p))
    } else {
        return Err(MacroError::missing(name));
    };

    let fence = DelimiterSpec::resolve(open, Delimiter::Bar, args.starred, None);
    if args.starred {
        let smashed = ExpressionNode::Smash {
            content: Box::new(content),
        };
        return Ok(fence.wrap(smashed));
    }
    Ok(fence.wrap_parts(vec![
        FencePart::Content(content),
        FencePart::Content(Atom::phantom("∫").into()),
    ]))
}

/// `\bra{a}`, merged with a directly following `\ket{b}` into `⟨a|b⟩`.
fn bra(p: &mut dyn SubParser<'_>, args: ConsumedArgs) -> MacroResult<ExpressionNode> {
    let starred = args.starred;
    let a = args.into_required().next_or_empty();
    if !p.cursor().peek().is_some_and(|t| t.is_cs("ket")) {
        let fence = DelimiterSpec::resolve(Delimiter::Angle, Delimiter::Vert, starred, None);
        return Ok(fence.wrap(a));
    }
    p.cursor().advance();
    let ket_starred = p.cursor().eat_char('*');
    let b = read_argument(p, true, "ket")?.ok_or_else(|| MacroError::missing("ket"))?;
    let fence = DelimiterSpec::pair(Delimiter::Angle, starred || ket_starred, None);
    Ok(fence.wrap_parts(vec![
        FencePart::Content(a),
        FencePart::Middle("|"),
        FencePart::Content(b),
    ]))
}

fn nabla(p: &dyn SubParser<'_>) -> ExpressionNode {
    if p.options().arrow_del {
        ExpressionNode::accent(Atom::ident("∇").into(), "→")
    } else {
        Atom::ident("∇").with_variant(Variant::Bold).into()
    }
}

fn vector_operator(
    p: &mut dyn SubParser<'_>,
    op: VectorOperator,
    args: &ConsumedArgs,
    name: &str,
) -> MacroResult<ExpressionNode> {
    let del = nabla(p);
    let mut children = match op {
        VectorOperator::Gradient => vec![del],
        VectorOperator::Divergence => vec![del, Atom::operator("·", Role::Bin).into()],
        VectorOperator::Curl => vec![del, Atom::operator("×", Role::Bin).into()],
        VectorOperator::Laplacian => {
            vec![ExpressionNode::superscript(del, Atom::number("2").into())]
        }
    };

    if let Some(fence) = fenced(p, &['(', '['], args.starred, args.size) {
        children.push(fence);
    } else if let Some(arg) = read_argument(p, false, name)? {
        children.extend(arg.into_children());
    }
    Ok(ExpressionNode::row(children))
}
