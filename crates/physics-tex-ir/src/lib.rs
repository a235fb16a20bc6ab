//! Role-tagged expression tree produced by the physics macro engine.
//!
//! Every node carries enough information (role, stretchiness, size level)
//! for a renderer to lay it out without knowing which macro produced it.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Spacing/fencing class of a node, in the TeX sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Ord,
    Op,
    Bin,
    Rel,
    Open,
    Close,
    Punct,
    Inner,
    /// Separator inside a fence (`\middle|`, the flat-fraction slash).
    Middle,
}

/// Delimiter size level.
///
/// `Big1`..`Big4` are the explicit `\big`, `\Big`, `\bigg`, `\Bigg` sizes;
/// their em values are configuration data owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeLevel {
    #[default]
    Natural,
    Big1,
    Big2,
    Big3,
    Big4,
    /// Stretch to the content; the renderer measures.
    Auto,
}

impl SizeLevel {
    /// TeX keyword for a fixed size.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            SizeLevel::Big1 => Some("big"),
            SizeLevel::Big2 => Some("Big"),
            SizeLevel::Big3 => Some("bigg"),
            SizeLevel::Big4 => Some("Bigg"),
            SizeLevel::Natural | SizeLevel::Auto => None,
        }
    }

    pub fn is_fixed(self) -> bool {
        self.keyword().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomKind {
    Identifier,
    Number,
    Operator,
    Text,
    Fence,
    /// Invisible atom that only contributes its height (`\vphantom`).
    Phantom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Upright,
    Italic,
    Bold,
    BoldItalic,
    Calligraphic,
}

/// A leaf symbol.
/// Glyph height in em, attached to fixed-size fences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Em(pub f32);

impl PartialEq for Em {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Em {}

impl Hash for Em {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom {
    pub text: String,
    pub kind: AtomKind,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub stretchy: bool,
    #[serde(default)]
    pub size: SizeLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub em: Option<Em>,
}

impl Atom {
    fn new(text: impl Into<String>, kind: AtomKind, role: Role) -> Self {
        Self {
            text: text.into(),
            kind,
            role,
            variant: None,
            stretchy: false,
            size: SizeLevel::Natural,
            em: None,
        }
    }

    pub fn ident(text: impl Into<String>) -> Self {
        Self::new(text, AtomKind::Identifier, Role::Ord)
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::new(text, AtomKind::Number, Role::Ord)
    }

    pub fn operator(text: impl Into<String>, role: Role) -> Self {
        Self::new(text, AtomKind::Operator, role)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, AtomKind::Text, Role::Ord)
    }

    pub fn phantom(text: impl Into<String>) -> Self {
        Self::new(text, AtomKind::Phantom, Role::Ord)
    }

    pub fn fence(glyph: impl Into<String>, role: Role, size: SizeLevel, stretchy: bool) -> Self {
        Self {
            stretchy,
            size,
            ..Self::new(glyph, AtomKind::Fence, role)
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// The output tree element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpressionNode {
    Atom(Atom),
    Row {
        children: Vec<ExpressionNode>,
        #[serde(default)]
        role: Role,
        /// Source text of the macro call that produced this row.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Fraction {
        numerator: Box<ExpressionNode>,
        denominator: Box<ExpressionNode>,
    },
    Superscript {
        base: Box<ExpressionNode>,
        exponent: Box<ExpressionNode>,
    },
    Subscript {
        base: Box<ExpressionNode>,
        subscript: Box<ExpressionNode>,
    },
    Accent {
        base: Box<ExpressionNode>,
        accent: String,
    },
    /// Content whose height and depth are ignored (`\smash`).
    Smash { content: Box<ExpressionNode> },
    Grid(Grid),
    /// Inline marker standing in for a macro that failed to expand.
    Error { message: String, source: String },
}

impl ExpressionNode {
    pub fn row(children: Vec<ExpressionNode>) -> Self {
        ExpressionNode::Row {
            children,
            role: Role::Ord,
            label: None,
        }
    }

    pub fn row_with_role(children: Vec<ExpressionNode>, role: Role) -> Self {
        ExpressionNode::Row {
            children,
            role,
            label: None,
        }
    }

    pub fn empty_row() -> Self {
        Self::row(Vec::new())
    }

    pub fn fraction(numerator: ExpressionNode, denominator: ExpressionNode) -> Self {
        ExpressionNode::Fraction {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    pub fn superscript(base: ExpressionNode, exponent: ExpressionNode) -> Self {
        ExpressionNode::Superscript {
            base: Box::new(base),
            exponent: Box::new(exponent),
        }
    }

    pub fn subscript(base: ExpressionNode, subscript: ExpressionNode) -> Self {
        ExpressionNode::Subscript {
            base: Box::new(base),
            subscript: Box::new(subscript),
        }
    }

    pub fn accent(base: ExpressionNode, accent: impl Into<String>) -> Self {
        ExpressionNode::Accent {
            base: Box::new(base),
            accent: accent.into(),
        }
    }

    pub fn error(message: impl Into<String>, source: impl Into<String>) -> Self {
        ExpressionNode::Error {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Record the source text of the macro call that produced this node.
    ///
    /// Consumes the finished node; rows get the label directly, anything else
    /// is wrapped in a single-child row so the child structure is untouched.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        match self {
            ExpressionNode::Row { children, role, .. } => ExpressionNode::Row {
                children,
                role,
                label: Some(source.into()),
            },
            other => ExpressionNode::Row {
                children: vec![other],
                role: Role::Ord,
                label: Some(source.into()),
            },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ExpressionNode::Atom(atom) => atom.role,
            ExpressionNode::Row { role, .. } => *role,
            _ => Role::Ord,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ExpressionNode::Row { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    /// Children of a row, or an empty slice for any other node.
    pub fn children(&self) -> &[ExpressionNode] {
        match self {
            ExpressionNode::Row { children, .. } => children,
            _ => &[],
        }
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            ExpressionNode::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    pub fn is_empty_row(&self) -> bool {
        matches!(self, ExpressionNode::Row { children, .. } if children.is_empty())
    }

    /// Flatten an unlabelled group into its children; anything else becomes
    /// a one-element list.
    pub fn into_children(self) -> Vec<ExpressionNode> {
        match self {
            ExpressionNode::Row {
                children,
                role: Role::Ord,
                label: None,
            } => children,
            other => vec![other],
        }
    }

    /// Find a bare grid, looking through single-child ordinary rows
    /// (macro labels, braces).
    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            ExpressionNode::Grid(grid) => Some(grid),
            ExpressionNode::Row {
                children,
                role: Role::Ord,
                ..
            } if children.len() == 1 => children[0].as_grid(),
            _ => None,
        }
    }

    /// Owned counterpart of [`ExpressionNode::as_grid`].
    pub fn into_grid(self) -> Result<Grid, ExpressionNode> {
        match self {
            ExpressionNode::Grid(grid) => Ok(grid),
            ExpressionNode::Row {
                mut children,
                role: Role::Ord,
                label,
            } if children.len() == 1 && children[0].as_grid().is_some() => {
                let only = children.remove(0);
                only.into_grid().map_err(|child| ExpressionNode::Row {
                    children: vec![child],
                    role: Role::Ord,
                    label,
                })
            }
            other => Err(other),
        }
    }

    /// Depth-first visit of every atom in the tree.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    /// Apply `f` to every atom, depth first.
    pub fn for_each_atom_mut(&mut self, f: &mut dyn FnMut(&mut Atom)) {
        match self {
            ExpressionNode::Atom(atom) => f(atom),
            ExpressionNode::Row { children, .. } => {
                for child in children {
                    child.for_each_atom_mut(f);
                }
            }
            ExpressionNode::Fraction {
                numerator,
                denominator,
            } => {
                numerator.for_each_atom_mut(f);
                denominator.for_each_atom_mut(f);
            }
            ExpressionNode::Superscript { base, exponent } => {
                base.for_each_atom_mut(f);
                exponent.for_each_atom_mut(f);
            }
            ExpressionNode::Subscript { base, subscript } => {
                base.for_each_atom_mut(f);
                subscript.for_each_atom_mut(f);
            }
            ExpressionNode::Accent { base, .. } => base.for_each_atom_mut(f),
            ExpressionNode::Smash { content } => content.for_each_atom_mut(f),
            ExpressionNode::Grid(grid) => {
                for cell in grid.rows.iter_mut().flatten() {
                    if let Cell::Node(node) = cell {
                        node.for_each_atom_mut(f);
                    }
                }
            }
            ExpressionNode::Error { .. } => {}
        }
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a Atom>) {
        match self {
            ExpressionNode::Atom(atom) => out.push(atom),
            ExpressionNode::Row { children, .. } => {
                for child in children {
                    child.collect_atoms(out);
                }
            }
            ExpressionNode::Fraction {
                numerator,
                denominator,
            } => {
                numerator.collect_atoms(out);
                denominator.collect_atoms(out);
            }
            ExpressionNode::Superscript { base, exponent } => {
                base.collect_atoms(out);
                exponent.collect_atoms(out);
            }
            ExpressionNode::Subscript { base, subscript } => {
                base.collect_atoms(out);
                subscript.collect_atoms(out);
            }
            ExpressionNode::Accent { base, .. } => base.collect_atoms(out),
            ExpressionNode::Smash { content } => content.collect_atoms(out),
            ExpressionNode::Grid(grid) => {
                for cell in grid.rows.iter().flatten() {
                    if let Cell::Node(node) = cell {
                        node.collect_atoms(out);
                    }
                }
            }
            ExpressionNode::Error { .. } => {}
        }
    }
}

impl From<Atom> for ExpressionNode {
    fn from(atom: Atom) -> Self {
        ExpressionNode::Atom(atom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Node(ExpressionNode),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_node(&self) -> Option<&ExpressionNode> {
        match self {
            Cell::Node(node) => Some(node),
            Cell::Empty => None,
        }
    }
}

impl From<ExpressionNode> for Cell {
    fn from(node: ExpressionNode) -> Self {
        Cell::Node(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridMeta {
    /// Typeset as an inline `smallmatrix`.
    #[serde(default)]
    pub small: bool,
}

/// Rectangular array of cells. Rows always have equal length.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
    #[serde(default)]
    pub meta: GridMeta,
}

impl Grid {
    /// A grid of `rows` x `cols` empty placeholders.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| (0..cols).map(|_| Cell::Empty).collect())
                .collect(),
            meta: GridMeta::default(),
        }
    }

    /// Build from possibly ragged rows, padding short rows with placeholders.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize_with(width, || Cell::Empty);
        }
        Self {
            rows,
            meta: GridMeta::default(),
        }
    }

    /// A 1x1 grid holding a single node.
    pub fn scalar(node: ExpressionNode) -> Self {
        Self::from_rows(vec![vec![Cell::Node(node)]])
    }

    pub fn with_meta(mut self, meta: GridMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.row_count(), self.col_count())
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Build a new `rows` x `cols` grid with every block stamped at its
    /// offset. Cells no block covers stay empty.
    ///
    /// Blocks must lie inside the extent and must not overlap.
    pub fn assemble(rows: usize, cols: usize, blocks: Vec<Block>) -> Self {
        let mut grid = Grid::new(rows, cols);
        for block in blocks {
            let (row_offset, col_offset) = (block.row_offset, block.col_offset);
            for (r, block_row) in block.grid.rows.into_iter().enumerate() {
                for (c, cell) in block_row.into_iter().enumerate() {
                    let target = &mut grid.rows[row_offset + r][col_offset + c];
                    debug_assert!(target.is_empty(), "overlapping blocks");
                    *target = cell;
                }
            }
        }
        grid
    }
}

/// A grid to be stamped into a larger grid at a target offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub grid: Grid,
    pub row_offset: usize,
    pub col_offset: usize,
}

impl Block {
    pub fn new(grid: Grid, row_offset: usize, col_offset: usize) -> Self {
        Self {
            grid,
            row_offset,
            col_offset,
        }
    }

    /// Bottom-right corner (exclusive) of the target rectangle.
    pub fn extent(&self) -> (usize, usize) {
        (
            self.row_offset + self.grid.row_count(),
            self.col_offset + self.grid.col_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: &str) -> Cell {
        Cell::Node(Atom::number(n).into())
    }

    #[test]
    fn from_rows_pads_ragged_rows() {
        let grid = Grid::from_rows(vec![vec![num("1")], vec![num("2"), num("3")]]);
        assert_eq!(grid.dimensions(), (2, 2));
        assert!(grid.cell(0, 1).unwrap().is_empty());
    }

    #[test]
    fn assemble_stamps_blocks_and_leaves_placeholders() {
        let a = Grid::scalar(Atom::ident("a").into());
        let b = Grid::from_rows(vec![vec![num("1"), num("2")], vec![num("3"), num("4")]]);
        let grid = Grid::assemble(3, 3, vec![Block::new(a, 0, 0), Block::new(b, 1, 1)]);

        assert_eq!(grid.dimensions(), (3, 3));
        assert_eq!(grid.cell(0, 0), Some(&Cell::Node(Atom::ident("a").into())));
        assert_eq!(grid.cell(2, 2), Some(&num("4")));
        assert!(grid.cell(0, 2).unwrap().is_empty());
        assert!(grid.cell(2, 0).unwrap().is_empty());
    }

    #[test]
    fn with_source_keeps_child_structure() {
        let row = ExpressionNode::row(vec![Atom::ident("x").into()]);
        let labelled = row.clone().with_source("\\qty(x)");
        assert_eq!(labelled.label(), Some("\\qty(x)"));
        assert_eq!(labelled.children(), row.children());

        let atom: ExpressionNode = Atom::number("1").into();
        let wrapped = atom.clone().with_source("\\imat{1}");
        assert_eq!(wrapped.children(), &[atom]);
    }

    #[test]
    fn for_each_atom_mut_reaches_grid_cells() {
        let grid = Grid::from_rows(vec![vec![num("1"), Cell::Empty], vec![Cell::Empty, num("2")]]);
        let mut node = ExpressionNode::row(vec![
            Atom::fence("(", Role::Open, SizeLevel::Big1, false).into(),
            ExpressionNode::Grid(grid),
        ]);
        let mut seen = 0;
        node.for_each_atom_mut(&mut |atom| {
            atom.em = Some(Em(1.0));
            seen += 1;
        });
        assert_eq!(seen, 3);
        assert!(node.atoms().iter().all(|atom| atom.em == Some(Em(1.0))));
    }

    #[test]
    fn as_grid_looks_through_labels() {
        let node = ExpressionNode::Grid(Grid::new(2, 2)).with_source("\\zmat{2}{2}");
        assert_eq!(node.as_grid().map(Grid::dimensions), Some((2, 2)));
        assert!(node.into_grid().is_ok());

        let fenced = ExpressionNode::row_with_role(vec![ExpressionNode::Grid(Grid::new(1, 1))], Role::Inner);
        assert!(fenced.as_grid().is_none());
    }
}
