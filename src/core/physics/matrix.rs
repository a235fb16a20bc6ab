//! Matrix block assembly.
//!
//! A matrix body is split into cells at top-level `&` and `\\`. Every cell
//! is parsed on its own; a cell that is itself a bare grid (a generator or
//! `\mqty{...}`) becomes a block, anything else a 1x1 scalar. Blocks are then
//! stamped into one grid using per-row heights and per-column widths.

use physics_tex_ir::{Atom, Block, Cell, ExpressionNode, Grid, GridMeta, Role};

use super::args::{braced_span, ConsumedArgs};
use super::delimiters::{size_keyword, Delimiter, DelimiterSpec, SizeKeyword};
use super::table::PHYSICS_MACROS;
use super::dispatch::AutoSpan;
use crate::core::engine::parser::unwrap_single;
use crate::core::engine::{SubParser, TexToken};
use crate::utils::error::{MacroError, MacroResult};

/// Token ranges `[start, end)` of each cell, row by row.
///
/// `&` and `\\` inside a group, a `\left..\right` pair or an auto fence
/// opened by a physics macro (`\qty(b & c)`) stay inside the cell.
fn split_cells(tokens: &[TexToken], start: usize, end: usize) -> Vec<Vec<(usize, usize)>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell_start = start;
    let mut depth = 0usize;
    let mut left_depth = 0usize;
    // (opener, closer, nested openers of the same kind) per open auto fence
    let mut fences: Vec<(char, char, usize)> = Vec::new();
    let mut armed = false;

    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        let after_macro = std::mem::take(&mut armed);
        let top_level = depth == 0 && left_depth == 0 && fences.is_empty();
        match token {
            TexToken::BeginGroup => depth += 1,
            TexToken::EndGroup => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            TexToken::ControlSeq(name) if name == "left" => left_depth += 1,
            TexToken::ControlSeq(name) if name == "right" => {
                left_depth = left_depth.saturating_sub(1)
            }
            TexToken::ControlSeq(name) if PHYSICS_MACROS.contains_key(name.as_str()) => {
                armed = true
            }
            TexToken::ControlSeq(name)
                if after_macro && matches!(size_keyword(name), Ok(SizeKeyword::Size(_))) =>
            {
                armed = true
            }
            TexToken::Char('*') if after_macro => armed = true,
            t if after_macro && t.is_trivia() => armed = true,
            TexToken::Char(c) if after_macro && matches!(c, '(' | '[' | '|') => {
                if let Some(close) = Delimiter::closing_char(*c) {
                    fences.push((*c, close, 0));
                }
            }
            TexToken::Char(c) if !fences.is_empty() => {
                if let Some((open, close, nested)) = fences.last_mut() {
                    if *c == *close {
                        if *nested == 0 {
                            fences.pop();
                        } else {
                            *nested -= 1;
                        }
                    } else if *c == *open {
                        *nested += 1;
                    }
                }
            }
            TexToken::AlignTab if top_level => {
                row.push((cell_start, i));
                cell_start = i + 1;
            }
            t if top_level && t.is_row_break() => {
                row.push((cell_start, i));
                rows.push(std::mem::take(&mut row));
                cell_start = i + 1;
            }
            _ => {}
        }
    }
    row.push((cell_start, end));

    // `a \\ b \\` has no third row.
    let trailing_blank = row.len() == 1 && tokens[cell_start..end].iter().all(TexToken::is_trivia);
    if !(trailing_blank && !rows.is_empty()) {
        rows.push(row);
    }
    rows
}

/// Turn a parsed cell into the grid it contributes.
fn cell_block(node: ExpressionNode) -> Grid {
    if node.is_empty_row() {
        return Grid::new(1, 1);
    }
    match node.into_grid() {
        Ok(grid) => grid,
        Err(node) => Grid::scalar(unwrap_single(node)),
    }
}

/// Stamp a (possibly ragged) grid of blocks into a single grid.
///
/// Row band `i` is as tall as its tallest block and column band `j` as wide
/// as its widest; block `(i, j)` lands at the sums of the bands before it.
pub fn stamp(mut blocks: Vec<Vec<Grid>>) -> Grid {
    let width = blocks.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut blocks {
        row.resize_with(width, || Grid::new(1, 1));
    }

    let heights: Vec<usize> = blocks
        .iter()
        .map(|row| row.iter().map(Grid::row_count).max().unwrap_or(0))
        .collect();
    let widths: Vec<usize> = (0..width)
        .map(|j| blocks.iter().map(|row| row[j].col_count()).max().unwrap_or(0))
        .collect();

    let row_offsets = prefix_sums(&heights);
    let col_offsets = prefix_sums(&widths);
    let placed = blocks
        .into_iter()
        .enumerate()
        .flat_map(|(i, row)| {
            let row_offsets = &row_offsets;
            let col_offsets = &col_offsets;
            row.into_iter()
                .enumerate()
                .map(move |(j, grid)| Block::new(grid, row_offsets[i], col_offsets[j]))
        })
        .collect();

    Grid::assemble(heights.iter().sum(), widths.iter().sum(), placed)
}

fn prefix_sums(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |acc, &size| {
            let offset = *acc;
            *acc += size;
            Some(offset)
        })
        .collect()
}

/// Offsets of diagonal blocks: `(Σ r_i, Σ c_i)` over the blocks before `k`.
pub fn diagonal_offsets(sizes: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let rows: Vec<usize> = sizes.iter().map(|&(r, _)| r).collect();
    let cols: Vec<usize> = sizes.iter().map(|&(_, c)| c).collect();
    prefix_sums(&rows).into_iter().zip(prefix_sums(&cols)).collect()
}

/// Offsets of anti-diagonal blocks: block `k` ends where block `k - 1`
/// starts, counting columns from the right edge.
pub fn anti_diagonal_offsets(sizes: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let total_cols: usize = sizes.iter().map(|&(_, c)| c).sum();
    let mut used = 0;
    diagonal_offsets(sizes)
        .into_iter()
        .zip(sizes)
        .map(|((row, _), &(_, cols))| {
            used += cols;
            (row, total_cols - used)
        })
        .collect()
}

/// Parse the grid body between token indices `start` and `end`.
fn read_grid(p: &mut dyn SubParser<'_>, start: usize, end: usize) -> Grid {
    let spans = split_cells(p.cursor().tokens(), start, end);
    let mut blocks = Vec::with_capacity(spans.len());
    for row in spans {
        let mut cells = Vec::with_capacity(row.len());
        for (cell_start, cell_end) in row {
            p.cursor().jump_to(cell_start);
            cells.push(cell_block(p.parse_until(cell_end)));
        }
        blocks.push(cells);
    }
    p.cursor().jump_to(end);
    stamp(blocks)
}

/// `\mqty`, `\smqty` and their fenced shorthands.
pub fn quantity(
    p: &mut dyn SubParser<'_>,
    args: &ConsumedArgs,
    small: bool,
    fence: Option<Delimiter>,
    name: &str,
) -> MacroResult<ExpressionNode> {
    let meta = GridMeta { small };

    if let Some(delim) = fence {
        let (open, close) = braced_span(p, name)?.ok_or_else(|| MacroError::missing(name))?;
        let grid = read_grid(p, open + 1, close).with_meta(meta);
        p.cursor().jump_to(close + 1);
        return Ok(DelimiterSpec::pair(delim, false, None).wrap(ExpressionNode::Grid(grid)));
    }

    if let Some((open, close)) = braced_span(p, name)? {
        let grid = read_grid(p, open + 1, close).with_meta(meta);
        p.cursor().jump_to(close + 1);
        return Ok(ExpressionNode::Grid(grid));
    }

    let span = AutoSpan::find(p, &['(', '[', '|']).ok_or_else(|| MacroError::missing(name))?;
    let grid = read_grid(p, span.open + 1, span.end).with_meta(meta);
    if span.closed {
        p.cursor().jump_to(span.end + 1);
    }
    let spec = match span.delim {
        Delimiter::Paren if args.starred => AutoSpan {
            delim: Delimiter::Group,
            ..span
        }
        .spec(false, None),
        _ => span.spec(false, None),
    };
    Ok(spec.wrap(ExpressionNode::Grid(grid)))
}

/// A dimension slot: digits only, zero treated as one.
fn dimension(text: &str, name: &str) -> MacroResult<usize> {
    let invalid = || MacroError::invalid_number(format!("dimension of \\{}", name), text);
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: usize = text.parse().map_err(|_| invalid())?;
    Ok(value.max(1))
}

fn raw_slot<'a>(args: &'a ConsumedArgs, index: usize, name: &str) -> MacroResult<&'a str> {
    args.raw
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| MacroError::missing(name))
}

fn number(text: &str) -> Cell {
    Cell::Node(Atom::number(text).into())
}

fn filled(rows: usize, cols: usize, mut cell: impl FnMut(usize, usize) -> Cell) -> Grid {
    Grid::from_rows(
        (0..rows)
            .map(|i| (0..cols).map(|j| cell(i, j)).collect())
            .collect(),
    )
}

/// `\imat{n}`
pub fn identity(args: &ConsumedArgs, name: &str) -> MacroResult<ExpressionNode> {
    let n = dimension(raw_slot(args, 0, name)?, name)?;
    if n == 1 {
        return Ok(Atom::number("1").into());
    }
    Ok(ExpressionNode::Grid(filled(n, n, |i, j| {
        number(if i == j { "1" } else { "0" })
    })))
}

/// `\zmat{n}{m}`
pub fn zero(args: &ConsumedArgs, name: &str) -> MacroResult<ExpressionNode> {
    let rows = dimension(raw_slot(args, 0, name)?, name)?;
    let cols = dimension(raw_slot(args, 1, name)?, name)?;
    Ok(ExpressionNode::Grid(filled(rows, cols, |_, _| number("0"))))
}

fn negated(atom: Atom) -> Cell {
    Cell::Node(ExpressionNode::row(vec![
        Atom::operator("-", Role::Bin).into(),
        atom.into(),
    ]))
}

/// Pauli matrix for an index; unknown indices give an empty grid.
pub fn pauli_grid(index: &str) -> Grid {
    let i = || Cell::Node(Atom::ident("i").into());
    match index {
        "0" => Grid::from_rows(vec![vec![number("1"), number("0")], vec![number("0"), number("1")]]),
        "1" | "x" => {
            Grid::from_rows(vec![vec![number("0"), number("1")], vec![number("1"), number("0")]])
        }
        "2" | "y" => Grid::from_rows(vec![
            vec![number("0"), negated(Atom::ident("i"))],
            vec![i(), number("0")],
        ]),
        "3" | "z" => Grid::from_rows(vec![
            vec![number("1"), number("0")],
            vec![number("0"), negated(Atom::number("1"))],
        ]),
        _ => Grid::new(0, 0),
    }
}

/// `\pmat{i}`
pub fn pauli(args: &ConsumedArgs, name: &str) -> MacroResult<ExpressionNode> {
    Ok(ExpressionNode::Grid(pauli_grid(raw_slot(args, 0, name)?)))
}

/// Token ranges of the comma-separated entries in `[start, end)`.
fn split_commas(tokens: &[TexToken], start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut entries = Vec::new();
    let mut entry_start = start;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        match token {
            TexToken::BeginGroup => depth += 1,
            TexToken::EndGroup => depth = depth.saturating_sub(1),
            TexToken::Char(',') if depth == 0 => {
                entries.push((entry_start, i));
                entry_start = i + 1;
            }
            _ => {}
        }
    }
    entries.push((entry_start, end));
    entries
}

/// `\dmat[filler]{a, b, ...}` and `\admat[filler]{...}`.
pub fn diagonal(
    p: &mut dyn SubParser<'_>,
    args: &ConsumedArgs,
    anti: bool,
    name: &str,
) -> MacroResult<ExpressionNode> {
    let (open, close) = braced_span(p, name)?.ok_or_else(|| MacroError::missing(name))?;
    let entries = split_commas(p.cursor().tokens(), open + 1, close);

    let mut blocks = Vec::with_capacity(entries.len());
    for (start, end) in entries {
        p.cursor().jump_to(start);
        blocks.push(cell_block(p.parse_until(end)));
    }
    p.cursor().jump_to(close + 1);

    let sizes: Vec<(usize, usize)> = blocks.iter().map(Grid::dimensions).collect();
    let offsets = if anti {
        anti_diagonal_offsets(&sizes)
    } else {
        diagonal_offsets(&sizes)
    };
    let total_rows = sizes.iter().map(|&(r, _)| r).sum();
    let total_cols = sizes.iter().map(|&(_, c)| c).sum();
    let placed = blocks
        .into_iter()
        .zip(offsets)
        .map(|(grid, (row, col))| Block::new(grid, row, col))
        .collect();
    let mut grid = Grid::assemble(total_rows, total_cols, placed);

    if let Some(filler) = args.expression() {
        let filler = unwrap_single(filler.clone());
        for cell in grid.rows.iter_mut().flatten() {
            if cell.is_empty() {
                *cell = Cell::Node(filler.clone());
            }
        }
    }
    Ok(ExpressionNode::Grid(grid))
}

/// `\xmat{a}{n}{m}`; the star adds index subscripts.
pub fn xmatrix(args: ConsumedArgs, name: &str) -> MacroResult<ExpressionNode> {
    let rows = dimension(raw_slot(&args, 0, name)?, name)?;
    let cols = dimension(raw_slot(&args, 1, name)?, name)?;
    let starred = args.starred;
    let base = unwrap_single(
        args.required
            .into_iter()
            .next()
            .unwrap_or_else(ExpressionNode::empty_row),
    );

    Ok(ExpressionNode::Grid(filled(rows, cols, |i, j| {
        if !starred {
            return Cell::Node(base.clone());
        }
        let index = if rows == 1 {
            (j + 1).to_string()
        } else if cols == 1 {
            (i + 1).to_string()
        } else {
            format!("{}{}", i + 1, j + 1)
        };
        Cell::Node(ExpressionNode::subscript(base.clone(), Atom::number(index).into()))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{tokenize, MathParser};
    use crate::core::physics::PhysicsOptions;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> ExpressionNode {
        let tokens = tokenize(input);
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.parse()
    }

    fn grid_of(input: &str) -> Grid {
        let node = parse(input);
        node.as_grid().cloned().expect("expected a bare grid")
    }

    #[test]
    fn test_split_cells_drops_trailing_row() {
        let tokens = tokenize("a & b \\\\ c & d \\\\");
        let spans = split_cells(tokens.as_slice(), 0, tokens.len());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].len(), 2);
    }

    #[test]
    fn test_split_cells_keeps_fenced_tabs() {
        let tokens = tokenize("a & \\qty(b & (c) \\\\ d) & \\left( e & f \\right) & {g & h}");
        let spans = split_cells(tokens.as_slice(), 0, tokens.len());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len(), 4);
    }

    #[test]
    fn test_fenced_cell_stays_whole() {
        let grid = grid_of("\\mqty{a & \\qty\\big(b & c)}");
        assert_eq!(grid.dimensions(), (1, 2));
        let cell = grid.cell(0, 1).and_then(Cell::as_node).map(|node| node.atoms().len());
        assert_eq!(cell, Some(4));
    }

    #[test]
    fn test_bare_grid() {
        let grid = grid_of("\\mqty{a & b \\\\ c & d}");
        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(grid.cell(1, 0), Some(&Cell::Node(Atom::ident("c").into())));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let grid = grid_of("\\mqty{a & b \\\\ c}");
        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(grid.cell(1, 1), Some(&Cell::Empty));
    }

    #[test]
    fn test_fenced_forms() {
        let node = parse("\\mqty(a & b)");
        let atoms = node.atoms();
        assert_eq!(atoms.first().map(|a| a.text.as_str()), Some("("));
        assert_eq!(atoms.last().map(|a| a.text.as_str()), Some(")"));

        let node = parse("\\mqty*(a)");
        assert_eq!(node.atoms()[0].text, "⟮");

        let node = parse("\\vmqty{a}");
        assert_eq!(node.atoms()[0].text, "|");

        let node = parse("\\smqty{a}");
        assert!(node.as_grid().is_some_and(|g| g.meta.small));
    }

    #[test]
    fn test_shorthand_requires_braces() {
        let tokens = tokenize("\\pmqty a");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.parse();
        assert_eq!(parser.diagnostics()[0].kind, "missing argument");
    }

    #[test]
    fn test_identity_and_zero() {
        let grid = grid_of("\\imat{3}");
        assert_eq!(grid.dimensions(), (3, 3));
        assert_eq!(grid.cell(1, 1), Some(&number("1")));
        assert_eq!(grid.cell(0, 2), Some(&number("0")));

        let node = parse("\\imat{1}");
        assert_eq!(node.atoms()[0].text, "1");
        assert!(node.as_grid().is_none());

        assert_eq!(grid_of("\\zmat{2}{3}").dimensions(), (2, 3));
    }

    #[test]
    fn test_invalid_dimension() {
        let tokens = tokenize("\\zmat{2}{x}");
        let options = PhysicsOptions::default();
        let mut parser = MathParser::new(tokens.as_slice(), &options);
        parser.parse();
        assert_eq!(parser.diagnostics()[0].kind, "invalid number");
    }

    #[test]
    fn test_pauli() {
        for key in ["0", "1", "2", "3", "x", "y", "z"] {
            assert_eq!(pauli_grid(key).dimensions(), (2, 2), "index {}", key);
        }
        assert_eq!(pauli_grid("4").dimensions(), (0, 0));
        assert_eq!(pauli_grid("1"), pauli_grid("x"));
    }

    #[test]
    fn test_diagonal_offsets() {
        let sizes = [(1, 1), (2, 2), (1, 3)];
        assert_eq!(diagonal_offsets(&sizes), vec![(0, 0), (1, 1), (3, 3)]);
        assert_eq!(anti_diagonal_offsets(&sizes), vec![(0, 5), (1, 3), (3, 0)]);
        assert!(diagonal_offsets(&[]).is_empty());
    }

    #[test]
    fn test_dmat_with_filler() {
        let grid = grid_of("\\dmat[0]{a, b}");
        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(grid.cell(0, 1), Some(&number("0")));
        assert_eq!(grid.cell(1, 1), Some(&Cell::Node(Atom::ident("b").into())));
    }

    #[test]
    fn test_admat_places_from_the_right() {
        let grid = grid_of("\\admat{a, b}");
        assert_eq!(grid.cell(0, 1), Some(&Cell::Node(Atom::ident("a").into())));
        assert_eq!(grid.cell(1, 0), Some(&Cell::Node(Atom::ident("b").into())));
        assert_eq!(grid.cell(0, 0), Some(&Cell::Empty));
    }

    #[test]
    fn test_nested_blocks() {
        let grid = grid_of("\\mqty{\\imat{2} & b \\\\ c & d}");
        assert_eq!(grid.dimensions(), (3, 3));
        assert_eq!(grid.cell(0, 2), Some(&Cell::Node(Atom::ident("b").into())));
        assert_eq!(grid.cell(2, 0), Some(&Cell::Node(Atom::ident("c").into())));
        assert_eq!(grid.cell(2, 2), Some(&Cell::Node(Atom::ident("d").into())));
        assert_eq!(grid.cell(1, 2), Some(&Cell::Empty));
    }

    #[test]
    fn test_xmat_indices() {
        let grid = grid_of("\\xmat*{a}{2}{2}");
        assert_eq!(
            grid.cell(1, 0),
            Some(&Cell::Node(ExpressionNode::subscript(
                Atom::ident("a").into(),
                Atom::number("21").into()
            )))
        );

        let row = grid_of("\\xmat*{a}{1}{3}");
        assert_eq!(
            row.cell(0, 2),
            Some(&Cell::Node(ExpressionNode::subscript(
                Atom::ident("a").into(),
                Atom::number("3").into()
            )))
        );

        let plain = grid_of("\\xmat{x}{2}{1}");
        assert_eq!(plain.cell(1, 0), Some(&Cell::Node(Atom::ident("x").into())));
    }
}
