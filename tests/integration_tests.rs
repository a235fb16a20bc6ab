//! Integration tests for physics macro expansion

use physics_tex::core::physics::delimiters::Delimiter;
use physics_tex::core::physics::matrix::{anti_diagonal_offsets, diagonal_offsets};
use physics_tex::core::physics::table::{ArgFallback, Handler, OptionalArgKind, OutputShape};
use physics_tex::ir::{Atom, Cell, Em, ExpressionNode, Grid, Role, SizeLevel};
use physics_tex::{
    expand, expand_to_latex, expand_with_options, expand_with_table, MacroSpec, MacroTable,
    PhysicsOptions, SizeTable,
};
use pretty_assertions::assert_eq;

/// The first top-level node produced for `input`.
fn first(input: &str) -> ExpressionNode {
    let output = expand(input);
    assert!(
        output.diagnostics.is_empty(),
        "unexpected diagnostics for {}: {:?}",
        input,
        output.diagnostics
    );
    output.tree.children()[0].clone()
}

fn grid(input: &str) -> Grid {
    first(input)
        .as_grid()
        .cloned()
        .unwrap_or_else(|| panic!("{} did not produce a grid", input))
}

fn top_level_count(input: &str) -> usize {
    expand(input).tree.children().len()
}

// ============================================================================
// Delimiters
// ============================================================================

mod delimiters {
    use super::*;
    use pretty_assertions::assert_eq;

    const FENCES: &[&str] = &[
        "\\pqty{a}",
        "\\bqty{a}",
        "\\vqty{a}",
        "\\Bqty{a}",
        "\\abs{a}",
        "\\norm{a}",
        "\\qty(a)",
        "\\comm{a}{b}",
        "\\acomm{a}{b}",
        "\\pb{a}{b}",
    ];

    fn starred(input: &str) -> String {
        let name_end = input[1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .map(|i| i + 1)
            .unwrap_or(input.len());
        format!("{}*{}", &input[..name_end], &input[name_end..])
    }

    #[test]
    fn test_star_and_plain_shapes_differ() {
        for input in FENCES {
            let plain = first(input);
            let children = plain.children();
            assert_eq!(plain.role(), Role::Inner, "{}", input);
            assert_eq!(children[0].role(), Role::Open, "{}", input);
            assert_eq!(children[2].role(), Role::Close, "{}", input);
            assert!(children[0].as_atom().is_some_and(|a| a.stretchy));

            let star_input = starred(input);
            let star = first(&star_input);
            let children = star.children();
            assert_eq!(star.role(), Role::Ord, "{}", star_input);
            assert_eq!(children[0].role(), Role::Ord, "{}", star_input);
            assert_eq!(children[2].role(), Role::Ord, "{}", star_input);
            assert!(children[0].as_atom().is_some_and(|a| !a.stretchy));
        }
    }

    #[test]
    fn test_empty_quantity_keeps_both_fences() {
        for input in ["\\qty", "\\qty{}", "\\qty()", "\\pqty{}"] {
            let node = first(input);
            let children = node.children();
            assert_eq!(children.len(), 3, "{}", input);
            assert!(children[1].is_empty_row(), "{}", input);
            assert_eq!(children[0].role(), Role::Open);
            assert_eq!(children[2].role(), Role::Close);
        }
    }

    #[test]
    fn test_explicit_sizes_increase() {
        assert!(SizeTable::default().is_increasing());
        let sizes = SizeTable::default();
        let mut previous = 0.0;
        for (keyword, level) in [
            ("big", SizeLevel::Big1),
            ("Big", SizeLevel::Big2),
            ("bigg", SizeLevel::Big3),
            ("Bigg", SizeLevel::Big4),
        ] {
            let node = first(&format!("\\qty\\{}(x)", keyword));
            let open = node.children()[0].as_atom().cloned().unwrap();
            let close = node.children()[2].as_atom().cloned().unwrap();
            assert_eq!(open.size, level);
            assert_eq!(open.role, Role::Open);
            assert_eq!(close.role, Role::Close);
            assert!(!open.stretchy);

            let em = sizes.em(level).unwrap();
            assert_eq!(open.em, Some(Em(em)));
            assert_eq!(close.em, Some(Em(em)));
            assert!(em > previous, "{} is not larger than the previous size", keyword);
            previous = em;
        }
    }

    #[test]
    fn test_loaded_sizes_reach_the_tree() {
        let options = PhysicsOptions {
            sizes: SizeTable {
                big: 1.0,
                big2: 2.0,
                bigg: 3.0,
                bigg2: 4.0,
            },
            ..PhysicsOptions::default()
        };
        let output = expand_with_options("\\qty\\bigg[x] + \\qty(y)", &options);
        let ems: Vec<Option<Em>> = output.tree.atoms().iter().map(|atom| atom.em).collect();
        assert_eq!(ems.iter().filter(|em| **em == Some(Em(3.0))).count(), 2);
        assert_eq!(ems.iter().filter(|em| em.is_some()).count(), 2);
    }

    #[test]
    fn test_bad_size_keyword_is_reported() {
        let output = expand("\\qty\\biggg(x) + y");
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, "unrecognized delimiter");
        assert!(output.has_errors());
    }

    #[test]
    fn test_unclosed_auto_fence() {
        let node = first("\\qty[a + b");
        let close = node.children()[2].as_atom().cloned().unwrap();
        assert_eq!(close.text, "");
        assert_eq!(close.role, Role::Close);
    }
}

// ============================================================================
// Dispatch
// ============================================================================

mod dispatch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commutator_spillover() {
        assert_eq!(top_level_count("\\comm{A}{B}"), 1);
        assert_eq!(top_level_count("\\comm{A}{B}{C}"), 2);
    }

    #[test]
    fn test_matrix_element_spillover() {
        assert_eq!(top_level_count("\\mel{n}{H}{m}"), 1);
        assert_eq!(top_level_count("\\mel{n}{H}{m}{x}"), 2);
    }

    #[test]
    fn test_aliases_expand_identically() {
        let pairs = [
            ("\\qty(x)", "\\quantity(x)"),
            ("\\abs{x}", "\\absolutevalue{x}"),
            ("\\ev{A}", "\\expval{A}"),
            ("\\dv{f}{x}", "\\derivative{f}{x}"),
            ("\\mqty{a}", "\\matrixquantity{a}"),
        ];
        for (short, long) in pairs {
            let a = expand(short).tree;
            let b = expand(long).tree;
            assert_eq!(a.atoms(), b.atoms(), "{} vs {}", short, long);
        }
    }

    #[test]
    fn test_source_labels() {
        let node = first("\\braket{a}{b}");
        assert_eq!(node.label(), Some("\\braket{a}{b}"));
    }

    #[test]
    fn test_failed_macro_becomes_marker() {
        let output = expand("a + \\pqty");
        assert!(output.has_errors());
        assert_eq!(output.diagnostics[0].location.as_deref(), Some("\\pqty"));
        assert!(matches!(
            output.tree.children().last(),
            Some(ExpressionNode::Error { source, .. }) if source == "\\pqty"
        ));
    }

    #[test]
    fn test_custom_table_entry() {
        let mut table = MacroTable::physics();
        table.register(
            "ceilqty",
            MacroSpec::new("ceilqty", OutputShape::Fenced, Handler::Fence(Delimiter::Bracket))
                .star()
                .optional(OptionalArgKind::Size)
                .args(1, ArgFallback::BracedGroup),
        );
        let output = expand_with_table("\\ceilqty{x}", &PhysicsOptions::default(), &table);
        let texts: Vec<&str> = output.tree.atoms().iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["[", "x", "]"]);
    }

    #[test]
    fn test_json_output() {
        let output = expand("\\ket{\\psi}");
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["tree"]["type"], "row");
        assert!(value["diagnostics"].as_array().is_some_and(|d| d.is_empty()));
    }
}

// ============================================================================
// Derivatives
// ============================================================================

mod derivatives {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Remove every `^1`.
    fn strip_unit_exponents(node: &ExpressionNode) -> ExpressionNode {
        match node {
            ExpressionNode::Superscript { base, exponent }
                if exponent.as_atom().is_some_and(|a| a.text == "1") =>
            {
                strip_unit_exponents(base)
            }
            ExpressionNode::Superscript { base, exponent } => ExpressionNode::superscript(
                strip_unit_exponents(base),
                strip_unit_exponents(exponent),
            ),
            ExpressionNode::Row { children, role, .. } => ExpressionNode::row_with_role(
                children.iter().map(strip_unit_exponents).collect(),
                *role,
            ),
            ExpressionNode::Fraction {
                numerator,
                denominator,
            } => ExpressionNode::fraction(
                strip_unit_exponents(numerator),
                strip_unit_exponents(denominator),
            ),
            other => other.clone(),
        }
    }

    #[test]
    fn test_default_order_is_one() {
        for (implicit, explicit) in [
            ("\\dv{f}{x}", "\\dv[1]{f}{x}"),
            ("\\dv{x}", "\\dv[1]{x}"),
            ("\\pdv{f}{x}", "\\pdv[1]{f}{x}"),
            ("\\fdv{F}{g}", "\\fdv[1]{F}{g}"),
        ] {
            assert_eq!(
                strip_unit_exponents(&first(implicit)),
                strip_unit_exponents(&first(explicit)),
                "{} vs {}",
                implicit,
                explicit
            );
        }
    }

    #[test]
    fn test_derivative_latex() {
        assert_eq!(
            expand_to_latex("\\pdv[2]{f}{x}"),
            "\\frac{\\partial^{2} f}{\\partial x^{2}}"
        );
    }

    #[test]
    fn test_mixed_partial_order_matches_variable_count() {
        let latex = expand_to_latex("\\pdv[2]{f}{x}{y}");
        assert_eq!(latex, expand_to_latex("\\pdv{f}{x}{y}"));
        assert!(latex.starts_with("\\frac{\\partial^{2} f}"));
        assert!(!latex.contains("x^{2}"));
    }

    #[test]
    fn test_italic_diff() {
        let options = PhysicsOptions {
            italic_diff: true,
            ..PhysicsOptions::default()
        };
        let output = expand_with_options("\\dd{x}", &options);
        assert_eq!(
            output.tree.atoms()[0].variant,
            Some(physics_tex::ir::Variant::Italic)
        );
    }

    #[test]
    fn test_star_shape() {
        let fraction = first("\\pdv{f}{x}");
        assert!(matches!(
            fraction.children()[0],
            ExpressionNode::Fraction { .. }
        ));
        let flat = first("\\pdv*{f}{x}");
        assert_eq!(flat.role(), Role::Inner);
        assert_eq!(flat.children().len(), 5);
    }
}

// ============================================================================
// Matrices
// ============================================================================

mod matrices {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(text: &str) -> Cell {
        Cell::Node(Atom::number(text).into())
    }

    #[test]
    fn test_pauli_completeness() {
        for key in ["0", "1", "2", "3", "x", "y", "z"] {
            assert_eq!(grid(&format!("\\pmat{{{}}}", key)).dimensions(), (2, 2), "{}", key);
        }
        for key in ["4", "w", "10"] {
            assert_eq!(grid(&format!("\\pmat{{{}}}", key)).dimensions(), (0, 0), "{}", key);
        }
    }

    #[test]
    fn test_diagonal_offsets_are_prefix_sums() {
        let cases: Vec<Vec<(usize, usize)>> = vec![
            vec![],
            vec![(2, 3)],
            vec![(1, 1), (2, 3)],
            vec![(3, 1), (1, 2), (2, 2)],
            vec![(1, 1), (2, 2), (1, 3), (4, 1), (2, 2)],
        ];
        for sizes in cases {
            let total_cols: usize = sizes.iter().map(|&(_, c)| c).sum();
            let diagonal = diagonal_offsets(&sizes);
            let anti = anti_diagonal_offsets(&sizes);
            assert_eq!(diagonal.len(), sizes.len());
            for k in 0..sizes.len() {
                let rows_before: usize = sizes[..k].iter().map(|&(r, _)| r).sum();
                let cols_before: usize = sizes[..k].iter().map(|&(_, c)| c).sum();
                let cols_through: usize = sizes[..=k].iter().map(|&(_, c)| c).sum();
                assert_eq!(diagonal[k], (rows_before, cols_before));
                assert_eq!(anti[k], (rows_before, total_cols - cols_through));
            }
        }
    }

    #[test]
    fn test_diagonal_mixed_blocks() {
        let g = grid("\\dmat{\\imat{2}, a, \\zmat{1}{3}}");
        assert_eq!(g.dimensions(), (4, 6));
        assert_eq!(g.cell(1, 1), Some(&num("1")));
        assert_eq!(g.cell(2, 2), Some(&Cell::Node(Atom::ident("a").into())));
        assert_eq!(g.cell(3, 5), Some(&num("0")));
        assert_eq!(g.cell(0, 5), Some(&Cell::Empty));
    }

    #[test]
    fn test_anti_diagonal_mixed_blocks() {
        let g = grid("\\admat{\\imat{2}, a}");
        assert_eq!(g.dimensions(), (3, 3));
        assert_eq!(g.cell(0, 1), Some(&num("1")));
        assert_eq!(g.cell(2, 0), Some(&Cell::Node(Atom::ident("a").into())));
        assert_eq!(g.cell(2, 2), Some(&Cell::Empty));
    }

    #[test]
    fn test_block_bands() {
        let g = grid("\\mqty{\\zmat{2}{1} & \\zmat{1}{3} \\\\ x & \\imat{2}}");
        // Bands: heights 2, 2; widths 1, 3.
        assert_eq!(g.dimensions(), (4, 4));
        assert_eq!(g.cell(1, 0), Some(&num("0")));
        assert_eq!(g.cell(0, 3), Some(&num("0")));
        assert_eq!(g.cell(1, 1), Some(&Cell::Empty));
        assert_eq!(g.cell(2, 0), Some(&Cell::Node(Atom::ident("x").into())));
        assert_eq!(g.cell(3, 2), Some(&num("1")));
        assert_eq!(g.cell(2, 3), Some(&Cell::Empty));
    }

    #[test]
    fn test_nested_mqty() {
        let g = grid("\\mqty{\\mqty{a & b} & c}");
        assert_eq!(g.dimensions(), (1, 3));
        assert_eq!(g.cell(0, 2), Some(&Cell::Node(Atom::ident("c").into())));
    }

    #[test]
    fn test_matrix_latex() {
        assert_eq!(
            expand_to_latex("\\pmqty{a & b \\\\ c & d}"),
            "\\left( \\begin{matrix} a & b \\\\ c & d \\end{matrix} \\right)"
        );
    }
}
