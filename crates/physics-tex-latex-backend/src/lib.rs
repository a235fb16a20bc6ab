//! Expression tree to plain LaTeX backend.
//!
//! The output uses only standard LaTeX/amsmath commands: fences become
//! `\left`/`\middle`/`\right` or `\bigl`-style pairs, grids become `matrix`
//! environments.

use physics_tex_ir::{Atom, AtomKind, Cell, ExpressionNode, Grid, Role, SizeLevel, Variant};

#[derive(Debug, Clone)]
pub struct LatexRenderOptions {
    /// Wrap error markers in `\textcolor{...}`.
    pub error_color: Option<String>,
    /// Matrix environment used for grids that are not marked small.
    pub matrix_env: String,
}

impl Default for LatexRenderOptions {
    fn default() -> Self {
        Self {
            error_color: Some("red".to_string()),
            matrix_env: "matrix".to_string(),
        }
    }
}

pub fn render(node: &ExpressionNode, options: &LatexRenderOptions) -> String {
    let mut out = String::new();
    render_node(node, options, &mut out);
    out.trim().to_string()
}

fn render_node(node: &ExpressionNode, options: &LatexRenderOptions, out: &mut String) {
    match node {
        ExpressionNode::Atom(atom) => push_piece(out, &render_atom(atom)),
        ExpressionNode::Row { children, .. } => {
            for child in children {
                render_node(child, options, out);
            }
        }
        ExpressionNode::Fraction {
            numerator,
            denominator,
        } => {
            let piece = format!(
                "\\frac{{{}}}{{{}}}",
                render(numerator, options),
                render(denominator, options)
            );
            push_piece(out, &piece);
        }
        ExpressionNode::Superscript { base, exponent } => {
            let piece = format!(
                "{}^{{{}}}",
                render_script_base(base, options),
                render(exponent, options)
            );
            push_piece(out, &piece);
        }
        ExpressionNode::Subscript { base, subscript } => {
            let piece = format!(
                "{}_{{{}}}",
                render_script_base(base, options),
                render(subscript, options)
            );
            push_piece(out, &piece);
        }
        ExpressionNode::Accent { base, accent } => {
            let piece = format!("{}{{{}}}", accent_command(accent), render(base, options));
            push_piece(out, &piece);
        }
        ExpressionNode::Smash { content } => {
            push_piece(out, &format!("\\smash{{{}}}", render(content, options)));
        }
        ExpressionNode::Grid(grid) => push_piece(out, &render_grid(grid, options)),
        ExpressionNode::Error { message, .. } => {
            let text = format!("\\text{{{}}}", escape_text(message));
            let piece = match &options.error_color {
                Some(color) => format!("\\textcolor{{{}}}{{{}}}", color, text),
                None => text,
            };
            push_piece(out, &piece);
        }
    }
}

/// Append with a separating space when two control words would fuse.
fn push_piece(out: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !out.is_empty() && !out.ends_with(' ') {
        out.push(' ');
    }
    out.push_str(piece);
}

fn render_script_base(base: &ExpressionNode, options: &LatexRenderOptions) -> String {
    let text = render(base, options);
    match base {
        ExpressionNode::Atom(_) => text,
        _ if text.is_empty() => "{}".to_string(),
        _ => format!("{{{}}}", text),
    }
}

fn render_grid(grid: &Grid, options: &LatexRenderOptions) -> String {
    let env = if grid.meta.small {
        "smallmatrix"
    } else {
        options.matrix_env.as_str()
    };
    let rows: Vec<String> = grid
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => String::new(),
                    Cell::Node(node) => render(node, options),
                })
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect();
    format!("\\begin{{{env}}} {} \\end{{{env}}}", rows.join(" \\\\ "))
}

fn render_atom(atom: &Atom) -> String {
    match atom.kind {
        AtomKind::Fence => render_fence(atom),
        AtomKind::Phantom => format!("\\vphantom{{{}}}", glyph_command(&atom.text)),
        AtomKind::Text => format!("\\text{{{}}}", escape_text(&atom.text)),
        AtomKind::Identifier if atom.role == Role::Op && atom.text.chars().count() > 1 => {
            apply_variant(&format!("\\operatorname{{{}}}", atom.text), atom.variant, true)
        }
        _ => apply_variant(&glyph_command(&atom.text), atom.variant, false),
    }
}

fn render_fence(atom: &Atom) -> String {
    let glyph = fence_glyph(&atom.text);
    match (atom.role, atom.size) {
        (Role::Open, SizeLevel::Auto) => format!("\\left{}", glyph),
        (Role::Close, SizeLevel::Auto) => format!("\\right{}", glyph),
        (Role::Middle, SizeLevel::Auto) => format!("\\middle{}", glyph),
        (role, size) if size.is_fixed() => {
            let keyword = size.keyword().unwrap_or("big");
            let suffix = match role {
                Role::Open => "l",
                Role::Close => "r",
                Role::Middle => "m",
                _ => "",
            };
            format!("\\{}{}{}", keyword, suffix, glyph)
        }
        _ => {
            // Plain fences: the invisible fence has no glyph at all.
            if atom.text.is_empty() {
                String::new()
            } else {
                glyph
            }
        }
    }
}

/// Glyph as used after `\left`/`\right`; an empty glyph is the null fence.
fn fence_glyph(text: &str) -> String {
    match text {
        "" => ".".to_string(),
        other => glyph_command(other),
    }
}

fn apply_variant(body: &str, variant: Option<Variant>, operator: bool) -> String {
    match variant {
        None | Some(Variant::Italic) => body.to_string(),
        Some(Variant::Upright) if operator => body.to_string(),
        Some(Variant::Upright) => format!("\\mathrm{{{}}}", body),
        Some(Variant::Bold) => format!("\\mathbf{{{}}}", body),
        Some(Variant::BoldItalic) => format!("\\boldsymbol{{{}}}", body),
        Some(Variant::Calligraphic) => format!("\\mathcal{{{}}}", body),
    }
}

fn accent_command(accent: &str) -> &'static str {
    match accent {
        "^" | "\u{302}" => "\\hat",
        "~" => "\\tilde",
        "\u{307}" => "\\dot",
        _ => "\\vec",
    }
}

/// Map a unicode glyph back to its LaTeX command.
fn glyph_command(text: &str) -> String {
    let cmd = match text {
        "⟨" => "\\langle",
        "⟩" => "\\rangle",
        "‖" => "\\Vert",
        "⟮" => "\\lgroup",
        "⟯" => "\\rgroup",
        "∂" => "\\partial",
        "∇" => "\\nabla",
        "δ" => "\\delta",
        "·" => "\\cdot",
        "×" => "\\times",
        "∫" => "\\int",
        "∑" => "\\sum",
        "∏" => "\\prod",
        "∞" => "\\infty",
        "ħ" => "\\hbar",
        "±" => "\\pm",
        "∓" => "\\mp",
        "≤" => "\\leq",
        "≥" => "\\geq",
        "≠" => "\\neq",
        "≈" => "\\approx",
        "≡" => "\\equiv",
        "→" => "\\to",
        "†" => "\\dagger",
        "′" => "'",
        "−" => "-",
        "α" => "\\alpha",
        "β" => "\\beta",
        "γ" => "\\gamma",
        "ε" => "\\epsilon",
        "θ" => "\\theta",
        "λ" => "\\lambda",
        "μ" => "\\mu",
        "ν" => "\\nu",
        "π" => "\\pi",
        "ρ" => "\\rho",
        "σ" => "\\sigma",
        "τ" => "\\tau",
        "φ" => "\\phi",
        "χ" => "\\chi",
        "ψ" => "\\psi",
        "ω" => "\\omega",
        "Γ" => "\\Gamma",
        "Δ" => "\\Delta",
        "Θ" => "\\Theta",
        "Λ" => "\\Lambda",
        "Π" => "\\Pi",
        "Σ" => "\\Sigma",
        "Φ" => "\\Phi",
        "Ψ" => "\\Psi",
        "Ω" => "\\Omega",
        "ζ" => "\\zeta",
        "η" => "\\eta",
        "ι" => "\\iota",
        "κ" => "\\kappa",
        "ξ" => "\\xi",
        "Ξ" => "\\Xi",
        "ℓ" => "\\ell",
        "∮" => "\\oint",
        "⊗" => "\\otimes",
        "⊕" => "\\oplus",
        "∘" => "\\circ",
        "∼" => "\\sim",
        "∝" => "\\propto",
        "∈" => "\\in",
        "…" => "\\ldots",
        "⋯" => "\\cdots",
        "{" => "\\{",
        "}" => "\\}",
        other => return other.to_string(),
    };
    cmd.to_string()
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '_' | '^' | '&' | '%' | '$' | '#' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size_fence() {
        let atom = Atom::fence("(", Role::Open, SizeLevel::Big2, false);
        assert_eq!(render_atom(&atom), "\\Bigl(");
        let atom = Atom::fence("⟩", Role::Close, SizeLevel::Big4, false);
        assert_eq!(render_atom(&atom), "\\Biggr\\rangle");
    }

    #[test]
    fn test_null_fence() {
        let atom = Atom::fence("", Role::Open, SizeLevel::Auto, true);
        assert_eq!(render_atom(&atom), "\\left.");
        let plain = Atom::fence("", Role::Ord, SizeLevel::Natural, false);
        assert_eq!(render_atom(&plain), "");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a_b & c"), "a\\_b \\& c");
    }
}
