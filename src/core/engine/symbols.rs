//! Control-word symbols understood by the host parser.

use phf::phf_map;
use physics_tex_ir::Role;

/// Glyph and spacing class for plain symbol control words.
pub const SYMBOLS: phf::Map<&'static str, (&'static str, Role)> = phf_map! {
    // Greek, lowercase
    "alpha" => ("α", Role::Ord),
    "beta" => ("β", Role::Ord),
    "gamma" => ("γ", Role::Ord),
    "delta" => ("δ", Role::Ord),
    "epsilon" => ("ε", Role::Ord),
    "varepsilon" => ("ε", Role::Ord),
    "zeta" => ("ζ", Role::Ord),
    "eta" => ("η", Role::Ord),
    "theta" => ("θ", Role::Ord),
    "iota" => ("ι", Role::Ord),
    "kappa" => ("κ", Role::Ord),
    "lambda" => ("λ", Role::Ord),
    "mu" => ("μ", Role::Ord),
    "nu" => ("ν", Role::Ord),
    "xi" => ("ξ", Role::Ord),
    "pi" => ("π", Role::Ord),
    "rho" => ("ρ", Role::Ord),
    "sigma" => ("σ", Role::Ord),
    "tau" => ("τ", Role::Ord),
    "phi" => ("φ", Role::Ord),
    "varphi" => ("φ", Role::Ord),
    "chi" => ("χ", Role::Ord),
    "psi" => ("ψ", Role::Ord),
    "omega" => ("ω", Role::Ord),
    // Greek, uppercase
    "Gamma" => ("Γ", Role::Ord),
    "Delta" => ("Δ", Role::Ord),
    "Theta" => ("Θ", Role::Ord),
    "Lambda" => ("Λ", Role::Ord),
    "Xi" => ("Ξ", Role::Ord),
    "Pi" => ("Π", Role::Ord),
    "Sigma" => ("Σ", Role::Ord),
    "Phi" => ("Φ", Role::Ord),
    "Psi" => ("Ψ", Role::Ord),
    "Omega" => ("Ω", Role::Ord),
    // Letter-like
    "hbar" => ("ħ", Role::Ord),
    "partial" => ("∂", Role::Ord),
    "nabla" => ("∇", Role::Ord),
    "infty" => ("∞", Role::Ord),
    "ell" => ("ℓ", Role::Ord),
    "dagger" => ("†", Role::Ord),
    "prime" => ("′", Role::Ord),
    // Large operators
    "int" => ("∫", Role::Op),
    "oint" => ("∮", Role::Op),
    "sum" => ("∑", Role::Op),
    "prod" => ("∏", Role::Op),
    // Binary operators
    "pm" => ("±", Role::Bin),
    "mp" => ("∓", Role::Bin),
    "times" => ("×", Role::Bin),
    "cdot" => ("·", Role::Bin),
    "otimes" => ("⊗", Role::Bin),
    "oplus" => ("⊕", Role::Bin),
    "circ" => ("∘", Role::Bin),
    // Relations
    "leq" => ("≤", Role::Rel),
    "le" => ("≤", Role::Rel),
    "geq" => ("≥", Role::Rel),
    "ge" => ("≥", Role::Rel),
    "neq" => ("≠", Role::Rel),
    "ne" => ("≠", Role::Rel),
    "approx" => ("≈", Role::Rel),
    "equiv" => ("≡", Role::Rel),
    "sim" => ("∼", Role::Rel),
    "propto" => ("∝", Role::Rel),
    "to" => ("→", Role::Rel),
    "rightarrow" => ("→", Role::Rel),
    "in" => ("∈", Role::Rel),
    // Delimiters outside \left/\right
    "langle" => ("⟨", Role::Open),
    "rangle" => ("⟩", Role::Close),
    "lgroup" => ("⟮", Role::Open),
    "rgroup" => ("⟯", Role::Close),
    "vert" => ("|", Role::Ord),
    "Vert" => ("‖", Role::Ord),
    "|" => ("‖", Role::Ord),
    "{" => ("{", Role::Open),
    "}" => ("}", Role::Close),
    // Punctuation
    "ldots" => ("…", Role::Inner),
    "cdots" => ("⋯", Role::Inner),
};

/// Delimiter glyphs accepted after `\left`, `\right`, `\middle` and the
/// fixed `\big`-family sizes.
pub fn delimiter_glyph(token_text: &str) -> Option<&'static str> {
    match token_text {
        "(" => Some("("),
        ")" => Some(")"),
        "[" => Some("["),
        "]" => Some("]"),
        "|" => Some("|"),
        "." => Some(""),
        "/" => Some("/"),
        "\\{" => Some("{"),
        "\\}" => Some("}"),
        "\\|" | "\\Vert" => Some("‖"),
        "\\vert" => Some("|"),
        "\\langle" => Some("⟨"),
        "\\rangle" => Some("⟩"),
        "\\lgroup" => Some("⟮"),
        "\\rgroup" => Some("⟯"),
        _ => None,
    }
}

pub fn lookup(name: &str) -> Option<(&'static str, Role)> {
    SYMBOLS.get(name).copied()
}
