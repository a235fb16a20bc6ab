//! # physics-tex
//!
//! Expansion of the LaTeX `physics` package notation (`\qty`, `\dv`,
//! `\braket`, `\mqty`, ...) into a role-tagged math expression tree.
//!
//! ## Features
//!
//! - Automatic and explicit delimiter sizing (`\qty(...)`, `\qty\Big[...]`)
//! - Derivatives, differentials and variations
//! - Dirac bra-ket notation
//! - Matrix macros with nested block stamping (`\mqty{\imat{2} & 0 \\ 0 & 1}`)
//! - Recoverable errors: a failed macro becomes an inline error marker
//!
//! ## Example
//!
//! ```
//! use physics_tex::expand_to_latex;
//!
//! let latex = expand_to_latex(r"\dv{f}{x}");
//! assert_eq!(latex, r"\frac{\mathrm{d} f}{\mathrm{d} x}");
//! ```

pub mod core;
pub mod utils;

pub use physics_tex_ir as ir;

pub use crate::core::engine::{detokenize, tokenize, MathParser, SubParser, TexToken, TokenCursor};
pub use crate::core::physics::{
    MacroSpec, MacroTable, PhysicsOptions, SizeTable, DEFAULT_TABLE, PHYSICS_MACROS,
};
pub use crate::utils::error::{Diagnostic, DiagnosticSeverity, MacroError, MacroResult, OptionsError};

use physics_tex_ir::ExpressionNode;
use physics_tex_latex_backend::{render, LatexRenderOptions};
use serde::Serialize;

/// Result of expanding one math expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionOutput {
    pub tree: ExpressionNode,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExpansionOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Expand with default options and the full physics table.
pub fn expand(input: &str) -> ExpansionOutput {
    expand_with_options(input, &PhysicsOptions::default())
}

pub fn expand_with_options(input: &str, options: &PhysicsOptions) -> ExpansionOutput {
    expand_with_table(input, options, &DEFAULT_TABLE)
}

/// Expand against a custom macro table.
pub fn expand_with_table(
    input: &str,
    options: &PhysicsOptions,
    table: &MacroTable,
) -> ExpansionOutput {
    let tokens = tokenize(input);
    let mut parser = MathParser::with_table(tokens.as_slice(), options, table);
    let mut tree = parser.parse();
    options.sizes.annotate(&mut tree);
    ExpansionOutput {
        tree,
        diagnostics: parser.into_diagnostics(),
    }
}

/// Expand and print the result back as plain LaTeX math.
pub fn expand_to_latex(input: &str) -> String {
    render(&expand(input).tree, &LatexRenderOptions::default())
}
