//! Utility modules
//!
//! Error types, result types and diagnostics shared by the engine and the
//! CLI.

pub mod error;

pub use error::{Diagnostic, DiagnosticSeverity, MacroError, MacroResult, OptionsError};
