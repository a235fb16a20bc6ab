//! The physics macro package.
//!
//! # Architecture
//!
//! ```text
//! MathParser ──(control word)──► MacroTable lookup
//!                                     │
//!                                     ▼
//!                             args::consume        star, [optional], {required}
//!                                     │
//!                                     ▼
//!                             dispatch::expand     Handler match
//!                              │      │      │
//!                              ▼      ▼      ▼
//!                      delimiters  derivative  matrix
//!                                     │
//!                                     ▼
//!                              ExpressionNode (labelled with source)
//! ```
//!
//! Every handler that needs a sub-expression calls back into the host via
//! [`SubParser::parse_until`](crate::core::engine::SubParser::parse_until).

pub mod args;
pub mod delimiters;
pub mod derivative;
pub mod dispatch;
pub mod matrix;
pub mod options;
pub mod table;

pub use args::{ConsumedArgs, OptionalValue};
pub use delimiters::{Delimiter, DelimiterSpec};
pub use options::{PhysicsOptions, SizeTable};
pub use table::{Handler, MacroSpec, MacroTable, DEFAULT_TABLE, PHYSICS_MACROS};
