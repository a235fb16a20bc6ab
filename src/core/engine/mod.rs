//! TeX math token engine.
//!
//! Tokenizes math-mode input, exposes a forward-only cursor over the token
//! stream and provides the host parser the physics package re-enters for
//! every argument.

pub mod cursor;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod token;

pub use cursor::{Extent, TokenCursor};
pub use lexer::{detokenize, tokenize, Lexer};
pub use parser::{MathParser, SubParser};
pub use token::{TexToken, TokenList};
