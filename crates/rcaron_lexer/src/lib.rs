//! rcaron_lexer: lexer crate.
//!
//! Turns source text into a flat list of span-tagged tokens and routes every
//! lexing error through a pluggable [`ErrorHandler`].
//! Entry points: `Lexer::read_next`, `Lexer::lex` and `tokenize`.
mod escape;
mod handler;
mod lexer;
mod number;

pub use handler::{CollectingErrorHandler, ErrorHandler, SilentErrorHandler, ThrowingErrorHandler};
pub use lexer::{Lexer, tokenize};
