//! rcaron_parser: parser crate.
//!
//! Turns lexer output into a [`rcaron_core::FileScope`]: grouped tokens,
//! classified lines, and the function and class tables of the file.
//! Entry points: `parse` and `Parser::parse`.
mod constant;
mod decl;
mod expr;
mod group;
mod lines;
mod parser;

pub use parser::{ParseOptions, ParseOutput, Parser, parse};
