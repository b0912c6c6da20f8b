//! rcaron_syntax: shared vocabulary of the RCaron front end.
//!
//! Spans, source text with line/column lookup, raw lexer tokens, numeric literal
//! values, the closed error taxonomy and error rendering.
mod error;
mod number;
mod render;
mod source;
mod span;
mod token;
mod util;

pub use error::{ErrorCode, RCaronError, Result};
pub use number::{Number, NumberKind};
pub use render::{render_error, render_errors};
pub use source::{SourceFile, SourceText};
pub use span::{ByteIndex, Span};
pub use token::{Operation, Token, TokenKind, TokenValue};
pub use util::{
    find_best_match, is_keyword_continue, is_keyword_start, is_variable_char, levenshtein_distance,
};
