//! Text to [`rcaron_core::FileScope`]: lexing, parsing and diagnostics in one place.
mod frontend;

pub use frontend::{Driver, LexedFile, ParsedFile};
