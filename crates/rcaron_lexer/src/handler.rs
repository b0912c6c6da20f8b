//! Error-handler capability shared by the lexer and the parser.
use rcaron_syntax::{RCaronError, Result};

/// Receives every lexing and parsing error.
pub trait ErrorHandler {
    /// Record one error.
    ///
    /// `Ok(true)` lets the caller keep producing a partial result, `Ok(false)`
    /// asks it to stop early and `Err` aborts immediately.
    fn handle(&mut self, error: RCaronError) -> Result<bool>;

    /// Whether the result may still be executed after the errors seen so far.
    fn allows_execution(&self) -> bool;
}

/// Fails on the first error.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThrowingErrorHandler;

impl ErrorHandler for ThrowingErrorHandler {
    fn handle(&mut self, error: RCaronError) -> Result<bool> {
        Err(error)
    }

    fn allows_execution(&self) -> bool {
        true
    }
}

/// Keeps going and remembers every error.
#[derive(Debug, Default)]
pub struct CollectingErrorHandler {
    errors: Vec<RCaronError>,
}

impl CollectingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[RCaronError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RCaronError> {
        self.errors
    }
}

impl ErrorHandler for CollectingErrorHandler {
    fn handle(&mut self, error: RCaronError) -> Result<bool> {
        self.errors.push(error);
        Ok(true)
    }

    fn allows_execution(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Drops errors but forbids execution once one was seen.
///
/// Used by tooling that wants best-effort structure from broken input.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentErrorHandler {
    had_error: bool,
}

impl SilentErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorHandler for SilentErrorHandler {
    fn handle(&mut self, _error: RCaronError) -> Result<bool> {
        self.had_error = true;
        Ok(true)
    }

    fn allows_execution(&self) -> bool {
        !self.had_error
    }
}
