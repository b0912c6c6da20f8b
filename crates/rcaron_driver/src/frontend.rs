use std::fs;
use std::sync::Arc;

use rcaron_core::{FileScope, Frontend};
use rcaron_lexer::{CollectingErrorHandler, Lexer, ThrowingErrorHandler};
use rcaron_parser::{ParseOptions, Parser};
use rcaron_syntax::{ErrorCode, RCaronError, Result, SourceFile, Token, render_errors};
use tracing::debug;

/// Lexer output with every error it reported.
#[derive(Clone, Debug)]
pub struct LexedFile {
    pub path: String,
    pub source: SourceFile,
    pub tokens: Vec<Token>,
    pub errors: Vec<RCaronError>,
}

/// Best-effort parse of a file, kept even when it contains errors so
/// tooling can show its structure.
pub struct ParsedFile {
    pub path: String,
    pub file_scope: Arc<FileScope>,
    pub tokens: Vec<Token>,
    pub errors: Vec<RCaronError>,
    pub warnings: Vec<RCaronError>,
    pub allows_execution: bool,
}

impl ParsedFile {
    /// Errors then warnings, rendered with line and column.
    pub fn render_diagnostics(&self) -> String {
        let mut all = self.errors.clone();
        all.extend(self.warnings.iter().cloned());
        render_errors(&self.file_scope.source, &all)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Driver {
    pub options: ParseOptions,
}

impl Frontend for Driver {
    fn parse_file(&self, name: &str, text: &str) -> Result<Arc<FileScope>> {
        self.parse_strict(name, text)
    }
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn lex_text(&self, path: &str, input: &str) -> Result<LexedFile> {
        let mut handler = CollectingErrorHandler::new();
        let tokens = Lexer::new(input).lex(&mut handler)?;
        Ok(LexedFile {
            path: path.to_string(),
            source: SourceFile::new(path, input),
            tokens,
            errors: handler.errors().to_vec(),
        })
    }

    /// Parse collecting every error instead of stopping at the first.
    pub fn parse_text(&self, path: &str, input: &str) -> Result<ParsedFile> {
        let mut handler = CollectingErrorHandler::new();
        let output = Parser::new(&mut handler, self.options).parse(path, input)?;
        let errors = handler.errors().to_vec();
        debug!(path, errors = errors.len(), warnings = output.warnings.len(), "parsed text");
        Ok(ParsedFile {
            path: path.to_string(),
            file_scope: output.file_scope,
            tokens: output.tokens,
            errors,
            warnings: output.warnings,
            allows_execution: output.allows_execution,
        })
    }

    pub fn parse_file(&self, path: &str) -> Result<ParsedFile> {
        let input = read(path)?;
        self.parse_text(path, &input)
    }

    /// Parse failing on the first error; the result is safe to execute.
    pub fn parse_strict(&self, path: &str, input: &str) -> Result<Arc<FileScope>> {
        let mut handler = ThrowingErrorHandler;
        let output = Parser::new(&mut handler, self.options).parse(path, input)?;
        Ok(output.file_scope)
    }

    pub fn parse_strict_file(&self, path: &str) -> Result<Arc<FileScope>> {
        let input = read(path)?;
        self.parse_strict(path, &input)
    }
}

fn read(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        RCaronError::new(
            ErrorCode::ImportNotFound,
            format!("Failed to read file {path}: {e}"),
        )
    })
}
