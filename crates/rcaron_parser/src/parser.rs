use std::sync::Arc;

use indexmap::IndexMap;
use rcaron_core::{ClassDefinition, FileScope, Function, Line, LineKind};
use rcaron_lexer::{ErrorHandler, Lexer};
use rcaron_syntax::{ErrorCode, RCaronError, Result, SourceFile, Span, Token};
use tracing::debug;

use crate::expr::Invalid;
use crate::group::Grouper;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep whitespace and comment tokens in [`ParseOutput::tokens`].
    pub keep_whitespace_tokens: bool,
    /// Register `func` and `class` declarations in the file scope.
    pub collect_declarations: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            keep_whitespace_tokens: false,
            collect_declarations: true,
        }
    }
}

pub struct ParseOutput {
    pub file_scope: Arc<FileScope>,
    /// The error handler's verdict once the whole file was read.
    pub allows_execution: bool,
    /// Lexer output the lines were built from.
    pub tokens: Vec<Token>,
    /// Problems that were reported but never block execution.
    pub warnings: Vec<RCaronError>,
}

pub struct Parser<'h> {
    pub(crate) handler: &'h mut dyn ErrorHandler,
    pub(crate) options: ParseOptions,
    pub(crate) functions: IndexMap<String, Arc<Function>>,
    pub(crate) classes: Vec<Arc<ClassDefinition>>,
    pub(crate) warnings: Vec<RCaronError>,
    pub(crate) halted: bool,
}

impl<'h> Parser<'h> {
    pub fn new(handler: &'h mut dyn ErrorHandler, options: ParseOptions) -> Self {
        Self {
            handler,
            options,
            functions: IndexMap::new(),
            classes: Vec::new(),
            warnings: Vec::new(),
            halted: false,
        }
    }

    pub fn parse(mut self, name: &str, source: &str) -> Result<ParseOutput> {
        let tokens = Lexer::new(source).lex(&mut *self.handler)?;
        let (items, halted) = Grouper::new(&tokens, &mut *self.handler).group()?;
        self.halted = halted;
        let lines = self.parse_lines(&items)?;
        let allows_execution = self.handler.allows_execution();

        debug!(
            file = name,
            tokens = tokens.len(),
            lines = lines.len(),
            functions = self.functions.len(),
            classes = self.classes.len(),
            allows_execution,
            "parsed"
        );

        let tokens = if self.options.keep_whitespace_tokens {
            tokens
        } else {
            tokens.into_iter().filter(|t| !t.is_trivia()).collect()
        };
        let file_scope = FileScope::new(
            SourceFile::new(name, source),
            lines,
            self.functions,
            self.classes,
        );
        Ok(ParseOutput {
            file_scope: Arc::new(file_scope),
            allows_execution,
            tokens,
            warnings: self.warnings,
        })
    }

    pub(crate) fn report(&mut self, code: ErrorCode, message: String, span: Span) -> Result<()> {
        if !self.handler.handle(RCaronError::at(code, message, span))? {
            self.halted = true;
        }
        Ok(())
    }

    pub(crate) fn invalid_line(&mut self, invalid: Invalid) -> Result<Line> {
        self.report(ErrorCode::ParseInvalidLine, invalid.message, invalid.span)?;
        Ok(Line::new(invalid.span, LineKind::Invalid))
    }

    pub(crate) fn register_function(&mut self, function: Function) {
        if self.options.collect_declarations {
            self.functions
                .insert(function.name.to_ascii_lowercase(), Arc::new(function));
        }
    }

    pub(crate) fn register_class(&mut self, class: ClassDefinition) {
        if !self.options.collect_declarations {
            return;
        }
        let class = Arc::new(class);
        match self
            .classes
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(&class.name))
        {
            Some(i) => self.classes[i] = class,
            None => self.classes.push(class),
        }
    }
}

/// Parse `source` into a file scope.
///
/// Every problem goes through `handler`; whether it aborts, collects or
/// silences decides how much of a broken file comes back.
pub fn parse(
    name: &str,
    source: &str,
    options: ParseOptions,
    handler: &mut dyn ErrorHandler,
) -> Result<ParseOutput> {
    Parser::new(handler, options).parse(name, source)
}
