//! Bracket grouping.
//!
//! First pass over the lexer output: drops trivia, remembers whether each
//! token was preceded by whitespace or a line break, and nests `( )`, `[ ]`
//! and `{ }` runs so every opener owns exactly the items up to its closer.
use rcaron_lexer::ErrorHandler;
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span, Token, TokenKind};

#[derive(Clone, Debug)]
pub(crate) enum Raw {
    Tok(Token),
    Paren(Vec<RawItem>),
    Bracket(Vec<RawItem>),
    Block(Vec<RawItem>),
}

#[derive(Clone, Debug)]
pub(crate) struct RawItem {
    pub raw: Raw,
    pub span: Span,
    /// Whitespace or a comment sits directly before this item.
    pub space_before: bool,
    /// That whitespace contains a line break.
    pub newline_before: bool,
}

impl RawItem {
    pub fn token(&self) -> Option<&Token> {
        match &self.raw {
            Raw::Tok(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.token().is_some_and(|t| t.kind == kind)
    }

    pub fn keyword(&self) -> Option<&str> {
        self.token()
            .filter(|t| t.kind == TokenKind::Keyword)
            .and_then(|t| t.name())
    }

    pub fn is_block(&self) -> bool {
        matches!(self.raw, Raw::Block(_))
    }
}

fn closer_for(opener: TokenKind) -> TokenKind {
    match opener {
        TokenKind::GroupStart => TokenKind::GroupEnd,
        TokenKind::IndexerStart => TokenKind::IndexerEnd,
        _ => TokenKind::BlockEnd,
    }
}

fn delimiter_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::GroupStart => "(",
        TokenKind::GroupEnd => ")",
        TokenKind::IndexerStart => "[",
        TokenKind::IndexerEnd => "]",
        TokenKind::BlockStart => "{",
        _ => "}",
    }
}

pub(crate) struct Grouper<'t, 'h> {
    tokens: &'t [Token],
    i: usize,
    handler: &'h mut dyn ErrorHandler,
    pub halted: bool,
}

impl<'t, 'h> Grouper<'t, 'h> {
    pub fn new(tokens: &'t [Token], handler: &'h mut dyn ErrorHandler) -> Self {
        Self {
            tokens,
            i: 0,
            handler,
            halted: false,
        }
    }

    pub fn group(mut self) -> Result<(Vec<RawItem>, bool)> {
        let (items, _) = self.group_until(None)?;
        Ok((items, self.halted))
    }

    fn report(&mut self, message: String, span: Span) -> Result<()> {
        let err = RCaronError::at(ErrorCode::UnmatchedDelimiter, message, span);
        if !self.handler.handle(err)? {
            self.halted = true;
        }
        Ok(())
    }

    /// Items up to the matching `closer`, and the closer's end offset.
    fn group_until(&mut self, closer: Option<TokenKind>) -> Result<(Vec<RawItem>, Option<u32>)> {
        let mut items = Vec::new();
        let mut space_before = false;
        let mut newline_before = false;
        while let Some(tok) = self.tokens.get(self.i) {
            self.i += 1;
            match tok.kind {
                TokenKind::Whitespace | TokenKind::Comment => {
                    space_before = true;
                    newline_before |= tok.has_newline();
                    continue;
                }
                TokenKind::GroupStart | TokenKind::IndexerStart | TokenKind::BlockStart => {
                    let start = tok.span.start.0;
                    let (inner, end) = self.group_until(Some(closer_for(tok.kind)))?;
                    let end = match end {
                        Some(end) => end,
                        None => {
                            self.report(
                                format!("Unclosed '{}'", delimiter_text(tok.kind)),
                                tok.span,
                            )?;
                            inner.last().map_or(tok.span.end.0, |it| it.span.end.0)
                        }
                    };
                    let raw = match tok.kind {
                        TokenKind::GroupStart => Raw::Paren(inner),
                        TokenKind::IndexerStart => Raw::Bracket(inner),
                        _ => Raw::Block(inner),
                    };
                    items.push(RawItem {
                        raw,
                        span: Span::new(start, end),
                        space_before,
                        newline_before,
                    });
                }
                TokenKind::GroupEnd | TokenKind::IndexerEnd | TokenKind::BlockEnd => {
                    if Some(tok.kind) == closer {
                        return Ok((items, Some(tok.span.end.0)));
                    }
                    self.report(
                        format!("Unmatched '{}'", delimiter_text(tok.kind)),
                        tok.span,
                    )?;
                }
                _ => items.push(RawItem {
                    raw: Raw::Tok(tok.clone()),
                    span: tok.span,
                    space_before,
                    newline_before,
                }),
            }
            space_before = false;
            newline_before = false;
        }
        Ok((items, None))
    }
}
