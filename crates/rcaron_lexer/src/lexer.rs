//! Lexer implementation.
//!
//! Pull-based: `read_next` scans one token per call. Every token keeps its
//! byte span, whitespace and comments included, so tooling can rebuild the
//! exact source from the token list.
//!
//! Context sensitivity is limited to two pieces of lookback: the kind of the
//! previous token and the kind of the previous significant token. They decide
//! whether `-` starts a negative literal or a named argument and whether `./`
//! starts a path.
use rcaron_syntax::{
    ErrorCode, Operation, RCaronError, Result, Span, Token, TokenKind, TokenValue,
    is_keyword_continue, is_keyword_start, is_variable_char,
};

use crate::ErrorHandler;
use crate::number::{NumberLiteral, evaluate, fallback};

/// RCaron lexer.
pub struct Lexer<'a> {
    pub(crate) input: &'a str,
    bytes: &'a [u8],
    pub(crate) i: usize,
    prev_kind: Option<TokenKind>,
    last_sig_kind: Option<TokenKind>,
    halted: bool,
}

/// Lex `input` to completion.
pub fn tokenize(input: &str, handler: &mut dyn ErrorHandler) -> Result<Vec<Token>> {
    Lexer::new(input).lex(handler)
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            i: 0,
            prev_kind: None,
            last_sig_kind: None,
            halted: false,
        }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.i
    }

    /// Run the lexer until the input is exhausted.
    pub fn lex(mut self, handler: &mut dyn ErrorHandler) -> Result<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.bytes.len().saturating_div(4).max(32));
        while let Some(tok) = self.read_next(handler)? {
            tokens.push(tok);
        }
        tracing::trace!(tokens = tokens.len(), bytes = self.bytes.len(), "lexed source");
        Ok(tokens)
    }

    /// Scan the next token, or `None` once the input is exhausted or the
    /// handler asked to stop.
    pub fn read_next(&mut self, handler: &mut dyn ErrorHandler) -> Result<Option<Token>> {
        loop {
            if self.halted || self.i >= self.bytes.len() {
                return Ok(None);
            }
            let start = self.i;
            if let Some(tok) = self.scan(start, handler)? {
                self.prev_kind = Some(tok.kind);
                if !tok.is_trivia() {
                    self.last_sig_kind = Some(tok.kind);
                }
                return Ok(Some(tok));
            }
        }
    }

    /// Scan one token starting at `start`; `None` when a bad character was skipped.
    fn scan(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Option<Token>> {
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };
        let tok = match c {
            c if c.is_whitespace() => self.lex_whitespace(start),
            '$' => return self.lex_variable(start, handler),
            '#' => return self.lex_hash(start, handler),
            '\'' | '"' => self.lex_string(start, c, handler)?,
            'c' if self.peek_str("c'") => self.lex_char(start, handler)?,
            '/' => self.lex_slash(start, handler)?,
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::LineEnding, start),
            ':' => self.single(TokenKind::Colon, start),
            '{' => self.single(TokenKind::BlockStart, start),
            '}' => self.single(TokenKind::BlockEnd, start),
            '(' => self.single(TokenKind::GroupStart, start),
            ')' => self.single(TokenKind::GroupEnd, start),
            '[' => self.single(TokenKind::IndexerStart, start),
            ']' => self.single(TokenKind::IndexerEnd, start),
            '.' => self.lex_dot(start),
            '~' if self.peek_str("~/") && self.at_argument_start() => self.lex_path(start),
            '0'..='9' => self.lex_number(start, handler)?,
            '-' => self.lex_minus(start, handler)?,
            '+' => {
                if self.peek_str("++") {
                    self.op(start, 2, Operation::Increment)
                } else if self.peek_str("+=") {
                    self.op(start, 2, Operation::AddAssign)
                } else {
                    self.op(start, 1, Operation::Add)
                }
            }
            '*' => {
                if self.peek_str("*=") {
                    self.op(start, 2, Operation::MultiplyAssign)
                } else {
                    self.op(start, 1, Operation::Multiply)
                }
            }
            '%' => self.op(start, 1, Operation::Modulo),
            '=' => {
                if self.peek_str("==") {
                    self.op(start, 2, Operation::Equal)
                } else {
                    self.op(start, 1, Operation::Assign)
                }
            }
            '!' => {
                if self.peek_str("!=") {
                    self.op(start, 2, Operation::NotEqual)
                } else {
                    self.op(start, 1, Operation::Not)
                }
            }
            '<' => {
                if self.peek_str("<=") {
                    self.op(start, 2, Operation::LessOrEqual)
                } else {
                    self.op(start, 1, Operation::Less)
                }
            }
            '>' => {
                if self.peek_str(">=") {
                    self.op(start, 2, Operation::GreaterOrEqual)
                } else {
                    self.op(start, 1, Operation::Greater)
                }
            }
            '&' if self.peek_str("&&") => self.op(start, 2, Operation::And),
            '|' => {
                if self.peek_str("||") {
                    self.op(start, 2, Operation::Or)
                } else {
                    self.op(start, 1, Operation::Pipeline)
                }
            }
            '@' => {
                self.i += 1;
                Token::new(
                    TokenKind::Keyword,
                    Span::from_range(start, self.i),
                    TokenValue::Name("@".to_string()),
                )
            }
            c if is_keyword_start(c) => self.lex_keyword(start),
            other => {
                self.i += other.len_utf8();
                self.report(
                    handler,
                    ErrorCode::UnexpectedCharacter,
                    format!("Unexpected character '{other}'"),
                    start,
                    self.i,
                )?;
                return Ok(None);
            }
        };
        Ok(Some(tok))
    }

    pub(crate) fn report(
        &mut self,
        handler: &mut dyn ErrorHandler,
        code: ErrorCode,
        message: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Result<()> {
        let err = RCaronError::at(code, message, Span::from_range(start, end));
        if !handler.handle(err)? {
            self.halted = true;
        }
        Ok(())
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.i += 1;
        Token::new(kind, Span::from_range(start, self.i), TokenValue::None)
    }

    fn op(&mut self, start: usize, len: usize, op: Operation) -> Token {
        self.i += len;
        Token::new(
            TokenKind::Operation,
            Span::from_range(start, self.i),
            TokenValue::Op(op),
        )
    }

    /// Start of a shell-style argument: nothing, whitespace, `(` or `,` before.
    fn at_argument_start(&self) -> bool {
        matches!(
            self.prev_kind,
            None | Some(TokenKind::Whitespace | TokenKind::GroupStart | TokenKind::Comma)
        )
    }

    fn negative_literal_allowed(&self) -> bool {
        match self.last_sig_kind {
            None => true,
            Some(TokenKind::Keyword) => self.prev_kind == Some(TokenKind::Whitespace),
            Some(
                TokenKind::Variable
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::Number
                | TokenKind::ExternThing
                | TokenKind::Path
                | TokenKind::GroupEnd
                | TokenKind::IndexerEnd,
            ) => false,
            Some(_) => true,
        }
    }

    fn lex_whitespace(&mut self, start: usize) -> Token {
        let mut has_newline = false;
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            has_newline |= ch == '\n';
            self.i += ch.len_utf8();
        }
        Token::new(
            TokenKind::Whitespace,
            Span::from_range(start, self.i),
            TokenValue::Space(has_newline),
        )
    }

    fn lex_variable(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Option<Token>> {
        self.i += 1;
        let name_start = self.i;
        self.eat_while(is_variable_char);
        if self.i == name_start {
            self.report(
                handler,
                ErrorCode::UnexpectedCharacter,
                "Expected a variable name after '$'",
                start,
                self.i,
            )?;
            return Ok(None);
        }
        Ok(Some(Token::new(
            TokenKind::Variable,
            Span::from_range(start, self.i),
            TokenValue::Name(self.input[name_start..self.i].to_string()),
        )))
    }

    fn lex_hash(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Option<Token>> {
        if self.peek_str("#!") {
            self.eat_while(|c| c != '\n');
            return Ok(Some(Token::new(
                TokenKind::Comment,
                Span::from_range(start, self.i),
                TokenValue::None,
            )));
        }
        self.i += 1;
        if !self.peek_char().is_some_and(|c| c == '_' || c.is_alphabetic()) {
            self.report(
                handler,
                ErrorCode::UnexpectedCharacter,
                "Expected a type name after '#'",
                start,
                self.i,
            )?;
            return Ok(None);
        }
        let name_start = self.i;
        loop {
            self.eat_while(is_variable_char);
            if self.peek_char() == Some('.') && self.char_after(1).is_some_and(is_variable_char) {
                self.i += 1;
                continue;
            }
            break;
        }
        Ok(Some(Token::new(
            TokenKind::ExternThing,
            Span::from_range(start, self.i),
            TokenValue::Name(self.input[name_start..self.i].to_string()),
        )))
    }

    fn lex_string(&mut self, start: usize, quote: char, handler: &mut dyn ErrorHandler) -> Result<Token> {
        self.i += 1;
        let mut out = String::new();
        loop {
            let Some(ch) = self.peek_char() else {
                self.report(
                    handler,
                    ErrorCode::UnterminatedString,
                    "Unterminated string literal",
                    start,
                    self.i,
                )?;
                break;
            };
            if ch == quote {
                self.i += 1;
                break;
            }
            if ch == '\\' {
                self.read_escape(&mut out, handler)?;
                continue;
            }
            out.push(ch);
            self.i += ch.len_utf8();
        }
        Ok(Token::new(
            TokenKind::String,
            Span::from_range(start, self.i),
            TokenValue::Str(out),
        ))
    }

    fn lex_char(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Token> {
        self.i += 2;
        let mut decoded = String::new();
        let mut terminated = false;
        loop {
            match self.peek_char() {
                None | Some('\n') => break,
                Some('\'') => {
                    self.i += 1;
                    terminated = true;
                    break;
                }
                Some('\\') => self.read_escape(&mut decoded, handler)?,
                Some(ch) => {
                    decoded.push(ch);
                    self.i += ch.len_utf8();
                }
            }
        }
        let mut chars = decoded.chars();
        let value = chars.next();
        if !terminated {
            self.report(
                handler,
                ErrorCode::UnterminatedCharacterLiteral,
                "Unterminated character literal",
                start,
                self.i,
            )?;
        } else if value.is_none() || chars.next().is_some() {
            self.report(
                handler,
                ErrorCode::InvalidCharacterLiteral,
                "A character literal must hold exactly one character",
                start,
                self.i,
            )?;
        }
        Ok(Token::new(
            TokenKind::Char,
            Span::from_range(start, self.i),
            TokenValue::Char(value.unwrap_or('\0')),
        ))
    }

    fn lex_slash(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Token> {
        if self.peek_str("//") {
            self.eat_while(|c| c != '\n');
        } else if self.peek_str("/#") {
            self.i += 2;
            let mut depth = 1usize;
            while depth > 0 {
                if self.peek_str("/#") {
                    self.i += 2;
                    depth += 1;
                } else if self.peek_str("#/") {
                    self.i += 2;
                    depth -= 1;
                } else if let Some(ch) = self.peek_char() {
                    self.i += ch.len_utf8();
                } else {
                    self.report(
                        handler,
                        ErrorCode::UnterminatedBlockComment,
                        "Unterminated block comment",
                        start,
                        self.i,
                    )?;
                    break;
                }
            }
        } else if self.peek_str("/=") {
            return Ok(self.op(start, 2, Operation::DivideAssign));
        } else {
            return Ok(self.op(start, 1, Operation::Divide));
        }
        Ok(Token::new(
            TokenKind::Comment,
            Span::from_range(start, self.i),
            TokenValue::None,
        ))
    }

    fn lex_dot(&mut self, start: usize) -> Token {
        if self.at_argument_start() && (self.peek_str("./") || self.peek_str("../")) {
            return self.lex_path(start);
        }
        if self.peek_str("..") && !self.peek_str("...") {
            return self.op(start, 2, Operation::Range);
        }
        self.single(TokenKind::Dot, start)
    }

    fn lex_path(&mut self, start: usize) -> Token {
        self.eat_while(|c| !c.is_whitespace() && !matches!(c, ';' | ',' | ')' | '|'));
        Token::new(
            TokenKind::Path,
            Span::from_range(start, self.i),
            TokenValue::Name(self.input[start..self.i].to_string()),
        )
    }

    fn lex_minus(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Token> {
        if self.peek_str("--") {
            return Ok(self.op(start, 2, Operation::Decrement));
        }
        if self.peek_str("-=") {
            return Ok(self.op(start, 2, Operation::SubtractAssign));
        }
        let next = self.char_after(1);
        if next.is_some_and(|c| c.is_ascii_digit()) && self.negative_literal_allowed() {
            return self.lex_number(start, handler);
        }
        if next.is_some_and(char::is_alphabetic) && self.at_argument_start() {
            self.i += 1;
            let name_start = self.i;
            self.eat_while(is_keyword_continue);
            return Ok(Token::new(
                TokenKind::NamedArgument,
                Span::from_range(start, self.i),
                TokenValue::Name(self.input[name_start..self.i].to_string()),
            ));
        }
        Ok(self.op(start, 1, Operation::Subtract))
    }

    fn lex_number(&mut self, start: usize, handler: &mut dyn ErrorHandler) -> Result<Token> {
        let negative = self.peek_char() == Some('-');
        if negative {
            self.i += 1;
        }
        let hex = self.peek_str("0x") || self.peek_str("0X");
        if hex {
            self.i += 2;
        }
        let digits_start = self.i;
        if hex {
            self.eat_while(|c| c == '_' || c.is_ascii_hexdigit());
        } else {
            self.eat_while(|c| c == '_' || c.is_ascii_digit());
        }
        let mut fractional = false;
        if self.peek_char() == Some('.') && self.char_after(1).is_some_and(|c| c.is_ascii_digit()) {
            fractional = true;
            self.i += 1;
            self.eat_while(|c| c == '_' || c.is_ascii_digit());
        }
        let digits_end = self.i;
        let suffix_start = self.i;
        while self.i - suffix_start < 2
            && self
                .peek_char()
                .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'u' | 'i' | 'l' | 'f' | 'd' | 'm'))
        {
            self.i += 1;
        }

        let lit = NumberLiteral {
            digits: &self.input[digits_start..digits_end],
            negative,
            hex,
            fractional,
            suffix: &self.input[suffix_start..self.i],
        };
        let value = match evaluate(&lit) {
            Ok(n) => n,
            Err((code, message)) => {
                let n = fallback(&lit);
                self.report(handler, code, message, start, self.i)?;
                n
            }
        };
        Ok(Token::new(
            TokenKind::Number,
            Span::from_range(start, self.i),
            TokenValue::Number(value),
        ))
    }

    fn lex_keyword(&mut self, start: usize) -> Token {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == '`' {
                self.i += 1;
                if let Some(escaped) = self.peek_char() {
                    name.push(escaped);
                    self.i += escaped.len_utf8();
                }
                continue;
            }
            if ch == '-' && !self.char_after(1).is_some_and(char::is_alphanumeric) {
                break;
            }
            if !is_keyword_continue(ch) {
                break;
            }
            name.push(ch);
            self.i += ch.len_utf8();
        }
        Token::new(
            TokenKind::Keyword,
            Span::from_range(start, self.i),
            TokenValue::Name(name),
        )
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.i += ch.len_utf8();
        }
    }

    pub(crate) fn peek_char(&self) -> Option<char> {
        self.input[self.i..].chars().next()
    }

    /// Character `n` characters past the cursor.
    fn char_after(&self, n: usize) -> Option<char> {
        self.input[self.i..].chars().nth(n)
    }

    pub(crate) fn peek_str(&self, s: &str) -> bool {
        self.input[self.i..].starts_with(s)
    }
}
