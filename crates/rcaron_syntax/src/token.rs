//! Raw lexer tokens.
//!
//! The lexer emits a flat list of these; the parser groups them into the
//! nested token tree the engine walks.
use crate::{Number, Span};

/// Token kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `$name`
    Variable,
    /// Bare identifier or keyword (`if`, `print`, `Get-Item`, `@`).
    Keyword,
    /// `'text'` or `"text"`.
    String,
    /// `c'x'`
    Char,
    /// Numeric literal.
    Number,
    /// Run of spaces, tabs and newlines.
    Whitespace,
    /// `// ...`, `/# ... #/` or a `#!` shebang line.
    Comment,
    /// Operator, see [`Operation`].
    Operation,
    /// `-Name` in an argument list.
    NamedArgument,
    /// `#Name.Space.Type`
    ExternThing,
    /// `./relative/path` style literal.
    Path,
    /// `,`
    Comma,
    /// `;`
    LineEnding,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// `(`
    GroupStart,
    /// `)`
    GroupEnd,
    /// `[`
    IndexerStart,
    /// `]`
    IndexerEnd,
}

/// Operators recognised by the lexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Range,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    And,
    Or,
    Not,
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    Increment,
    Decrement,
    Pipeline,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Modulo => "%",
            Operation::Range => "..",
            Operation::Equal => "==",
            Operation::NotEqual => "!=",
            Operation::Less => "<",
            Operation::Greater => ">",
            Operation::LessOrEqual => "<=",
            Operation::GreaterOrEqual => ">=",
            Operation::And => "&&",
            Operation::Or => "||",
            Operation::Not => "!",
            Operation::Assign => "=",
            Operation::AddAssign => "+=",
            Operation::SubtractAssign => "-=",
            Operation::MultiplyAssign => "*=",
            Operation::DivideAssign => "/=",
            Operation::Increment => "++",
            Operation::Decrement => "--",
            Operation::Pipeline => "|",
        }
    }

    pub fn is_math(self) -> bool {
        matches!(
            self,
            Operation::Add
                | Operation::Subtract
                | Operation::Multiply
                | Operation::Divide
                | Operation::Modulo
                | Operation::Range
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operation::Equal
                | Operation::NotEqual
                | Operation::Less
                | Operation::Greater
                | Operation::LessOrEqual
                | Operation::GreaterOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operation::And | Operation::Or)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Operation::Assign
                | Operation::AddAssign
                | Operation::SubtractAssign
                | Operation::MultiplyAssign
                | Operation::DivideAssign
        )
    }

    /// Binary operator this compound assignment applies before storing.
    pub fn compound_base(self) -> Option<Operation> {
        match self {
            Operation::AddAssign => Some(Operation::Add),
            Operation::SubtractAssign => Some(Operation::Subtract),
            Operation::MultiplyAssign => Some(Operation::Multiply),
            Operation::DivideAssign => Some(Operation::Divide),
            _ => None,
        }
    }

    /// Operators after which a line break does not end the statement.
    pub fn continues_line(self) -> bool {
        self.is_math() || self.is_comparison() || self.is_logical() || self.is_assignment()
    }
}

/// Kind-specific payload decoded while lexing.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    None,
    /// Variable, keyword, extern-thing, named-argument and path names.
    Name(String),
    /// Decoded string contents.
    Str(String),
    Char(char),
    Number(Number),
    Op(Operation),
    /// Whitespace run; `true` when it contains a line break.
    Space(bool),
}

/// Token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Span in source text.
    pub span: Span,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, value: TokenValue) -> Self {
        Self { kind, span, value }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn op(&self) -> Option<Operation> {
        match self.value {
            TokenValue::Op(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn has_newline(&self) -> bool {
        matches!(self.value, TokenValue::Space(true))
    }
}
