//! Grouped token tree.
//!
//! The parser folds the flat lexer output into these nodes: dot chains,
//! call argument lists, operator groups and pipelines. Nodes own their
//! children and are never mutated after parsing.
use std::sync::Arc;

use rcaron_syntax::{Number, Operation, Span};

/// Literal value known at parse time.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Char(char),
    Number(Number),
    String(Arc<str>),
}

/// Separator in front of a chain link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainSeparator {
    /// `.member`
    Dot,
    /// `:member`, only after an extern thing.
    Colon,
    /// `[index]` directly after the previous link.
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChainKind {
    Member(String),
    Call { name: String, args: Vec<PosToken> },
    Index(Box<PosToken>),
}

/// One step of a dot chain such as `.Length`, `:New(1)` or `[0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainLink {
    pub span: Span,
    pub separator: ChainSeparator,
    pub kind: ChainKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PosTokenKind {
    Variable(String),
    Constant(Constant),
    /// Bare identifier.
    Keyword(String),
    /// `#Name.Space.Type`
    ExternThing(String),
    /// `-Name value` pair collected from a call's arguments. A lone `-Name`
    /// carries `$true`.
    NamedArg { name: String, value: Box<PosToken> },
    /// Operator inside a math group.
    Operation(Operation),
    /// `( expr )`
    Group(Box<PosToken>),
    /// `Name(a, b)`
    KeywordCall { name: String, args: Vec<PosToken> },
    /// `Name a b -Flag c`
    ShellCall { name: String, args: Vec<PosToken> },
    /// Head value followed by member, call and index links.
    DotGroup { head: Box<PosToken>, chain: Vec<ChainLink> },
    /// Values interleaved with arithmetic operators, evaluated by precedence.
    Math(Vec<PosToken>),
    Comparison { op: Operation, left: Box<PosToken>, right: Box<PosToken> },
    Logical { op: Operation, left: Box<PosToken>, right: Box<PosToken> },
    Not(Box<PosToken>),
    Negate(Box<PosToken>),
    Pipeline { left: Box<PosToken>, right: Box<PosToken> },
}

/// Token with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct PosToken {
    pub span: Span,
    pub kind: PosTokenKind,
}

impl PosToken {
    pub fn new(span: Span, kind: PosTokenKind) -> Self {
        Self { span, kind }
    }

    pub fn constant(span: Span, c: Constant) -> Self {
        Self::new(span, PosTokenKind::Constant(c))
    }

    pub fn keyword(&self) -> Option<&str> {
        match &self.kind {
            PosTokenKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self.kind {
            PosTokenKind::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn variable(&self) -> Option<&str> {
        match &self.kind {
            PosTokenKind::Variable(v) => Some(v),
            _ => None,
        }
    }
}
