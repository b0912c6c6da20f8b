//! Classified statements.
use rcaron_syntax::{Operation, Span};

use crate::PosToken;

/// Ordered statements between `{` and `}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeBlock {
    pub span: Span,
    pub lines: Vec<Line>,
}

/// `value { body }` inside a switch; `value == None` is the `default` case.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub span: Span,
    pub value: Option<PosToken>,
    pub body: CodeBlock,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    /// `$name = value`, `$name += value`, ...
    VariableAssignment {
        name: String,
        op: Operation,
        value: PosToken,
    },
    /// `let $name = value`
    LetAssignment { name: String, value: PosToken },
    If { condition: PosToken, body: CodeBlock },
    ElseIf { condition: PosToken, body: CodeBlock },
    Else { body: CodeBlock },
    While { condition: PosToken, body: CodeBlock },
    DoWhile { condition: PosToken, body: CodeBlock },
    For {
        init: Option<Box<Line>>,
        condition: Option<PosToken>,
        step: Option<Box<Line>>,
        body: CodeBlock,
    },
    /// Like `For` without a fresh scope per iteration.
    QuickFor {
        init: Option<Box<Line>>,
        condition: Option<PosToken>,
        step: Option<Box<Line>>,
        body: CodeBlock,
    },
    ForEach {
        variable: String,
        source: PosToken,
        body: CodeBlock,
    },
    Loop { body: CodeBlock },
    Switch { subject: PosToken, cases: Vec<SwitchCase> },
    Try {
        body: CodeBlock,
        catch: Option<CodeBlock>,
        finally: Option<CodeBlock>,
    },
    /// Marker left where a `func` was declared; the function itself lives in the file scope.
    FunctionDeclaration { name: String },
    /// Marker left where a `class` was declared.
    ClassDeclaration { name: String },
    /// `$x++` / `$x.y--`
    Unary { target: PosToken, op: Operation },
    /// `$x.y = v`, `$a[0] += v`
    MemberAssignment {
        target: PosToken,
        op: Operation,
        value: PosToken,
    },
    /// A call, pipeline or any other expression evaluated for its side effects.
    Expression(PosToken),
    Return(Option<PosToken>),
    Break,
    Continue,
    Throw(PosToken),
    Block(CodeBlock),
    /// Unrecognised statement kept so line numbering stays intact.
    Invalid,
}

/// Statement with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub span: Span,
    pub kind: LineKind,
}

impl Line {
    pub fn new(span: Span, kind: LineKind) -> Self {
        Self { span, kind }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, LineKind::Invalid)
    }
}
