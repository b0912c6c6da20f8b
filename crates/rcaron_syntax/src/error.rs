//! The closed error taxonomy shared by lexer, parser and engine.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::Span;

pub type Result<T, E = RCaronError> = std::result::Result<T, E>;

/// Machine-checkable failure kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexer
    InvalidEscape,
    InvalidUnicodeEscape,
    TooShortUnicodeEscape,
    InvalidHexNumber,
    InvalidNumberSuffix,
    NumberOutOfRange,
    InvalidCharacterLiteral,
    UnterminatedCharacterLiteral,
    UnterminatedString,
    UnterminatedBlockComment,
    UnexpectedCharacter,

    // Parser
    UnmatchedDelimiter,
    ParseInvalidLine,
    ExpectedConstant,
    StaticPropertyWithoutInitializer,

    // Runtime
    VariableNotFound,
    MethodNotFound,
    MethodNoSuitableMatch,
    NamedArgumentNotFound,
    ArgumentsLeftUnassigned,
    LeftOverPositionalArgument,
    TypeNotFound,
    ClassNotFound,
    ClassPropertyNotFound,
    ClassFunctionNotFound,
    ClassStaticPropertyNotFound,
    ClassStaticFunctionNotFound,
    ImportNotFound,
    FunctionToImportNotFound,
    ClassToImportNotFound,
    LetVariableTypeMismatch,
    NoSuitableIndexerImplementation,
    CannotResolveInDotThing,
    IndexOutOfRange,
    OperatorTypeMismatch,
    DivisionByZero,
    ExpectedBoolean,
    NotCallable,
    InvalidPipelineUse,
    InvalidOperation,
    BreakOutsideLoop,
    ReturnOutsideFunction,
    RecursionLimitExceeded,
    AssertionFailed,
    ThrownValue,
    HostError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidEscape => "InvalidEscape",
            ErrorCode::InvalidUnicodeEscape => "InvalidUnicodeEscape",
            ErrorCode::TooShortUnicodeEscape => "TooShortUnicodeEscape",
            ErrorCode::InvalidHexNumber => "InvalidHexNumber",
            ErrorCode::InvalidNumberSuffix => "InvalidNumberSuffix",
            ErrorCode::NumberOutOfRange => "NumberOutOfRange",
            ErrorCode::InvalidCharacterLiteral => "InvalidCharacterLiteral",
            ErrorCode::UnterminatedCharacterLiteral => "UnterminatedCharacterLiteral",
            ErrorCode::UnterminatedString => "UnterminatedString",
            ErrorCode::UnterminatedBlockComment => "UnterminatedBlockComment",
            ErrorCode::UnexpectedCharacter => "UnexpectedCharacter",
            ErrorCode::UnmatchedDelimiter => "UnmatchedDelimiter",
            ErrorCode::ParseInvalidLine => "ParseInvalidLine",
            ErrorCode::ExpectedConstant => "ExpectedConstant",
            ErrorCode::StaticPropertyWithoutInitializer => "StaticPropertyWithoutInitializer",
            ErrorCode::VariableNotFound => "VariableNotFound",
            ErrorCode::MethodNotFound => "MethodNotFound",
            ErrorCode::MethodNoSuitableMatch => "MethodNoSuitableMatch",
            ErrorCode::NamedArgumentNotFound => "NamedArgumentNotFound",
            ErrorCode::ArgumentsLeftUnassigned => "ArgumentsLeftUnassigned",
            ErrorCode::LeftOverPositionalArgument => "LeftOverPositionalArgument",
            ErrorCode::TypeNotFound => "TypeNotFound",
            ErrorCode::ClassNotFound => "ClassNotFound",
            ErrorCode::ClassPropertyNotFound => "ClassPropertyNotFound",
            ErrorCode::ClassFunctionNotFound => "ClassFunctionNotFound",
            ErrorCode::ClassStaticPropertyNotFound => "ClassStaticPropertyNotFound",
            ErrorCode::ClassStaticFunctionNotFound => "ClassStaticFunctionNotFound",
            ErrorCode::ImportNotFound => "ImportNotFound",
            ErrorCode::FunctionToImportNotFound => "FunctionToImportNotFound",
            ErrorCode::ClassToImportNotFound => "ClassToImportNotFound",
            ErrorCode::LetVariableTypeMismatch => "LetVariableTypeMismatch",
            ErrorCode::NoSuitableIndexerImplementation => "NoSuitableIndexerImplementation",
            ErrorCode::CannotResolveInDotThing => "CannotResolveInDotThing",
            ErrorCode::IndexOutOfRange => "IndexOutOfRange",
            ErrorCode::OperatorTypeMismatch => "OperatorTypeMismatch",
            ErrorCode::DivisionByZero => "DivisionByZero",
            ErrorCode::ExpectedBoolean => "ExpectedBoolean",
            ErrorCode::NotCallable => "NotCallable",
            ErrorCode::InvalidPipelineUse => "InvalidPipelineUse",
            ErrorCode::InvalidOperation => "InvalidOperation",
            ErrorCode::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorCode::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorCode::RecursionLimitExceeded => "RecursionLimitExceeded",
            ErrorCode::AssertionFailed => "AssertionFailed",
            ErrorCode::ThrownValue => "ThrownValue",
            ErrorCode::HostError => "HostError",
        }
    }

    /// Codes that can only be produced while lexing or parsing.
    pub fn is_parse_time(self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidEscape
                | ErrorCode::InvalidUnicodeEscape
                | ErrorCode::TooShortUnicodeEscape
                | ErrorCode::InvalidHexNumber
                | ErrorCode::InvalidNumberSuffix
                | ErrorCode::NumberOutOfRange
                | ErrorCode::InvalidCharacterLiteral
                | ErrorCode::UnterminatedCharacterLiteral
                | ErrorCode::UnterminatedString
                | ErrorCode::UnterminatedBlockComment
                | ErrorCode::UnexpectedCharacter
                | ErrorCode::UnmatchedDelimiter
                | ErrorCode::ParseInvalidLine
                | ErrorCode::ExpectedConstant
                | ErrorCode::StaticPropertyWithoutInitializer
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error surfaced to hosts: code, message and an optional span.
///
/// A script-level `throw` keeps the thrown value as an opaque payload so a
/// `catch` block can hand it back to the script unchanged.
#[derive(Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RCaronError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Option<Span>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl RCaronError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
            payload: None,
        }
    }

    pub fn at(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(code, message).with_span(span)
    }

    pub fn thrown(message: impl Into<String>, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            code: ErrorCode::ThrownValue,
            message: message.into(),
            span: None,
            payload: Some(payload),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach `span` unless the error already carries a more precise one.
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for RCaronError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RCaronError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("span", &self.span)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = RCaronError::new(ErrorCode::VariableNotFound, "Variable '$a' not found");
        assert_eq!(err.to_string(), "VariableNotFound: Variable '$a' not found");
    }

    #[test]
    fn payload_downcasts_to_the_stored_type() {
        let err = RCaronError::thrown("boom", Arc::new(42i64));
        assert_eq!(err.payload::<i64>(), Some(&42));
        assert!(err.payload::<String>().is_none());
    }

    #[test]
    fn or_span_keeps_the_first_span() {
        let err = RCaronError::at(ErrorCode::TypeNotFound, "x", Span::new(1, 2))
            .or_span(Span::new(5, 9));
        assert_eq!(err.span, Some(Span::new(1, 2)));
    }
}
