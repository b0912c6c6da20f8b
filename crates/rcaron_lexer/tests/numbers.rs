use rcaron_lexer::{CollectingErrorHandler, ThrowingErrorHandler, tokenize};
use rcaron_syntax::{ErrorCode, Number, TokenKind, TokenValue};
use rust_decimal::Decimal;

fn number(src: &str) -> Number {
    let mut handler = ThrowingErrorHandler;
    let toks = tokenize(src, &mut handler).expect("lex");
    match toks[0].value {
        TokenValue::Number(n) => n,
        ref other => panic!("expected number, got {other:?}"),
    }
}

fn first_error(src: &str) -> (ErrorCode, Vec<TokenKind>) {
    let mut handler = CollectingErrorHandler::new();
    let toks = tokenize(src, &mut handler).expect("lex");
    let code = handler.errors().first().map(|e| e.code).expect("an error");
    (code, toks.iter().map(|t| t.kind).collect())
}

#[test]
fn defaults_and_suffixes() {
    assert_eq!(number("42"), Number::I64(42));
    assert_eq!(number("42i"), Number::I32(42));
    assert_eq!(number("42u"), Number::U32(42));
    assert_eq!(number("42ul"), Number::U64(42));
    assert_eq!(number("2.5"), Number::F64(2.5));
    assert_eq!(number("2.5f"), Number::F32(2.5));
    assert_eq!(number("2d"), Number::F64(2.0));
    assert_eq!(number("1.25m"), Number::Decimal(Decimal::new(125, 2)));
}

#[test]
fn separators_and_hex() {
    assert_eq!(number("1_000_000"), Number::I64(1_000_000));
    assert_eq!(number("0xFF"), Number::I64(255));
    assert_eq!(number("0x1_0i"), Number::I32(16));
    assert_eq!(number("-0x10"), Number::I64(-16));
}

#[test]
fn suffix_errors_do_not_stop_lexing() {
    let (code, kinds) = first_error("1uf $a");
    assert_eq!(code, ErrorCode::InvalidNumberSuffix);
    assert_eq!(
        kinds,
        vec![TokenKind::Number, TokenKind::Whitespace, TokenKind::Variable]
    );

    let (code, _) = first_error("0x10m");
    assert_eq!(code, ErrorCode::InvalidHexNumber);

    let (code, _) = first_error("0x1.5");
    assert_eq!(code, ErrorCode::InvalidHexNumber);

    let (code, _) = first_error("1.5l");
    assert_eq!(code, ErrorCode::InvalidNumberSuffix);
}

#[test]
fn out_of_range_literal() {
    let (code, _) = first_error("99999999999999999999");
    assert_eq!(code, ErrorCode::NumberOutOfRange);
    let (code, _) = first_error("$a = -1u;");
    assert_eq!(code, ErrorCode::NumberOutOfRange);
}
