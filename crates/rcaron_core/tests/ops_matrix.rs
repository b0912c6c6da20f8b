use pretty_assertions::assert_eq;
use rcaron_core::Value;
use rcaron_core::ops::{arithmetic, compare, negate, step};
use rcaron_syntax::{ErrorCode, Operation};
use rust_decimal::Decimal;

fn show(v: Value) -> String {
    format!("{v:?}")
}

#[test]
fn same_kind_arithmetic_matches_native() {
    let cases = [
        (Value::I32(7), Value::I32(2), Operation::Divide, Value::I32(7 / 2)),
        (Value::I64(7), Value::I64(2), Operation::Modulo, Value::I64(7 % 2)),
        (Value::U32(3), Value::U32(4), Operation::Multiply, Value::U32(12)),
        (Value::U64(10), Value::U64(4), Operation::Subtract, Value::U64(6)),
        (Value::F32(1.5), Value::F32(2.0), Operation::Multiply, Value::F32(3.0)),
        (Value::F64(1.0), Value::F64(4.0), Operation::Divide, Value::F64(0.25)),
        (
            Value::Decimal(Decimal::new(15, 1)),
            Value::Decimal(Decimal::new(25, 1)),
            Operation::Add,
            Value::Decimal(Decimal::new(4, 0)),
        ),
    ];
    for (a, b, op, expected) in cases {
        let got = arithmetic(op, &a, &b).expect("arith");
        assert!(got.loose_equals(&expected), "{} {op:?} {} = {}", show(a), show(b), show(got));
    }
}

#[test]
fn integer_arithmetic_wraps() {
    let got = arithmetic(Operation::Add, &Value::I32(i32::MAX), &Value::I32(1)).unwrap();
    assert!(got.loose_equals(&Value::I32(i32::MIN)));
    let got = arithmetic(Operation::Subtract, &Value::U32(0), &Value::U32(1)).unwrap();
    assert!(got.loose_equals(&Value::U32(u32::MAX)));
}

#[test]
fn mixed_kinds_are_rejected() {
    let err = arithmetic(Operation::Add, &Value::I64(1), &Value::I32(1)).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
    let err = arithmetic(Operation::Add, &Value::from("a"), &Value::I64(1)).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
    let err = compare(Operation::Equal, &Value::I64(1), &Value::F64(1.0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
}

#[test]
fn division_by_zero() {
    let err = arithmetic(Operation::Divide, &Value::I64(1), &Value::I64(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::DivisionByZero);
    let got = arithmetic(Operation::Divide, &Value::F64(1.0), &Value::F64(0.0)).unwrap();
    assert_eq!(got.to_display_string(), "Infinity");
}

#[test]
fn strings_concatenate() {
    let got = arithmetic(Operation::Add, &Value::from("ab"), &Value::from("cd")).unwrap();
    assert_eq!(got.as_str(), Some("abcd"));
    let err = arithmetic(Operation::Subtract, &Value::from("ab"), &Value::from("cd")).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
}

#[test]
fn ranges_need_i64() {
    let got = arithmetic(Operation::Range, &Value::I64(1), &Value::I64(4)).unwrap();
    assert!(got.loose_equals(&Value::Range(1, 4)));
    let err = arithmetic(Operation::Range, &Value::I32(1), &Value::I32(4)).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
}

#[test]
fn comparisons() {
    assert!(compare(Operation::Less, &Value::I64(1), &Value::I64(2)).unwrap());
    assert!(compare(Operation::GreaterOrEqual, &Value::F64(2.0), &Value::F64(2.0)).unwrap());
    assert!(compare(Operation::Less, &Value::from("a"), &Value::from("b")).unwrap());
    assert!(compare(Operation::NotEqual, &Value::from("a"), &Value::Null).unwrap());
    assert!(!compare(Operation::Equal, &Value::Bool(true), &Value::I64(1)).unwrap());
    let err = compare(Operation::Less, &Value::Bool(true), &Value::Bool(false)).unwrap_err();
    assert_eq!(err.code, ErrorCode::OperatorTypeMismatch);
}

#[test]
fn unary_helpers() {
    assert!(negate(&Value::I64(3)).unwrap().loose_equals(&Value::I64(-3)));
    assert_eq!(negate(&Value::U32(3)).unwrap_err().code, ErrorCode::OperatorTypeMismatch);
    assert!(step(&Value::I32(3), Operation::Increment).unwrap().loose_equals(&Value::I32(4)));
    assert!(step(&Value::F64(3.0), Operation::Decrement).unwrap().loose_equals(&Value::F64(2.0)));
}
