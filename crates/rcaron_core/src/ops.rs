//! Primitive operator dispatch over boxed values.
//!
//! Both operands must already share a primitive kind; there are no implicit
//! conversions. Integer arithmetic wraps.
use std::cmp::Ordering;

use rcaron_syntax::{ErrorCode, Operation, RCaronError, Result};

use crate::Value;

fn mismatch(op: Operation, left: &Value, right: &Value) -> RCaronError {
    RCaronError::new(
        ErrorCode::OperatorTypeMismatch,
        format!(
            "Cannot apply '{}' to {} and {}",
            op.as_str(),
            left.type_name(),
            right.type_name()
        ),
    )
}

fn division_by_zero() -> RCaronError {
    RCaronError::new(ErrorCode::DivisionByZero, "Attempted to divide by zero")
}

macro_rules! int_arith {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        match $op {
            Operation::Add => Value::$variant(a.wrapping_add(b)),
            Operation::Subtract => Value::$variant(a.wrapping_sub(b)),
            Operation::Multiply => Value::$variant(a.wrapping_mul(b)),
            Operation::Divide if b == 0 => return Err(division_by_zero()),
            Operation::Divide => Value::$variant(a.wrapping_div(b)),
            Operation::Modulo if b == 0 => return Err(division_by_zero()),
            Operation::Modulo => Value::$variant(a.wrapping_rem(b)),
            _ => return Err(unsupported($op)),
        }
    }};
}

macro_rules! float_arith {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        match $op {
            Operation::Add => Value::$variant(a + b),
            Operation::Subtract => Value::$variant(a - b),
            Operation::Multiply => Value::$variant(a * b),
            Operation::Divide => Value::$variant(a / b),
            Operation::Modulo => Value::$variant(a % b),
            _ => return Err(unsupported($op)),
        }
    }};
}

fn unsupported(op: Operation) -> RCaronError {
    RCaronError::new(
        ErrorCode::InvalidOperation,
        format!("'{}' is not an arithmetic operator", op.as_str()),
    )
}

/// `left op right` for `+ - * / % ..`.
pub fn arithmetic(op: Operation, left: &Value, right: &Value) -> Result<Value> {
    Ok(match (left, right) {
        (Value::I64(a), Value::I64(b)) if op == Operation::Range => Value::Range(*a, *b),
        _ if op == Operation::Range => return Err(mismatch(op, left, right)),
        (Value::I32(a), Value::I32(b)) => int_arith!(I32, op, *a, *b),
        (Value::I64(a), Value::I64(b)) => int_arith!(I64, op, *a, *b),
        (Value::U32(a), Value::U32(b)) => int_arith!(U32, op, *a, *b),
        (Value::U64(a), Value::U64(b)) => int_arith!(U64, op, *a, *b),
        (Value::F32(a), Value::F32(b)) => float_arith!(F32, op, *a, *b),
        (Value::F64(a), Value::F64(b)) => float_arith!(F64, op, *a, *b),
        (Value::Decimal(a), Value::Decimal(b)) => {
            let result = match op {
                Operation::Add => a.checked_add(*b),
                Operation::Subtract => a.checked_sub(*b),
                Operation::Multiply => a.checked_mul(*b),
                Operation::Divide if b.is_zero() => return Err(division_by_zero()),
                Operation::Divide => a.checked_div(*b),
                Operation::Modulo if b.is_zero() => return Err(division_by_zero()),
                Operation::Modulo => a.checked_rem(*b),
                _ => return Err(unsupported(op)),
            };
            match result {
                Some(d) => Value::Decimal(d),
                None => {
                    return Err(RCaronError::new(
                        ErrorCode::HostError,
                        "Decimal arithmetic overflowed",
                    ));
                }
            }
        }
        (Value::String(a), Value::String(b)) if op == Operation::Add => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Value::from(s)
        }
        _ => return Err(mismatch(op, left, right)),
    })
}

fn ordering(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    Some(match (left, right) {
        (Value::I32(a), Value::I32(b)) => a.partial_cmp(b),
        (Value::I64(a), Value::I64(b)) => a.partial_cmp(b),
        (Value::U32(a), Value::U32(b)) => a.partial_cmp(b),
        (Value::U64(a), Value::U64(b)) => a.partial_cmp(b),
        (Value::F32(a), Value::F32(b)) => a.partial_cmp(b),
        (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
        _ => return None,
    })
}

/// `left op right` for `== != < > <= >=`.
///
/// Equality between two different kinds is `false`, except between two
/// different numeric kinds, which is an error like every other numeric mix.
pub fn compare(op: Operation, left: &Value, right: &Value) -> Result<bool> {
    match op {
        Operation::Equal | Operation::NotEqual => {
            if let (Some(a), Some(b)) = (left.number_kind(), right.number_kind()) {
                if a != b {
                    return Err(mismatch(op, left, right));
                }
            }
            let eq = left.loose_equals(right);
            Ok(if op == Operation::Equal { eq } else { !eq })
        }
        Operation::Less | Operation::Greater | Operation::LessOrEqual | Operation::GreaterOrEqual => {
            let Some(ord) = ordering(left, right) else {
                return Err(mismatch(op, left, right));
            };
            Ok(match (op, ord) {
                (_, None) => false,
                (Operation::Less, Some(o)) => o == Ordering::Less,
                (Operation::Greater, Some(o)) => o == Ordering::Greater,
                (Operation::LessOrEqual, Some(o)) => o != Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            })
        }
        _ => Err(RCaronError::new(
            ErrorCode::InvalidOperation,
            format!("'{}' is not a comparison operator", op.as_str()),
        )),
    }
}

/// Unary minus on a signed or floating value.
pub fn negate(value: &Value) -> Result<Value> {
    Ok(match value {
        Value::I32(v) => Value::I32(v.wrapping_neg()),
        Value::I64(v) => Value::I64(v.wrapping_neg()),
        Value::F32(v) => Value::F32(-v),
        Value::F64(v) => Value::F64(-v),
        Value::Decimal(v) => Value::Decimal(-*v),
        other => {
            return Err(RCaronError::new(
                ErrorCode::OperatorTypeMismatch,
                format!("Cannot negate a value of type {}", other.type_name()),
            ));
        }
    })
}

/// Add one (`Increment`) or subtract one (`Decrement`) keeping the kind.
pub fn step(value: &Value, op: Operation) -> Result<Value> {
    let one = match value {
        Value::I32(_) => Value::I32(1),
        Value::I64(_) => Value::I64(1),
        Value::U32(_) => Value::U32(1),
        Value::U64(_) => Value::U64(1),
        Value::F32(_) => Value::F32(1.0),
        Value::F64(_) => Value::F64(1.0),
        Value::Decimal(_) => Value::Decimal(rust_decimal::Decimal::ONE),
        other => {
            return Err(RCaronError::new(
                ErrorCode::OperatorTypeMismatch,
                format!("Cannot apply '{}' to {}", op.as_str(), other.type_name()),
            ));
        }
    };
    let arith = if op == Operation::Decrement {
        Operation::Subtract
    } else {
        Operation::Add
    };
    arithmetic(arith, value, &one)
}
