//! Numeric literal values.
use rust_decimal::Decimal;

/// The primitive kind a numeric literal was declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Decimal,
}

impl NumberKind {
    pub fn is_floating(self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64 | NumberKind::Decimal)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, NumberKind::U32 | NumberKind::U64)
    }

    pub fn name(self) -> &'static str {
        match self {
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
            NumberKind::Decimal => "decimal",
        }
    }
}

/// A numeric literal with its declared width and signedness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::U32(_) => NumberKind::U32,
            Number::U64(_) => NumberKind::U64,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
            Number::Decimal(_) => NumberKind::Decimal,
        }
    }
}
