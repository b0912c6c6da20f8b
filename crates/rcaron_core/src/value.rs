//! Boxed runtime values.
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rcaron_syntax::{Number, NumberKind, RCaronError};
use rust_decimal::Decimal;

use crate::{ClassInstance, Constant, HostObject, Pipeline, RType};

/// Shared, mutable array storage.
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(Arc<str>),
    Array(ArrayRef),
    /// Half-open `start..end`.
    Range(i64, i64),
    Class(Arc<ClassInstance>),
    Type(RType),
    Host(Arc<dyn HostObject>),
    Pipeline(Arc<Pipeline>),
    Error(Arc<RCaronError>),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(items)))
    }

    pub fn number_kind(&self) -> Option<NumberKind> {
        Some(match self {
            Value::I32(_) => NumberKind::I32,
            Value::I64(_) => NumberKind::I64,
            Value::U32(_) => NumberKind::U32,
            Value::U64(_) => NumberKind::U64,
            Value::F32(_) => NumberKind::F32,
            Value::F64(_) => NumberKind::F64,
            Value::Decimal(_) => NumberKind::Decimal,
            _ => return None,
        })
    }

    pub fn runtime_type(&self) -> RType {
        match self {
            Value::Null => RType::Null,
            Value::Bool(_) => RType::Bool,
            Value::Char(_) => RType::Char,
            Value::String(_) => RType::String,
            Value::Array(_) => RType::Array,
            Value::Range(..) => RType::Range,
            Value::Class(c) => RType::Class(c.definition.clone()),
            Value::Type(_) => RType::Type,
            Value::Host(h) => RType::Host(h.host_type()),
            Value::Pipeline(_) => RType::Pipeline,
            Value::Error(_) => RType::Error,
            other => match other.number_kind() {
                Some(k) => RType::Number(k),
                None => RType::Any,
            },
        }
    }

    pub fn type_name(&self) -> String {
        self.runtime_type().name()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view used for indexing and ranges.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::U32(v) => Some(v as i64),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Identity for reference values, structural equality for primitives.
    /// Values of different kinds are never equal.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Range(a, b), Value::Range(c, d)) => a == c && b == d,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Pipeline(a), Value::Pipeline(b)) => Arc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Text used by `print` and string conversion.
    pub fn to_display_string(&self) -> String {
        let mut out = String::new();
        self.write_display(&mut out);
        out
    }

    fn write_display(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("$null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Char(c) => out.push(*c),
            Value::I32(v) => out.push_str(itoa::Buffer::new().format(*v)),
            Value::I64(v) => out.push_str(itoa::Buffer::new().format(*v)),
            Value::U32(v) => out.push_str(itoa::Buffer::new().format(*v)),
            Value::U64(v) => out.push_str(itoa::Buffer::new().format(*v)),
            Value::F32(v) => write_float(out, *v as f64, ryu::Buffer::new().format(*v)),
            Value::F64(v) => write_float(out, *v, ryu::Buffer::new().format(*v)),
            Value::Decimal(d) => out.push_str(&d.to_string()),
            Value::String(s) => out.push_str(s),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.read().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_display(out);
                }
                out.push(']');
            }
            Value::Range(a, b) => {
                out.push_str(itoa::Buffer::new().format(*a));
                out.push_str("..");
                out.push_str(itoa::Buffer::new().format(*b));
            }
            Value::Class(c) => out.push_str(&c.definition.name),
            Value::Type(t) => out.push_str(&t.name()),
            Value::Host(h) => out.push_str(&h.display()),
            Value::Pipeline(_) => out.push_str("Pipeline"),
            Value::Error(e) => out.push_str(&e.to_string()),
        }
    }
}

/// `1.0` prints as `1`, non-finite values use their usual names.
fn write_float(out: &mut String, v: f64, formatted: &str) {
    if v.is_nan() {
        out.push_str("NaN");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        out.push_str(formatted.strip_suffix(".0").unwrap_or(formatted));
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Char(c) => write!(f, "Char({c:?})"),
            Value::Array(_) => write!(f, "Array({})", self.to_display_string()),
            Value::Host(h) => write!(f, "Host({})", h.host_type().full_name()),
            Value::Class(c) => write!(f, "Class({})", c.definition.name),
            Value::Error(e) => write!(f, "Error({e:?})"),
            other => match other.number_kind() {
                Some(k) => write!(f, "{}({})", k.name(), other.to_display_string()),
                None => f.write_str(&other.to_display_string()),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.loose_equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::I32(v) => Value::I32(v),
            Number::I64(v) => Value::I64(v),
            Number::U32(v) => Value::U32(v),
            Number::U64(v) => Value::U64(v),
            Number::F32(v) => Value::F32(v),
            Number::F64(v) => Value::F64(v),
            Number::Decimal(v) => Value::Decimal(v),
        }
    }
}

impl From<&Constant> for Value {
    fn from(c: &Constant) -> Self {
        match c {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Char(c) => Value::Char(*c),
            Constant::Number(n) => Value::from(*n),
            Constant::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}
