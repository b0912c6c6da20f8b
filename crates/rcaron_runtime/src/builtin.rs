//! Host types backing the primitive values, so member calls on strings,
//! arrays and numbers go through the same overload resolution as host calls.
use std::sync::Arc;

use rcaron_core::{HostMethod, HostType, MethodKind, RType, Value};
use rcaron_syntax::{ErrorCode, NumberKind, RCaronError, Result};

const NAMESPACE: &str = "System";

const NUMBER_KINDS: [NumberKind; 7] = [
    NumberKind::I32,
    NumberKind::I64,
    NumberKind::U32,
    NumberKind::U64,
    NumberKind::F32,
    NumberKind::F64,
    NumberKind::Decimal,
];

pub(crate) struct BuiltinTypes {
    object: Arc<HostType>,
    string: Arc<HostType>,
    array: Arc<HostType>,
    boolean: Arc<HostType>,
    character: Arc<HostType>,
    range: Arc<HostType>,
    numbers: Vec<(NumberKind, Arc<HostType>)>,
}

impl BuiltinTypes {
    pub(crate) fn new() -> Self {
        let object = Arc::new(object_type());
        let derived = |name: &str| Arc::new(HostType::new(NAMESPACE, name).with_base(object.clone()));
        let numbers = NUMBER_KINDS
            .iter()
            .map(|&k| (k, derived(number_type_name(k))))
            .collect();
        Self {
            string: Arc::new(string_type(object.clone())),
            array: Arc::new(array_type(object.clone())),
            boolean: derived("Boolean"),
            character: derived("Char"),
            range: derived("Range"),
            numbers,
            object,
        }
    }

    pub(crate) fn all(&self) -> Vec<Arc<HostType>> {
        let mut all = vec![
            self.object.clone(),
            self.string.clone(),
            self.array.clone(),
            self.boolean.clone(),
            self.character.clone(),
            self.range.clone(),
        ];
        all.extend(self.numbers.iter().map(|(_, t)| t.clone()));
        all
    }

    pub(crate) fn for_type(&self, ty: &RType) -> Option<Arc<HostType>> {
        Some(match ty {
            RType::String => self.string.clone(),
            RType::Array => self.array.clone(),
            RType::Bool => self.boolean.clone(),
            RType::Char => self.character.clone(),
            RType::Range => self.range.clone(),
            RType::Number(k) => {
                return self
                    .numbers
                    .iter()
                    .find(|(kind, _)| kind == k)
                    .map(|(_, t)| t.clone());
            }
            RType::Null | RType::Class(_) | RType::Host(_) | RType::Generic { .. } => return None,
            _ => self.object.clone(),
        })
    }
}

fn number_type_name(kind: NumberKind) -> &'static str {
    match kind {
        NumberKind::I32 => "Int32",
        NumberKind::I64 => "Int64",
        NumberKind::U32 => "UInt32",
        NumberKind::U64 => "UInt64",
        NumberKind::F32 => "Single",
        NumberKind::F64 => "Double",
        NumberKind::Decimal => "Decimal",
    }
}

fn receiver(this: Option<&Value>) -> Result<&Value> {
    this.ok_or_else(|| RCaronError::new(ErrorCode::InvalidOperation, "Instance method called without a receiver"))
}

fn receiver_str(this: Option<&Value>) -> Result<&str> {
    let value = receiver(this)?;
    value.as_str().ok_or_else(|| {
        RCaronError::new(
            ErrorCode::OperatorTypeMismatch,
            format!("Expected a string receiver, got {}", value.type_name()),
        )
    })
}

fn str_arg(args: &[Value], i: usize) -> Result<&str> {
    args.get(i).and_then(Value::as_str).ok_or_else(|| {
        RCaronError::new(ErrorCode::OperatorTypeMismatch, format!("Argument {i} must be a string"))
    })
}

fn int_arg(args: &[Value], i: usize) -> Result<i64> {
    args.get(i).and_then(Value::as_i64).ok_or_else(|| {
        RCaronError::new(ErrorCode::OperatorTypeMismatch, format!("Argument {i} must be an integer"))
    })
}

fn out_of_range(what: &str, index: i64, len: usize) -> RCaronError {
    RCaronError::new(
        ErrorCode::IndexOutOfRange,
        format!("{what} {index} is out of range for length {len}"),
    )
}

fn instance(
    name: &str,
    params: Vec<RType>,
    f: impl Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync + 'static,
) -> HostMethod {
    HostMethod::new(name, MethodKind::Instance, params, f)
}

fn object_type() -> HostType {
    HostType::new(NAMESPACE, "Object").with_method(instance("ToString", vec![], |this, _| {
        Ok(Value::from(receiver(this)?.to_display_string()))
    }))
}

/// Char-based substring; `start` may equal the length.
fn substring(s: &str, start: i64, length: Option<i64>) -> Result<Value> {
    let count = s.chars().count();
    if start < 0 || start as usize > count {
        return Err(out_of_range("Start index", start, count));
    }
    let rest = count - start as usize;
    let take = match length {
        Some(l) if l < 0 || l as usize > rest => return Err(out_of_range("Length", l, rest)),
        Some(l) => l as usize,
        None => rest,
    };
    Ok(Value::from(
        s.chars().skip(start as usize).take(take).collect::<String>(),
    ))
}

fn string_type(object: Arc<HostType>) -> HostType {
    HostType::new(NAMESPACE, "String")
        .with_base(object)
        .with_method(instance("Length", vec![], |this, _| {
            Ok(Value::I64(receiver_str(this)?.chars().count() as i64))
        }))
        .with_method(instance("ToUpper", vec![], |this, _| {
            Ok(Value::from(receiver_str(this)?.to_uppercase()))
        }))
        .with_method(instance("ToLower", vec![], |this, _| {
            Ok(Value::from(receiver_str(this)?.to_lowercase()))
        }))
        .with_method(instance("Trim", vec![], |this, _| {
            Ok(Value::from(receiver_str(this)?.trim()))
        }))
        .with_method(instance(
            "Substring",
            vec![RType::Number(NumberKind::I64)],
            |this, args| substring(receiver_str(this)?, int_arg(args, 0)?, None),
        ))
        .with_method(instance(
            "Substring",
            vec![RType::Number(NumberKind::I64), RType::Number(NumberKind::I64)],
            |this, args| substring(receiver_str(this)?, int_arg(args, 0)?, Some(int_arg(args, 1)?)),
        ))
        .with_method(instance("Contains", vec![RType::String], |this, args| {
            Ok(Value::Bool(receiver_str(this)?.contains(str_arg(args, 0)?)))
        }))
        .with_method(instance("StartsWith", vec![RType::String], |this, args| {
            Ok(Value::Bool(receiver_str(this)?.starts_with(str_arg(args, 0)?)))
        }))
        .with_method(instance("Split", vec![RType::String], |this, args| {
            let parts = receiver_str(this)?
                .split(str_arg(args, 0)?)
                .map(Value::from)
                .collect();
            Ok(Value::array(parts))
        }))
        .with_method(instance("Replace", vec![RType::String, RType::String], |this, args| {
            Ok(Value::from(
                receiver_str(this)?.replace(str_arg(args, 0)?, str_arg(args, 1)?),
            ))
        }))
}

fn array_type(object: Arc<HostType>) -> HostType {
    HostType::new(NAMESPACE, "Array")
        .with_base(object)
        .with_method(instance("Length", vec![], |this, _| match receiver(this)? {
            Value::Array(items) => Ok(Value::I64(items.read().len() as i64)),
            other => Err(RCaronError::new(
                ErrorCode::OperatorTypeMismatch,
                format!("Expected an array receiver, got {}", other.type_name()),
            )),
        }))
        .with_method(instance("Add", vec![RType::Any], |this, args| match receiver(this)? {
            Value::Array(items) => {
                items.write().extend(args.first().cloned());
                Ok(Value::Null)
            }
            other => Err(RCaronError::new(
                ErrorCode::OperatorTypeMismatch,
                format!("Expected an array receiver, got {}", other.type_name()),
            )),
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_counts_chars() {
        assert_eq!(substring("řeka", 1, None).unwrap(), Value::from("eka"));
        assert_eq!(substring("řeka", 0, Some(2)).unwrap(), Value::from("ře"));
        assert_eq!(substring("abc", 3, None).unwrap(), Value::from(""));
        assert_eq!(
            substring("abc", 4, None).unwrap_err().code,
            ErrorCode::IndexOutOfRange
        );
        assert_eq!(
            substring("abc", 1, Some(5)).unwrap_err().code,
            ErrorCode::IndexOutOfRange
        );
    }

    #[test]
    fn numbers_share_the_object_base() {
        let types = BuiltinTypes::new();
        let int = types.for_type(&RType::Number(NumberKind::I32)).unwrap();
        assert_eq!(int.full_name(), "System.Int32");
        assert!(int.derives_from(&types.object));
        assert!(types.for_type(&RType::Null).is_none());
    }
}
