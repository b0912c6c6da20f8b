use rcaron_syntax::{ErrorCode, RCaronError, Result};

use crate::{RType, Value};

/// Variable slot. `let` bindings keep the type of their first value and
/// reject assignments of any other type.
#[derive(Clone, Debug)]
pub enum Variable {
    Plain(Value),
    Let { ty: RType, value: Value },
}

impl Variable {
    pub fn new_let(value: Value) -> Self {
        Variable::Let {
            ty: value.runtime_type(),
            value,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Variable::Plain(v) => v,
            Variable::Let { value, .. } => value,
        }
    }

    pub fn assign(&mut self, name: &str, new_value: Value) -> Result<()> {
        match self {
            Variable::Plain(v) => *v = new_value,
            Variable::Let { ty, value } => {
                let actual = new_value.runtime_type();
                if actual != *ty {
                    return Err(RCaronError::new(
                        ErrorCode::LetVariableTypeMismatch,
                        format!(
                            "Cannot assign {} to let variable '${name}' of type {}",
                            actual.name(),
                            ty.name()
                        ),
                    ));
                }
                *value = new_value;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_rejects_other_types() {
        let mut v = Variable::new_let(Value::I64(1));
        v.assign("a", Value::I64(2)).unwrap();
        let err = v.assign("a", Value::from("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::LetVariableTypeMismatch);
        assert!(v.value().loose_equals(&Value::I64(2)));
    }

    #[test]
    fn plain_accepts_anything() {
        let mut v = Variable::Plain(Value::I64(1));
        v.assign("a", Value::from("x")).unwrap();
        assert_eq!(v.value().as_str(), Some("x"));
    }
}
