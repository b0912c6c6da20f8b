//! Type-name and overload resolution against host types.
use std::sync::Arc;

use parking_lot::RwLock;
use rcaron_core::{FileScope, HostMethod, HostType, MethodKind, RType, Value};
use rcaron_syntax::{ErrorCode, NumberKind, RCaronError, Result, find_best_match};
use rust_decimal::Decimal;
use smallvec::SmallVec;
use tracing::debug;

use crate::builtin::BuiltinTypes;

pub const SCORE_EXACT: u32 = 100;
pub const SCORE_ASSIGNABLE: u32 = 10;

#[derive(Clone, Copy)]
enum Primitive {
    Any,
    Bool,
    Char,
    String,
    Array,
    Range,
    Pipeline,
    Number(NumberKind),
}

static PRIMITIVE_NAMES: phf::Map<&'static str, Primitive> = phf::phf_map! {
    "object" => Primitive::Any,
    "any" => Primitive::Any,
    "bool" => Primitive::Bool,
    "boolean" => Primitive::Bool,
    "char" => Primitive::Char,
    "string" => Primitive::String,
    "array" => Primitive::Array,
    "range" => Primitive::Range,
    "pipeline" => Primitive::Pipeline,
    "int" => Primitive::Number(NumberKind::I32),
    "i32" => Primitive::Number(NumberKind::I32),
    "long" => Primitive::Number(NumberKind::I64),
    "i64" => Primitive::Number(NumberKind::I64),
    "uint" => Primitive::Number(NumberKind::U32),
    "u32" => Primitive::Number(NumberKind::U32),
    "ulong" => Primitive::Number(NumberKind::U64),
    "u64" => Primitive::Number(NumberKind::U64),
    "float" => Primitive::Number(NumberKind::F32),
    "f32" => Primitive::Number(NumberKind::F32),
    "double" => Primitive::Number(NumberKind::F64),
    "f64" => Primitive::Number(NumberKind::F64),
    "decimal" => Primitive::Number(NumberKind::Decimal),
};

impl Primitive {
    fn rtype(self) -> RType {
        match self {
            Primitive::Any => RType::Any,
            Primitive::Bool => RType::Bool,
            Primitive::Char => RType::Char,
            Primitive::String => RType::String,
            Primitive::Array => RType::Array,
            Primitive::Range => RType::Range,
            Primitive::Pipeline => RType::Pipeline,
            Primitive::Number(k) => RType::Number(k),
        }
    }
}

/// Host method picked for one call shape.
#[derive(Clone, Debug)]
pub struct ResolvedMethod {
    pub method: HostMethod,
    pub score: u32,
    /// At least one numeric argument must be widened to its parameter kind.
    pub needs_widening: bool,
    /// Static method found in an opened extension namespace; the receiver
    /// becomes its first argument.
    pub is_extension: bool,
}

impl ResolvedMethod {
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value> {
        let mut call_args: SmallVec<[Value; 4]> = SmallVec::new();
        if self.is_extension {
            if let Some(r) = receiver {
                call_args.push(r.clone());
            }
        }
        call_args.extend(args.iter().cloned());
        if self.needs_widening {
            for (value, param) in call_args.iter_mut().zip(&self.method.params) {
                if let RType::Number(kind) = param {
                    *value = widen(value, *kind);
                }
            }
        }
        let this = match self.method.kind {
            MethodKind::Instance if !self.is_extension => receiver,
            _ => None,
        };
        (self.method.func)(this, &call_args)
    }
}

/// Implicit numeric conversions accepted by overload scoring.
pub fn widens(from: NumberKind, to: NumberKind) -> bool {
    use NumberKind::*;
    matches!(
        (from, to),
        (I32, I64 | F32 | F64 | Decimal)
            | (U32, U64 | I64 | F32 | F64 | Decimal)
            | (I64 | U64, F32 | F64 | Decimal)
            | (F32, F64)
    )
}

fn as_f64(value: &Value) -> Option<f64> {
    Some(match *value {
        Value::I32(v) => v as f64,
        Value::I64(v) => v as f64,
        Value::U32(v) => v as f64,
        Value::U64(v) => v as f64,
        Value::F32(v) => v as f64,
        Value::F64(v) => v,
        _ => return None,
    })
}

/// Convert a number to a wider kind; anything else comes back unchanged.
pub fn widen(value: &Value, to: NumberKind) -> Value {
    let converted = match to {
        NumberKind::I64 => value.as_i64().map(Value::I64),
        NumberKind::U64 => match *value {
            Value::U32(v) => Some(Value::U64(v as u64)),
            _ => None,
        },
        NumberKind::F32 => as_f64(value).map(|v| Value::F32(v as f32)),
        NumberKind::F64 => as_f64(value).map(Value::F64),
        NumberKind::Decimal => match *value {
            Value::I32(v) => Some(Value::Decimal(Decimal::from(v))),
            Value::I64(v) => Some(Value::Decimal(Decimal::from(v))),
            Value::U32(v) => Some(Value::Decimal(Decimal::from(v))),
            Value::U64(v) => Some(Value::Decimal(Decimal::from(v))),
            Value::F32(_) | Value::F64(_) => as_f64(value)
                .and_then(|v| Decimal::try_from(v).ok())
                .map(Value::Decimal),
            _ => None,
        },
        NumberKind::I32 | NumberKind::U32 => None,
    };
    converted.unwrap_or_else(|| value.clone())
}

/// Score of one argument against one parameter, and whether it needs widening.
pub fn score_parameter(param: &RType, arg: &Value) -> (u32, bool) {
    let actual = arg.runtime_type();
    if *param == actual {
        return (SCORE_EXACT, false);
    }
    match param {
        RType::Any | RType::Generic {
            constraint: None, ..
        } => (SCORE_ASSIGNABLE, false),
        RType::Generic {
            constraint: Some(c),
            ..
        } => {
            if score_parameter(c, arg).0 > 0 {
                (SCORE_ASSIGNABLE, false)
            } else {
                (0, false)
            }
        }
        _ if arg.is_null() && param.is_nullable() => (SCORE_ASSIGNABLE, false),
        RType::Number(to) => match actual {
            RType::Number(from) if widens(from, *to) => (SCORE_ASSIGNABLE, true),
            _ => (0, false),
        },
        RType::Host(expected) => match arg {
            Value::Host(h) if h.host_type().derives_from(expected) => (SCORE_ASSIGNABLE, false),
            _ => (0, false),
        },
        _ => (0, false),
    }
}

/// Total score of a candidate. A single mismatch zeroes it; an empty
/// parameter list against no arguments beats everything.
pub fn score_candidate(params: &[RType], args: &[Value]) -> (u32, bool) {
    if params.len() != args.len() {
        return (0, false);
    }
    if params.is_empty() {
        return (u32::MAX, false);
    }
    let mut total = 0u32;
    let mut widening = false;
    for (param, arg) in params.iter().zip(args) {
        let (score, widen) = score_parameter(param, arg);
        if score == 0 {
            return (0, false);
        }
        total = total.saturating_add(score);
        widening |= widen;
    }
    (total, widening)
}

fn pick_best<'m>(
    candidates: impl IntoIterator<Item = &'m HostMethod>,
    args: &[Value],
) -> Option<(&'m HostMethod, u32, bool)> {
    let mut best: Option<(&HostMethod, u32, bool)> = None;
    for method in candidates {
        let (score, widening) = score_candidate(&method.params, args);
        if best.is_none_or(|(_, b, _)| score > b) {
            best = Some((method, score, widening));
        }
    }
    best
}

fn describe_args(args: &[Value]) -> String {
    args.iter()
        .map(|a| a.type_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Known host types plus the built-in primitive types.
pub struct TypeRegistry {
    types: RwLock<Vec<Arc<HostType>>>,
    builtins: BuiltinTypes,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let builtins = BuiltinTypes::new();
        Self {
            types: RwLock::new(builtins.all()),
            builtins,
        }
    }

    pub fn register(&self, ty: impl Into<Arc<HostType>>) -> Arc<HostType> {
        let ty = ty.into();
        self.types.write().push(ty.clone());
        ty
    }

    pub fn types(&self) -> Vec<Arc<HostType>> {
        self.types.read().clone()
    }

    /// Host type whose methods apply to values of `ty`.
    pub fn host_type_for(&self, ty: &RType) -> Option<Arc<HostType>> {
        match ty {
            RType::Host(h) => Some(h.clone()),
            other => self.builtins.for_type(other),
        }
    }

    /// Resolve a textual type name.
    ///
    /// Primitive names win. Host types are only searched when the name is
    /// qualified or some namespace was opened; short-name hits are cached on
    /// the file scope.
    pub fn resolve_type(&self, name: &str, scope: &FileScope) -> Option<RType> {
        if let Some(p) = PRIMITIVE_NAMES.get(name.to_ascii_lowercase().as_str()) {
            return Some(p.rtype());
        }
        let qualified = name.contains('.');
        if !qualified && !scope.has_opened_namespaces() {
            return None;
        }
        let types = self.types.read();
        if qualified {
            if let Some(t) = types.iter().find(|t| t.full_name().eq_ignore_ascii_case(name)) {
                return Some(RType::Host(t.clone()));
            }
        }
        if let Some(t) = scope.cached_type(name) {
            return Some(t);
        }
        for ns in scope.opened_namespaces() {
            let full = format!("{ns}.{name}");
            if let Some(t) = types.iter().find(|t| t.full_name().eq_ignore_ascii_case(&full)) {
                let ty = RType::Host(t.clone());
                scope.cache_type(name, ty.clone());
                return Some(ty);
            }
        }
        None
    }

    /// Pick the best-scoring method `name` on `receiver`.
    ///
    /// With `instance` set only instance methods are considered, falling back
    /// to static methods of types in `extension_namespaces` that take the
    /// receiver as first argument. Without it, static methods and (for `new`)
    /// constructors are considered. Ties keep the first candidate found.
    #[tracing::instrument(
        level = "debug",
        skip(self, receiver, instance, args, extension_namespaces),
        fields(receiver = %receiver.full_name(), args = args.len())
    )]
    pub fn resolve_method(
        &self,
        name: &str,
        receiver: &Arc<HostType>,
        instance: Option<&Value>,
        args: &[Value],
        extension_namespaces: &[String],
    ) -> Result<ResolvedMethod> {
        let is_new = name.eq_ignore_ascii_case("new");
        let wanted = |m: &HostMethod| {
            m.name.eq_ignore_ascii_case(name)
                && match m.kind {
                    MethodKind::Instance => instance.is_some(),
                    MethodKind::Static => instance.is_none(),
                    MethodKind::Constructor => instance.is_none() && is_new,
                }
        };

        let mut candidates: Vec<&HostMethod> = Vec::new();
        let mut known_names: Vec<&str> = Vec::new();
        let mut cur = Some(receiver.as_ref());
        while let Some(t) = cur {
            for m in &t.methods {
                known_names.push(&m.name);
                if wanted(m) {
                    candidates.push(m);
                }
            }
            cur = t.base.as_deref();
        }

        if !candidates.is_empty() {
            let found = candidates.len();
            return self.finish(name, receiver, pick_best(candidates, args), args, found, false);
        }

        if let Some(this) = instance {
            let types = self.types.read();
            let extensions: Vec<&HostMethod> = types
                .iter()
                .filter(|t| {
                    extension_namespaces
                        .iter()
                        .any(|ns| t.namespace.eq_ignore_ascii_case(ns))
                })
                .flat_map(|t| t.methods.iter())
                .filter(|m| m.kind == MethodKind::Static && m.name.eq_ignore_ascii_case(name))
                .collect();
            if !extensions.is_empty() {
                let mut full: Vec<Value> = Vec::with_capacity(args.len() + 1);
                full.push(this.clone());
                full.extend(args.iter().cloned());
                let found = extensions.len();
                let best = pick_best(extensions, &full);
                return self.finish(name, receiver, best, &full, found, true);
            }
        }

        let mut message = format!("Method '{name}' not found on {}", receiver.full_name());
        if let Some(suggestion) = find_best_match(name, known_names.iter().copied()) {
            message.push_str(&format!("; did you mean '{suggestion}'?"));
        }
        Err(RCaronError::new(ErrorCode::MethodNotFound, message))
    }

    fn finish(
        &self,
        name: &str,
        receiver: &Arc<HostType>,
        best: Option<(&HostMethod, u32, bool)>,
        args: &[Value],
        candidates: usize,
        is_extension: bool,
    ) -> Result<ResolvedMethod> {
        match best {
            Some((method, score, needs_widening)) if score > 0 => {
                debug!(method = name, candidates, score, is_extension, "resolved method");
                Ok(ResolvedMethod {
                    method: method.clone(),
                    score,
                    needs_widening,
                    is_extension,
                })
            }
            _ => Err(RCaronError::new(
                ErrorCode::MethodNoSuitableMatch,
                format!(
                    "No overload of '{name}' on {} accepts ({})",
                    receiver.full_name(),
                    describe_args(args)
                ),
            )),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_table() {
        assert!(widens(NumberKind::I32, NumberKind::I64));
        assert!(widens(NumberKind::U32, NumberKind::U64));
        assert!(!widens(NumberKind::I64, NumberKind::I32));
        assert!(!widens(NumberKind::I32, NumberKind::U32));
        assert!(!widens(NumberKind::F64, NumberKind::F32));
    }

    #[test]
    fn parameter_scores() {
        let i64_param = RType::Number(NumberKind::I64);
        assert_eq!(score_parameter(&i64_param, &Value::I64(1)), (SCORE_EXACT, false));
        assert_eq!(score_parameter(&i64_param, &Value::I32(1)), (SCORE_ASSIGNABLE, true));
        assert_eq!(score_parameter(&i64_param, &Value::from("x")), (0, false));
        assert_eq!(score_parameter(&RType::String, &Value::Null), (SCORE_ASSIGNABLE, false));
        assert_eq!(score_parameter(&RType::Any, &Value::Bool(true)), (SCORE_ASSIGNABLE, false));
    }

    #[test]
    fn generic_parameter_scores() {
        let open = RType::Generic {
            name: "T".to_string(),
            constraint: None,
        };
        let numeric = RType::Generic {
            name: "T".to_string(),
            constraint: Some(Box::new(RType::Number(NumberKind::I64))),
        };
        assert_eq!(score_parameter(&open, &Value::from("x")), (SCORE_ASSIGNABLE, false));
        assert_eq!(score_parameter(&numeric, &Value::I64(1)), (SCORE_ASSIGNABLE, false));
        assert_eq!(score_parameter(&numeric, &Value::I32(1)), (SCORE_ASSIGNABLE, false));
        assert_eq!(score_parameter(&numeric, &Value::from("x")), (0, false));
        assert_eq!(
            score_candidate(&[numeric, RType::String], &[Value::I64(1), Value::from("s")]),
            (SCORE_ASSIGNABLE + SCORE_EXACT, false)
        );
    }

    #[test]
    fn empty_parameter_list_scores_highest() {
        assert_eq!(score_candidate(&[], &[]), (u32::MAX, false));
        assert_eq!(score_candidate(&[], &[Value::Null]).0, 0);
    }

    #[test]
    fn widen_keeps_value() {
        assert!(matches!(widen(&Value::I32(7), NumberKind::I64), Value::I64(7)));
        assert!(matches!(widen(&Value::I32(7), NumberKind::F64), Value::F64(v) if v == 7.0));
        assert!(matches!(widen(&Value::from("s"), NumberKind::F64), Value::String(_)));
    }
}
