//! Runtime types and the host interop capability.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rcaron_syntax::{NumberKind, Result};

use crate::{ClassDefinition, Value};

/// Native callable behind a host method.
///
/// Receives the receiver (`None` for static methods and constructors) and
/// arguments already converted to the declared parameter types.
pub type HostFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Instance,
    Static,
    Constructor,
}

#[derive(Clone)]
pub struct HostMethod {
    pub name: String,
    pub kind: MethodKind,
    pub params: Vec<RType>,
    pub func: HostFn,
}

impl HostMethod {
    pub fn new(
        name: impl Into<String>,
        kind: MethodKind,
        params: Vec<RType>,
        func: impl Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMethod")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish()
    }
}

/// Type exposed by the host: a namespace-qualified name, an optional base and
/// a method table consumed by method resolution.
#[derive(Debug)]
pub struct HostType {
    pub namespace: String,
    pub name: String,
    pub base: Option<Arc<HostType>>,
    pub methods: Vec<HostMethod>,
}

impl HostType {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            base: None,
            methods: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: Arc<HostType>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_method(mut self, method: HostMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Parameterless static method read as a property (`#Type:Name`).
    pub fn static_property(&self, name: &str) -> Option<&HostMethod> {
        let mut cur = Some(self);
        while let Some(t) = cur {
            let found = t.methods.iter().find(|m| {
                m.kind == MethodKind::Static && m.params.is_empty() && m.name.eq_ignore_ascii_case(name)
            });
            if found.is_some() {
                return found;
            }
            cur = t.base.as_deref();
        }
        None
    }

    /// `self` is `other` or derives from it.
    pub fn derives_from(&self, other: &HostType) -> bool {
        let mut cur = Some(self);
        while let Some(t) = cur {
            if std::ptr::eq(t, other) {
                return true;
            }
            cur = t.base.as_deref();
        }
        false
    }
}

/// Runtime type of a value, or a parameter type of a host method.
#[derive(Clone, Debug)]
pub enum RType {
    Null,
    /// Accepts every value.
    Any,
    Bool,
    Char,
    Number(NumberKind),
    String,
    Array,
    Range,
    Pipeline,
    Error,
    Type,
    Class(Arc<ClassDefinition>),
    Host(Arc<HostType>),
    /// Open generic parameter, optionally constrained to a base type.
    Generic {
        name: String,
        constraint: Option<Box<RType>>,
    },
}

impl RType {
    pub fn name(&self) -> String {
        match self {
            RType::Null => "null".to_string(),
            RType::Any => "any".to_string(),
            RType::Bool => "bool".to_string(),
            RType::Char => "char".to_string(),
            RType::Number(k) => k.name().to_string(),
            RType::String => "string".to_string(),
            RType::Array => "array".to_string(),
            RType::Range => "range".to_string(),
            RType::Pipeline => "pipeline".to_string(),
            RType::Error => "error".to_string(),
            RType::Type => "type".to_string(),
            RType::Class(c) => c.name.clone(),
            RType::Host(h) => h.full_name(),
            RType::Generic { name, .. } => name.clone(),
        }
    }

    /// Reference-like types accept `$null`.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            RType::Any
                | RType::String
                | RType::Array
                | RType::Pipeline
                | RType::Error
                | RType::Type
                | RType::Class(_)
                | RType::Host(_)
                | RType::Generic { .. }
        )
    }
}

impl PartialEq for RType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RType::Number(a), RType::Number(b)) => a == b,
            (RType::Class(a), RType::Class(b)) => Arc::ptr_eq(a, b),
            (RType::Host(a), RType::Host(b)) => Arc::ptr_eq(a, b),
            (
                RType::Generic { name: a, constraint: ca },
                RType::Generic { name: b, constraint: cb },
            ) => a == b && ca == cb,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Host object reachable from scripts.
///
/// Member access, indexing and iteration are tried here first; method calls
/// not answered by `invoke_member` fall back to resolving against
/// `host_type().methods`.
pub trait HostObject: Send + Sync {
    fn host_type(&self) -> Arc<HostType>;

    fn as_any(&self) -> &dyn Any;

    fn get_member(&self, _name: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    /// `Ok(false)` when the member does not exist.
    fn set_member(&self, _name: &str, _value: Value) -> Result<bool> {
        Ok(false)
    }

    fn invoke_member(&self, _name: &str, _args: &[Value]) -> Result<Option<Value>> {
        Ok(None)
    }

    fn index(&self, _index: &Value) -> Result<Option<Value>> {
        Ok(None)
    }

    fn set_index(&self, _index: &Value, _value: Value) -> Result<bool> {
        Ok(false)
    }

    fn iterate(&self) -> Option<Box<dyn Iterator<Item = Result<Value>> + Send>> {
        None
    }

    fn display(&self) -> String {
        self.host_type().full_name()
    }
}
