//! Host modules: named bundles of callables the engine dispatches bare calls to.
use std::sync::Arc;

use indexmap::IndexMap;
use rcaron_core::{Pipeline, PosToken, Value};
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span};

use crate::Motor;
use crate::call::{Arg, ParamSpec, bind_arguments};

/// How a call was written in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallShape {
    /// `Name`
    Bare,
    /// `Name(a, b)`
    Parenthesized,
    /// `Name a b -Flag v`
    Shell,
}

#[derive(Clone, Debug)]
pub struct CallContext {
    pub shape: CallShape,
    /// Set when the call is the right-hand side of `|`.
    pub pipeline: Option<Arc<Pipeline>>,
    /// Set when the result feeds another call through `|`.
    pub is_left_of_pipeline: bool,
    pub span: Span,
}

impl CallContext {
    pub fn new(shape: CallShape, span: Span) -> Self {
        Self {
            shape,
            pipeline: None,
            is_left_of_pipeline: false,
            span,
        }
    }
}

pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// Run method `name`. `Ok(None)` means this module has no such method
    /// and the next module should be tried.
    fn run(
        &self,
        name: &str,
        motor: &mut Motor,
        args: &[PosToken],
        ctx: &CallContext,
    ) -> Result<Option<Value>>;

    /// Method names offered for "did you mean" hints.
    fn method_names(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Clone, Debug)]
pub struct ModuleParam {
    pub name: String,
    pub default: Option<Value>,
    /// Receives the incoming pipeline when called on the right of `|`.
    pub from_pipeline: bool,
}

impl ModuleParam {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            from_pipeline: false,
        }
    }

    pub fn optional(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
            from_pipeline: false,
        }
    }

    pub fn pipeline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            from_pipeline: true,
        }
    }
}

pub type ModuleFn = Arc<dyn Fn(&mut Motor, &[Value], &CallContext) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub struct ModuleMethod {
    pub name: String,
    pub params: Vec<ModuleParam>,
    /// Takes every positional argument as-is; named arguments are rejected.
    pub variadic: bool,
    pub body: ModuleFn,
}

impl ModuleMethod {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ModuleParam>,
        body: impl Fn(&mut Motor, &[Value], &CallContext) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            variadic: false,
            body: Arc::new(body),
        }
    }

    pub fn variadic(
        name: impl Into<String>,
        body: impl Fn(&mut Motor, &[Value], &CallContext) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            variadic: true,
            body: Arc::new(body),
        }
    }

    fn bind(&self, args: Vec<Arg>, ctx: &CallContext) -> Result<Vec<Value>> {
        if self.variadic {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Arg::Positional(v) => values.push(v),
                    Arg::Named(name, _) => {
                        return Err(RCaronError::new(
                            ErrorCode::NamedArgumentNotFound,
                            format!("'{}' takes no named argument '-{name}'", self.name),
                        ));
                    }
                }
            }
            return Ok(values);
        }
        let specs: Vec<ParamSpec<'_>> = self
            .params
            .iter()
            .map(|p| ParamSpec {
                name: &p.name,
                default: p.default.clone(),
                from_pipeline: p.from_pipeline,
            })
            .collect();
        bind_arguments(&self.name, &specs, args, ctx.pipeline.as_ref())
    }
}

/// Case-insensitive name to method map.
#[derive(Clone, Default)]
pub struct MethodTable {
    methods: IndexMap<String, ModuleMethod>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, method: ModuleMethod) -> &mut Self {
        self.methods.insert(method.name.to_ascii_lowercase(), method);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModuleMethod> {
        self.methods.get(&name.to_ascii_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.values().map(|m| m.name.as_str())
    }
}

/// [`Module`] backed by a [`MethodTable`], binding arguments the same way
/// script functions do.
pub struct TableModule {
    name: String,
    methods: MethodTable,
}

impl TableModule {
    pub fn new(name: impl Into<String>, methods: MethodTable) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }
}

impl Module for TableModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &self,
        name: &str,
        motor: &mut Motor,
        args: &[PosToken],
        ctx: &CallContext,
    ) -> Result<Option<Value>> {
        let Some(method) = self.methods.get(name) else {
            return Ok(None);
        };
        let args = motor.collect_args(args)?;
        let values = method.bind(args, ctx)?;
        (method.body)(motor, &values, ctx).map(Some)
    }

    fn method_names(&self) -> Vec<String> {
        self.methods.names().map(str::to_string).collect()
    }
}
