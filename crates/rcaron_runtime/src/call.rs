//! Call dispatch and argument binding.
use std::sync::Arc;

use rcaron_core::{FileScope, Function, Pipeline, PosToken, PosTokenKind, Value, Variable};
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span, find_best_match};
use smallvec::{SmallVec, smallvec};
use tracing::{debug, instrument};

use crate::Motor;
use crate::exec::Flow;
use crate::frame::{ClassContext, FrameKind, StackFrame};
use crate::module::CallContext;

/// Evaluated call argument.
#[derive(Clone, Debug)]
pub enum Arg {
    Positional(Value),
    /// `-Name value`; a lone `-Name` carries `$true`.
    Named(String, Value),
}

pub(crate) struct ParamSpec<'a> {
    pub(crate) name: &'a str,
    pub(crate) default: Option<Value>,
    pub(crate) from_pipeline: bool,
}

/// Match arguments to parameters.
///
/// Named arguments bind first by case-insensitive name, then positional
/// arguments fill the remaining slots left to right, then defaults fill
/// whatever is still empty. A pipeline parameter takes `pipeline` when one
/// is given.
pub(crate) fn bind_arguments(
    callee: &str,
    params: &[ParamSpec<'_>],
    args: Vec<Arg>,
    pipeline: Option<&Arc<Pipeline>>,
) -> Result<Vec<Value>> {
    let mut slots: SmallVec<[Option<Value>; 8]> = smallvec![None; params.len()];
    if let Some(pipeline) = pipeline {
        if let Some(i) = params.iter().position(|p| p.from_pipeline) {
            slots[i] = Some(Value::Pipeline(pipeline.clone()));
        }
    }

    let mut positional: SmallVec<[Value; 8]> = SmallVec::new();
    for arg in args {
        match arg {
            Arg::Positional(v) => positional.push(v),
            Arg::Named(name, v) => {
                let Some(i) = params.iter().position(|p| p.name.eq_ignore_ascii_case(&name)) else {
                    let mut message = format!("'{callee}' has no parameter named '{name}'");
                    if let Some(s) = find_best_match(&name, params.iter().map(|p| p.name)) {
                        message.push_str(&format!("; did you mean '{s}'?"));
                    }
                    return Err(RCaronError::new(ErrorCode::NamedArgumentNotFound, message));
                };
                slots[i] = Some(v);
            }
        }
    }

    let mut next = 0;
    for value in positional {
        while next < slots.len() && slots[next].is_some() {
            next += 1;
        }
        if next == slots.len() {
            return Err(RCaronError::new(
                ErrorCode::LeftOverPositionalArgument,
                format!("Too many positional arguments for '{callee}'"),
            ));
        }
        slots[next] = Some(value);
        next += 1;
    }

    let mut values = Vec::with_capacity(slots.len());
    for (slot, param) in slots.into_iter().zip(params) {
        match slot.or_else(|| param.default.clone()) {
            Some(v) => values.push(v),
            None => {
                return Err(RCaronError::new(
                    ErrorCode::ArgumentsLeftUnassigned,
                    format!("Parameter '{}' of '{callee}' was not assigned", param.name),
                ));
            }
        }
    }
    Ok(values)
}

pub(crate) fn bind_function(function: &Function, args: Vec<Arg>) -> Result<Vec<Value>> {
    let specs: SmallVec<[ParamSpec<'_>; 8]> = function
        .params
        .iter()
        .map(|p| ParamSpec {
            name: &p.name,
            default: p.default.as_ref().map(Value::from),
            from_pipeline: false,
        })
        .collect();
    bind_arguments(&function.name, &specs, args, None)
}

impl Motor {
    /// Evaluate call arguments left to right.
    pub fn collect_args(&mut self, args: &[PosToken]) -> Result<Vec<Arg>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(match &arg.kind {
                PosTokenKind::NamedArg { name, value } => Arg::Named(name.clone(), self.eval(value)?),
                _ => Arg::Positional(self.eval(arg)?),
            });
        }
        Ok(out)
    }

    /// Bare call: functions of the active class, then script functions, then
    /// override modules, then ordinary modules.
    pub(crate) fn call_named(&mut self, name: &str, args: &[PosToken], ctx: &CallContext) -> Result<Value> {
        if ctx.pipeline.is_none() {
            if let Some(class_ctx) = self.class_context() {
                let class = class_ctx.definition().clone();
                let (function, call_ctx) = match (&class_ctx, class.function(name)) {
                    (ClassContext::Instance(_), Some(f)) => (Some(f.clone()), class_ctx.clone()),
                    _ => (
                        class.static_function(name).cloned(),
                        ClassContext::Static(class.clone()),
                    ),
                };
                if let Some(function) = function {
                    let owner = self.current_file_scope()?;
                    let args = self.collect_args(args)?;
                    let values = bind_function(&function, args)?;
                    return self.invoke_function(&function, owner, values, Some(call_ctx), ctx.span);
                }
            }
            let scope = self.current_file_scope()?;
            if let Some((function, owner)) = scope.find_function(name) {
                let args = self.collect_args(args)?;
                let values = bind_function(&function, args)?;
                return self.invoke_function(&function, owner, values, None, ctx.span);
            }
        }
        if let Some(value) = self.call_module(name, args, ctx)? {
            return Ok(value);
        }
        let scope = self.current_file_scope()?;
        Err(self.method_not_found(name, &scope))
    }

    /// Offer the call to override modules, then ordinary modules.
    pub(crate) fn call_module(
        &mut self,
        name: &str,
        args: &[PosToken],
        ctx: &CallContext,
    ) -> Result<Option<Value>> {
        let total = self.override_modules.len() + self.modules.len();
        for i in 0..total {
            let module = match i.checked_sub(self.override_modules.len()) {
                None => self.override_modules[i].clone(),
                Some(j) => self.modules[j].clone(),
            };
            if let Some(value) = module.run(name, self, args, ctx)? {
                return Ok(Some(value));
            }
        }
        debug!(name, modules = total, "no module handled call");
        Ok(None)
    }

    pub(crate) fn method_not_found(&self, name: &str, scope: &FileScope) -> RCaronError {
        let mut candidates = scope.visible_function_names();
        for module in self.override_modules.iter().chain(&self.modules) {
            candidates.extend(module.method_names());
        }
        let mut message = format!("Method '{name}' not found");
        if let Some(s) = find_best_match(name, candidates.iter().map(String::as_str)) {
            message.push_str(&format!("; did you mean '{s}'?"));
        }
        RCaronError::new(ErrorCode::MethodNotFound, message)
    }

    /// Run a script function body in a new function frame.
    #[instrument(level = "trace", skip_all, fields(function = %function.name))]
    pub(crate) fn invoke_function(
        &mut self,
        function: &Arc<Function>,
        owner: Arc<FileScope>,
        values: Vec<Value>,
        class: Option<ClassContext>,
        span: Span,
    ) -> Result<Value> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(RCaronError::at(
                ErrorCode::RecursionLimitExceeded,
                format!(
                    "Call depth limit of {} exceeded calling '{}'",
                    self.options.max_call_depth, function.name
                ),
                span,
            ));
        }
        let mut frame = StackFrame::new(FrameKind::Function { class }, owner, span);
        for (param, value) in function.params.iter().zip(values) {
            frame.scope.insert(param.name.clone(), Variable::Plain(value));
        }
        let base = self.stack.len();
        self.stack.push(frame);
        self.call_depth += 1;
        let flow = self.exec_lines(&function.body.lines);
        self.call_depth -= 1;
        self.stack.truncate(base);
        match flow? {
            Flow::Return(v) => Ok(v),
            Flow::Next => Ok(Value::Null),
            Flow::Break | Flow::Continue => Err(RCaronError::new(
                ErrorCode::BreakOutsideLoop,
                format!("break or continue escaped function '{}'", function.name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, default: Option<Value>) -> ParamSpec<'_> {
        ParamSpec {
            name,
            default,
            from_pipeline: false,
        }
    }

    #[test]
    fn named_then_positional() {
        let params = [spec("a", None), spec("b", Some(Value::I64(2)))];
        let bound = bind_arguments(
            "f",
            &params,
            vec![Arg::Named("B".into(), Value::I64(5)), Arg::Positional(Value::I64(1))],
            None,
        )
        .unwrap();
        assert_eq!(bound, vec![Value::I64(1), Value::I64(5)]);
    }

    #[test]
    fn binding_errors() {
        let params = [spec("a", None)];
        let err = bind_arguments("f", &params, vec![], None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ArgumentsLeftUnassigned);
        let err = bind_arguments(
            "f",
            &params,
            vec![Arg::Positional(Value::Null), Arg::Positional(Value::Null)],
            None,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::LeftOverPositionalArgument);
        let err = bind_arguments("f", &params, vec![Arg::Named("zz".into(), Value::Null)], None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NamedArgumentNotFound);
    }

    #[test]
    fn pipeline_parameter_is_skipped_by_positionals() {
        let params = [
            ParamSpec {
                name: "items",
                default: None,
                from_pipeline: true,
            },
            spec("limit", None),
        ];
        let pipe = Arc::new(Pipeline::single(Value::Null));
        let bound = bind_arguments("f", &params, vec![Arg::Positional(Value::I64(3))], Some(&pipe))
            .unwrap();
        assert!(matches!(bound[0], Value::Pipeline(_)));
        assert_eq!(bound[1], Value::I64(3));
    }
}
