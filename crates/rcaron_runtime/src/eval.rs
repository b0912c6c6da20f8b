//! Expression evaluation and variable lookup.
use std::sync::Arc;

use rcaron_core::{Pipeline, PosToken, PosTokenKind, RType, Value, Variable, ops};
use rcaron_syntax::{ErrorCode, Operation, RCaronError, Result, find_best_match};
use smallvec::SmallVec;

use crate::Motor;
use crate::frame::ClassContext;
use crate::module::{CallContext, CallShape};

/// Values produced by `foreach` and pipeline consumers.
pub type ValueIter = Box<dyn Iterator<Item = Result<Value>> + Send>;

fn precedence(op: Operation) -> u8 {
    match op {
        Operation::Range => 0,
        Operation::Add | Operation::Subtract => 1,
        _ => 2,
    }
}

fn apply(values: &mut SmallVec<[Value; 8]>, op: Operation) -> Result<()> {
    let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
        return Err(RCaronError::new(
            ErrorCode::InvalidOperation,
            format!("Operator '{}' is missing an operand", op.as_str()),
        ));
    };
    values.push(ops::arithmetic(op, &left, &right)?);
    Ok(())
}

/// Name, arguments and shape of a token that denotes a call.
pub(crate) fn call_parts(token: &PosToken) -> Option<(&str, &[PosToken], CallShape)> {
    match &token.kind {
        PosTokenKind::Keyword(name) => Some((name.as_str(), &[][..], CallShape::Bare)),
        PosTokenKind::KeywordCall { name, args } => {
            Some((name.as_str(), args.as_slice(), CallShape::Parenthesized))
        }
        PosTokenKind::ShellCall { name, args } => Some((name.as_str(), args.as_slice(), CallShape::Shell)),
        _ => None,
    }
}

impl Motor {
    /// Evaluate one expression. Errors without a span get the token's.
    pub(crate) fn eval(&mut self, token: &PosToken) -> Result<Value> {
        self.eval_inner(token).map_err(|e| e.or_span(token.span))
    }

    fn eval_inner(&mut self, token: &PosToken) -> Result<Value> {
        match &token.kind {
            PosTokenKind::Variable(name) => self.lookup(name),
            PosTokenKind::Constant(c) => Ok(Value::from(c)),
            PosTokenKind::ExternThing(name) => self.resolve_extern(name),
            PosTokenKind::Keyword(_)
            | PosTokenKind::KeywordCall { .. }
            | PosTokenKind::ShellCall { .. } => {
                let Some((name, args, shape)) = call_parts(token) else {
                    return Ok(Value::Null);
                };
                self.call_named(name, args, &CallContext::new(shape, token.span))
            }
            PosTokenKind::Group(inner) => self.eval(inner),
            PosTokenKind::DotGroup { head, chain } => self.eval_chain(head, chain),
            PosTokenKind::Math(items) => self.eval_math(items),
            PosTokenKind::Comparison { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Ok(Value::Bool(ops::compare(*op, &l, &r)?))
            }
            PosTokenKind::Logical { op, left, right } => {
                let l = self.condition(left)?;
                Ok(Value::Bool(match op {
                    Operation::And if !l => false,
                    Operation::Or if l => true,
                    _ => self.condition(right)?,
                }))
            }
            PosTokenKind::Not(inner) => Ok(Value::Bool(!self.condition(inner)?)),
            PosTokenKind::Negate(inner) => ops::negate(&self.eval(inner)?),
            PosTokenKind::Pipeline { left, right } => self.eval_pipeline(left, right, false),
            PosTokenKind::NamedArg { name, .. } => {
                Err(RCaronError::new(
                    ErrorCode::InvalidOperation,
                    format!("Named argument '-{name}' outside of a call"),
                ))
            }
            PosTokenKind::Operation(op) => Err(RCaronError::new(
                ErrorCode::InvalidOperation,
                format!("Unexpected operator '{}'", op.as_str()),
            )),
        }
    }

    /// Flat operator list, `* / %` before `+ -` before `..`, left to right.
    fn eval_math(&mut self, items: &[PosToken]) -> Result<Value> {
        let mut values: SmallVec<[Value; 8]> = SmallVec::new();
        let mut pending: SmallVec<[Operation; 8]> = SmallVec::new();
        for item in items {
            match item.operation() {
                Some(op) => {
                    while let Some(&top) = pending.last() {
                        if precedence(top) < precedence(op) {
                            break;
                        }
                        pending.pop();
                        apply(&mut values, top)?;
                    }
                    pending.push(op);
                }
                None => values.push(self.eval(item)?),
            }
        }
        while let Some(op) = pending.pop() {
            apply(&mut values, op)?;
        }
        match (values.pop(), values.is_empty()) {
            (Some(v), true) => Ok(v),
            _ => Err(RCaronError::new(
                ErrorCode::InvalidOperation,
                "Malformed arithmetic expression",
            )),
        }
    }

    /// `left | right`. The right side must be a module method; it gets the
    /// left value as a pipeline, wrapping non-pipeline values as a single item.
    fn eval_pipeline(&mut self, left: &PosToken, right: &PosToken, left_of_pipeline: bool) -> Result<Value> {
        let source = self.pipeline_source(left)?;
        let Some((name, args, shape)) = call_parts(right) else {
            return Err(RCaronError::at(
                ErrorCode::InvalidPipelineUse,
                "The right side of '|' must be a call",
                right.span,
            ));
        };
        let ctx = CallContext {
            shape,
            pipeline: Some(source),
            is_left_of_pipeline: left_of_pipeline,
            span: right.span,
        };
        match self.call_module(name, args, &ctx)? {
            Some(value) => Ok(value),
            None => Err(RCaronError::at(
                ErrorCode::InvalidPipelineUse,
                format!("No module method '{name}' to receive the pipeline"),
                right.span,
            )),
        }
    }

    fn pipeline_source(&mut self, left: &PosToken) -> Result<Arc<Pipeline>> {
        let value = match &left.kind {
            PosTokenKind::Pipeline { left: l, right: r } => self.eval_pipeline(l, r, true)?,
            _ => match call_parts(left) {
                Some((name, args, shape)) => {
                    let mut ctx = CallContext::new(shape, left.span);
                    ctx.is_left_of_pipeline = true;
                    self.call_named(name, args, &ctx)
                        .map_err(|e| e.or_span(left.span))?
                }
                None => self.eval(left)?,
            },
        };
        Ok(match value {
            Value::Pipeline(p) => p,
            other => Arc::new(Pipeline::single(other)),
        })
    }

    /// `#Name`: a script class visible from the current file, else a host
    /// or primitive type.
    fn resolve_extern(&mut self, name: &str) -> Result<Value> {
        let scope = self.current_file_scope()?;
        if let Some((class, _)) = scope.find_class(name) {
            return Ok(Value::Type(RType::Class(class)));
        }
        match self.registry.resolve_type(name, &scope) {
            Some(ty) => Ok(Value::Type(ty)),
            None => Err(RCaronError::new(
                ErrorCode::TypeNotFound,
                format!("Type '{name}' not found"),
            )),
        }
    }

    pub fn iterate(&self, value: &Value) -> Result<ValueIter> {
        Ok(match value {
            Value::Pipeline(p) => Box::new(p.take_enumerator()?),
            Value::Array(items) => Box::new(items.read().clone().into_iter().map(Ok)),
            Value::Range(start, end) => Box::new((*start..*end).map(|i| Ok(Value::I64(i)))),
            Value::String(s) => {
                let chars: Vec<Value> = s.chars().map(Value::Char).collect();
                Box::new(chars.into_iter().map(Ok))
            }
            Value::Host(h) => match h.iterate() {
                Some(iter) => iter,
                None => return Err(not_iterable(value)),
            },
            other => return Err(not_iterable(other)),
        })
    }

    /// Index of the frame holding `name`, searching no further than the
    /// innermost function frame.
    fn variable_frame(&self, name: &str) -> Option<usize> {
        for (i, frame) in self.stack.iter().enumerate().rev() {
            if frame.scope.contains_key(name) {
                return Some(i);
            }
            if frame.is_return_worthy() {
                return None;
            }
        }
        None
    }

    /// Class exposed by the innermost function frame.
    pub(crate) fn class_context(&self) -> Option<ClassContext> {
        let frame = self.stack.iter().rev().find(|f| f.is_return_worthy())?;
        frame.class_context().cloned()
    }

    pub(crate) fn lookup_variable(&self, name: &str) -> Option<Value> {
        if let Some(i) = self.variable_frame(name) {
            return self.stack[i].scope.get(name).map(|v| v.value().clone());
        }
        let ctx = self.class_context()?;
        match &ctx {
            ClassContext::Instance(instance) if name == "this" => {
                return Some(Value::Class(instance.clone()));
            }
            ClassContext::Instance(instance) => {
                if let Some(v) = instance.get_property(name) {
                    return Some(v);
                }
            }
            ClassContext::Static(_) => {}
        }
        let class = ctx.definition();
        class
            .static_property_index(name)
            .and_then(|i| class.get_static(i))
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<Value> {
        if let Some(v) = self.lookup_variable(name) {
            return Ok(v);
        }
        let visible = self.visible_variable_names();
        let mut message = format!("Variable '${name}' not found");
        if let Some(s) = find_best_match(name, visible.iter().map(String::as_str)) {
            message.push_str(&format!("; did you mean '${s}'?"));
        }
        Err(RCaronError::new(ErrorCode::VariableNotFound, message))
    }

    fn visible_variable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for frame in self.stack.iter().rev() {
            names.extend(frame.scope.keys().cloned());
            if frame.is_return_worthy() {
                break;
            }
        }
        if let Some(ctx) = self.class_context() {
            let class = ctx.definition();
            names.extend(class.property_names.iter().cloned());
            names.extend(class.static_property_names.iter().cloned());
        }
        names
    }

    /// Assign to an existing variable or class slot, else create a plain
    /// variable in the innermost frame.
    pub(crate) fn assign_variable(&mut self, name: &str, value: Value) -> Result<()> {
        if let Some(i) = self.variable_frame(name) {
            if let Some(var) = self.stack[i].scope.get_mut(name) {
                return var.assign(name, value);
            }
        }
        if let Some(ctx) = self.class_context() {
            if let ClassContext::Instance(instance) = &ctx {
                if let Some(i) = instance.definition.property_index(name) {
                    instance.set(i, value);
                    return Ok(());
                }
            }
            let class = ctx.definition();
            if let Some(i) = class.static_property_index(name) {
                class.set_static(i, value);
                return Ok(());
            }
        }
        match self.stack.last_mut() {
            Some(frame) => {
                frame.scope.insert(name.to_string(), Variable::Plain(value));
                Ok(())
            }
            None => Err(RCaronError::new(
                ErrorCode::InvalidOperation,
                "No script is running on this motor",
            )),
        }
    }
}

fn not_iterable(value: &Value) -> RCaronError {
    RCaronError::new(
        ErrorCode::InvalidOperation,
        format!("Cannot iterate over a value of type {}", value.type_name()),
    )
}
