//! Dot chains: members, method calls, indexers and class instantiation.
use std::sync::Arc;

use rcaron_core::{
    ChainKind, ChainLink, ClassDefinition, ClassInstance, FileScope, HostType, PosToken, RType, Value,
    Variable,
};
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span};
use smallvec::SmallVec;

use crate::Motor;
use crate::call::{Arg, bind_function};
use crate::frame::{ClassContext, FrameKind, StackFrame};
use crate::resolve::ResolvedMethod;

/// Memo key for host method resolution at one call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CallSiteKey {
    file: usize,
    span: Span,
    receiver: String,
    instance: bool,
    extensions: usize,
    args: SmallVec<[String; 4]>,
}

fn index_out_of_range(index: i64, len: usize) -> RCaronError {
    RCaronError::new(
        ErrorCode::IndexOutOfRange,
        format!("Index {index} is out of range for length {len}"),
    )
}

fn checked_index(index: i64, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| index_out_of_range(index, len))
}

fn cannot_set(name: &str, target: &Value) -> RCaronError {
    RCaronError::new(
        ErrorCode::CannotResolveInDotThing,
        format!("Cannot set '{name}' on a value of type {}", target.type_name()),
    )
}

fn no_index_setter(target: &Value) -> RCaronError {
    RCaronError::new(
        ErrorCode::NoSuitableIndexerImplementation,
        format!(
            "Cannot assign through an index on a value of type {}",
            target.type_name()
        ),
    )
}

fn positional_only(name: &str, args: Vec<Arg>) -> Result<Vec<Value>> {
    args.into_iter()
        .map(|arg| match arg {
            Arg::Positional(v) => Ok(v),
            Arg::Named(n, _) => Err(RCaronError::new(
                ErrorCode::NamedArgumentNotFound,
                format!("Method '{name}' does not take named argument '-{n}'"),
            )),
        })
        .collect()
}

impl Motor {
    pub(crate) fn eval_chain(&mut self, head: &PosToken, chain: &[ChainLink]) -> Result<Value> {
        let mut value = self.eval(head)?;
        for link in chain {
            value = self
                .apply_link(value, link)
                .map_err(|e| e.or_span(link.span))?;
        }
        Ok(value)
    }

    fn apply_link(&mut self, target: Value, link: &ChainLink) -> Result<Value> {
        match &link.kind {
            ChainKind::Member(name) => self.get_member(&target, name),
            ChainKind::Call { name, args } => self.call_member(&target, name, args, link.span),
            ChainKind::Index(index) => {
                let index = self.eval(index)?;
                self.index_get(target, &index)
            }
        }
    }

    /// Store `value` through the last link of a chain.
    pub(crate) fn assign_chain(&mut self, head: &PosToken, chain: &[ChainLink], value: Value) -> Result<()> {
        let Some((last, rest)) = chain.split_last() else {
            return self.assign_target(head, value);
        };
        let target = self.eval_chain(head, rest)?;
        let result = match &last.kind {
            ChainKind::Member(name) => self.set_member(&target, name, value),
            ChainKind::Index(index) => {
                let index = self.eval(index)?;
                self.index_set(&target, &index, value)
            }
            ChainKind::Call { name, .. } => Err(RCaronError::new(
                ErrorCode::InvalidOperation,
                format!("Cannot assign to the result of '{name}(...)'"),
            )),
        };
        result.map_err(|e| e.or_span(last.span))
    }

    pub fn get_member(&mut self, target: &Value, name: &str) -> Result<Value> {
        match target {
            Value::Type(RType::Class(class)) => {
                return match class.static_property_index(name) {
                    Some(i) => Ok(class.get_static(i).unwrap_or_default()),
                    None => Err(RCaronError::new(
                        ErrorCode::ClassStaticPropertyNotFound,
                        format!("Class '{}' has no static property '{name}'", class.name),
                    )),
                };
            }
            Value::Class(instance) => {
                return instance.get_property(name).ok_or_else(|| {
                    RCaronError::new(
                        ErrorCode::ClassPropertyNotFound,
                        format!("Class '{}' has no property '{name}'", instance.definition.name),
                    )
                });
            }
            Value::Host(host) => {
                if let Some(v) = host.get_member(name)? {
                    return Ok(v);
                }
            }
            Value::Type(ty) => {
                if let Some(host_type) = self.registry.host_type_for(ty) {
                    if let Some(method) = host_type.static_property(name) {
                        return (method.func)(None, &[]);
                    }
                }
            }
            _ => {}
        }

        // Parameterless instance methods double as properties (`$s.Length`).
        if !matches!(target, Value::Type(_) | Value::Null) {
            if let Some(ty) = self.registry.host_type_for(&target.runtime_type()) {
                if let Ok(resolved) = self.registry.resolve_method(name, &ty, Some(target), &[], &[]) {
                    return resolved.invoke(Some(target), &[]);
                }
            }
        }

        let mut value = target.clone();
        for accessor in self.accessors.clone() {
            if accessor.try_get(self, name, &mut value)? {
                return Ok(value);
            }
        }
        Err(RCaronError::new(
            ErrorCode::CannotResolveInDotThing,
            format!("Cannot resolve '{name}' on a value of type {}", target.type_name()),
        ))
    }

    pub fn set_member(&mut self, target: &Value, name: &str, value: Value) -> Result<()> {
        match target {
            Value::Type(RType::Class(class)) => match class.static_property_index(name) {
                Some(i) => {
                    class.set_static(i, value);
                    Ok(())
                }
                None => Err(RCaronError::new(
                    ErrorCode::ClassStaticPropertyNotFound,
                    format!("Class '{}' has no static property '{name}'", class.name),
                )),
            },
            Value::Class(instance) => match instance.definition.property_index(name) {
                Some(i) => {
                    instance.set(i, value);
                    Ok(())
                }
                None => Err(RCaronError::new(
                    ErrorCode::ClassPropertyNotFound,
                    format!("Class '{}' has no property '{name}'", instance.definition.name),
                )),
            },
            Value::Host(host) => {
                if host.set_member(name, value)? {
                    Ok(())
                } else {
                    Err(cannot_set(name, target))
                }
            }
            _ => Err(cannot_set(name, target)),
        }
    }

    fn call_member(&mut self, target: &Value, name: &str, args: &[PosToken], span: Span) -> Result<Value> {
        match target {
            Value::Type(RType::Class(class)) => {
                if name.eq_ignore_ascii_case("new") {
                    return self.instantiate(class, args, span);
                }
                let Some(function) = class.static_function(name).cloned() else {
                    return Err(RCaronError::new(
                        ErrorCode::ClassStaticFunctionNotFound,
                        format!("Class '{}' has no static function '{name}'", class.name),
                    ));
                };
                let owner = self.class_scope(class)?;
                let args = self.collect_args(args)?;
                let values = bind_function(&function, args)?;
                let ctx = ClassContext::Static(class.clone());
                return self.invoke_function(&function, owner, values, Some(ctx), span);
            }
            Value::Class(instance) => {
                let class = &instance.definition;
                if let Some(function) = class.function(name).cloned() {
                    let owner = match instance.scope.upgrade() {
                        Some(scope) => scope,
                        None => self.current_file_scope()?,
                    };
                    let args = self.collect_args(args)?;
                    let values = bind_function(&function, args)?;
                    let ctx = ClassContext::Instance(instance.clone());
                    return self.invoke_function(&function, owner, values, Some(ctx), span);
                }
                if name.eq_ignore_ascii_case("GetType") {
                    return Ok(Value::Type(RType::Class(class.clone())));
                }
                if name.eq_ignore_ascii_case("ToString") {
                    return Ok(Value::from(class.name.as_str()));
                }
                return Err(RCaronError::new(
                    ErrorCode::ClassFunctionNotFound,
                    format!("Class '{}' has no function '{name}'", class.name),
                ));
            }
            _ => {}
        }

        let args = self.collect_args(args)?;
        let values = positional_only(name, args)?;
        if let Value::Host(host) = target {
            if let Some(v) = host.invoke_member(name, &values)? {
                return Ok(v);
            }
        }
        match target {
            Value::Type(ty) => {
                let Some(host_type) = self.registry.host_type_for(ty) else {
                    return Err(RCaronError::new(
                        ErrorCode::TypeNotFound,
                        format!("Type '{}' has no callable members", ty.name()),
                    ));
                };
                let resolved = self.resolve_cached(name, &host_type, None, &values, span)?;
                resolved.invoke(None, &values)
            }
            _ => {
                if name.eq_ignore_ascii_case("GetType") && values.is_empty() {
                    return Ok(Value::Type(target.runtime_type()));
                }
                let Some(host_type) = self.registry.host_type_for(&target.runtime_type()) else {
                    return Err(RCaronError::new(
                        ErrorCode::CannotResolveInDotThing,
                        format!("Cannot call '{name}' on a value of type {}", target.type_name()),
                    ));
                };
                let resolved = self.resolve_cached(name, &host_type, Some(target), &values, span)?;
                resolved.invoke(Some(target), &values)
            }
        }
    }

    /// Method resolution memoized per call site and argument types.
    fn resolve_cached(
        &mut self,
        name: &str,
        receiver: &Arc<HostType>,
        instance: Option<&Value>,
        args: &[Value],
        span: Span,
    ) -> Result<ResolvedMethod> {
        let scope = self.current_file_scope()?;
        let extensions = scope.opened_extension_namespaces();
        let key = CallSiteKey {
            file: Arc::as_ptr(&scope) as usize,
            span,
            receiver: receiver.full_name(),
            instance: instance.is_some(),
            extensions: extensions.len(),
            args: args.iter().map(Value::type_name).collect(),
        };
        if let Some(hit) = self.method_cache.get(&key) {
            return Ok(hit.clone());
        }
        let resolved = self
            .registry
            .resolve_method(name, receiver, instance, args, &extensions)?;
        self.method_cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// File scope a class was declared in, as seen from the current file.
    fn class_scope(&self, class: &ClassDefinition) -> Result<Arc<FileScope>> {
        let scope = self.current_file_scope()?;
        Ok(scope
            .find_class(&class.name)
            .map(|(_, owner)| owner)
            .unwrap_or(scope))
    }

    /// `#Class:New(-prop value ...)`: run property initializers in
    /// declaration order, then apply named arguments to properties.
    fn instantiate(&mut self, class: &Arc<ClassDefinition>, args: &[PosToken], span: Span) -> Result<Value> {
        let args = self.collect_args(args)?;
        let owner = self.class_scope(class)?;
        let instance = Arc::new(ClassInstance::new(class.clone(), &owner));

        // Statics are visible; sibling properties only once declared.
        let ctx = ClassContext::Static(class.clone());
        let frame = StackFrame::new(FrameKind::Function { class: Some(ctx) }, owner, span);
        let base = self.stack.len();
        self.stack.push(frame);
        let initialized = self.run_initializers(&instance);
        self.stack.truncate(base);
        initialized?;

        for arg in args {
            match arg {
                Arg::Named(name, value) => match class.property_index(&name) {
                    Some(i) => {
                        instance.set(i, value);
                    }
                    None => {
                        return Err(RCaronError::new(
                            ErrorCode::ClassPropertyNotFound,
                            format!("Class '{}' has no property '{name}'", class.name),
                        ));
                    }
                },
                Arg::Positional(_) => {
                    return Err(RCaronError::new(
                        ErrorCode::LeftOverPositionalArgument,
                        format!("'{}' is constructed with named property arguments only", class.name),
                    ));
                }
            }
        }
        Ok(Value::Class(instance))
    }

    fn run_initializers(&mut self, instance: &ClassInstance) -> Result<()> {
        let class = &instance.definition;
        for (i, name) in class.property_names.iter().enumerate() {
            let value = match class.property_initializers.get(i) {
                Some(Some(token)) => self.eval(token)?,
                _ => Value::Null,
            };
            instance.set(i, value.clone());
            if let Some(frame) = self.stack.last_mut() {
                frame.scope.insert(name.clone(), Variable::Plain(value));
            }
        }
        Ok(())
    }

    pub fn index_get(&mut self, target: Value, index: &Value) -> Result<Value> {
        match (&target, index.as_i64()) {
            (Value::Array(items), Some(i)) => {
                let items = items.read();
                return Ok(items[checked_index(i, items.len())?].clone());
            }
            (Value::String(s), Some(i)) => {
                let count = s.chars().count();
                let at = checked_index(i, count)?;
                return Ok(s.chars().nth(at).map(Value::Char).unwrap_or_default());
            }
            (Value::Host(host), _) => {
                if let Some(v) = host.index(index)? {
                    return Ok(v);
                }
            }
            _ => {}
        }
        let type_name = target.type_name();
        let mut value = target;
        for indexer in self.indexers.clone() {
            if indexer.try_index(self, index, &mut value)? {
                return Ok(value);
            }
        }
        Err(RCaronError::new(
            ErrorCode::NoSuitableIndexerImplementation,
            format!("Cannot index a value of type {type_name} with {}", index.type_name()),
        ))
    }

    pub fn index_set(&mut self, target: &Value, index: &Value, value: Value) -> Result<()> {
        match (target, index.as_i64()) {
            (Value::Array(items), Some(i)) => {
                let mut items = items.write();
                let at = checked_index(i, items.len())?;
                items[at] = value;
                Ok(())
            }
            (Value::Host(host), _) => {
                if host.set_index(index, value)? {
                    Ok(())
                } else {
                    Err(no_index_setter(target))
                }
            }
            _ => Err(no_index_setter(target)),
        }
    }
}
