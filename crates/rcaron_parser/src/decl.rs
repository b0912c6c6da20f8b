//! `func` and `class` declarations.
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rcaron_core::{ClassDefinition, Constant, Function, Parameter, PosToken, Value};
use rcaron_syntax::{ErrorCode, Operation, RCaronError, Result, Span, Token, TokenKind};
use tracing::warn;

use crate::Parser;
use crate::constant::fold_constant;
use crate::expr::{Built, Invalid, build_expression, span_of, split_on};
use crate::group::{Raw, RawItem};
use crate::lines::{block_items, built, is_keyword, split_statements};

fn variable_name(item: &RawItem) -> Option<&str> {
    item.token()
        .filter(|t| t.kind == TokenKind::Variable)
        .and_then(Token::name)
}

fn is_assign(item: &RawItem) -> bool {
    item.token().and_then(Token::op) == Some(Operation::Assign)
}

impl Parser<'_> {
    /// `Name(params) { body }` following the `func` keyword.
    pub(crate) fn parse_function(&mut self, rest: &[RawItem], span: Span) -> Result<Built<Function>> {
        let (name_item, params, body) = match rest {
            [
                name,
                RawItem {
                    raw: Raw::Paren(params),
                    ..
                },
                body,
            ] => (name, params.as_slice(), body),
            [name, body] => (name, &[][..], body),
            _ => return Ok(Err(Invalid::new(span, "Expected `func Name($a, $b = 1) { ... }`"))),
        };
        let Some(name) = name_item.keyword() else {
            return Ok(Err(Invalid::new(name_item.span, "Expected a function name")));
        };
        if !body.is_block() {
            return Ok(Err(Invalid::new(body.span, "Expected the function body")));
        }
        let name = name.to_string();
        let params = built!(self.parse_parameters(params)?);
        let body = self.parse_block(body)?;
        Ok(Ok(Function {
            name,
            span,
            params,
            body,
        }))
    }

    fn parse_parameters(&mut self, items: &[RawItem]) -> Result<Built<Vec<Parameter>>> {
        let mut params = Vec::new();
        for part in split_on(items, TokenKind::Comma) {
            let param = match part {
                [var] => variable_name(var).map(|name| Parameter {
                    name: name.to_string(),
                    default: None,
                }),
                [var, assign, default @ ..] if is_assign(assign) => match variable_name(var) {
                    Some(name) => {
                        let default = self.constant_or_report(default, span_of(part))?;
                        Some(Parameter {
                            name: name.to_string(),
                            default: Some(default),
                        })
                    }
                    None => None,
                },
                _ => None,
            };
            match param {
                Some(p) => params.push(p),
                None => {
                    return Ok(Err(Invalid::new(
                        span_of(part),
                        "Expected a parameter like `$name` or `$name = constant`",
                    )));
                }
            }
        }
        Ok(Ok(params))
    }

    fn constant_or_report(&mut self, items: &[RawItem], span: Span) -> Result<Constant> {
        match fold_constant(items) {
            Some(c) => Ok(c),
            None => {
                self.report(
                    ErrorCode::ExpectedConstant,
                    "Expected a literal value".to_string(),
                    if items.is_empty() { span } else { span_of(items) },
                )?;
                Ok(Constant::Null)
            }
        }
    }

    /// `class Name { members }`
    pub(crate) fn parse_class(&mut self, stmt: &[RawItem]) -> Result<Built<ClassDefinition>> {
        let span = span_of(stmt);
        let [_, name_item, body] = stmt else {
            return Ok(Err(Invalid::new(span, "Expected `class Name { ... }`")));
        };
        let (Some(name), Some(members)) = (name_item.keyword(), block_items(body)) else {
            return Ok(Err(Invalid::new(span, "Expected `class Name { ... }`")));
        };
        let mut class = ClassBuilder::default();
        for member in split_statements(members, true) {
            if self.halted {
                break;
            }
            if let Err(invalid) = self.parse_member(&mut class, member)? {
                self.invalid_line(invalid)?;
            }
        }
        Ok(Ok(ClassDefinition {
            name: name.to_string(),
            span,
            property_names: class.property_names,
            property_initializers: class.property_initializers,
            functions: class.functions,
            static_functions: class.static_functions,
            static_property_names: class.static_property_names,
            static_values: Mutex::new(class.static_values),
        }))
    }

    fn parse_member(&mut self, class: &mut ClassBuilder, member: &[RawItem]) -> Result<Built<()>> {
        let span = span_of(member);
        match member {
            [var] if variable_name(var).is_some() => {
                class.add_property(variable_name(var).unwrap_or_default(), None);
            }
            [var, assign, value @ ..] if is_assign(assign) && variable_name(var).is_some() => {
                if value.is_empty() {
                    return Ok(Err(Invalid::new(span, "Property initializer is empty")));
                }
                let value = built!(build_expression(value));
                class.add_property(variable_name(var).unwrap_or_default(), Some(value));
            }
            [kw, rest @ ..] if is_keyword(kw, "func") => {
                let function = built!(self.parse_function(rest, span)?);
                class
                    .functions
                    .insert(function.name.to_ascii_lowercase(), Arc::new(function));
            }
            [kw, func, rest @ ..] if is_keyword(kw, "static") && is_keyword(func, "func") => {
                let function = built!(self.parse_function(rest, span)?);
                class
                    .static_functions
                    .insert(function.name.to_ascii_lowercase(), Arc::new(function));
            }
            [kw, var] if is_keyword(kw, "static") && variable_name(var).is_some() => {
                let name = variable_name(var).unwrap_or_default();
                warn!(property = name, "static property declared without an initializer");
                self.warnings.push(RCaronError::at(
                    ErrorCode::StaticPropertyWithoutInitializer,
                    format!("Static property ${name} has no initializer and starts as $null"),
                    span,
                ));
                class.add_static(name, Value::Null);
            }
            [kw, var, assign, value @ ..]
                if is_keyword(kw, "static") && is_assign(assign) && variable_name(var).is_some() =>
            {
                let constant = self.constant_or_report(value, span)?;
                class.add_static(variable_name(var).unwrap_or_default(), Value::from(&constant));
            }
            _ => {
                return Ok(Err(Invalid::new(
                    span,
                    "Expected a property, `func` or `static` member",
                )));
            }
        }
        Ok(Ok(()))
    }
}

#[derive(Default)]
struct ClassBuilder {
    property_names: Vec<String>,
    property_initializers: Vec<Option<PosToken>>,
    functions: IndexMap<String, Arc<Function>>,
    static_functions: IndexMap<String, Arc<Function>>,
    static_property_names: Vec<String>,
    static_values: Vec<Value>,
}

impl ClassBuilder {
    fn add_property(&mut self, name: &str, initializer: Option<PosToken>) {
        match self
            .property_names
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
        {
            Some(i) => self.property_initializers[i] = initializer,
            None => {
                self.property_names.push(name.to_string());
                self.property_initializers.push(initializer);
            }
        }
    }

    fn add_static(&mut self, name: &str, value: Value) {
        match self
            .static_property_names
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
        {
            Some(i) => self.static_values[i] = value,
            None => {
                self.static_property_names.push(name.to_string());
                self.static_values.push(value);
            }
        }
    }
}
