//! Module registered on every motor: output, assertions, arrays, ranges,
//! namespace opening, imports and a few pipeline consumers.
use rcaron_core::{Pipeline, Value, ops};
use rcaron_syntax::{ErrorCode, Operation, RCaronError, Result};

use crate::Motor;
use crate::module::{CallContext, MethodTable, ModuleMethod, ModuleParam, TableModule};

pub fn core_module() -> TableModule {
    let mut table = MethodTable::new();
    table
        .add(ModuleMethod::variadic("print", print))
        .add(ModuleMethod::variadic("println", print))
        .add(ModuleMethod::variadic("dbg_print", |motor, args, _| {
            let line = args
                .iter()
                .map(|v| format!("{v:?}"))
                .collect::<Vec<_>>()
                .join(" ");
            motor.write_line(&line);
            Ok(Value::Null)
        }))
        .add(ModuleMethod::variadic("@", |_, args, _| {
            Ok(Value::array(args.to_vec()))
        }))
        .add(ModuleMethod::new(
            "range",
            vec![ModuleParam::required("start"), ModuleParam::required("end")],
            range,
        ))
        .add(ModuleMethod::new(
            "assert",
            vec![ModuleParam::required("condition")],
            |_, args, _| match args[0] {
                Value::Bool(true) => Ok(Value::Null),
                Value::Bool(false) => Err(RCaronError::new(
                    ErrorCode::AssertionFailed,
                    "Assertion failed",
                )),
                ref other => Err(RCaronError::new(
                    ErrorCode::ExpectedBoolean,
                    format!("assert expects a bool, got {}", other.type_name()),
                )),
            },
        ))
        .add(ModuleMethod::new(
            "String",
            vec![ModuleParam::required("value")],
            |_, args, _| Ok(Value::from(args[0].to_display_string())),
        ))
        .add(ModuleMethod::variadic("Open", |motor, args, _| {
            let scope = motor.current_file_scope()?;
            for ns in string_list(args)? {
                scope.open_namespace(&ns);
            }
            Ok(Value::Null)
        }))
        .add(ModuleMethod::variadic("OpenExt", |motor, args, _| {
            let scope = motor.current_file_scope()?;
            for ns in string_list(args)? {
                scope.open_extension_namespace(&ns);
            }
            Ok(Value::Null)
        }))
        .add(ModuleMethod::new(
            "OpenFromFile",
            vec![ModuleParam::required("path")],
            |motor, args, _| {
                motor.import_file(&expect_string(&args[0])?)?;
                Ok(Value::Null)
            },
        ))
        .add(ModuleMethod::new(
            "ImportFrom",
            vec![
                ModuleParam::required("path"),
                ModuleParam::optional("Functions", Value::array(Vec::new())),
                ModuleParam::optional("Classes", Value::array(Vec::new())),
            ],
            |motor, args, _| {
                let path = expect_string(&args[0])?;
                let functions = string_list(&args[1..2])?;
                let classes = string_list(&args[2..3])?;
                motor.import_selected(&path, &functions, &classes)?;
                Ok(Value::Null)
            },
        ))
        .add(ModuleMethod::new(
            "Sum",
            vec![ModuleParam::pipeline("items")],
            |motor, args, _| {
                let mut total: Option<Value> = None;
                for item in items(motor, &args[0])? {
                    total = Some(match total {
                        Some(acc) => ops::arithmetic(Operation::Add, &acc, &item)?,
                        None => item,
                    });
                }
                Ok(total.unwrap_or(Value::I64(0)))
            },
        ))
        .add(ModuleMethod::new(
            "Count",
            vec![ModuleParam::pipeline("items")],
            |motor, args, _| Ok(Value::I64(items(motor, &args[0])?.len() as i64)),
        ))
        .add(ModuleMethod::new(
            "Collect",
            vec![ModuleParam::pipeline("items")],
            |motor, args, _| Ok(Value::array(items(motor, &args[0])?)),
        ));
    TableModule::new("core", table)
}

fn print(motor: &mut Motor, args: &[Value], ctx: &CallContext) -> Result<Value> {
    if args.is_empty() {
        if let Some(pipeline) = &ctx.pipeline {
            for item in pipeline.take_enumerator()? {
                motor.write_line(&item?.to_display_string());
            }
            return Ok(Value::Null);
        }
    }
    let line = args
        .iter()
        .map(Value::to_display_string)
        .collect::<Vec<_>>()
        .join(" ");
    motor.write_line(&line);
    Ok(Value::Null)
}

/// Half-open integer range. Feeding a pipeline it streams, otherwise it is
/// a plain range value.
fn range(_: &mut Motor, args: &[Value], ctx: &CallContext) -> Result<Value> {
    let bound = |v: &Value| {
        v.as_i64().ok_or_else(|| {
            RCaronError::new(
                ErrorCode::OperatorTypeMismatch,
                format!("range bounds must be integers, got {}", v.type_name()),
            )
        })
    };
    let (start, end) = (bound(&args[0])?, bound(&args[1])?);
    if ctx.is_left_of_pipeline {
        let iter = (start..end).map(|i| Ok(Value::I64(i)));
        Ok(Value::Pipeline(std::sync::Arc::new(Pipeline::from_enumerator(iter))))
    } else {
        Ok(Value::Range(start, end))
    }
}

fn expect_string(value: &Value) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        RCaronError::new(
            ErrorCode::OperatorTypeMismatch,
            format!("Expected a string, got {}", value.type_name()),
        )
    })
}

/// Strings from a mix of string and array-of-string arguments.
fn string_list(args: &[Value]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => {
                for item in items.read().iter() {
                    out.push(expect_string(item)?);
                }
            }
            other => out.push(expect_string(other)?),
        }
    }
    Ok(out)
}

/// Every value of `source`. A pipeline carrying exactly one collection is
/// flattened into that collection's items.
fn items(motor: &mut Motor, source: &Value) -> Result<Vec<Value>> {
    let collected: Vec<Value> = motor.iterate(source)?.collect::<Result<_>>()?;
    if let (Value::Pipeline(_), [single]) = (source, collected.as_slice()) {
        if matches!(single, Value::Array(_) | Value::Range(..) | Value::Pipeline(_)) {
            return motor.iterate(single)?.collect();
        }
    }
    Ok(collected)
}
