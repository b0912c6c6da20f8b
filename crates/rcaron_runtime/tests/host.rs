mod common;

use std::any::Any;
use std::sync::{Arc, OnceLock};

use common::{error_code, eval, motor, parse};
use pretty_assertions::assert_eq;
use rcaron_core::{HostMethod, HostObject, HostType, MethodKind, RType, Value};
use rcaron_runtime::{
    CallContext, IndexerImplementation, MethodTable, Motor, ModuleMethod, ModuleParam,
    PropertyAccessor, TableModule,
};
use rcaron_syntax::{ErrorCode, NumberKind, Result};

const I64: RType = RType::Number(NumberKind::I64);
const F64: RType = RType::Number(NumberKind::F64);

struct Point {
    x: i64,
    y: i64,
}

impl HostObject for Point {
    fn host_type(&self) -> Arc<HostType> {
        point_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_member(&self, name: &str) -> Result<Option<Value>> {
        Ok(match name {
            "X" => Some(Value::I64(self.x)),
            "Y" => Some(Value::I64(self.y)),
            _ => None,
        })
    }
}

fn point_of(this: Option<&Value>) -> &Point {
    match this {
        Some(Value::Host(h)) => h.as_any().downcast_ref::<Point>().expect("a point"),
        other => panic!("not a point: {other:?}"),
    }
}

fn point_type() -> Arc<HostType> {
    static TYPE: OnceLock<Arc<HostType>> = OnceLock::new();
    TYPE.get_or_init(|| {
        Arc::new(
            HostType::new("Demo", "Point")
                .with_method(HostMethod::new("New", MethodKind::Constructor, vec![I64, I64], |_, args| {
                    let (Some(x), Some(y)) = (args[0].as_i64(), args[1].as_i64()) else {
                        panic!("bound arguments are integers");
                    };
                    Ok(Value::Host(Arc::new(Point { x, y })))
                }))
                .with_method(HostMethod::new("Sum", MethodKind::Instance, vec![], |this, _| {
                    let p = point_of(this);
                    Ok(Value::I64(p.x + p.y))
                })),
        )
    })
    .clone()
}

fn tag(name: &'static str) -> impl Fn(Option<&Value>, &[Value]) -> Result<Value> + Send + Sync {
    move |_, _| Ok(Value::from(name))
}

fn generic(constraint: Option<RType>) -> RType {
    RType::Generic {
        name: "T".to_string(),
        constraint: constraint.map(Box::new),
    }
}

fn demo_motor() -> Motor {
    let mut motor = motor();
    let registry = motor.registry().clone();
    registry.register(point_type());
    registry.register(
        HostType::new("Demo", "Calc")
            .with_method(HostMethod::new("Add", MethodKind::Static, vec![I64, I64], tag("long")))
            .with_method(HostMethod::new("Add", MethodKind::Static, vec![F64, F64], tag("double")))
            .with_method(HostMethod::new("Add", MethodKind::Static, vec![RType::Any, RType::Any], tag("any")))
            .with_method(HostMethod::new("Pi", MethodKind::Static, vec![], |_, _| Ok(Value::F64(3.25)))),
    );
    registry.register(
        HostType::new("Demo", "Pick")
            .with_method(HostMethod::new("Wrap", MethodKind::Static, vec![generic(Some(RType::String))], tag("generic")))
            .with_method(HostMethod::new("Wrap", MethodKind::Static, vec![RType::String], tag("exact")))
            .with_method(HostMethod::new("Keep", MethodKind::Static, vec![generic(None)], tag("open")))
            .with_method(HostMethod::new("Keep", MethodKind::Static, vec![RType::String], tag("string"))),
    );
    registry.register(
        HostType::new("Demo.Ext", "StringExt").with_method(HostMethod::new(
            "Shout",
            MethodKind::Static,
            vec![RType::String],
            |_, args| Ok(Value::from(format!("{}!", args[0].to_display_string().to_uppercase()))),
        )),
    );
    motor
}

fn demo_eval(src: &str) -> Value {
    demo_motor().run(parse(src)).unwrap().unwrap()
}

fn demo_error(src: &str) -> ErrorCode {
    demo_motor().run(parse(src)).unwrap_err().code
}

#[test]
fn builtin_string_methods_and_properties() {
    assert_eq!(eval("$s = 'hello'\nreturn $s.Substring(1, 3)"), Value::from("ell"));
    assert_eq!(eval("$s = 'hello'\nreturn $s.Substring(1)"), Value::from("ello"));
    assert_eq!(eval("$s = 'hello'\nreturn $s.Length"), Value::I64(5));
    assert_eq!(eval("$s = 'a,b,c'\nreturn $s.Split(',').Length"), Value::I64(3));
    assert_eq!(eval("$n = 42\nreturn $n.ToString()"), Value::from("42"));
}

#[test]
fn arguments_widen_to_wider_numbers() {
    assert_eq!(eval("$s = 'hello'\nreturn $s.Substring(1i)"), Value::from("ello"));
    assert_eq!(eval("$s = 'hello'\nreturn $s.Substring(1u, 2i)"), Value::from("el"));
}

#[test]
fn overload_mismatch_and_unknown_method() {
    assert_eq!(
        error_code("$s = 'hello'\n$s.Substring('x')"),
        ErrorCode::MethodNoSuitableMatch
    );
    assert_eq!(
        error_code("$s = 'hello'\n$s.Substring(1.5)"),
        ErrorCode::MethodNoSuitableMatch
    );
    let err = common::run_err("$s = 'hello'\n$s.ToUpperr()");
    assert_eq!(err.code, ErrorCode::MethodNotFound);
    assert!(err.message.contains("ToUpper"), "{}", err.message);
}

#[test]
fn exact_matches_beat_widening_and_ties_keep_the_first() {
    assert_eq!(demo_eval("return #Demo.Calc:Add(1, 2)"), Value::from("long"));
    assert_eq!(demo_eval("return #Demo.Calc:Add(1.5, 2.5)"), Value::from("double"));
    assert_eq!(demo_eval("return #Demo.Calc:Add(1i, 2i)"), Value::from("long"));
    assert_eq!(demo_eval("return #Demo.Calc:Add('a', 'b')"), Value::from("any"));
    assert_eq!(demo_error("#Demo.Calc:Add(1)"), ErrorCode::MethodNoSuitableMatch);
}

#[test]
fn open_generics_lose_to_exact_matches_and_beat_mismatches() {
    assert_eq!(demo_eval("return #Demo.Pick:Wrap('x')"), Value::from("exact"));
    assert_eq!(demo_error("#Demo.Pick:Wrap(5)"), ErrorCode::MethodNoSuitableMatch);
    assert_eq!(demo_eval("return #Demo.Pick:Keep(5)"), Value::from("open"));
    assert_eq!(demo_eval("return #Demo.Pick:Keep('s')"), Value::from("string"));
}

#[test]
fn parameterless_statics_read_as_properties() {
    assert_eq!(demo_eval("return #Demo.Calc:Pi"), Value::F64(3.25));
    assert_eq!(demo_eval("Open Demo\nreturn #Calc:Pi"), Value::F64(3.25));
    assert_eq!(demo_error("return #Demo.Calc:Tau"), ErrorCode::CannotResolveInDotThing);
}

#[test]
fn short_type_names_need_an_open_namespace() {
    assert_eq!(demo_error("#Calc:Add(1, 2)"), ErrorCode::TypeNotFound);
    assert_eq!(demo_eval("Open('Demo')\nreturn #Calc:Add(1, 2)"), Value::from("long"));
    assert_eq!(demo_eval("Open Demo\nreturn #Calc:Add(1, 2)"), Value::from("long"));
}

#[test]
fn primitive_type_names_resolve_without_namespaces() {
    assert_eq!(eval("return #int"), Value::Type(RType::Number(NumberKind::I32)));
    assert_eq!(eval("return #String"), Value::Type(RType::String));
}

#[test]
fn host_constructor_members_and_methods() {
    let src = "$p = #Demo.Point:New(3, 4)\nreturn $p.X + $p.Sum()";
    assert_eq!(demo_eval(src), Value::I64(10));
    assert_eq!(demo_eval("$p = #Demo.Point:New(1, 1)\nreturn $p.Sum"), Value::I64(2));
    assert_eq!(
        demo_error("$p = #Demo.Point:New(1, 1)\n$p.Z"),
        ErrorCode::CannotResolveInDotThing
    );
}

#[test]
fn extension_methods_come_from_opened_namespaces() {
    assert_eq!(
        demo_eval("OpenExt('Demo.Ext')\n$s = 'hi'\nreturn $s.Shout()"),
        Value::from("HI!")
    );
    assert_eq!(demo_error("$s = 'hi'\n$s.Shout()"), ErrorCode::MethodNotFound);
}

#[test]
fn registered_types_are_shared_through_the_registry() {
    let first = demo_motor();
    let mut second = motor();
    second.set_registry(first.registry().clone());
    assert_eq!(
        second.run(parse("return #Demo.Calc:Add(1, 2)")).unwrap(),
        Some(Value::from("long"))
    );
}

struct Loud;

impl PropertyAccessor for Loud {
    fn try_get(&self, _: &mut Motor, name: &str, target: &mut Value) -> Result<bool> {
        match (name, target.as_str()) {
            ("Loud", Some(s)) => {
                *target = Value::from(s.to_uppercase());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct RangeOffset;

impl IndexerImplementation for RangeOffset {
    fn try_index(&self, _: &mut Motor, index: &Value, target: &mut Value) -> Result<bool> {
        match (&*target, index.as_i64()) {
            (Value::Range(start, _), Some(i)) => {
                *target = Value::I64(start + i);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[test]
fn accessors_and_indexers_are_fallbacks() {
    let mut m = motor();
    m.add_property_accessor(Arc::new(Loud));
    m.add_indexer(Arc::new(RangeOffset));
    let src = "$s = 'quiet'\n$r = range(10, 20)\nprint($s.Loud, $r[2], $s[0])";
    assert_eq!(m.execute(parse(src)).unwrap().output, "QUIET 12 q\n");
    assert_eq!(
        m.run(parse("$b = $true\nreturn $b[0]")).unwrap_err().code,
        ErrorCode::NoSuitableIndexerImplementation
    );
}

#[test]
fn array_indexing_and_bounds() {
    assert_eq!(eval("$a = @(1, 2, 3)\n$a[1] = 9\nreturn $a[1]"), Value::I64(9));
    assert_eq!(eval("$a = @()\n$a.Add(4)\nreturn $a.Length"), Value::I64(1));
    assert_eq!(error_code("$a = @(1)\nreturn $a[3]"), ErrorCode::IndexOutOfRange);
}

fn math_module() -> TableModule {
    let mut table = MethodTable::new();
    table
        .add(ModuleMethod::new(
            "Double",
            vec![ModuleParam::required("x")],
            |_, args, _| Ok(Value::I64(args[0].as_i64().unwrap_or_default() * 2)),
        ))
        .add(ModuleMethod::new(
            "Shape",
            vec![ModuleParam::optional("x", Value::Null)],
            |_, _, ctx: &CallContext| Ok(Value::from(format!("{:?}", ctx.shape))),
        ));
    TableModule::new("math", table)
}

#[test]
fn modules_answer_bare_calls() {
    let mut m = motor();
    m.add_module(Arc::new(math_module()));
    assert_eq!(m.run(parse("return Double(21)")).unwrap(), Some(Value::I64(42)));
    assert_eq!(m.run(parse("return Double(-x 4)")).unwrap(), Some(Value::I64(8)));
    let shapes = "print(Shape(), Shape)\nShape 1";
    m.run(parse(shapes)).unwrap();
    assert_eq!(m.take_output(), "Parenthesized Bare\n");
}

#[test]
fn script_functions_shadow_modules_and_overrides_shadow_both_kinds() {
    let mut m = motor();
    m.add_module(Arc::new(math_module()));
    let src = "func Double($x) { return 0 }\nreturn Double(21)";
    assert_eq!(m.run(parse(src)).unwrap(), Some(Value::I64(0)));

    let mut table = MethodTable::new();
    table.add(ModuleMethod::variadic("print", |motor, args, _| {
        motor.write_line(&format!("[{}]", args.len()));
        Ok(Value::Null)
    }));
    m.add_override_module(Arc::new(TableModule::new("quiet", table)));
    assert_eq!(m.execute(parse("print(1, 2)")).unwrap().output, "[2]\n");
}

#[test]
fn unknown_call_suggests_module_methods() {
    let err = common::run_err("prnt('x')");
    assert_eq!(err.code, ErrorCode::MethodNotFound);
    assert!(err.message.contains("print"), "{}", err.message);
}
