mod common;

use common::{error_code, eval, output};
use pretty_assertions::assert_eq;
use rcaron_core::Value;
use rcaron_syntax::ErrorCode;

const COUNTER: &str = r#"
class Counter {
    $count = 0;
    $step = 1 + 2;
    static $created = 0;
    func Add($n = 1) { $count += $n; return $count }
    func Current() { return $this.count }
    static func Make() { $created += 1; return #Counter:New() }
}
"#;

fn with_counter(body: &str) -> String {
    format!("{COUNTER}\n{body}")
}

#[test]
fn initializers_run_per_instance() {
    assert_eq!(eval(&with_counter("$c = #Counter:New()\nreturn $c.step")), Value::I64(3));
}

#[test]
fn instances_are_isolated_and_statics_are_shared() {
    let src = with_counter(
        r#"
        $a = #Counter:Make()
        $b = #Counter:Make()
        $a.Add(5)
        $a.Add()
        $b.Add()
        print($a.count, $b.count, #Counter:created)
    "#,
    );
    assert_eq!(output(&src), "6 1 2\n");
}

#[test]
fn this_and_bare_properties_inside_methods() {
    let src = with_counter("$c = #Counter:New()\n$c.Add(4)\nreturn $c.Current()");
    assert_eq!(eval(&src), Value::I64(4));
}

#[test]
fn initializers_see_only_earlier_properties() {
    let src = r#"
        class Pair {
            static $base = 10;
            $a = $base + 1;
            $b = $a * 2;
        }
        return #Pair:New().b
    "#;
    assert_eq!(eval(src), Value::I64(22));
    assert_eq!(
        error_code("class Late { $a = $b; $b = 5 }
return #Late:New().a"),
        ErrorCode::VariableNotFound
    );
}

#[test]
fn named_arguments_set_properties_on_new() {
    let src = with_counter("$c = #Counter:New(-count 10)\nreturn $c.Add(1)");
    assert_eq!(eval(&src), Value::I64(11));
    assert_eq!(
        error_code(&with_counter("#Counter:New(1)")),
        ErrorCode::LeftOverPositionalArgument
    );
    assert_eq!(
        error_code(&with_counter("#Counter:New(-missing 1)")),
        ErrorCode::ClassPropertyNotFound
    );
}

#[test]
fn member_assignment_and_increment() {
    let src = with_counter("$c = #Counter:New()\n$c.count = 7\n$c.count++\n$c.count += 2\nreturn $c.count");
    assert_eq!(eval(&src), Value::I64(10));
    let src = with_counter("#Counter:created = 5\nreturn #Counter:created");
    assert_eq!(eval(&src), Value::I64(5));
}

#[test]
fn missing_members_have_distinct_errors() {
    let cases = [
        ("$c = #Counter:New()\n$c.nope", ErrorCode::ClassPropertyNotFound),
        ("$c = #Counter:New()\n$c.Nope()", ErrorCode::ClassFunctionNotFound),
        ("#Counter:Nope()", ErrorCode::ClassStaticFunctionNotFound),
        ("return #Counter:nope", ErrorCode::ClassStaticPropertyNotFound),
        ("#Missing:New()", ErrorCode::TypeNotFound),
    ];
    for (body, code) in cases {
        assert_eq!(error_code(&with_counter(body)), code, "{body}");
    }
}

#[test]
fn static_functions_see_statics_but_not_instance_members() {
    let src = r#"
        class Config {
            $name = 'x';
            static $prefix = 'cfg';
            static func Describe() { return $prefix + ':' + $name }
        }
        #Config:Describe()
    "#;
    assert_eq!(error_code(src), ErrorCode::VariableNotFound);
}

#[test]
fn methods_call_siblings_without_a_receiver() {
    let src = r#"
        class Shape {
            $side = 3;
            func Area() { return $side * $side }
            func Describe() { return 'area ' + String(Area()) }
            static func Unit() { return Scale(1) }
            static func Scale($n) { return $n * 10 }
        }
        $s = #Shape:New()
        print($s.Describe())
        print(#Shape:Unit())
    "#;
    assert_eq!(output(src), "area 9\n10\n");
}

#[test]
fn get_type_and_to_string_on_instances() {
    let src = with_counter("$c = #Counter:New()\nprint($c.ToString())\nreturn $c.GetType()");
    let mut motor = common::motor();
    let value = motor.run(common::parse(&src)).unwrap().unwrap();
    assert_eq!(value.to_display_string(), "Counter");
    assert_eq!(motor.take_output(), "Counter\n");
}

#[test]
fn statics_persist_between_runs_of_one_scope() {
    let scope = common::parse(&with_counter("#Counter:Make()\nreturn #Counter:created"));
    let mut motor = common::motor();
    assert_eq!(motor.run(scope.clone()).unwrap(), Some(Value::I64(1)));
    assert_eq!(motor.run(scope).unwrap(), Some(Value::I64(2)));
}
