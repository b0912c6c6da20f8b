mod common;

use std::io::Cursor;
use std::sync::Arc;

use common::{error_code, eval, output};
use pretty_assertions::assert_eq;
use rcaron_core::{Pipeline, Value};
use rcaron_syntax::ErrorCode;

#[test]
fn range_streams_into_consumers() {
    assert_eq!(eval("return range(0, 5) | Sum"), Value::I64(10));
    assert_eq!(eval("return range(0, 4) | Collect | Count"), Value::I64(4));
    assert_eq!(eval("return range(3, 3) | Sum"), Value::I64(0));
}

#[test]
fn plain_values_are_wrapped_and_collections_flattened() {
    assert_eq!(eval("return @(1, 2, 3) | Count"), Value::I64(3));
    assert_eq!(eval("$r = range(1, 4)\nreturn $r | Sum"), Value::I64(6));
    assert_eq!(eval("return 5 | Count"), Value::I64(1));
}

#[test]
fn range_outside_a_pipeline_is_a_value() {
    assert_eq!(eval("return range(1, 3)"), Value::Range(1, 3));
}

#[test]
fn print_drains_its_pipeline() {
    assert_eq!(output("range(0, 3) | print"), "0\n1\n2\n");
}

#[test]
fn right_side_must_be_a_module_method() {
    assert_eq!(
        error_code("func F() { }\nrange(0, 3) | F"),
        ErrorCode::InvalidPipelineUse
    );
}

#[test]
fn a_pipeline_is_consumed_once() {
    let mut motor = common::motor();
    let items = (0..3).map(|i| Ok(Value::I64(i)));
    motor
        .set_global("feed", Value::Pipeline(Arc::new(Pipeline::from_enumerator(items))))
        .unwrap();
    let err = motor
        .run(common::parse("$a = $feed | Count\n$b = $feed | Count"))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOperation);
    assert!(err.message.contains("already consumed"), "{}", err.message);
}

#[test]
fn foreach_consumes_a_pipeline() {
    let mut motor = common::motor();
    let reader = Cursor::new(b"alpha\nbeta\n".to_vec());
    motor
        .set_global("lines", Value::Pipeline(Arc::new(Pipeline::from_reader(reader))))
        .unwrap();
    let out = motor
        .execute(common::parse("foreach ($l in $lines) { print($l.ToUpper()) }"))
        .unwrap()
        .output;
    assert_eq!(out, "ALPHA\nBETA\n");
}

#[test]
fn channel_pipeline_fed_from_another_thread() {
    let (pipe, writer) = Pipeline::channel(2);
    let scope = common::parse("return $feed | Sum");
    let mut motor = common::motor();
    motor
        .set_global("feed", Value::Pipeline(Arc::new(pipe)))
        .unwrap();
    let value = crossbeam::thread::scope(|s| {
        s.spawn(move |_| {
            for i in 1..=10 {
                writer.write(Value::I64(i)).unwrap();
            }
        });
        motor.run(scope).unwrap()
    })
    .unwrap();
    assert_eq!(value, Some(Value::I64(55)));
}
