#![allow(dead_code)]

use std::sync::{Arc, Once};

use rcaron_core::{FileScope, Value};
use rcaron_driver::Driver;
use rcaron_runtime::{Motor, MotorOptions};
use rcaron_syntax::{ErrorCode, RCaronError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static TRACING: Once = Once::new();

/// Log engine events to the test output when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer())
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}

pub fn parse(src: &str) -> Arc<FileScope> {
    Driver::new().parse_strict("main", src).expect("parse")
}

pub fn motor() -> Motor {
    init_tracing();
    let mut motor = Motor::with_options(MotorOptions::default());
    motor.set_frontend(Arc::new(Driver::new()));
    motor
}

/// Value of the script's top-level `return`.
pub fn eval(src: &str) -> Value {
    motor()
        .run(parse(src))
        .expect("run")
        .expect("script returns a value")
}

/// Everything the script printed.
pub fn output(src: &str) -> String {
    let mut motor = motor();
    motor.execute(parse(src)).expect("run").output
}

pub fn run_err(src: &str) -> RCaronError {
    let mut motor = motor();
    match motor.run(parse(src)) {
        Ok(v) => panic!("expected an error, got {v:?}"),
        Err(e) => e,
    }
}

pub fn error_code(src: &str) -> ErrorCode {
    run_err(src).code
}
