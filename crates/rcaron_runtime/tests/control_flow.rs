mod common;

use common::{error_code, eval, output};
use pretty_assertions::assert_eq;
use rcaron_core::Value;
use rcaron_syntax::ErrorCode;

#[test]
fn arithmetic_precedence_and_grouping() {
    assert_eq!(eval("return ((3 * 3) + 2) * 2 / 2;"), Value::I64(11));
    assert_eq!(eval("return 2 + 3 * 4 - 1;"), Value::I64(13));
    assert_eq!(eval("return 10 - 4 - 3;"), Value::I64(3));
    assert_eq!(eval("return 17 % 5 * 2;"), Value::I64(4));
}

#[test]
fn numeric_kinds_do_not_mix() {
    assert_eq!(error_code("return 1 + 1.5;"), ErrorCode::OperatorTypeMismatch);
    assert_eq!(eval("return 1.5 + 1.5;"), Value::F64(3.0));
}

#[test]
fn string_concatenation_and_print() {
    let out = output("$name = 'World'\nprint('Hello, ' + $name)\nprint(1, $true, $null)");
    assert_eq!(out, "Hello, World\n1 true $null\n");
}

#[test]
fn if_else_chain_runs_one_branch() {
    let src = r#"
        func Size($x) {
            if ($x > 10) { return 'big' } else if ($x > 3) { return 'mid' } else { return 'small' }
        }
        print(Size(50)); print(Size(5)); print(Size(1))
    "#;
    assert_eq!(output(src), "big\nmid\nsmall\n");
}

#[test]
fn non_bool_condition_is_rejected() {
    assert_eq!(error_code("if (1) { }"), ErrorCode::ExpectedBoolean);
    assert_eq!(error_code("while ('x') { }"), ErrorCode::ExpectedBoolean);
}

#[test]
fn for_loop_variable_lives_in_the_header() {
    let src = "$sum = 0\nfor ($i = 0; $i < 5; $i++) { $sum += $i }\nreturn $sum";
    assert_eq!(eval(src), Value::I64(10));
    let src = "for ($i = 0; $i < 5; $i++) { }\nreturn $i";
    assert_eq!(error_code(src), ErrorCode::VariableNotFound);
}

#[test]
fn qfor_runs_the_body_in_the_header_scope() {
    let src = "$sum = 0\nqfor ($i = 0; $i < 4; $i++) { $sum += $i }\nreturn $sum";
    assert_eq!(eval(src), Value::I64(6));
}

#[test]
fn while_with_break_and_continue() {
    let src = r#"
        $i = 0
        $odd = 0
        while ($true) {
            $i++
            if ($i > 9) { break }
            if ($i % 2 == 0) { continue }
            $odd += 1
        }
        return $odd
    "#;
    assert_eq!(eval(src), Value::I64(5));
}

#[test]
fn dowhile_runs_at_least_once() {
    assert_eq!(eval("$i = 0\ndowhile ($false) { $i++ }\nreturn $i"), Value::I64(1));
}

#[test]
fn loop_until_break() {
    let src = "$i = 0\nloop {\n $i++\n if ($i == 3) { break }\n}\nreturn $i";
    assert_eq!(eval(src), Value::I64(3));
}

#[test]
fn foreach_over_arrays_ranges_and_strings() {
    let src = r#"
        $total = 0
        foreach ($n in @(1, 2, 3)) { $total += $n }
        foreach ($n in range(0, 4)) { $total += $n }
        return $total
    "#;
    assert_eq!(eval(src), Value::I64(12));
    assert_eq!(output("foreach ($c in 'ab') { print($c) }"), "a\nb\n");
}

#[test]
fn switch_matches_value_then_default() {
    let src = r#"
        func Describe($v) {
            switch ($v) {
                1 { return 'one' }
                'two' { return 'second' }
                default { return 'other' }
            }
        }
        print(Describe(1)); print(Describe('two')); print(Describe(5))
    "#;
    assert_eq!(output(src), "one\nsecond\nother\n");
}

#[test]
fn return_leaves_every_construct() {
    let src = r#"
        func InFor() {
            for ($i = 0; $i < 10; $i++) { if ($i == 3) { return $i } }
            return 0
        }
        func InForEach() {
            foreach ($x in @(4, 5, 6)) { if ($x == 5) { return $x } }
            return 0
        }
        func InWhile() {
            while ($true) { return 7 }
        }
        func InLoop() {
            loop { loop { return 8 } }
        }
        func InTry() {
            try { return 9 } finally { $ignored = 1 }
            return 0
        }
        func InBlock() {
            { { return 10 } }
        }
        func InDoWhile() {
            dowhile ($false) { return 11 }
            return 0
        }
        func InQFor() {
            qfor ($i = 0; $i < 10; $i++) { if ($i == 2) { return $i } }
            return 0
        }
        return InFor() + InForEach() + InWhile() + InLoop() + InTry() + InBlock() + InDoWhile() + InQFor()
    "#;
    assert_eq!(eval(src), Value::I64(3 + 5 + 7 + 8 + 9 + 10 + 11 + 2));
}

#[test]
fn top_level_return_stops_the_run() {
    assert_eq!(output("print('a')\nreturn 1\nprint('b')"), "a\n");
}

#[test]
fn break_outside_a_loop_is_an_error() {
    assert_eq!(error_code("break"), ErrorCode::BreakOutsideLoop);
    assert_eq!(error_code("func F() { continue }\nF()"), ErrorCode::BreakOutsideLoop);
}

#[test]
fn let_keeps_its_first_type() {
    assert_eq!(eval("let $n = 1\n$n = 2\nreturn $n"), Value::I64(2));
    assert_eq!(
        error_code("let $n = 1\n$n = 'x'"),
        ErrorCode::LetVariableTypeMismatch
    );
}

#[test]
fn block_scope_hides_inner_variables() {
    assert_eq!(error_code("{ $inner = 1 }\nreturn $inner"), ErrorCode::VariableNotFound);
    assert_eq!(eval("$outer = 1\n{ $outer = 2 }\nreturn $outer"), Value::I64(2));
}

#[test]
fn unknown_variable_suggests_a_close_name() {
    let err = common::run_err("$counter = 1\nreturn $countr");
    assert_eq!(err.code, ErrorCode::VariableNotFound);
    assert!(err.message.contains("$counter"), "{}", err.message);
    assert!(err.span.is_some());
}

#[test]
fn try_catch_finally() {
    let src = "try { throw 'boom' } catch { print('caught ' + $exception) } finally { print('cleanup') }";
    assert_eq!(output(src), "caught boom\ncleanup\n");
    let src = "try { assert($false) } catch { print('recovered') }";
    assert_eq!(output(src), "recovered\n");
}

#[test]
fn finally_runs_when_the_error_escapes() {
    let mut motor = common::motor();
    let err = motor
        .run(common::parse("try { throw 'x' } finally { print('f') }"))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ThrownValue);
    assert_eq!(motor.take_output(), "f\n");
}

#[test]
fn thrown_values_keep_their_payload() {
    let err = common::run_err("throw 42");
    assert_eq!(err.code, ErrorCode::ThrownValue);
    assert_eq!(err.payload::<Value>(), Some(&Value::I64(42)));
}

#[test]
fn rethrowing_a_caught_error_keeps_its_code() {
    let src = "try { assert($false) } catch { throw $exception }";
    assert_eq!(error_code(src), ErrorCode::AssertionFailed);
}

#[test]
fn assert_needs_a_bool() {
    assert_eq!(error_code("assert(1)"), ErrorCode::ExpectedBoolean);
    assert_eq!(error_code("assert(1 == 2)"), ErrorCode::AssertionFailed);
}
