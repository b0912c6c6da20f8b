mod common;

use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use rcaron_core::Value;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128, max_shrink_iters: 100, .. ProptestConfig::default()
    })]

    #[test]
    fn flat_math_follows_precedence(a in 0i64..1000, b in 0i64..1000, c in 0i64..1000, d in 1i64..100) {
        let src = format!("return {a} + {b} * {c} - {a} % {d}");
        prop_assert_eq!(common::eval(&src), Value::I64(a + b * c - a % d));
    }

    #[test]
    fn grouping_overrides_precedence(a in 0i64..1000, b in 0i64..1000, c in 1i64..100) {
        let src = format!("return ({a} + {b}) * {c} / {c}");
        prop_assert_eq!(common::eval(&src), Value::I64(a + b));
    }

    #[test]
    fn loops_agree_with_native_sums(n in 0i64..60) {
        let src = format!("$t = 0\nfor ($i = 0; $i < {n}; $i++) {{ $t += $i }}\nreturn $t");
        prop_assert_eq!(common::eval(&src), Value::I64((0..n).sum()));
        let src = format!("return range(0, {n}) | Sum");
        prop_assert_eq!(common::eval(&src), Value::I64((0..n).sum()));
    }
}
