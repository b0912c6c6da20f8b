use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use rcaron_lexer::{SilentErrorHandler, tokenize};

fn any_rcaron_like() -> impl Strategy<Value = String> {
    let pieces = prop::sample::select(vec![
        "$a", "$b_2", " ", "\n", "\t", "=", "==", "+", "-", "*", "/", "%", "..", ".", "...", "(",
        ")", "{", "}", "[", "]", ",", ";", ":", "|", "||", "&&", "!", "!=", "<", ">=", "++", "--",
        "+=", "1", "42", "1.5", "0x1F", "7u", "3m", "1uf", "'str'", "\"dq\"", "'\\n'", "'\\z'",
        "'\\u0159'", "c'x'", "c'", "print", "Get-Item", "-Force", "#Foo.Bar", "#!", "// c",
        "/# b #/", "/#", "./p/q", "~/h", "@", "`;", "if", "else", "\u{20ac}", "'",
    ]);
    prop::collection::vec(pieces, 0..40).prop_map(|v| v.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256, max_shrink_iters: 200, .. ProptestConfig::default()
    })]

    #[test]
    fn lexing_random_input_does_not_panic(s in any_rcaron_like()) {
        let mut handler = SilentErrorHandler::new();
        let toks = tokenize(&s, &mut handler).expect("silent handler never aborts");
        let mut last_end = 0u32;
        for t in &toks {
            prop_assert!(t.span.start.0 >= last_end);
            prop_assert!(t.span.end.0 as usize <= s.len());
            last_end = t.span.end.0;
        }
    }

    #[test]
    fn relexing_a_token_slice_reproduces_the_token(s in any_rcaron_like()) {
        let mut handler = SilentErrorHandler::new();
        let toks = tokenize(&s, &mut handler).expect("silent handler never aborts");
        for t in &toks {
            let text = &s[t.span.range()];
            let mut handler = SilentErrorHandler::new();
            let again = tokenize(text, &mut handler).expect("silent handler never aborts");
            prop_assert_eq!(again.len(), 1, "slice {:?} of {:?}", text, s);
            prop_assert_eq!(again[0].kind, t.kind);
            prop_assert_eq!(again[0].span.len(), t.span.len());
        }
    }
}
