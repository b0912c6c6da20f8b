use pretty_assertions::assert_eq;
use rcaron_core::{ChainKind, ChainSeparator, Constant, LineKind, PosToken, PosTokenKind};
use rcaron_lexer::ThrowingErrorHandler;
use rcaron_parser::{ParseOptions, parse};
use rcaron_syntax::{Number, Operation};

fn expr(src: &str) -> PosToken {
    let mut handler = ThrowingErrorHandler;
    let out = parse("t", src, ParseOptions::default(), &mut handler).expect("parse");
    match &out.file_scope.lines[0].kind {
        LineKind::Expression(tok) => tok.clone(),
        LineKind::VariableAssignment { value, .. } => value.clone(),
        other => panic!("unexpected line {other:?}"),
    }
}

fn num(n: i64) -> PosTokenKind {
    PosTokenKind::Constant(Constant::Number(Number::I64(n)))
}

fn kinds(tokens: &[PosToken]) -> Vec<PosTokenKind> {
    tokens.iter().map(|t| t.kind.clone()).collect()
}

#[test]
fn math_stays_flat() {
    let tok = expr("$a = 1 + 2 * 3;");
    let PosTokenKind::Math(items) = tok.kind else {
        panic!("expected math, got {tok:?}");
    };
    assert_eq!(
        kinds(&items),
        vec![
            num(1),
            PosTokenKind::Operation(Operation::Add),
            num(2),
            PosTokenKind::Operation(Operation::Multiply),
            num(3),
        ]
    );
}

#[test]
fn logical_binds_looser_than_comparison() {
    let tok = expr("$a = $x == 1 || $y < 2 && $z;");
    let PosTokenKind::Logical { op, left, right } = tok.kind else {
        panic!("expected logical");
    };
    assert_eq!(op, Operation::Or);
    assert!(matches!(left.kind, PosTokenKind::Comparison { op: Operation::Equal, .. }));
    let PosTokenKind::Logical { op, left, .. } = right.kind else {
        panic!("expected nested and");
    };
    assert_eq!(op, Operation::And);
    assert!(matches!(left.kind, PosTokenKind::Comparison { op: Operation::Less, .. }));
}

#[test]
fn prefix_operators() {
    let tok = expr("$a = !$b;");
    assert!(matches!(tok.kind, PosTokenKind::Not(_)));
    let tok = expr("$a = -$b * 2;");
    let PosTokenKind::Math(items) = tok.kind else {
        panic!("expected math");
    };
    assert!(matches!(items[0].kind, PosTokenKind::Negate(_)));
}

#[test]
fn keyword_call_and_dot_chain() {
    let tok = expr("$a = Add(1, 2).ToString().Length;");
    let PosTokenKind::DotGroup { head, chain } = tok.kind else {
        panic!("expected dot group");
    };
    let PosTokenKind::KeywordCall { name, args } = head.kind else {
        panic!("expected call head");
    };
    assert_eq!(name, "Add");
    assert_eq!(kinds(&args), vec![num(1), num(2)]);
    assert_eq!(chain.len(), 2);
    assert!(matches!(&chain[0].kind, ChainKind::Call { name, args } if name == "ToString" && args.is_empty()));
    assert!(matches!(&chain[1].kind, ChainKind::Member(m) if m == "Length"));
}

#[test]
fn indexers_attach_only_without_space() {
    let tok = expr("$a = $list[0].Name;");
    let PosTokenKind::DotGroup { chain, .. } = tok.kind else {
        panic!("expected dot group");
    };
    assert_eq!(chain[0].separator, ChainSeparator::None);
    assert!(matches!(&chain[0].kind, ChainKind::Index(i) if i.kind == num(0)));
}

#[test]
fn extern_thing_static_call() {
    let tok = expr("#System.Text.Builder:New(3);");
    let PosTokenKind::DotGroup { head, chain } = tok.kind else {
        panic!("expected dot group");
    };
    assert_eq!(head.kind, PosTokenKind::ExternThing("System.Text.Builder".into()));
    assert_eq!(chain[0].separator, ChainSeparator::Colon);
}

#[test]
fn shell_calls_collect_named_arguments() {
    let tok = expr("Get-Item ./x -Depth 2 word -Force;");
    let PosTokenKind::ShellCall { name, args } = tok.kind else {
        panic!("expected shell call");
    };
    assert_eq!(name, "Get-Item");
    assert_eq!(args.len(), 4);
    assert_eq!(args[0].kind, PosTokenKind::Constant(Constant::String("./x".into())));
    assert!(matches!(&args[1].kind, PosTokenKind::NamedArg { name, value } if name == "Depth" && value.kind == num(2)));
    assert_eq!(args[2].kind, PosTokenKind::Constant(Constant::String("word".into())));
    assert!(matches!(
        &args[3].kind,
        PosTokenKind::NamedArg { name, value }
            if name == "Force" && value.kind == PosTokenKind::Constant(Constant::Bool(true))
    ));
}

#[test]
fn dotted_keywords_are_strings() {
    let tok = expr("Open System.Text;");
    let PosTokenKind::ShellCall { args, .. } = tok.kind else {
        panic!("expected shell call");
    };
    assert_eq!(args[0].kind, PosTokenKind::Constant(Constant::String("System.Text".into())));
}

#[test]
fn pipelines_nest_to_the_left() {
    let tok = expr("range(0, 5) | Collect | Count;");
    let PosTokenKind::Pipeline { left, right } = tok.kind else {
        panic!("expected pipeline");
    };
    assert_eq!(right.kind, PosTokenKind::Keyword("Count".into()));
    assert!(matches!(left.kind, PosTokenKind::Pipeline { .. }));
}

#[test]
fn named_argument_inside_parenthesized_call() {
    let tok = expr("f(1, -b 2);");
    let PosTokenKind::KeywordCall { args, .. } = tok.kind else {
        panic!("expected call");
    };
    assert!(matches!(&args[1].kind, PosTokenKind::NamedArg { name, .. } if name == "b"));
}

#[test]
fn constants_from_variables() {
    assert_eq!(expr("$a = $true;").kind, PosTokenKind::Constant(Constant::Bool(true)));
    assert_eq!(expr("$a = $NULL;").kind, PosTokenKind::Constant(Constant::Null));
}
