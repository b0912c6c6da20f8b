use pretty_assertions::assert_eq;
use rcaron_lexer::{
    CollectingErrorHandler, ErrorHandler, SilentErrorHandler, ThrowingErrorHandler, tokenize,
};
use rcaron_syntax::{ErrorCode, Number, Operation, Token, TokenKind, TokenValue};

fn significant(src: &str) -> Vec<Token> {
    let mut handler = ThrowingErrorHandler;
    tokenize(src, &mut handler)
        .expect("lex")
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect()
}

fn kinds(src: &str) -> Vec<TokenKind> {
    significant(src).into_iter().map(|t| t.kind).collect()
}

#[test]
fn assignment_statement() {
    assert_eq!(
        kinds("$h = ((3*3)+2)*2/2;"),
        vec![
            TokenKind::Variable,
            TokenKind::Operation,
            TokenKind::GroupStart,
            TokenKind::GroupStart,
            TokenKind::Number,
            TokenKind::Operation,
            TokenKind::Number,
            TokenKind::GroupEnd,
            TokenKind::Operation,
            TokenKind::Number,
            TokenKind::GroupEnd,
            TokenKind::Operation,
            TokenKind::Number,
            TokenKind::Operation,
            TokenKind::Number,
            TokenKind::LineEnding,
        ]
    );
}

#[test]
fn range_is_not_split() {
    let toks = significant("1..5");
    assert_eq!(toks.len(), 3);
    assert_eq!(toks[1].op(), Some(Operation::Range));
    assert_eq!(toks[0].value, TokenValue::Number(Number::I64(1)));
    assert_eq!(toks[2].value, TokenValue::Number(Number::I64(5)));
}

#[test]
fn fractional_and_member_call_on_integer() {
    let toks = significant("1.5");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].value, TokenValue::Number(Number::F64(1.5)));

    assert_eq!(
        kinds("1.ToString()"),
        vec![
            TokenKind::Number,
            TokenKind::Dot,
            TokenKind::Keyword,
            TokenKind::GroupStart,
            TokenKind::GroupEnd,
        ]
    );
}

#[test]
fn negative_literals_depend_on_the_previous_token() {
    let toks = significant("$a = -1;");
    assert_eq!(toks[2].value, TokenValue::Number(Number::I64(-1)));

    let toks = significant("$a-1");
    assert_eq!(toks[1].op(), Some(Operation::Subtract));

    let toks = significant("return -1;");
    assert_eq!(toks[1].value, TokenValue::Number(Number::I64(-1)));
}

#[test]
fn named_arguments_and_dashed_keywords() {
    let toks = significant("Get-Item -Path './x' -Force");
    assert_eq!(toks[0].name(), Some("Get-Item"));
    assert_eq!(toks[1].kind, TokenKind::NamedArgument);
    assert_eq!(toks[1].name(), Some("Path"));
    assert_eq!(toks[2].kind, TokenKind::String);
    assert_eq!(toks[3].name(), Some("Force"));
}

#[test]
fn extern_thing_and_colon() {
    let toks = significant("#System.Text.Builder:New()");
    assert_eq!(toks[0].kind, TokenKind::ExternThing);
    assert_eq!(toks[0].name(), Some("System.Text.Builder"));
    assert_eq!(toks[1].kind, TokenKind::Colon);
    assert_eq!(toks[2].name(), Some("New"));
}

#[test]
fn comments_are_trivia() {
    let src = "#!/usr/bin/rcaron\n// line\n/# outer /# inner #/ still #/ $a";
    let toks = significant(src);
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].name(), Some("a"));
}

#[test]
fn paths_only_at_argument_start() {
    let toks = significant("OpenFromFile ./lib/math.rcaron;");
    assert_eq!(toks[1].kind, TokenKind::Path);
    assert_eq!(toks[1].name(), Some("./lib/math.rcaron"));
    assert_eq!(toks[2].kind, TokenKind::LineEnding);
}

#[test]
fn backtick_escapes_keyword_characters() {
    let toks = significant("print a`;b");
    assert_eq!(toks[1].name(), Some("a;b"));
}

#[test]
fn char_literals() {
    let toks = significant("c'x' c'\\n'");
    assert_eq!(toks[0].value, TokenValue::Char('x'));
    assert_eq!(toks[1].value, TokenValue::Char('\n'));

    let mut handler = CollectingErrorHandler::new();
    tokenize("c'xy'", &mut handler).expect("lex");
    assert_eq!(handler.errors()[0].code, ErrorCode::InvalidCharacterLiteral);

    let mut handler = CollectingErrorHandler::new();
    tokenize("c'x", &mut handler).expect("lex");
    assert_eq!(handler.errors()[0].code, ErrorCode::UnterminatedCharacterLiteral);
}

#[test]
fn whitespace_tokens_remember_newlines() {
    let mut handler = ThrowingErrorHandler;
    let toks = tokenize("$a \n $b", &mut handler).expect("lex");
    assert_eq!(toks[1].kind, TokenKind::Whitespace);
    assert!(toks[1].has_newline());
}

#[test]
fn unexpected_character_is_skipped() {
    let mut handler = SilentErrorHandler::new();
    let toks = tokenize("$a € $b", &mut handler).expect("lex");
    let names: Vec<_> = toks.iter().filter_map(|t| t.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(!handler.allows_execution());
}

#[test]
fn throwing_handler_stops_at_first_error() {
    let mut handler = ThrowingErrorHandler;
    let err = tokenize("'\\z'", &mut handler).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidEscape);
    assert!(err.span.is_some());
}

#[test]
fn read_next_is_pull_based() {
    let mut handler = ThrowingErrorHandler;
    let mut lexer = rcaron_lexer::Lexer::new("$a;");
    let first = lexer.read_next(&mut handler).expect("lex").expect("token");
    assert_eq!(first.kind, TokenKind::Variable);
    assert_eq!(lexer.position(), 2);
    let second = lexer.read_next(&mut handler).expect("lex").expect("token");
    assert_eq!(second.kind, TokenKind::LineEnding);
    assert!(lexer.read_next(&mut handler).expect("lex").is_none());
}
