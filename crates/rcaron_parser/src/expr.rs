//! Expression building.
//!
//! Works on the grouped items of one statement fragment. Adjacent items are
//! first folded into value pieces (dot chains, calls, groups, literals), then
//! the pieces are split by operator precedence from the loosest binding
//! inward: pipelines, shell calls, `||`, `&&`, comparisons, and finally flat
//! math groups that the engine evaluates by operator priority.
use std::sync::Arc;

use rcaron_core::{ChainKind, ChainLink, ChainSeparator, Constant, PosToken, PosTokenKind};
use rcaron_syntax::{Operation, Span, Token, TokenKind, TokenValue};
use smallvec::SmallVec;

use crate::group::{Raw, RawItem};

/// Rejected fragment. The caller turns it into a `ParseInvalidLine` report.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Invalid {
    pub span: Span,
    pub message: String,
}

impl Invalid {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

pub(crate) type Built<T> = std::result::Result<T, Invalid>;

#[derive(Clone, Debug)]
enum Piece {
    Value(PosToken),
    Op(Operation, Span),
    Named(String, Span),
}

impl Piece {
    fn span(&self) -> Span {
        match self {
            Piece::Value(t) => t.span,
            Piece::Op(_, s) | Piece::Named(_, s) => *s,
        }
    }

    fn op(&self) -> Option<Operation> {
        match self {
            Piece::Op(op, _) => Some(*op),
            _ => None,
        }
    }
}

pub(crate) fn span_of(items: &[RawItem]) -> Span {
    match (items.first(), items.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => Span::default(),
    }
}

fn span_of_pieces(pieces: &[Piece]) -> Span {
    match (pieces.first(), pieces.last()) {
        (Some(first), Some(last)) => first.span().merge(last.span()),
        _ => Span::default(),
    }
}

/// `$true`, `$false` and `$null` read as constants.
pub(crate) fn variable_constant(name: &str) -> Option<Constant> {
    if name.eq_ignore_ascii_case("true") {
        Some(Constant::Bool(true))
    } else if name.eq_ignore_ascii_case("false") {
        Some(Constant::Bool(false))
    } else if name.eq_ignore_ascii_case("null") {
        Some(Constant::Null)
    } else {
        None
    }
}

/// Literal carried by a single token, if any.
pub(crate) fn token_constant(tok: &Token) -> Option<Constant> {
    match (&tok.kind, &tok.value) {
        (TokenKind::String, TokenValue::Str(s)) => Some(Constant::String(Arc::from(s.as_str()))),
        (TokenKind::Char, TokenValue::Char(c)) => Some(Constant::Char(*c)),
        (TokenKind::Number, TokenValue::Number(n)) => Some(Constant::Number(*n)),
        (TokenKind::Path, TokenValue::Name(p)) => Some(Constant::String(Arc::from(p.as_str()))),
        (TokenKind::Variable, TokenValue::Name(n)) => variable_constant(n),
        _ => None,
    }
}

/// Split `items` on top-level tokens of `kind`. An empty input yields no parts.
pub(crate) fn split_on(items: &[RawItem], kind: TokenKind) -> Vec<&[RawItem]> {
    if items.is_empty() {
        return Vec::new();
    }
    items.split(|it| it.is_kind(kind)).collect()
}

/// Build one full expression.
pub(crate) fn build_expression(items: &[RawItem]) -> Built<PosToken> {
    if items.is_empty() {
        return Err(Invalid::new(Span::default(), "Expected an expression"));
    }
    let pieces = pieces(items)?;
    build_pipeline(&pieces)
}

/// Build one call argument: an expression or a `-Name value` pair.
pub(crate) fn build_argument(items: &[RawItem]) -> Built<PosToken> {
    let span = span_of(items);
    if items.is_empty() {
        return Err(Invalid::new(span, "Empty argument"));
    }
    let pieces = pieces(items)?;
    if let Some(Piece::Named(name, name_span)) = pieces.first() {
        let value = match &pieces[1..] {
            [] => PosToken::constant(*name_span, Constant::Bool(true)),
            rest => build_pipeline(rest)?,
        };
        return Ok(named_arg(name.clone(), value, span));
    }
    build_pipeline(&pieces)
}

fn named_arg(name: String, value: PosToken, span: Span) -> PosToken {
    PosToken::new(
        span,
        PosTokenKind::NamedArg {
            name,
            value: Box::new(value),
        },
    )
}

/// Comma separated argument list of a parenthesized call.
pub(crate) fn build_arguments(items: &[RawItem]) -> Built<Vec<PosToken>> {
    split_on(items, TokenKind::Comma)
        .into_iter()
        .map(build_argument)
        .collect()
}

fn pieces(items: &[RawItem]) -> Built<Vec<Piece>> {
    let mut out = Vec::with_capacity(items.len());
    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        i += 1;
        let head = match &item.raw {
            Raw::Tok(tok) => match tok.kind {
                TokenKind::Operation => {
                    let op = tok.op().ok_or_else(|| Invalid::new(tok.span, "Bad operator"))?;
                    out.push(Piece::Op(op, tok.span));
                    continue;
                }
                TokenKind::NamedArgument => {
                    out.push(Piece::Named(tok.name().unwrap_or_default().to_string(), tok.span));
                    continue;
                }
                TokenKind::Keyword => {
                    let name = tok.name().unwrap_or_default().to_string();
                    match adjacent_paren(items, i) {
                        Some((inner, paren_span)) => {
                            i += 1;
                            PosToken::new(
                                tok.span.merge(paren_span),
                                PosTokenKind::KeywordCall {
                                    name,
                                    args: build_arguments(inner)?,
                                },
                            )
                        }
                        _ => PosToken::new(tok.span, PosTokenKind::Keyword(name)),
                    }
                }
                TokenKind::Variable => match token_constant(tok) {
                    Some(c) => PosToken::constant(tok.span, c),
                    None => PosToken::new(
                        tok.span,
                        PosTokenKind::Variable(tok.name().unwrap_or_default().to_string()),
                    ),
                },
                TokenKind::ExternThing => PosToken::new(
                    tok.span,
                    PosTokenKind::ExternThing(tok.name().unwrap_or_default().to_string()),
                ),
                TokenKind::String | TokenKind::Char | TokenKind::Number | TokenKind::Path => {
                    let c = token_constant(tok)
                        .ok_or_else(|| Invalid::new(tok.span, "Malformed literal"))?;
                    PosToken::constant(tok.span, c)
                }
                _ => {
                    return Err(Invalid::new(
                        tok.span,
                        format!("Unexpected {:?} in expression", tok.kind),
                    ));
                }
            },
            Raw::Paren(inner) => {
                if inner.is_empty() {
                    return Err(Invalid::new(item.span, "Empty parentheses"));
                }
                PosToken::new(item.span, PosTokenKind::Group(Box::new(build_expression(inner)?)))
            }
            Raw::Bracket(_) => {
                return Err(Invalid::new(item.span, "Indexer without a value to index"));
            }
            Raw::Block(_) => {
                return Err(Invalid::new(item.span, "Unexpected block in expression"));
            }
        };
        let value = chain(head, items, &mut i)?;
        out.push(Piece::Value(value));
    }
    Ok(out)
}

/// Parenthesized list written directly against the previous item.
fn adjacent_paren(items: &[RawItem], at: usize) -> Option<(&[RawItem], Span)> {
    match items.get(at) {
        Some(RawItem {
            raw: Raw::Paren(inner),
            span,
            space_before: false,
            ..
        }) => Some((inner.as_slice(), *span)),
        _ => None,
    }
}

/// Collect `.member`, `.call(..)`, `:member` and `[index]` links after `head`.
fn chain(head: PosToken, items: &[RawItem], i: &mut usize) -> Built<PosToken> {
    let mut links: Vec<ChainLink> = Vec::new();
    loop {
        let Some(next) = items.get(*i) else { break };
        match &next.raw {
            Raw::Bracket(inner) if !next.space_before => {
                let index = build_expression(inner)?;
                links.push(ChainLink {
                    span: next.span,
                    separator: ChainSeparator::None,
                    kind: ChainKind::Index(Box::new(index)),
                });
                *i += 1;
            }
            Raw::Tok(tok) if tok.kind == TokenKind::Dot || tok.kind == TokenKind::Colon => {
                let separator = if tok.kind == TokenKind::Dot {
                    ChainSeparator::Dot
                } else {
                    // `:` only follows an extern thing directly.
                    if next.space_before
                        || !links.is_empty()
                        || !matches!(head.kind, PosTokenKind::ExternThing(_))
                    {
                        break;
                    }
                    ChainSeparator::Colon
                };
                let Some(name_item) = items.get(*i + 1) else {
                    return Err(Invalid::new(tok.span, "Expected a member name"));
                };
                let Some(name) = name_item.keyword().filter(|_| !name_item.space_before) else {
                    return Err(Invalid::new(name_item.span, "Expected a member name"));
                };
                let name = name.to_string();
                *i += 2;
                let mut span = tok.span.merge(name_item.span);
                let kind = match adjacent_paren(items, *i) {
                    Some((inner, paren_span)) => {
                        *i += 1;
                        span = span.merge(paren_span);
                        ChainKind::Call {
                            name,
                            args: build_arguments(inner)?,
                        }
                    }
                    _ => ChainKind::Member(name),
                };
                links.push(ChainLink {
                    span,
                    separator,
                    kind,
                });
            }
            _ => break,
        }
    }
    if links.is_empty() {
        return Ok(head);
    }
    let span = head.span.merge(links[links.len() - 1].span);
    // `System.Text` style dotted names are plain strings.
    if let PosTokenKind::Keyword(first) = &head.kind {
        let mut dotted = first.clone();
        let all_members = links.iter().all(|l| match &l.kind {
            ChainKind::Member(m) if l.separator == ChainSeparator::Dot => {
                dotted.push('.');
                dotted.push_str(m);
                true
            }
            _ => false,
        });
        if all_members {
            return Ok(PosToken::constant(span, Constant::String(Arc::from(dotted))));
        }
    }
    Ok(PosToken::new(
        span,
        PosTokenKind::DotGroup {
            head: Box::new(head),
            chain: links,
        },
    ))
}

fn last_top_level(pieces: &[Piece], pred: impl Fn(Operation) -> bool) -> Option<usize> {
    pieces.iter().rposition(|p| p.op().is_some_and(&pred))
}

fn build_pipeline(pieces: &[Piece]) -> Built<PosToken> {
    if let Some(at) = last_top_level(pieces, |op| op == Operation::Pipeline) {
        let (left, right) = (&pieces[..at], &pieces[at + 1..]);
        if left.is_empty() || right.is_empty() {
            return Err(Invalid::new(pieces[at].span(), "Pipeline needs a stage on both sides"));
        }
        let left = build_pipeline(left)?;
        let right = build_stage(right)?;
        return Ok(PosToken::new(
            left.span.merge(right.span),
            PosTokenKind::Pipeline {
                left: Box::new(left),
                right: Box::new(right),
            },
        ));
    }
    build_stage(pieces)
}

/// `Name arg arg -Flag value` when a bare keyword is followed by arguments.
fn build_stage(pieces: &[Piece]) -> Built<PosToken> {
    let shell_name = match pieces {
        [Piece::Value(head), Piece::Value(_) | Piece::Named(..), ..] => head.keyword(),
        _ => None,
    };
    let Some(name) = shell_name else {
        return build_logical(pieces);
    };
    let mut args: SmallVec<[PosToken; 4]> = SmallVec::new();
    let mut i = 1;
    while i < pieces.len() {
        match &pieces[i] {
            Piece::Named(arg_name, span) => {
                let value = match pieces.get(i + 1) {
                    Some(Piece::Value(v)) => {
                        i += 1;
                        shell_word(v.clone())
                    }
                    _ => PosToken::constant(*span, Constant::Bool(true)),
                };
                let span = span.merge(value.span);
                args.push(named_arg(arg_name.clone(), value, span));
            }
            Piece::Value(v) => args.push(shell_word(v.clone())),
            Piece::Op(op, span) => {
                return Err(Invalid::new(
                    *span,
                    format!(
                        "Operator '{}' is not allowed in a shell-style call; wrap the expression in parentheses",
                        op.as_str()
                    ),
                ));
            }
        }
        i += 1;
    }
    Ok(PosToken::new(
        span_of_pieces(pieces),
        PosTokenKind::ShellCall {
            name: name.to_string(),
            args: args.into_vec(),
        },
    ))
}

/// Bare words in shell arguments are strings.
fn shell_word(token: PosToken) -> PosToken {
    match token.kind {
        PosTokenKind::Keyword(word) => PosToken::constant(token.span, Constant::String(Arc::from(word))),
        _ => token,
    }
}

fn build_logical(pieces: &[Piece]) -> Built<PosToken> {
    for op in [Operation::Or, Operation::And] {
        if let Some(at) = last_top_level(pieces, |o| o == op) {
            let (left, right) = binary_sides(pieces, at)?;
            let left = build_logical(left)?;
            let right = build_logical(right)?;
            return Ok(PosToken::new(
                left.span.merge(right.span),
                PosTokenKind::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            ));
        }
    }
    if let Some(at) = last_top_level(pieces, Operation::is_comparison) {
        let (left, right) = binary_sides(pieces, at)?;
        let op = pieces[at].op().unwrap_or(Operation::Equal);
        let left = build_logical(left)?;
        let right = build_math(right)?;
        return Ok(PosToken::new(
            left.span.merge(right.span),
            PosTokenKind::Comparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        ));
    }
    build_math(pieces)
}

fn binary_sides(pieces: &[Piece], at: usize) -> Built<(&[Piece], &[Piece])> {
    let (left, right) = (&pieces[..at], &pieces[at + 1..]);
    if left.is_empty() || right.is_empty() {
        let op = pieces[at].op().map_or("?", Operation::as_str);
        return Err(Invalid::new(
            pieces[at].span(),
            format!("Operator '{op}' needs an operand on both sides"),
        ));
    }
    Ok((left, right))
}

fn build_math(pieces: &[Piece]) -> Built<PosToken> {
    let mut out: Vec<PosToken> = Vec::with_capacity(pieces.len());
    let mut expect_value = true;
    let mut i = 0;
    while i < pieces.len() {
        let piece = &pieces[i];
        i += 1;
        if expect_value {
            let value = match piece {
                Piece::Value(v) => v.clone(),
                Piece::Op(op @ (Operation::Subtract | Operation::Not), span) => {
                    let operand = unary_operand(pieces, &mut i, *span)?;
                    let span = span.merge(operand.span);
                    let kind = if *op == Operation::Not {
                        PosTokenKind::Not(Box::new(operand))
                    } else {
                        PosTokenKind::Negate(Box::new(operand))
                    };
                    PosToken::new(span, kind)
                }
                Piece::Op(op, span) => {
                    return Err(Invalid::new(
                        *span,
                        format!("Expected a value before '{}'", op.as_str()),
                    ));
                }
                Piece::Named(name, span) => {
                    return Err(Invalid::new(
                        *span,
                        format!("Named argument '-{name}' outside of a call"),
                    ));
                }
            };
            out.push(value);
            expect_value = false;
        } else {
            match piece {
                Piece::Op(op, span) if op.is_math() => {
                    out.push(PosToken::new(*span, PosTokenKind::Operation(*op)));
                    expect_value = true;
                }
                other => {
                    return Err(Invalid::new(other.span(), "Expected an operator"));
                }
            }
        }
    }
    if expect_value {
        return Err(Invalid::new(span_of_pieces(pieces), "Expected a value"));
    }
    if out.len() == 1 {
        return Ok(out.remove(0));
    }
    Ok(PosToken::new(span_of_pieces(pieces), PosTokenKind::Math(out)))
}

fn unary_operand(pieces: &[Piece], i: &mut usize, op_span: Span) -> Built<PosToken> {
    match pieces.get(*i) {
        Some(Piece::Value(v)) => {
            *i += 1;
            Ok(v.clone())
        }
        Some(Piece::Op(op @ (Operation::Subtract | Operation::Not), span)) => {
            *i += 1;
            let inner = unary_operand(pieces, i, *span)?;
            let span = span.merge(inner.span);
            let kind = if *op == Operation::Not {
                PosTokenKind::Not(Box::new(inner))
            } else {
                PosTokenKind::Negate(Box::new(inner))
            };
            Ok(PosToken::new(span, kind))
        }
        _ => Err(Invalid::new(op_span, "Prefix operator without an operand")),
    }
}
