//! Statement splitting and line classification.
use rcaron_core::{CodeBlock, Line, LineKind, PosTokenKind, SwitchCase};
use rcaron_syntax::{Operation, Result, Token, TokenKind};

use crate::Parser;
use crate::expr::{Built, Invalid, build_expression, span_of, split_on, variable_constant};
use crate::group::{Raw, RawItem};

/// Bail out of a classifier with an invalid line.
macro_rules! built {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(invalid) => return Ok(Err(invalid)),
        }
    };
}
pub(crate) use built;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Statement {
    If,
    Else,
    While,
    DoWhile,
    For,
    QuickFor,
    ForEach,
    Loop,
    Switch,
    Try,
    Catch,
    Finally,
    Func,
    Class,
    Static,
    Return,
    Break,
    Continue,
    Throw,
    Let,
}

impl Statement {
    fn ends_with_block(self) -> bool {
        !matches!(
            self,
            Statement::Return
                | Statement::Break
                | Statement::Continue
                | Statement::Throw
                | Statement::Let
        )
    }
}

static STATEMENTS: phf::Map<&'static str, Statement> = phf::phf_map! {
    "if" => Statement::If,
    "else" => Statement::Else,
    "while" => Statement::While,
    "dowhile" => Statement::DoWhile,
    "for" => Statement::For,
    "qfor" => Statement::QuickFor,
    "foreach" => Statement::ForEach,
    "loop" => Statement::Loop,
    "switch" => Statement::Switch,
    "try" => Statement::Try,
    "catch" => Statement::Catch,
    "finally" => Statement::Finally,
    "func" => Statement::Func,
    "class" => Statement::Class,
    "static" => Statement::Static,
    "return" => Statement::Return,
    "break" => Statement::Break,
    "continue" => Statement::Continue,
    "throw" => Statement::Throw,
    "let" => Statement::Let,
};

fn statement_of(item: &RawItem) -> Option<Statement> {
    let kw = item.keyword()?;
    STATEMENTS.get(kw.to_ascii_lowercase().as_str()).copied()
}

pub(crate) fn is_keyword(item: &RawItem, word: &str) -> bool {
    item.keyword().is_some_and(|k| k.eq_ignore_ascii_case(word))
}

fn token_op(item: &RawItem) -> Option<Operation> {
    item.token().and_then(Token::op)
}

fn leaves_line_open(last: &RawItem) -> bool {
    last.is_kind(TokenKind::Comma)
        || token_op(last).is_some_and(|op| op.continues_line() || op == Operation::Pipeline)
}

fn continues_line(next: &RawItem) -> bool {
    next.is_block()
        || next.is_kind(TokenKind::Dot)
        || token_op(next).is_some_and(|op| op.continues_line() || op == Operation::Pipeline)
}

/// Cut a block's items into statements.
///
/// A statement ends at `;`, at the end of the block, at a line break that
/// leaves nothing dangling, or right after the body block of a block
/// statement. With `block_ends_any`, every statement ends at its first block,
/// which is how switch cases and class members are laid out.
pub(crate) fn split_statements(items: &[RawItem], block_ends_any: bool) -> Vec<&[RawItem]> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        if item.is_kind(TokenKind::LineEnding) {
            if i > start {
                out.push(&items[start..i]);
            }
            i += 1;
            start = i;
            continue;
        }
        if i > start
            && item.newline_before
            && !leaves_line_open(&items[i - 1])
            && !continues_line(item)
        {
            out.push(&items[start..i]);
            start = i;
            continue;
        }
        if item.is_block()
            && (i == start
                || block_ends_any
                || statement_of(&items[start]).is_some_and(Statement::ends_with_block))
        {
            out.push(&items[start..=i]);
            i += 1;
            start = i;
            continue;
        }
        i += 1;
    }
    if start < items.len() {
        out.push(&items[start..]);
    }
    out
}

pub(crate) fn block_items(item: &RawItem) -> Option<&[RawItem]> {
    match &item.raw {
        Raw::Block(inner) => Some(inner),
        _ => None,
    }
}

pub(crate) fn paren_items(item: &RawItem) -> Option<&[RawItem]> {
    match &item.raw {
        Raw::Paren(inner) => Some(inner),
        _ => None,
    }
}

fn expected(stmt: &[RawItem], shape: &str) -> Invalid {
    Invalid::new(span_of(stmt), format!("Expected `{shape}`"))
}

impl Parser<'_> {
    pub(crate) fn parse_lines(&mut self, items: &[RawItem]) -> Result<Vec<Line>> {
        let mut lines: Vec<Line> = Vec::new();
        for stmt in split_statements(items, false) {
            if self.halted {
                break;
            }
            match statement_of(&stmt[0]) {
                Some(which @ (Statement::Catch | Statement::Finally)) => {
                    if let Some(invalid) = self.attach_handler(&mut lines, which, stmt)? {
                        lines.push(self.invalid_line(invalid)?);
                    }
                }
                _ => {
                    let line = self.parse_line(stmt)?;
                    lines.push(line);
                }
            }
        }
        Ok(lines)
    }

    pub(crate) fn parse_block(&mut self, item: &RawItem) -> Result<CodeBlock> {
        let lines = match block_items(item) {
            Some(inner) => self.parse_lines(inner)?,
            None => Vec::new(),
        };
        Ok(CodeBlock {
            span: item.span,
            lines,
        })
    }

    pub(crate) fn parse_line(&mut self, stmt: &[RawItem]) -> Result<Line> {
        let span = span_of(stmt);
        match self.classify(stmt)? {
            Ok(kind) => Ok(Line::new(span, kind)),
            Err(invalid) => self.invalid_line(invalid),
        }
    }

    /// Hang `catch { }` / `finally { }` on the `try` right before it.
    fn attach_handler(
        &mut self,
        lines: &mut [Line],
        which: Statement,
        stmt: &[RawItem],
    ) -> Result<Option<Invalid>> {
        let [_, body] = stmt else {
            return Ok(Some(expected(stmt, "catch { ... }")));
        };
        if !body.is_block() {
            return Ok(Some(expected(stmt, "catch { ... }")));
        }
        let Some(Line {
            span,
            kind: LineKind::Try { catch, finally, .. },
        }) = lines.last_mut()
        else {
            return Ok(Some(Invalid::new(
                span_of(stmt),
                "`catch` and `finally` must follow a `try` block",
            )));
        };
        let slot = match which {
            Statement::Catch if catch.is_none() && finally.is_none() => catch,
            Statement::Finally if finally.is_none() => finally,
            _ => {
                return Ok(Some(Invalid::new(
                    span_of(stmt),
                    "Duplicate or misplaced `catch`/`finally`",
                )));
            }
        };
        *slot = Some(self.parse_block(body)?);
        *span = span.merge(body.span);
        Ok(None)
    }

    fn classify(&mut self, stmt: &[RawItem]) -> Result<Built<LineKind>> {
        if let [only] = stmt {
            if only.is_block() {
                return Ok(Ok(LineKind::Block(self.parse_block(only)?)));
            }
        }
        if let Some(which) = statement_of(&stmt[0]) {
            return self.classify_statement(which, stmt);
        }

        if let Some(at) = stmt
            .iter()
            .position(|it| token_op(it).is_some_and(Operation::is_assignment))
        {
            let op = token_op(&stmt[at]).unwrap_or(Operation::Assign);
            let (target, value) = (&stmt[..at], &stmt[at + 1..]);
            if target.is_empty() || value.is_empty() {
                return Ok(Err(expected(stmt, "$target = value")));
            }
            let value = built!(build_expression(value));
            let single_variable = match target {
                [single] => single.token().filter(|t| t.kind == TokenKind::Variable),
                _ => None,
            };
            if let Some(tok) = single_variable {
                let name = tok.name().unwrap_or_default();
                if variable_constant(name).is_some() {
                    return Ok(Err(Invalid::new(tok.span, format!("Cannot assign to ${name}"))));
                }
                return Ok(Ok(LineKind::VariableAssignment {
                    name: name.to_string(),
                    op,
                    value,
                }));
            }
            let target = built!(build_expression(target));
            return Ok(match target.kind {
                PosTokenKind::DotGroup { .. } => Ok(LineKind::MemberAssignment { target, op, value }),
                _ => Err(Invalid::new(target.span, "Cannot assign to this expression")),
            });
        }

        if let Some(op) = stmt
            .last()
            .and_then(token_op)
            .filter(|op| matches!(op, Operation::Increment | Operation::Decrement))
        {
            let target = &stmt[..stmt.len() - 1];
            if target.is_empty() {
                return Ok(Err(expected(stmt, "$variable++")));
            }
            let target = built!(build_expression(target));
            return Ok(match target.kind {
                PosTokenKind::Variable(_) | PosTokenKind::DotGroup { .. } => {
                    Ok(LineKind::Unary { target, op })
                }
                _ => Err(Invalid::new(target.span, "Cannot increment this expression")),
            });
        }

        Ok(build_expression(stmt).map(LineKind::Expression))
    }

    fn classify_statement(&mut self, which: Statement, stmt: &[RawItem]) -> Result<Built<LineKind>> {
        let kind = match which {
            Statement::If | Statement::While | Statement::DoWhile => {
                let [_, cond, body] = stmt else {
                    return Ok(Err(expected(stmt, "keyword (condition) { ... }")));
                };
                let (Some(cond), true) = (paren_items(cond), body.is_block()) else {
                    return Ok(Err(expected(stmt, "keyword (condition) { ... }")));
                };
                let condition = built!(build_expression(cond));
                let body = self.parse_block(body)?;
                match which {
                    Statement::If => LineKind::If { condition, body },
                    Statement::While => LineKind::While { condition, body },
                    _ => LineKind::DoWhile { condition, body },
                }
            }
            Statement::Else => match stmt {
                [_, body] if body.is_block() => LineKind::Else {
                    body: self.parse_block(body)?,
                },
                [_, kw, cond, body] if is_keyword(kw, "if") && body.is_block() => {
                    let Some(cond) = paren_items(cond) else {
                        return Ok(Err(expected(stmt, "else if (condition) { ... }")));
                    };
                    let condition = built!(build_expression(cond));
                    LineKind::ElseIf {
                        condition,
                        body: self.parse_block(body)?,
                    }
                }
                _ => return Ok(Err(expected(stmt, "else { ... }"))),
            },
            Statement::For | Statement::QuickFor => {
                let [_, header, body] = stmt else {
                    return Ok(Err(expected(stmt, "for (init; condition; step) { ... }")));
                };
                let (Some(header), true) = (paren_items(header), body.is_block()) else {
                    return Ok(Err(expected(stmt, "for (init; condition; step) { ... }")));
                };
                let parts = split_on(header, TokenKind::LineEnding);
                let [init, condition, step] = parts.as_slice() else {
                    return Ok(Err(Invalid::new(
                        span_of(header),
                        "A for header has exactly three `;`-separated parts",
                    )));
                };
                let init = self.optional_line(init)?;
                let condition = match condition {
                    [] => None,
                    cond => Some(built!(build_expression(cond))),
                };
                let step = self.optional_line(step)?;
                let body = self.parse_block(body)?;
                if which == Statement::For {
                    LineKind::For {
                        init,
                        condition,
                        step,
                        body,
                    }
                } else {
                    LineKind::QuickFor {
                        init,
                        condition,
                        step,
                        body,
                    }
                }
            }
            Statement::ForEach => {
                let [_, header, body] = stmt else {
                    return Ok(Err(expected(stmt, "foreach ($item in source) { ... }")));
                };
                let header = paren_items(header).unwrap_or_default();
                let [var, kw_in, source @ ..] = header else {
                    return Ok(Err(expected(stmt, "foreach ($item in source) { ... }")));
                };
                let variable = match var.token() {
                    Some(tok) if tok.kind == TokenKind::Variable && is_keyword(kw_in, "in") => {
                        tok.name().unwrap_or_default().to_string()
                    }
                    _ => return Ok(Err(expected(stmt, "foreach ($item in source) { ... }"))),
                };
                if !body.is_block() {
                    return Ok(Err(expected(stmt, "foreach ($item in source) { ... }")));
                }
                let source = built!(build_expression(source));
                LineKind::ForEach {
                    variable,
                    source,
                    body: self.parse_block(body)?,
                }
            }
            Statement::Loop => match stmt {
                [_, body] if body.is_block() => LineKind::Loop {
                    body: self.parse_block(body)?,
                },
                _ => return Ok(Err(expected(stmt, "loop { ... }"))),
            },
            Statement::Try => match stmt {
                [_, body] if body.is_block() => LineKind::Try {
                    body: self.parse_block(body)?,
                    catch: None,
                    finally: None,
                },
                _ => return Ok(Err(expected(stmt, "try { ... }"))),
            },
            Statement::Catch | Statement::Finally => {
                return Ok(Err(Invalid::new(
                    span_of(stmt),
                    "`catch` and `finally` must follow a `try` block",
                )));
            }
            Statement::Switch => {
                let [_, subject, body] = stmt else {
                    return Ok(Err(expected(stmt, "switch (value) { case { ... } }")));
                };
                let (Some(subject), Some(cases)) = (paren_items(subject), block_items(body)) else {
                    return Ok(Err(expected(stmt, "switch (value) { case { ... } }")));
                };
                let subject = built!(build_expression(subject));
                LineKind::Switch {
                    subject,
                    cases: self.parse_switch_cases(cases)?,
                }
            }
            Statement::Func => {
                let function = built!(self.parse_function(&stmt[1..], span_of(stmt))?);
                let name = function.name.clone();
                self.register_function(function);
                LineKind::FunctionDeclaration { name }
            }
            Statement::Class => {
                let class = built!(self.parse_class(stmt)?);
                let name = class.name.clone();
                self.register_class(class);
                LineKind::ClassDeclaration { name }
            }
            Statement::Static => {
                return Ok(Err(Invalid::new(
                    stmt[0].span,
                    "`static` is only allowed inside a class",
                )));
            }
            Statement::Return => match stmt {
                [_] => LineKind::Return(None),
                [_, value @ ..] => LineKind::Return(Some(built!(build_expression(value)))),
                [] => LineKind::Return(None),
            },
            Statement::Break | Statement::Continue => match stmt {
                [_] if which == Statement::Break => LineKind::Break,
                [_] => LineKind::Continue,
                _ => return Ok(Err(Invalid::new(span_of(stmt), "Unexpected tokens after jump"))),
            },
            Statement::Throw => match stmt {
                [_, value @ ..] if !value.is_empty() => {
                    LineKind::Throw(built!(build_expression(value)))
                }
                _ => return Ok(Err(expected(stmt, "throw value"))),
            },
            Statement::Let => {
                let [_, var, assign, value @ ..] = stmt else {
                    return Ok(Err(expected(stmt, "let $name = value")));
                };
                let name = match var.token() {
                    Some(tok)
                        if tok.kind == TokenKind::Variable
                            && token_op(assign) == Some(Operation::Assign)
                            && !value.is_empty() =>
                    {
                        tok.name().unwrap_or_default().to_string()
                    }
                    _ => return Ok(Err(expected(stmt, "let $name = value"))),
                };
                LineKind::LetAssignment {
                    name,
                    value: built!(build_expression(value)),
                }
            }
        };
        Ok(Ok(kind))
    }

    fn optional_line(&mut self, items: &[RawItem]) -> Result<Option<Box<Line>>> {
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(self.parse_line(items)?)))
    }

    fn parse_switch_cases(&mut self, items: &[RawItem]) -> Result<Vec<SwitchCase>> {
        let mut cases = Vec::new();
        for stmt in split_statements(items, true) {
            if self.halted {
                break;
            }
            let span = span_of(stmt);
            let Some((body, value)) = stmt.split_last().filter(|(b, v)| b.is_block() && !v.is_empty())
            else {
                self.invalid_line(Invalid::new(span, "Expected `value { ... }` in switch"))?;
                continue;
            };
            let value = match value {
                [only] if is_keyword(only, "default") => None,
                value => match build_expression(value) {
                    Ok(v) => Some(v),
                    Err(invalid) => {
                        self.invalid_line(invalid)?;
                        continue;
                    }
                },
            };
            cases.push(SwitchCase {
                span,
                value,
                body: self.parse_block(body)?,
            });
        }
        Ok(cases)
    }
}
