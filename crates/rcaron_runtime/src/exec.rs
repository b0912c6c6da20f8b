//! Statement execution and control flow.
use std::sync::Arc;

use rcaron_core::{CodeBlock, Line, LineKind, PosToken, PosTokenKind, Value, Variable, ops};
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span};
use tracing::trace;

use crate::Motor;
use crate::frame::{FrameKind, StackFrame};

/// How a statement left its block.
#[derive(Debug)]
pub(crate) enum Flow {
    Next,
    Break,
    Continue,
    Return(Value),
}

/// State of the if/else-if/else chain a block is in the middle of.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chain {
    None,
    /// No branch ran yet.
    Pending,
    /// A branch already ran; the rest of the chain is skipped.
    Done,
}

fn orphan(what: &str) -> RCaronError {
    RCaronError::new(
        ErrorCode::ParseInvalidLine,
        format!("'{what}' without a preceding 'if'"),
    )
}

/// Loop exit decided by one body run, `None` to keep going.
fn loop_exit(flow: Flow) -> Option<Flow> {
    match flow {
        Flow::Break => Some(Flow::Next),
        Flow::Return(v) => Some(Flow::Return(v)),
        Flow::Next | Flow::Continue => None,
    }
}

impl Motor {
    pub(crate) fn exec_lines(&mut self, lines: &[Line]) -> Result<Flow> {
        let mut chain = Chain::None;
        for line in lines {
            trace!(start = line.span.start.0, end = line.span.end.0, "exec line");
            let flow = self
                .exec_line(line, &mut chain)
                .map_err(|e| e.or_span(line.span))?;
            if !matches!(flow, Flow::Next) {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    pub(crate) fn exec_block(&mut self, block: &CodeBlock, kind: FrameKind, span: Span) -> Result<Flow> {
        self.exec_scoped(block, kind, span, None)
    }

    /// Run `block` in a new frame, optionally binding one variable in it.
    /// The stack is restored whether or not the block fails.
    pub(crate) fn exec_scoped(
        &mut self,
        block: &CodeBlock,
        kind: FrameKind,
        span: Span,
        binding: Option<(&str, Value)>,
    ) -> Result<Flow> {
        let mut frame = StackFrame::new(kind, self.current_file_scope()?, span);
        if let Some((name, value)) = binding {
            frame.scope.insert(name.to_string(), Variable::Plain(value));
        }
        let base = self.stack.len();
        self.stack.push(frame);
        let flow = self.exec_lines(&block.lines);
        self.stack.truncate(base);
        flow
    }

    fn exec_line(&mut self, line: &Line, chain: &mut Chain) -> Result<Flow> {
        let span = line.span;
        let prev = std::mem::replace(chain, Chain::None);
        match &line.kind {
            LineKind::If { condition, body } => {
                if self.condition(condition)? {
                    *chain = Chain::Done;
                    return self.exec_block(body, FrameKind::Block, span);
                }
                *chain = Chain::Pending;
                Ok(Flow::Next)
            }
            LineKind::ElseIf { condition, body } => match prev {
                Chain::None => Err(orphan("else if")),
                Chain::Done => {
                    *chain = Chain::Done;
                    Ok(Flow::Next)
                }
                Chain::Pending => {
                    if self.condition(condition)? {
                        *chain = Chain::Done;
                        return self.exec_block(body, FrameKind::Block, span);
                    }
                    *chain = Chain::Pending;
                    Ok(Flow::Next)
                }
            },
            LineKind::Else { body } => match prev {
                Chain::None => Err(orphan("else")),
                Chain::Done => Ok(Flow::Next),
                Chain::Pending => self.exec_block(body, FrameKind::Block, span),
            },
            LineKind::VariableAssignment { name, op, value } => {
                let mut v = self.eval(value)?;
                if let Some(base) = op.compound_base() {
                    let current = self.lookup(name)?;
                    v = ops::arithmetic(base, &current, &v)?;
                }
                self.assign_variable(name, v)?;
                Ok(Flow::Next)
            }
            LineKind::LetAssignment { name, value } => {
                let v = self.eval(value)?;
                if let Some(frame) = self.stack.last_mut() {
                    frame.scope.insert(name.clone(), Variable::new_let(v));
                }
                Ok(Flow::Next)
            }
            LineKind::While { condition, body } => {
                while self.condition(condition)? {
                    let flow = self.exec_block(body, FrameKind::Loop, span)?;
                    if let Some(exit) = loop_exit(flow) {
                        return Ok(exit);
                    }
                }
                Ok(Flow::Next)
            }
            LineKind::DoWhile { condition, body } => {
                loop {
                    let flow = self.exec_block(body, FrameKind::Loop, span)?;
                    if let Some(exit) = loop_exit(flow) {
                        return Ok(exit);
                    }
                    if !self.condition(condition)? {
                        return Ok(Flow::Next);
                    }
                }
            }
            LineKind::For {
                init,
                condition,
                step,
                body,
            } => self.exec_for(init.as_deref(), condition.as_ref(), step.as_deref(), body, true, span),
            LineKind::QuickFor {
                init,
                condition,
                step,
                body,
            } => self.exec_for(init.as_deref(), condition.as_ref(), step.as_deref(), body, false, span),
            LineKind::ForEach {
                variable,
                source,
                body,
            } => {
                let source = self.eval(source)?;
                // Dropping the iterator on any exit releases its source.
                let iter = self.iterate(&source)?;
                for item in iter {
                    let flow = self.exec_scoped(body, FrameKind::Loop, span, Some((variable.as_str(), item?)))?;
                    if let Some(exit) = loop_exit(flow) {
                        return Ok(exit);
                    }
                }
                Ok(Flow::Next)
            }
            LineKind::Loop { body } => loop {
                let flow = self.exec_block(body, FrameKind::Loop, span)?;
                if let Some(exit) = loop_exit(flow) {
                    return Ok(exit);
                }
            },
            LineKind::Switch { subject, cases } => {
                let subject = self.eval(subject)?;
                let mut default = None;
                for case in cases {
                    match &case.value {
                        None => default = Some(case),
                        Some(value) => {
                            if self.eval(value)?.loose_equals(&subject) {
                                return self.exec_block(&case.body, FrameKind::Block, case.span);
                            }
                        }
                    }
                }
                match default {
                    Some(case) => self.exec_block(&case.body, FrameKind::Block, case.span),
                    None => Ok(Flow::Next),
                }
            }
            LineKind::Try {
                body,
                catch,
                finally,
            } => {
                let outcome = match self.exec_block(body, FrameKind::Block, span) {
                    Err(err) => match catch {
                        Some(handler) => {
                            let thrown = err.payload::<Value>().cloned();
                            let payload = thrown.unwrap_or_else(|| Value::Error(Arc::new(err)));
                            self.exec_scoped(handler, FrameKind::Catch, span, Some(("exception", payload)))
                        }
                        None => Err(err),
                    },
                    ok => ok,
                };
                if let Some(finally) = finally {
                    match self.exec_block(finally, FrameKind::Block, span)? {
                        Flow::Next => {}
                        flow => return Ok(flow),
                    }
                }
                outcome
            }
            LineKind::FunctionDeclaration { .. } | LineKind::ClassDeclaration { .. } => Ok(Flow::Next),
            LineKind::Unary { target, op } => {
                let current = self.eval(target)?;
                let next = ops::step(&current, *op)?;
                self.assign_target(target, next)?;
                Ok(Flow::Next)
            }
            LineKind::MemberAssignment { target, op, value } => {
                let mut v = self.eval(value)?;
                if let Some(base) = op.compound_base() {
                    let current = self.eval(target)?;
                    v = ops::arithmetic(base, &current, &v)?;
                }
                self.assign_target(target, v)?;
                Ok(Flow::Next)
            }
            LineKind::Expression(token) => {
                self.eval(token)?;
                Ok(Flow::Next)
            }
            LineKind::Return(value) => Ok(Flow::Return(match value {
                Some(v) => self.eval(v)?,
                None => Value::Null,
            })),
            LineKind::Break => Ok(Flow::Break),
            LineKind::Continue => Ok(Flow::Continue),
            LineKind::Throw(token) => match self.eval(token)? {
                Value::Error(err) => Err((*err).clone()),
                value => Err(RCaronError::thrown(value.to_display_string(), Arc::new(value))),
            },
            LineKind::Block(block) => self.exec_block(block, FrameKind::Block, span),
            LineKind::Invalid => Err(RCaronError::at(
                ErrorCode::ParseInvalidLine,
                "Cannot execute a line that failed to parse",
                span,
            )),
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Line>,
        condition: Option<&PosToken>,
        step: Option<&Line>,
        body: &CodeBlock,
        scope_per_iteration: bool,
        span: Span,
    ) -> Result<Flow> {
        let header = StackFrame::new(FrameKind::Loop, self.current_file_scope()?, span);
        let base = self.stack.len();
        self.stack.push(header);
        let flow = self.run_for(init, condition, step, body, scope_per_iteration, span);
        self.stack.truncate(base);
        flow
    }

    fn run_for(
        &mut self,
        init: Option<&Line>,
        condition: Option<&PosToken>,
        step: Option<&Line>,
        body: &CodeBlock,
        scope_per_iteration: bool,
        span: Span,
    ) -> Result<Flow> {
        if let Some(init) = init {
            self.exec_line(init, &mut Chain::None)?;
        }
        loop {
            if let Some(condition) = condition {
                if !self.condition(condition)? {
                    return Ok(Flow::Next);
                }
            }
            let flow = if scope_per_iteration {
                self.exec_block(body, FrameKind::Loop, span)?
            } else {
                self.exec_lines(&body.lines)?
            };
            if let Some(exit) = loop_exit(flow) {
                return Ok(exit);
            }
            if let Some(step) = step {
                self.exec_line(step, &mut Chain::None)?;
            }
        }
    }

    pub(crate) fn condition(&mut self, token: &PosToken) -> Result<bool> {
        let value = self.eval(token)?;
        value.as_bool().ok_or_else(|| {
            RCaronError::at(
                ErrorCode::ExpectedBoolean,
                format!("Expected a bool condition, got {}", value.type_name()),
                token.span,
            )
        })
    }

    /// Store into a variable, property, static slot or indexer.
    pub(crate) fn assign_target(&mut self, target: &PosToken, value: Value) -> Result<()> {
        match &target.kind {
            PosTokenKind::Variable(name) => self.assign_variable(name, value),
            PosTokenKind::Group(inner) => self.assign_target(inner, value),
            PosTokenKind::DotGroup { head, chain } => self.assign_chain(head, chain, value),
            _ => Err(RCaronError::at(
                ErrorCode::InvalidOperation,
                "Cannot assign to this expression",
                target.span,
            )),
        }
    }
}
