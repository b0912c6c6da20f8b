//! Call/block stack frames.
use std::sync::Arc;

use rcaron_core::{ClassDefinition, ClassInstance, FastHashMap, FileScope, Variable, fast_map_new};
use rcaron_syntax::Span;

/// Class whose members a function frame exposes as pseudo-variables.
#[derive(Clone, Debug)]
pub(crate) enum ClassContext {
    Instance(Arc<ClassInstance>),
    Static(Arc<ClassDefinition>),
}

impl ClassContext {
    pub(crate) fn definition(&self) -> &Arc<ClassDefinition> {
        match self {
            ClassContext::Instance(i) => &i.definition,
            ClassContext::Static(d) => d,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum FrameKind {
    Block,
    /// Target of `break` and `continue`.
    Loop,
    /// Variable lookups stop here.
    Function { class: Option<ClassContext> },
    /// Holds `$exception` while a catch body runs.
    Catch,
}

pub(crate) struct StackFrame {
    pub(crate) kind: FrameKind,
    pub(crate) scope: FastHashMap<String, Variable>,
    pub(crate) file_scope: Arc<FileScope>,
    /// Statement or call that pushed the frame.
    pub(crate) span: Span,
}

impl StackFrame {
    pub(crate) fn new(kind: FrameKind, file_scope: Arc<FileScope>, span: Span) -> Self {
        Self {
            kind,
            scope: fast_map_new(),
            file_scope,
            span,
        }
    }

    pub(crate) fn is_return_worthy(&self) -> bool {
        matches!(self.kind, FrameKind::Function { .. })
    }

    pub(crate) fn class_context(&self) -> Option<&ClassContext> {
        match &self.kind {
            FrameKind::Function { class } => class.as_ref(),
            _ => None,
        }
    }
}
