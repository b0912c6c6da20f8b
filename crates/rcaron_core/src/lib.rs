//! Core types for the RCaron engine.
//!
//! This crate holds everything the parser produces and the engine consumes:
//! - `PosToken` / `Line` / `CodeBlock` - the grouped, classified program tree
//! - `FileScope` - one parsed unit with its function and class tables
//! - `Value` - boxed runtime values and the primitive operator matrix
//! - `ClassDefinition` / `ClassInstance` - script classes
//! - `Pipeline` - single-consumption value streams between calls
//! - `HostType` / `HostObject` - the host interop capability
mod class;
mod file_scope;
mod frontend;
mod line;
pub mod ops;
mod pipeline;
mod tree;
mod types;
mod value;
mod variable;

pub use class::{ClassDefinition, ClassInstance};
pub use file_scope::{FileScope, Function, Parameter};
pub use frontend::Frontend;
pub use line::{CodeBlock, Line, LineKind, SwitchCase};
pub use pipeline::{ChannelWriter, Pipeline, PipelineEnumerator};
pub use tree::{ChainKind, ChainLink, ChainSeparator, Constant, PosToken, PosTokenKind};
pub use types::{HostFn, HostMethod, HostObject, HostType, MethodKind, RType};
pub use value::{ArrayRef, Value};
pub use variable::Variable;

pub type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

pub fn fast_map_new<K, V>() -> FastHashMap<K, V> {
    hashbrown::HashMap::with_hasher(ahash::RandomState::new())
}
