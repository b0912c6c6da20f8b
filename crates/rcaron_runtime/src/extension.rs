//! Pluggable member and indexer fallbacks.
//!
//! Consulted in registration order, only after the engine's own array,
//! string, class and host-object handling found nothing.
use rcaron_core::Value;
use rcaron_syntax::Result;

use crate::Motor;

pub trait IndexerImplementation: Send + Sync {
    /// Replace `target` with `target[index]` and return `true`, or leave it
    /// untouched and return `false`.
    fn try_index(&self, motor: &mut Motor, index: &Value, target: &mut Value) -> Result<bool>;
}

pub trait PropertyAccessor: Send + Sync {
    /// Replace `target` with `target.name` and return `true`, or leave it
    /// untouched and return `false`.
    fn try_get(&self, motor: &mut Motor, name: &str, target: &mut Value) -> Result<bool>;
}
