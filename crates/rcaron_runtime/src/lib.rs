//! RCaron execution engine.
//!
//! The [`Motor`] walks the lines of a parsed [`rcaron_core::FileScope`],
//! dispatching bare calls to script functions and host [`Module`]s and
//! member calls to script classes or host types through the
//! [`TypeRegistry`] overload scoring.
mod builtin;
mod call;
mod config;
mod core_module;
mod eval;
mod exec;
mod extension;
mod frame;
mod import;
mod member;
mod module;
mod motor;
mod pool;
mod resolve;

use rcaron_core::Value;

pub use call::Arg;
pub use config::{Capabilities, FileSystem, MotorOptions, StdFileSystem};
pub use core_module::core_module;
pub use eval::ValueIter;
pub use extension::{IndexerImplementation, PropertyAccessor};
pub use module::{CallContext, CallShape, MethodTable, Module, ModuleFn, ModuleMethod, ModuleParam, TableModule};
pub use motor::Motor;
pub use pool::{MotorPool, PooledMotor};
pub use resolve::{
    ResolvedMethod, SCORE_ASSIGNABLE, SCORE_EXACT, TypeRegistry, score_candidate, score_parameter, widen,
    widens,
};

/// Outcome of [`Motor::execute`].
#[derive(Debug)]
pub struct ExecResult {
    /// Value of a top-level `return`.
    pub value: Option<Value>,
    pub output: String,
}
