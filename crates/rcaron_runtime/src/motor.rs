//! The execution engine.
use std::sync::Arc;

use rcaron_core::{FastHashMap, FileScope, Frontend, Value, Variable, fast_map_new};
use rcaron_syntax::{ErrorCode, RCaronError, Result, Span};
use tracing::instrument;

use crate::call::Arg;
use crate::config::{Capabilities, FileSystem, MotorOptions};
use crate::core_module::core_module;
use crate::exec::Flow;
use crate::extension::{IndexerImplementation, PropertyAccessor};
use crate::frame::{FrameKind, StackFrame};
use crate::member::CallSiteKey;
use crate::module::Module;
use crate::resolve::{ResolvedMethod, TypeRegistry};
use crate::ExecResult;

/// Tree-walking interpreter over parsed [`FileScope`]s.
///
/// A motor is single-threaded; use [`crate::MotorPool`] to hand isolated
/// instances to concurrent callers.
pub struct Motor {
    pub(crate) options: MotorOptions,
    pub(crate) caps: Capabilities,
    pub(crate) frontend: Option<Arc<dyn Frontend>>,
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) modules: Vec<Arc<dyn Module>>,
    pub(crate) override_modules: Vec<Arc<dyn Module>>,
    pub(crate) indexers: Vec<Arc<dyn IndexerImplementation>>,
    pub(crate) accessors: Vec<Arc<dyn PropertyAccessor>>,
    pub(crate) stack: Vec<StackFrame>,
    pub(crate) call_depth: usize,
    pub(crate) method_cache: FastHashMap<CallSiteKey, ResolvedMethod>,
    pub(crate) import_cache: FastHashMap<String, Arc<FileScope>>,
    /// Host-bound variables seeded into every root frame.
    globals: FastHashMap<String, Value>,
    output: String,
}

impl Motor {
    pub fn new() -> Self {
        Self::with_options(MotorOptions::default())
    }

    pub fn with_options(options: MotorOptions) -> Self {
        Self {
            options,
            caps: Capabilities::default(),
            frontend: None,
            registry: Arc::new(TypeRegistry::new()),
            modules: vec![Arc::new(core_module())],
            override_modules: Vec::new(),
            indexers: Vec::new(),
            accessors: Vec::new(),
            stack: Vec::new(),
            call_depth: 0,
            method_cache: fast_map_new(),
            import_cache: fast_map_new(),
            globals: fast_map_new(),
            output: String::new(),
        }
    }

    pub fn options(&self) -> MotorOptions {
        self.options
    }

    /// Parser used by imports.
    pub fn set_frontend(&mut self, frontend: Arc<dyn Frontend>) {
        self.frontend = Some(frontend);
    }

    pub fn set_file_system(&mut self, fs: Arc<dyn FileSystem>) {
        self.caps.fs = fs;
    }

    pub fn set_capabilities(&mut self, caps: Capabilities) {
        self.caps = caps;
    }

    /// Share one set of host types between motors.
    pub fn set_registry(&mut self, registry: Arc<TypeRegistry>) {
        self.registry = registry;
        self.method_cache.clear();
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Ordinary modules are tried in registration order, after the core module.
    pub fn add_module(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Override modules are tried before every ordinary module.
    pub fn add_override_module(&mut self, module: Arc<dyn Module>) {
        self.override_modules.push(module);
    }

    pub fn add_indexer(&mut self, indexer: Arc<dyn IndexerImplementation>) {
        self.indexers.push(indexer);
    }

    pub fn add_property_accessor(&mut self, accessor: Arc<dyn PropertyAccessor>) {
        self.accessors.push(accessor);
    }

    /// Run the top-level lines of `scope`.
    ///
    /// Returns the value of a top-level `return`, if any. Top-level
    /// variables stay readable through [`Motor::variable`] until the next run.
    #[instrument(level = "debug", skip(self, scope), fields(file = %scope.name()))]
    pub fn run(&mut self, scope: Arc<FileScope>) -> Result<Option<Value>> {
        self.enter(scope.clone());
        let flow = self.exec_lines(&scope.lines);
        self.stack.truncate(1);
        match flow? {
            Flow::Next => Ok(None),
            Flow::Return(v) => Ok(Some(v)),
            Flow::Break | Flow::Continue => Err(RCaronError::new(
                ErrorCode::BreakOutsideLoop,
                "break or continue outside of a loop",
            )),
        }
    }

    /// [`Motor::run`] plus the captured output.
    pub fn execute(&mut self, scope: Arc<FileScope>) -> Result<ExecResult> {
        let value = self.run(scope)?;
        Ok(ExecResult {
            value,
            output: self.take_output(),
        })
    }

    /// Call a script function visible from the current file scope with
    /// positional arguments.
    #[instrument(level = "debug", skip(self, args), fields(args = args.len()))]
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let scope = self.current_file_scope()?;
        let Some((function, owner)) = scope.find_function(name) else {
            return Err(self.method_not_found(name, &scope));
        };
        let args = args.into_iter().map(Arg::Positional).collect();
        let values = crate::call::bind_function(&function, args)?;
        self.invoke_function(&function, owner, values, None, function.span)
    }

    /// Value of `name` as seen from the top of the stack.
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.lookup_variable(name)
    }

    /// Bind a top-level variable for this and every later run.
    pub fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
        if let Some(frame) = self.stack.first_mut() {
            match frame.scope.get_mut(name) {
                Some(var) => var.assign(name, value.clone())?,
                None => {
                    frame.scope.insert(name.to_string(), Variable::Plain(value.clone()));
                }
            }
        }
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    /// Start a session on `scope` without running its lines, so hosts can
    /// call functions directly.
    pub fn enter(&mut self, scope: Arc<FileScope>) {
        self.stack.clear();
        self.call_depth = 0;
        let mut root = StackFrame::new(FrameKind::Block, scope, Span::default());
        for (name, value) in &self.globals {
            root.scope.insert(name.clone(), Variable::Plain(value.clone()));
        }
        self.stack.push(root);
    }

    /// File scope of the innermost frame.
    pub fn current_file_scope(&self) -> Result<Arc<FileScope>> {
        self.stack
            .last()
            .map(|f| f.file_scope.clone())
            .ok_or_else(no_active_run)
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn write_output(&mut self, s: &str) {
        if self.options.capture_output {
            self.output.push_str(s);
        } else {
            print!("{s}");
        }
    }

    pub fn write_line(&mut self, s: &str) {
        self.write_output(s);
        self.write_output("\n");
    }

    /// Drop all per-run state so the motor can be handed out again.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.call_depth = 0;
        self.output.clear();
        self.globals.clear();
        self.method_cache.clear();
        self.import_cache.clear();
    }
}

impl Default for Motor {
    fn default() -> Self {
        Self::new()
    }
}

fn no_active_run() -> RCaronError {
    RCaronError::new(ErrorCode::InvalidOperation, "No script is running on this motor")
}
