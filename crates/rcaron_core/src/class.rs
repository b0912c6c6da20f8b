//! Script classes.
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use rcaron_syntax::Span;

use crate::{FileScope, Function, PosToken, Value};

/// Template produced by a `class Name { ... }` declaration.
///
/// Everything except `static_values` is fixed at parse time. The static slots
/// are shared by every instance and by every engine running the class.
pub struct ClassDefinition {
    pub name: String,
    pub span: Span,
    pub property_names: Vec<String>,
    /// One entry per property; `None` leaves the slot `$null`.
    pub property_initializers: Vec<Option<PosToken>>,
    /// Keyed by lowercase name.
    pub functions: IndexMap<String, Arc<Function>>,
    /// Keyed by lowercase name.
    pub static_functions: IndexMap<String, Arc<Function>>,
    pub static_property_names: Vec<String>,
    pub static_values: Mutex<Vec<Value>>,
}

impl ClassDefinition {
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.property_names
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
    }

    pub fn static_property_index(&self, name: &str) -> Option<usize> {
        self.static_property_names
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
    }

    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn static_function(&self, name: &str) -> Option<&Arc<Function>> {
        self.static_functions.get(&name.to_ascii_lowercase())
    }

    pub fn get_static(&self, index: usize) -> Option<Value> {
        self.static_values.lock().get(index).cloned()
    }

    pub fn set_static(&self, index: usize, value: Value) -> bool {
        match self.static_values.lock().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("property_names", &self.property_names)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("static_functions", &self.static_functions.keys().collect::<Vec<_>>())
            .field("static_property_names", &self.static_property_names)
            .finish()
    }
}

/// Per-instance property slots of a script class.
pub struct ClassInstance {
    pub definition: Arc<ClassDefinition>,
    /// File scope the class was declared in.
    pub scope: Weak<FileScope>,
    properties: Mutex<Vec<Value>>,
}

impl ClassInstance {
    /// Instance with every property slot set to `$null`.
    pub fn new(definition: Arc<ClassDefinition>, scope: &Arc<FileScope>) -> Self {
        let properties = vec![Value::Null; definition.property_names.len()];
        Self {
            definition,
            scope: Arc::downgrade(scope),
            properties: Mutex::new(properties),
        }
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.properties.lock().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.properties.lock().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.definition
            .property_index(name)
            .and_then(|i| self.get(i))
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("class", &self.definition.name)
            .field("properties", &*self.properties.lock())
            .finish()
    }
}
