//! Parsed compilation unit.
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rcaron_syntax::{SourceFile, Span};

use crate::{ClassDefinition, CodeBlock, Constant, FastHashMap, Line, RType, fast_map_new};

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// `None` marks a required parameter.
    pub default: Option<Constant>,
}

/// Script function. The owning file scope is whichever scope the function
/// was found in at call time.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub span: Span,
    pub params: Vec<Parameter>,
    pub body: CodeBlock,
}

/// One parsed source unit: its statements, declarations and the mutable
/// state attached to it by `Open`/import operations.
pub struct FileScope {
    pub source: SourceFile,
    pub lines: Vec<Line>,
    /// Keyed by lowercase name.
    pub functions: IndexMap<String, Arc<Function>>,
    pub classes: Vec<Arc<ClassDefinition>>,
    opened_namespaces: RwLock<Vec<String>>,
    opened_extension_namespaces: RwLock<Vec<String>>,
    type_cache: RwLock<FastHashMap<String, RType>>,
    imported_scopes: RwLock<Vec<Arc<FileScope>>>,
    imported_functions: RwLock<Vec<(Arc<Function>, Arc<FileScope>)>>,
    imported_classes: RwLock<Vec<(Arc<ClassDefinition>, Arc<FileScope>)>>,
}

impl FileScope {
    pub fn new(
        source: SourceFile,
        lines: Vec<Line>,
        functions: IndexMap<String, Arc<Function>>,
        classes: Vec<Arc<ClassDefinition>>,
    ) -> Self {
        Self {
            source,
            lines,
            functions,
            classes,
            opened_namespaces: RwLock::new(Vec::new()),
            opened_extension_namespaces: RwLock::new(Vec::new()),
            type_cache: RwLock::new(fast_map_new()),
            imported_scopes: RwLock::new(Vec::new()),
            imported_functions: RwLock::new(Vec::new()),
            imported_classes: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn text(&self) -> &str {
        self.source.text.as_str()
    }

    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassDefinition>> {
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Function visible from this scope, own declarations first, then
    /// selective imports, then wholesale imports. Returns the scope the
    /// function body must run in.
    pub fn find_function(
        self: &Arc<Self>,
        name: &str,
    ) -> Option<(Arc<Function>, Arc<FileScope>)> {
        if let Some(f) = self.function(name) {
            return Some((f.clone(), self.clone()));
        }
        if let Some((f, s)) = self
            .imported_functions
            .read()
            .iter()
            .find(|(f, _)| f.name.eq_ignore_ascii_case(name))
        {
            return Some((f.clone(), s.clone()));
        }
        self.imported_scopes
            .read()
            .iter()
            .find_map(|s| s.function(name).map(|f| (f.clone(), s.clone())))
    }

    pub fn find_class(
        self: &Arc<Self>,
        name: &str,
    ) -> Option<(Arc<ClassDefinition>, Arc<FileScope>)> {
        if let Some(c) = self.class(name) {
            return Some((c.clone(), self.clone()));
        }
        if let Some((c, s)) = self
            .imported_classes
            .read()
            .iter()
            .find(|(c, _)| c.name.eq_ignore_ascii_case(name))
        {
            return Some((c.clone(), s.clone()));
        }
        self.imported_scopes
            .read()
            .iter()
            .find_map(|s| s.class(name).map(|c| (c.clone(), s.clone())))
    }

    /// Names of every visible function, for suggestions.
    pub fn visible_function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.values().map(|f| f.name.clone()).collect();
        names.extend(self.imported_functions.read().iter().map(|(f, _)| f.name.clone()));
        for s in self.imported_scopes.read().iter() {
            names.extend(s.functions.values().map(|f| f.name.clone()));
        }
        names
    }

    /// Import `scope` wholesale. Re-importing the same file replaces the
    /// earlier entry, so repeated runs of one scope do not accumulate.
    pub fn import_scope(&self, scope: Arc<FileScope>) {
        let mut imported = self.imported_scopes.write();
        match imported.iter_mut().find(|s| same_file(s, &scope)) {
            Some(slot) => *slot = scope,
            None => imported.push(scope),
        }
    }

    pub fn import_function(&self, function: Arc<Function>, owner: Arc<FileScope>) {
        let mut imported = self.imported_functions.write();
        let existing = imported
            .iter_mut()
            .find(|(f, s)| f.name.eq_ignore_ascii_case(&function.name) && same_file(s, &owner));
        match existing {
            Some(slot) => *slot = (function, owner),
            None => imported.push((function, owner)),
        }
    }

    pub fn import_class(&self, class: Arc<ClassDefinition>, owner: Arc<FileScope>) {
        let mut imported = self.imported_classes.write();
        let existing = imported
            .iter_mut()
            .find(|(c, s)| c.name.eq_ignore_ascii_case(&class.name) && same_file(s, &owner));
        match existing {
            Some(slot) => *slot = (class, owner),
            None => imported.push((class, owner)),
        }
    }

    pub fn imported_scopes(&self) -> Vec<Arc<FileScope>> {
        self.imported_scopes.read().clone()
    }

    pub fn open_namespace(&self, namespace: &str) {
        let mut opened = self.opened_namespaces.write();
        if !opened.iter().any(|n| n == namespace) {
            opened.push(namespace.to_string());
        }
        self.type_cache.write().clear();
    }

    pub fn open_extension_namespace(&self, namespace: &str) {
        let mut opened = self.opened_extension_namespaces.write();
        if !opened.iter().any(|n| n == namespace) {
            opened.push(namespace.to_string());
        }
    }

    pub fn opened_namespaces(&self) -> Vec<String> {
        self.opened_namespaces.read().clone()
    }

    pub fn opened_extension_namespaces(&self) -> Vec<String> {
        self.opened_extension_namespaces.read().clone()
    }

    pub fn has_opened_namespaces(&self) -> bool {
        !self.opened_namespaces.read().is_empty()
    }

    pub fn cached_type(&self, name: &str) -> Option<RType> {
        self.type_cache.read().get(name).cloned()
    }

    pub fn cache_type(&self, name: &str, ty: RType) {
        self.type_cache.write().insert(name.to_string(), ty);
    }
}

impl std::fmt::Debug for FileScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileScope")
            .field("name", &self.source.name)
            .field("lines", &self.lines.len())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field(
                "classes",
                &self.classes.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn same_file(a: &Arc<FileScope>, b: &Arc<FileScope>) -> bool {
    Arc::ptr_eq(a, b) || a.name() == b.name()
}
