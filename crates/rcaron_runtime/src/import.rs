//! Multi-file composition: loading other source files into the current scope.
use std::path::Path;
use std::sync::Arc;

use rcaron_core::FileScope;
use rcaron_syntax::{ErrorCode, RCaronError, Result};
use tracing::debug;

use crate::Motor;

/// `path` relative to the directory of the importing file.
fn resolve_path(importer: &FileScope, path: &str) -> String {
    let target = Path::new(path);
    if target.is_absolute() {
        return path.to_string();
    }
    match Path::new(importer.name()).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(target).to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}

impl Motor {
    /// Parse `path` once per motor. Top-level lines of the loaded file are
    /// not executed; only its declarations become visible.
    fn load_file(&mut self, path: &str) -> Result<Arc<FileScope>> {
        let importer = self.current_file_scope()?;
        let key = resolve_path(&importer, path);
        if let Some(scope) = self.import_cache.get(&key) {
            return Ok(scope.clone());
        }
        let text = self.caps.fs.read_text(&key).map_err(|e| {
            RCaronError::new(
                ErrorCode::ImportNotFound,
                format!("Cannot import '{key}': {e}"),
            )
        })?;
        let Some(frontend) = self.frontend.clone() else {
            return Err(RCaronError::new(
                ErrorCode::HostError,
                "No frontend configured to parse imported files",
            ));
        };
        let scope = frontend.parse_file(&key, &text)?;
        debug!(
            path = %key,
            functions = scope.functions.len(),
            classes = scope.classes.len(),
            "loaded import"
        );
        self.import_cache.insert(key, scope.clone());
        Ok(scope)
    }

    /// Make every function and class of `path` visible from the current file.
    pub fn import_file(&mut self, path: &str) -> Result<()> {
        let loaded = self.load_file(path)?;
        self.current_file_scope()?.import_scope(loaded);
        Ok(())
    }

    /// Make only the named functions and classes of `path` visible.
    pub fn import_selected(&mut self, path: &str, functions: &[String], classes: &[String]) -> Result<()> {
        let loaded = self.load_file(path)?;
        let importer = self.current_file_scope()?;
        for name in functions {
            let Some(function) = loaded.function(name) else {
                return Err(RCaronError::new(
                    ErrorCode::FunctionToImportNotFound,
                    format!("'{}' declares no function '{name}'", loaded.name()),
                ));
            };
            importer.import_function(function.clone(), loaded.clone());
        }
        for name in classes {
            let Some(class) = loaded.class(name) else {
                return Err(RCaronError::new(
                    ErrorCode::ClassToImportNotFound,
                    format!("'{}' declares no class '{name}'", loaded.name()),
                ));
            };
            importer.import_class(class.clone(), loaded.clone());
        }
        debug!(path, functions = functions.len(), classes = classes.len(), "selective import");
        Ok(())
    }
}
