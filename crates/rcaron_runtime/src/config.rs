//! Engine options and injected system capabilities.
use std::sync::Arc;

/// Engine knobs, fixed for the lifetime of a [`crate::Motor`].
#[derive(Clone, Copy, Debug)]
pub struct MotorOptions {
    /// Nested script calls allowed before `RecursionLimitExceeded`.
    pub max_call_depth: usize,
    /// Collect `print` output for [`crate::Motor::take_output`] instead of
    /// writing it to stdout.
    pub capture_output: bool,
}

impl Default for MotorOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            capture_output: true,
        }
    }
}

/// Source text access used by imports.
pub trait FileSystem: Send + Sync {
    fn read_text(&self, path: &str) -> Result<String, String>;
}

pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_text(&self, path: &str) -> Result<String, String> {
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    }
}

#[derive(Clone)]
pub struct Capabilities {
    pub fs: Arc<dyn FileSystem>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            fs: Arc::new(StdFileSystem),
        }
    }
}
