use std::sync::Arc;

use rcaron_syntax::Result;

use crate::FileScope;

/// Source-to-`FileScope` front end, injected into the engine so imports can
/// parse other files without the engine depending on the parser.
pub trait Frontend: Send + Sync {
    fn parse_file(&self, name: &str, text: &str) -> Result<Arc<FileScope>>;
}
