use rcaron_core::Constant;

use crate::expr::token_constant;
use crate::group::RawItem;

/// Fold a fragment that must be a single literal.
///
/// Only literal tokens fold: numbers, strings, chars, paths and
/// `$true`/`$false`/`$null`. Anything computed is rejected.
pub(crate) fn fold_constant(items: &[RawItem]) -> Option<Constant> {
    match items {
        [only] => only.token().and_then(token_constant),
        _ => None,
    }
}
