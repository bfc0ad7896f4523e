//! Debug overlay: relabel a raw final tape with variable names.
//!
//! Meant for inspecting the tape a finished program leaves behind. Runs
//! against the compiler's live scope chain, so it is most useful right
//! before scopes are popped, or at the root where long-lived variables
//! reside.

use std::collections::HashMap;

use tapec_types::{Address, CellReport};

use crate::compiler::Transcompiler;
use crate::error::{CodegenError, CodegenResult};

/// Relabels each cell of `tape` with the variable that owns it.
///
/// Names are gathered walking the scope chain innermost first, so a
/// shadowing inner variable wins over the outer one it hides. Unowned
/// cells must hold zero unless the allocator remembers them as dirty;
/// any other non-zero cell is an invariant violation.
pub fn snapshot(compiler: &Transcompiler, tape: &[u8]) -> CodegenResult<Vec<CellReport>> {
    let scopes = compiler.scopes();

    let mut names: HashMap<Address, &str> = HashMap::new();
    for frame in scopes.frames_innermost_first() {
        for variable in frame.variables() {
            names.entry(variable.address()).or_insert(variable.name());
        }
    }

    tape.iter()
        .enumerate()
        .map(|(address, &value)| {
            if let Some(name) = names.get(&address) {
                return Ok(CellReport::named(*name, value));
            }
            if value == 0 {
                return Ok(CellReport::Free(0));
            }
            if scopes.memory().is_dirty(address) {
                return Ok(CellReport::Dirty { dirty: value });
            }
            Err(CodegenError::UnaccountedCell { address, value })
        })
        .collect()
}
