//! Codegen error types.
//!
//! Every failure here is a static, deterministic defect in how the API
//! was used (or in the code generator itself); there is no recovery
//! path, compilation aborts at the first error.

use tapec_types::{Address, TEMP_ARRAY_MAX};
use thiserror::Error;

/// Errors that can occur while generating a tape-machine program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A name was declared twice in the same scope.
    #[error("can't redeclare variable \"{0}\" in the same scope")]
    Redeclared(String),

    /// A name was referenced but no scope in the active chain declares it.
    #[error("variable \"{0}\" doesn't exist")]
    Undeclared(String),

    /// An address was freed without ever being allocated.
    #[error("cell at address {0} is not allocated")]
    NotAllocated(Address),

    /// An address was freed by a scope that does not own it.
    #[error("cell at address {0} is not allocated by the scope that is requesting to free it")]
    ForeignOwner(Address),

    /// A temporary handle was released by a scope that is not tracking it.
    #[error("temporary at address {0} is not tracked by this scope")]
    UntrackedTemporary(Address),

    /// A scope (or the finished program) still holds live temporaries.
    #[error("can't discard a scope while {0} temporary allocation(s) are still live")]
    TemporaryLeak(usize),

    /// The root scope was asked for its parent.
    #[error("the root scope has no parent")]
    NoParentScope,

    /// A temporary array was requested outside the supported size range.
    #[error("temporary array size must be 1..={max}, got {0}", max = TEMP_ARRAY_MAX)]
    ArraySizeOutOfRange(usize),

    /// The allocation snapshot found a non-zero cell that no live
    /// variable owns and that was never freed — a codegen bug.
    #[error("unaccounted non-zero cell at address {address} with value {value}")]
    UnaccountedCell { address: Address, value: u8 },
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
