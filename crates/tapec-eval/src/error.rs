//! Interpreter errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbalanced loop brackets in program")]
    UnbalancedLoops,
    #[error("cursor moved left of the tape start")]
    CursorUnderflow,
    #[error("cursor moved past the tape end ({len} cells)")]
    CursorOverflow { len: usize },
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
}

pub type EvalResult<T> = Result<T, EvalError>;
