//! Reference tape-machine interpreter.
//!
//! Executes generated programs directly, instruction by instruction.
//! Used as the golden reference for validating compiler output: tests
//! compile a program, run it here, and assert on the bytes written and
//! the tape left behind.

pub mod error;
pub mod machine;

pub use error::{EvalError, EvalResult};
pub use machine::{Machine, Run};
