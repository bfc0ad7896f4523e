//! Shared types for the tapec compiler.
//!
//! This crate defines the tape address type, the eight-symbol target
//! instruction alphabet, the variable/temporary handles, the annotated
//! instruction trace entries, and the allocation-snapshot cell reports
//! shared between the code generator and its diagnostic tooling.

mod handles;
mod instruction;
mod report;
mod trace;

pub use handles::{TemporaryArray, TemporaryVariable, Variable, TEMP_ARRAY_MAX};
pub use instruction::Instruction;
pub use report::CellReport;
pub use trace::TraceOp;

/// A zero-based index into the target machine's linear byte tape.
///
/// The tape is unbounded upward; addresses below zero do not exist, so
/// allocation searches clip at 0.
pub type Address = usize;
