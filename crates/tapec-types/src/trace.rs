//! Entries of the emitted instruction trace.
//!
//! The trace is the intermediate representation between the code
//! generator and the printer: an ordered log of labeled instruction
//! groups interleaved with scope boundary markers that drive
//! indentation.

use serde::Serialize;

/// One entry of the instruction trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceOp {
    /// A run of raw instruction text attributed to a human-readable
    /// operation label, recorded with the label-stack depth at emission
    /// time.
    Group {
        code: String,
        label: String,
        level: usize,
    },
    /// A scope was opened; the printout indents from here.
    ScopeOpen,
    /// A scope was closed; the printout dedents from here.
    ScopeClose,
}

impl TraceOp {
    pub fn group(code: impl Into<String>, label: impl Into<String>, level: usize) -> Self {
        TraceOp::Group {
            code: code.into(),
            label: label.into(),
            level,
        }
    }
}
