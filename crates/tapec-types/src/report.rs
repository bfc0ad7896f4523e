//! Cell reports produced by the memory-allocation snapshot overlay.

use serde::Serialize;

/// What one tape cell held at the end of a run, relabeled with the
/// allocation information of the live scope tree.
///
/// Serializes to the overlay's diagnostic JSON shape: a named cell is
/// `{"name": …, "value": …}`, a residual cell is `{"dirty": …}`, and an
/// untouched free cell is a bare `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellReport {
    /// The cell is owned by a live variable.
    Named { name: String, value: u8 },
    /// The cell was allocated and freed at some point and is not
    /// guaranteed clean.
    Dirty { dirty: u8 },
    /// Never-owned (or proven clean) cell holding zero.
    Free(u8),
}

impl CellReport {
    pub fn named(name: impl Into<String>, value: u8) -> Self {
        CellReport::Named {
            name: name.into(),
            value,
        }
    }
}
