//! Lightweight handles binding names (or nothing, for temporaries) to
//! tape addresses.
//!
//! A handle never owns tape memory — the scope that declared it does,
//! and releases it through the allocator on scope exit.

use crate::Address;

/// Largest allowed [`TemporaryArray`] size.
pub const TEMP_ARRAY_MAX: usize = 16;

/// A named, address-bound value with scope-bound lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    address: Address,
}

impl Variable {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// An unnamed, address-bound value used internally by codegen
/// primitives. Not part of any symbol table; tracked only in the set of
/// live temporaries of the scope that declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryVariable {
    address: Address,
}

impl TemporaryVariable {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(self) -> Address {
        self.address
    }
}

/// A contiguous run of 1 to [`TEMP_ARRAY_MAX`] temporary cells, freed as
/// a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryArray {
    address: Address,
    size: usize,
}

impl TemporaryArray {
    /// Build a handle over `size` cells starting at `address`.
    ///
    /// The size bound is checked by the declaring scope before any cell
    /// is allocated; this constructor only asserts it.
    pub fn new(address: Address, size: usize) -> Self {
        assert!(
            size >= 1 && size <= TEMP_ARRAY_MAX,
            "temporary array size {size} out of range 1..={TEMP_ARRAY_MAX}"
        );
        Self { address, size }
    }

    pub fn address(self) -> Address {
        self.address
    }

    pub fn size(self) -> usize {
        self.size
    }

    /// The cell at `index` as a single-cell temporary handle.
    pub fn at(self, index: usize) -> TemporaryVariable {
        assert!(
            index < self.size,
            "index {index} out of bounds for temporary array of size {}",
            self.size
        );
        TemporaryVariable::new(self.address + index)
    }

    /// All cells, in address order.
    pub fn cells(self) -> impl Iterator<Item = TemporaryVariable> {
        (0..self.size).map(move |offset| TemporaryVariable::new(self.address + offset))
    }
}
