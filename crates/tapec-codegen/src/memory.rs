//! Flat allocator over tape addresses.
//!
//! The whole program shares one [`Memory`]. It hands out contiguous
//! address runs as close as possible to a requested anchor and tracks
//! which scope owns each occupied cell, so a scope can never release
//! memory it did not allocate. Owner tokens are opaque [`ScopeId`]s
//! compared only by identity, never dereferenced.

use std::collections::{BTreeMap, BTreeSet};

use tapec_types::Address;

use crate::error::{CodegenError, CodegenResult};

/// Opaque identity token for the scope that owns an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u64);

/// The tape allocator: a mapping from occupied address to owning scope,
/// plus the set of "dirty" addresses (freed at least once, so not
/// guaranteed to hold zero).
#[derive(Debug, Default)]
pub struct Memory {
    tape: BTreeMap<Address, ScopeId>,
    dirty: BTreeSet<Address>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a free, contiguous run of `size` cells closest to
    /// `next_to` and mark every cell as owned by `owner`.
    ///
    /// The search expands a radius around the anchor; at each radius the
    /// run *ending* at `next_to - radius` is tried before the run
    /// *starting* at `next_to + radius`, so lower addresses win ties.
    /// The tape is unbounded upward, so the search always succeeds.
    pub fn allocate(&mut self, owner: ScopeId, next_to: Address, size: usize) -> Address {
        let start = self.find_free_run(next_to, size);
        for offset in 0..size {
            self.tape.insert(start + offset, owner);
            self.dirty.remove(&(start + offset));
        }
        start
    }

    /// Release exactly one cell previously allocated by `owner`.
    ///
    /// The cell is recorded as dirty: the allocator cannot prove what
    /// the generated program left in it.
    pub fn free(&mut self, owner: ScopeId, address: Address) -> CodegenResult<()> {
        match self.tape.get(&address) {
            None => Err(CodegenError::NotAllocated(address)),
            Some(cell_owner) if *cell_owner != owner => Err(CodegenError::ForeignOwner(address)),
            Some(_) => {
                self.tape.remove(&address);
                self.dirty.insert(address);
                Ok(())
            }
        }
    }

    /// Whether `address` was freed at some point and never reallocated.
    pub fn is_dirty(&self, address: Address) -> bool {
        self.dirty.contains(&address)
    }

    fn find_free_run(&self, next_to: Address, size: usize) -> Address {
        for radius in 0.. {
            // Low side: run ending at next_to - radius.
            if let Some(start) = next_to
                .checked_sub(radius)
                .and_then(|end| (end + 1).checked_sub(size))
            {
                if self.run_is_free(start, size) {
                    return start;
                }
            }

            // High side: run starting at next_to + radius.
            let start = next_to + radius;
            if self.run_is_free(start, size) {
                return start;
            }
        }
        unreachable!("the tape is unbounded upward")
    }

    fn run_is_free(&self, start: Address, size: usize) -> bool {
        (start..start + size).all(|address| !self.tape.contains_key(&address))
    }
}
