//! Hierarchical scopes: symbol tables, temporary tracking, lifetimes.
//!
//! The active parent chain is kept as a stack of frames, innermost
//! last. Named lookups walk the stack outward, so the nearest enclosing
//! declaration wins (standard lexical shadowing). Each frame carries an
//! identity token under which it owns its tape cells; a frame may only
//! be discarded once every temporary it declared has been released.

use std::collections::BTreeMap;

use tapec_types::{Address, TemporaryArray, TemporaryVariable, Variable, TEMP_ARRAY_MAX};

use crate::error::{CodegenError, CodegenResult};
use crate::memory::{Memory, ScopeId};

/// One lexical lifetime region: named variables plus live temporaries.
#[derive(Debug)]
pub struct ScopeFrame {
    id: ScopeId,
    variables: BTreeMap<String, Variable>,
    /// Live temporary allocations: start address to cell count.
    temporaries: BTreeMap<Address, usize>,
}

impl ScopeFrame {
    fn new(id: ScopeId) -> Self {
        Self {
            id,
            variables: BTreeMap::new(),
            temporaries: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// The variables declared directly in this frame.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Fails while this frame still tracks any live temporary.
    pub fn verify_before_discard(&self) -> CodegenResult<()> {
        if self.temporaries.is_empty() {
            Ok(())
        } else {
            Err(CodegenError::TemporaryLeak(self.temporaries.len()))
        }
    }
}

/// The active scope chain, root first, plus the one shared allocator.
#[derive(Debug)]
pub struct ScopeStack {
    memory: Memory,
    frames: Vec<ScopeFrame>,
    next_id: u64,
}

impl ScopeStack {
    /// A fresh chain holding only the root scope.
    pub fn new() -> Self {
        Self {
            memory: Memory::new(),
            frames: vec![ScopeFrame::new(ScopeId(0))],
            next_id: 1,
        }
    }

    /// Open a child scope.
    pub fn push(&mut self) {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        self.frames.push(ScopeFrame::new(id));
    }

    /// Discard the innermost scope. The caller must already have swept
    /// its named variables; outstanding temporaries are an error.
    pub fn pop(&mut self) -> CodegenResult<()> {
        if self.frames.len() == 1 {
            return Err(CodegenError::NoParentScope);
        }
        self.current().verify_before_discard()?;
        self.frames.pop();
        Ok(())
    }

    pub fn has_parent(&self) -> bool {
        self.frames.len() > 1
    }

    /// Declare `name` in the innermost scope, allocated near `next_to`.
    ///
    /// Shadowing an outer declaration is allowed; redeclaring within the
    /// same scope is not.
    pub fn declare_variable(&mut self, name: &str, next_to: Address) -> CodegenResult<Address> {
        if self.current().variables.contains_key(name) {
            return Err(CodegenError::Redeclared(name.to_string()));
        }
        let id = self.current().id;
        let address = self.memory.allocate(id, next_to, 1);
        self.current_mut()
            .variables
            .insert(name.to_string(), Variable::new(name, address));
        Ok(address)
    }

    /// Remove `name` from the innermost scope and release its cell.
    pub fn unset_variable(&mut self, name: &str) -> CodegenResult<()> {
        let id = self.current().id;
        let variable = self
            .current_mut()
            .variables
            .remove(name)
            .ok_or_else(|| CodegenError::Undeclared(name.to_string()))?;
        self.memory.free(id, variable.address())
    }

    /// Allocate one anonymous cell near `next_to`, tracked by the
    /// innermost scope.
    pub fn declare_temporary(&mut self, next_to: Address) -> TemporaryVariable {
        let id = self.current().id;
        let address = self.memory.allocate(id, next_to, 1);
        self.current_mut().temporaries.insert(address, 1);
        TemporaryVariable::new(address)
    }

    /// Allocate a contiguous run of `size` anonymous cells near
    /// `next_to`, tracked (and later freed) as a unit.
    pub fn declare_temporary_array(
        &mut self,
        next_to: Address,
        size: usize,
    ) -> CodegenResult<TemporaryArray> {
        if size == 0 || size > TEMP_ARRAY_MAX {
            return Err(CodegenError::ArraySizeOutOfRange(size));
        }
        let id = self.current().id;
        let address = self.memory.allocate(id, next_to, size);
        self.current_mut().temporaries.insert(address, size);
        Ok(TemporaryArray::new(address, size))
    }

    /// Release a temporary tracked by the innermost scope.
    pub fn unset_temporary(&mut self, temporary: TemporaryVariable) -> CodegenResult<()> {
        let id = self.current().id;
        let address = temporary.address();
        if self.current().temporaries.get(&address) != Some(&1) {
            return Err(CodegenError::UntrackedTemporary(address));
        }
        self.current_mut().temporaries.remove(&address);
        self.memory.free(id, address)
    }

    /// Release a temporary array tracked by the innermost scope, one
    /// cell at a time.
    pub fn unset_temporary_array(&mut self, array: TemporaryArray) -> CodegenResult<()> {
        let id = self.current().id;
        let address = array.address();
        if self.current().temporaries.get(&address) != Some(&array.size()) {
            return Err(CodegenError::UntrackedTemporary(address));
        }
        self.current_mut().temporaries.remove(&address);
        for cell in array.cells() {
            self.memory.free(id, cell.address())?;
        }
        Ok(())
    }

    /// Resolve `name` against the nearest enclosing declaration.
    pub fn variable(&self, name: &str) -> CodegenResult<&Variable> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(name))
            .ok_or_else(|| CodegenError::Undeclared(name.to_string()))
    }

    /// The tape address `name` resolves to.
    pub fn address_of(&self, name: &str) -> CodegenResult<Address> {
        Ok(self.variable(name)?.address())
    }

    /// Names declared directly in the innermost scope.
    pub fn local_variable_names(&self) -> Vec<String> {
        self.current().variables.keys().cloned().collect()
    }

    /// Fails if the innermost scope still holds live temporaries.
    pub fn verify_before_discard(&self) -> CodegenResult<()> {
        self.current().verify_before_discard()
    }

    /// Fails if any scope in the active chain still holds live
    /// temporaries. Run once, before the finished program is printed.
    pub fn deep_verify_before_discard(&self) -> CodegenResult<()> {
        for frame in &self.frames {
            frame.verify_before_discard()?;
        }
        Ok(())
    }

    /// Frames from innermost to outermost, for the allocation snapshot.
    pub fn frames_innermost_first(&self) -> impl Iterator<Item = &ScopeFrame> {
        self.frames.iter().rev()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    fn current(&self) -> &ScopeFrame {
        self.frames.last().expect("scope stack is never empty")
    }

    fn current_mut(&mut self) -> &mut ScopeFrame {
        self.frames.last_mut().expect("scope stack is never empty")
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scopes = ScopeStack::new();
        scopes.declare_variable("x", 0).unwrap();
        assert_eq!(
            scopes.declare_variable("x", 0),
            Err(CodegenError::Redeclared("x".to_string()))
        );
    }

    #[test]
    fn test_shadowing_resolves_to_nearest_declaration() {
        let mut scopes = ScopeStack::new();
        let outer = scopes.declare_variable("x", 0).unwrap();

        scopes.push();
        let inner = scopes.declare_variable("x", 5).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(scopes.address_of("x").unwrap(), inner);

        scopes.unset_variable("x").unwrap();
        scopes.pop().unwrap();
        assert_eq!(scopes.address_of("x").unwrap(), outer);
    }

    #[test]
    fn test_lookup_walks_to_outer_scopes() {
        let mut scopes = ScopeStack::new();
        let address = scopes.declare_variable("outer", 0).unwrap();
        scopes.push();
        scopes.push();
        assert_eq!(scopes.address_of("outer").unwrap(), address);
        assert_eq!(
            scopes.address_of("missing"),
            Err(CodegenError::Undeclared("missing".to_string()))
        );
    }

    #[test]
    fn test_unset_is_scope_local() {
        let mut scopes = ScopeStack::new();
        scopes.declare_variable("x", 0).unwrap();
        scopes.push();
        // Visible from the child, but not owned by it.
        assert!(scopes.address_of("x").is_ok());
        assert_eq!(
            scopes.unset_variable("x"),
            Err(CodegenError::Undeclared("x".to_string()))
        );
    }

    #[test]
    fn test_redeclaration_after_unset_is_allowed() {
        let mut scopes = ScopeStack::new();
        scopes.declare_variable("x", 0).unwrap();
        scopes.unset_variable("x").unwrap();
        scopes.declare_variable("x", 0).unwrap();
    }

    #[test]
    fn test_scope_with_live_temporary_cannot_close() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        let temporary = scopes.declare_temporary(0);
        assert_eq!(scopes.pop(), Err(CodegenError::TemporaryLeak(1)));

        scopes.unset_temporary(temporary).unwrap();
        scopes.pop().unwrap();
    }

    #[test]
    fn test_deep_verify_sees_outer_leaks() {
        let mut scopes = ScopeStack::new();
        let temporary = scopes.declare_temporary(0);
        scopes.push();
        assert!(scopes.verify_before_discard().is_ok());
        assert_eq!(
            scopes.deep_verify_before_discard(),
            Err(CodegenError::TemporaryLeak(1))
        );

        scopes.pop().unwrap();
        scopes.unset_temporary(temporary).unwrap();
        assert!(scopes.deep_verify_before_discard().is_ok());
    }

    #[test]
    fn test_temporary_must_be_released_by_tracking_scope() {
        let mut scopes = ScopeStack::new();
        let temporary = scopes.declare_temporary(0);
        scopes.push();
        assert_eq!(
            scopes.unset_temporary(temporary),
            Err(CodegenError::UntrackedTemporary(temporary.address()))
        );
    }

    #[test]
    fn test_temporary_array_released_as_a_unit() {
        let mut scopes = ScopeStack::new();
        let array = scopes.declare_temporary_array(0, 7).unwrap();
        assert_eq!(array.size(), 7);
        scopes.unset_temporary_array(array).unwrap();
        assert!(scopes.verify_before_discard().is_ok());

        assert_eq!(
            scopes.declare_temporary_array(0, 17),
            Err(CodegenError::ArraySizeOutOfRange(17))
        );
    }

    #[test]
    fn test_root_scope_cannot_be_popped() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.pop(), Err(CodegenError::NoParentScope));
    }
}
