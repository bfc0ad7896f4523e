//! The transcompiler: public API surface and code generator.
//!
//! Every primitive keeps one piece of hidden state in sync with the
//! program it emits: the cursor position. An operation that touches a
//! cell first emits the pointer moves to reach it (nothing when already
//! there), then the operating instructions. Reads are implemented with
//! the copy-drain-restore pattern: draining a cell through a loop while
//! mirroring it into a temporary, then draining the temporary back,
//! leaves the source untouched and the value delivered.
//!
//! Emitted instructions accumulate in a buffer attributed to the
//! innermost active operation label; flushed buffers become the ordered
//! trace that [`CodePrinter`](crate::printer::CodePrinter) renders.

use std::mem;

use tapec_types::{Address, Instruction, TemporaryVariable, TraceOp};

use crate::error::{CodegenError, CodegenResult};
use crate::scope::ScopeStack;

/// The fixed instruction sequence of the simultaneous division/modulo
/// algorithm. It operates on a seven-cell scratch block laid out as
/// `[dividend, 0, divisor, 1, 0, 0, 0]` with the cursor on the first
/// cell, and terminates with remainder + 1 at offset 3, quotient at
/// offset 4, and the cursor back where it started.
///
/// Offset 3 carries a bias of one: the divisor-refill loop is keyed on
/// it, and the bias keeps it non-zero even when the divisor copy is
/// exhausted before any remainder progress was counted (a divisor of
/// one exhausts on the very first turn). The refill drains offset 3
/// back into the divisor cell, re-establishes the bias, and bumps the
/// quotient. The cell layout is load-bearing; change nothing here
/// without re-verifying the whole sequence.
const DIVMOD_SEQUENCE: &str = "[->+>-[>+>>]>[[-<+>]+>+>>]<<<<<<]";

/// Anything the code generator can position the cursor on: a declared
/// variable name or a temporary handle.
pub trait Operand {
    /// The tape address this operand currently resolves to.
    fn resolve(&self, scopes: &ScopeStack) -> CodegenResult<Address>;
    /// How the operand appears in trace labels.
    fn describe(&self) -> String;
}

impl Operand for &str {
    fn resolve(&self, scopes: &ScopeStack) -> CodegenResult<Address> {
        scopes.address_of(self)
    }

    fn describe(&self) -> String {
        (*self).to_string()
    }
}

impl Operand for TemporaryVariable {
    fn resolve(&self, _scopes: &ScopeStack) -> CodegenResult<Address> {
        Ok(self.address())
    }

    fn describe(&self) -> String {
        format!("temporary[{}]", self.address())
    }
}

/// The code generator and public API surface.
///
/// Callers construct programs by invoking the operations directly (an
/// embedded DSL); [`code`](Transcompiler::code) verifies that no
/// temporary leaked anywhere in the still-open scope chain and returns
/// the printed program text.
pub struct Transcompiler {
    cursor: Address,
    scopes: ScopeStack,
    trace: Vec<TraceOp>,
    /// Instruction text emitted since the last flush.
    block: String,
    /// Labels of the operations currently generating code, outermost
    /// first.
    label_stack: Vec<String>,
}

impl Transcompiler {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            scopes: ScopeStack::new(),
            trace: Vec::new(),
            block: String::new(),
            label_stack: Vec::new(),
        }
    }

    // ── Declarations and assignment ──────────────────────────────────────

    /// Declare `name` in the current scope, allocated next to the
    /// cursor. The cell is not zeroed: a never-used address holds zero
    /// by construction, and scope exit re-zeroes cells before they are
    /// reused.
    pub fn declare_variable(&mut self, name: &str) -> CodegenResult<()> {
        self.operation(format!("declare {name}"), |c| {
            c.scopes.declare_variable(name, c.cursor)?;
            Ok(())
        })
    }

    /// Set `name` to `value`: zero the cell, then count up (or down,
    /// for negative values — the cells wrap modulo 256).
    pub fn assign_value(&mut self, name: &str, value: i16) -> CodegenResult<()> {
        self.operation(format!("assign {value} to {name}"), |c| {
            c.reset(name)?;
            if value >= 0 {
                c.inc(name, value as usize)
            } else {
                c.dec(name, value.unsigned_abs() as usize)
            }
        })
    }

    /// Read one input byte into `name`.
    pub fn write_input(&mut self, name: &str) -> CodegenResult<()> {
        self.operation(format!("write input {name}"), |c| {
            c.move_to(name)?;
            c.emit_one(Instruction::Input);
            Ok(())
        })
    }

    /// Write `name` as one output byte.
    pub fn print_variable(&mut self, name: &str) -> CodegenResult<()> {
        self.operation(format!("print {name}"), |c| c.print_cell(name))
    }

    /// Print the value of `name` as decimal digits.
    ///
    /// Covers 0..=99: the value is split by divmod ten, the tens digit
    /// printed only when non-zero. Larger values print a garbage tens
    /// character, since a single target cell cannot hold a three-digit
    /// split.
    pub fn print_number(&mut self, name: &str) -> CodegenResult<()> {
        self.operation(format!("print {name}"), |c| {
            let anchor = c.scopes.address_of(name)?;
            let ten = c.scopes.declare_temporary(anchor);
            let tens = c.scopes.declare_temporary(anchor);
            let ones = c.scopes.declare_temporary(anchor);

            c.inc(ten, 10)?;
            c.divmod_cells(tens, ones, name, ten)?;

            c.reset(ten)?;
            c.scopes.unset_temporary(ten)?;

            c.whenever_cells(tens, |c| {
                c.inc(tens, 48)?;
                c.print_cell(tens)?;
                c.reset(tens)
            })?;

            c.inc(ones, 48)?;
            c.print_cell(ones)?;
            c.reset(ones)?;

            c.scopes.unset_temporary(tens)?;
            c.scopes.unset_temporary(ones)
        })
    }

    /// Add `n` to `name`.
    pub fn increment(&mut self, name: &str, n: u8) -> CodegenResult<()> {
        self.operation(format!("increment {name} with {n}"), |c| {
            c.inc(name, n as usize)
        })
    }

    /// Subtract `n` from `name`.
    pub fn decrement(&mut self, name: &str, n: u8) -> CodegenResult<()> {
        self.operation(format!("decrement {name} with {n}"), |c| {
            c.dec(name, n as usize)
        })
    }

    // ── Arithmetic ───────────────────────────────────────────────────────

    /// `to += from`, leaving `from` unchanged.
    pub fn add(&mut self, to: &str, from: &str) -> CodegenResult<()> {
        self.operation(format!("add {from} to {to}"), |c| c.add_cells(to, from))
    }

    /// `to *= from`, leaving `from` unchanged.
    pub fn multiply(&mut self, to: &str, from: &str) -> CodegenResult<()> {
        self.operation(format!("multiply {from} to {to}"), |c| {
            let iterator = c.copy(from)?;
            let swap = c.scopes.declare_temporary(iterator.address());
            let result = c.scopes.declare_temporary(iterator.address());

            // For each unit of `from`: drain `to` into the accumulator
            // (and a swap), then drain the swap back so the next pass
            // sees `to` restored.
            c.loop_of(iterator, |c| {
                c.loop_of(to, |c| {
                    c.inc(swap, 1)?;
                    c.inc(result, 1)
                })?;
                c.loop_of(swap, |c| c.inc(to, 1))
            })?;

            c.scopes.unset_temporary(iterator)?;
            c.reset(swap)?;
            c.scopes.unset_temporary(swap)?;

            c.reset(to)?;
            c.restore_from_temporary(to, result)
        })
    }

    /// Simultaneous integer division and remainder:
    /// `div_result = dividend / divisor`, `mod_result = dividend % divisor`.
    /// `dividend` and `divisor` are left unchanged.
    ///
    /// Precondition: the runtime value of `divisor` must be non-zero.
    /// The compiler never sees runtime values, so this cannot be
    /// checked here; a zero divisor makes the emitted program loop
    /// forever.
    pub fn divmod(
        &mut self,
        div_result: &str,
        mod_result: &str,
        dividend: &str,
        divisor: &str,
    ) -> CodegenResult<()> {
        self.operation(
            format!("divmod ({div_result} {mod_result}) = {dividend} / {divisor}"),
            |c| c.divmod_cells(div_result, mod_result, dividend, divisor),
        )
    }

    /// `result = 1` if `a >= b`, else `result = 0`. Both inputs are
    /// left unchanged.
    ///
    /// Unary comparison: both copies count down in lockstep while `a`'s
    /// copy lasts, watching for the moment `b`'s copy hits zero. Runs
    /// in O(min(a, b)) loop turns; no faster algorithm is attempted.
    pub fn is_greater_than_or_equal(
        &mut self,
        result: &str,
        a: &str,
        b: &str,
    ) -> CodegenResult<()> {
        self.operation(format!("{result} = {a} >= {b}"), |c| {
            let a_copy = c.copy(a)?;
            let b_copy = c.copy(b)?;
            c.reset(result)?;

            // b == 0 means a >= b before any counting.
            c.whenever_else_cells(b_copy, |_| Ok(()), |c| c.inc(result, 1))?;

            c.loop_of(a_copy, |c| {
                c.dec(b_copy, 1)?;
                c.whenever_else_cells(b_copy, |_| Ok(()), |c| c.inc(result, 1))
            })?;

            c.reset(b_copy)?;
            c.scopes.unset_temporary(b_copy)?;
            c.scopes.unset_temporary(a_copy)
        })
    }

    // ── Control flow ─────────────────────────────────────────────────────

    /// Run `if_positive` once when `condition` is non-zero.
    pub fn whenever<F>(&mut self, condition: &str, if_positive: F) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.whenever_cells(condition, if_positive)
    }

    /// Run `if_positive` once when `condition` is non-zero, otherwise
    /// `if_negative` once. The two branches are mutually exclusive.
    pub fn whenever_else<F, G>(
        &mut self,
        condition: &str,
        if_positive: F,
        if_negative: G,
    ) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
        G: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.whenever_else_cells(condition, if_positive, if_negative)
    }

    /// Loop `f` while `name` is non-zero.
    ///
    /// This is the raw loop primitive: the loop is keyed on the actual
    /// variable's cell, and the body is responsible for consuming it
    /// (usually by decrementing), or the loop never terminates.
    pub fn while_loop<F>(&mut self, name: &str, f: F) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.operation(format!("while {name}"), |c| {
            c.move_to(name)?;
            c.emit_one(Instruction::LoopOpen);
            Ok(())
        })?;
        self.scope(f)?;
        self.operation(format!("endwhile {name}"), |c| {
            c.move_to(name)?;
            c.emit_one(Instruction::LoopClose);
            Ok(())
        })
    }

    /// Run `f` as many times as the current value of `name`, leaving
    /// `name` unchanged: a non-destructive copy drives the countdown.
    pub fn times<F>(&mut self, name: &str, f: F) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        let iterator = self.copy(name)?;
        self.operation(format!("times {name}"), |c| {
            c.move_to(iterator)?;
            c.emit_one(Instruction::LoopOpen);
            c.dec(iterator, 1)
        })?;
        self.scope(f)?;
        self.operation(format!("endtimes {name}"), |c| {
            c.move_to(iterator)?;
            c.emit_one(Instruction::LoopClose);
            Ok(())
        })?;
        // The countdown left the iterator at zero.
        self.scopes.unset_temporary(iterator)
    }

    // ── Scopes ───────────────────────────────────────────────────────────

    /// Run `f` inside a child scope, then sweep everything it declared.
    pub fn scope<F>(&mut self, f: F) -> CodegenResult<()>
    where
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.push_scope();
        f(self)?;
        self.pop_scope()
    }

    /// Open a child scope.
    pub fn push_scope(&mut self) {
        self.trace.push(TraceOp::ScopeOpen);
        self.scopes.push();
    }

    /// Close the current scope: zero and release every variable
    /// declared directly in it, then discard it. Scope exit is the sole
    /// reclamation mechanism — cells are never garbage-collected.
    ///
    /// Fails if the scope still tracks a temporary, or at the root.
    pub fn pop_scope(&mut self) -> CodegenResult<()> {
        if !self.scopes.has_parent() {
            return Err(CodegenError::NoParentScope);
        }
        self.scopes.verify_before_discard()?;

        for name in self.scopes.local_variable_names() {
            self.reset(name.as_str())?;
            self.scopes.unset_variable(&name)?;
        }
        self.scopes.pop()?;
        self.trace.push(TraceOp::ScopeClose);
        Ok(())
    }

    // ── Finalization and diagnostics ─────────────────────────────────────

    /// Verify that no temporary is live anywhere in the open scope
    /// chain, then print the annotated program text.
    pub fn code(&mut self) -> CodegenResult<String> {
        self.scopes.deep_verify_before_discard()?;
        self.flush_pending();
        Ok(crate::printer::CodePrinter::new(&self.trace).print())
    }

    /// Diagnostic access to the live scope chain and allocator, for the
    /// allocation snapshot overlay and tests.
    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    /// The raw instruction trace recorded so far.
    pub fn trace(&self) -> &[TraceOp] {
        &self.trace
    }

    // ── Operation bookkeeping ────────────────────────────────────────────

    /// Run `f` under `label`. Entering flushes the pending buffer under
    /// the enclosing operation's label (even when empty — that is what
    /// produces the comment-only header lines); leaving flushes the
    /// buffer under `label` when anything was emitted.
    fn operation<R>(
        &mut self,
        label: impl Into<String>,
        f: impl FnOnce(&mut Self) -> CodegenResult<R>,
    ) -> CodegenResult<R> {
        if let Some(active) = self.label_stack.last().cloned() {
            let code = mem::take(&mut self.block);
            self.trace
                .push(TraceOp::group(code, active, self.label_stack.len()));
        }

        self.label_stack.push(label.into());
        let result = f(self);

        let depth = self.label_stack.len();
        if let Some(label) = self.label_stack.pop() {
            if !self.block.is_empty() {
                let code = mem::take(&mut self.block);
                self.trace.push(TraceOp::group(code, label, depth));
            }
        }
        result
    }

    /// Instructions emitted outside any operation (scope-exit sweeps)
    /// end up buffered; record them as an unlabeled group.
    fn flush_pending(&mut self) {
        if !self.block.is_empty() {
            let code = mem::take(&mut self.block);
            self.trace.push(TraceOp::group(code, "", 1));
        }
    }

    // ── Emission primitives ──────────────────────────────────────────────

    fn emit(&mut self, text: &str) {
        self.block.push_str(text);
    }

    fn emit_one(&mut self, instruction: Instruction) {
        self.block.push(instruction.as_char());
    }

    fn emit_repeat(&mut self, instruction: Instruction, count: usize) {
        for _ in 0..count {
            self.block.push(instruction.as_char());
        }
    }

    /// Emit the pointer moves from the cursor to `operand` — nothing
    /// when already positioned.
    fn move_to<O: Operand>(&mut self, operand: O) -> CodegenResult<()> {
        let address = operand.resolve(&self.scopes)?;
        if address < self.cursor {
            self.emit_repeat(Instruction::Left, self.cursor - address);
        } else {
            self.emit_repeat(Instruction::Right, address - self.cursor);
        }
        self.cursor = address;
        Ok(())
    }

    fn inc<O: Operand>(&mut self, operand: O, count: usize) -> CodegenResult<()> {
        self.move_to(operand)?;
        self.emit_repeat(Instruction::Increment, count);
        Ok(())
    }

    fn dec<O: Operand>(&mut self, operand: O, count: usize) -> CodegenResult<()> {
        self.move_to(operand)?;
        self.emit_repeat(Instruction::Decrement, count);
        Ok(())
    }

    /// Zero the cell: loop "while non-zero, decrement". Terminates for
    /// every starting value.
    fn reset<O: Operand>(&mut self, operand: O) -> CodegenResult<()> {
        self.move_to(operand)?;
        self.emit("[-]");
        Ok(())
    }

    fn print_cell<O: Operand>(&mut self, operand: O) -> CodegenResult<()> {
        self.move_to(operand)?;
        self.emit_one(Instruction::Output);
        Ok(())
    }

    /// The countdown loop: decrement `iterator` once per turn, then run
    /// the body, always returning to `iterator` before closing.
    fn loop_of<O, F>(&mut self, iterator: O, f: F) -> CodegenResult<()>
    where
        O: Operand + Copy,
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        self.move_to(iterator)?;
        self.emit_one(Instruction::LoopOpen);
        self.dec(iterator, 1)?;
        f(self)?;
        self.move_to(iterator)?;
        self.emit_one(Instruction::LoopClose);
        Ok(())
    }

    /// Drain `from` into `to`, leaving `from` at zero.
    fn move_value<O: Operand + Copy>(
        &mut self,
        to: O,
        from: TemporaryVariable,
    ) -> CodegenResult<()> {
        self.loop_of(from, |c| c.inc(to, 1))
    }

    /// Drain the temporary back into `target` and release it.
    fn restore_from_temporary<O: Operand + Copy>(
        &mut self,
        target: O,
        temporary: TemporaryVariable,
    ) -> CodegenResult<()> {
        self.move_value(target, temporary)?;
        self.scopes.unset_temporary(temporary)
    }

    // ── Codegen building blocks ──────────────────────────────────────────

    /// Non-destructive copy of `from` into a fresh temporary.
    ///
    /// Drains `from` into two temporaries at once, then drains one of
    /// them back; the other keeps the value. The returned handle is the
    /// caller's to release.
    fn copy<O: Operand + Copy>(&mut self, from: O) -> CodegenResult<TemporaryVariable> {
        let new_from = self.scopes.declare_temporary(self.cursor);
        let new_to = self.scopes.declare_temporary(self.cursor);

        self.operation(
            format!("copy {} to {}", from.describe(), new_to.describe()),
            |c| {
                c.loop_of(from, |c| {
                    c.inc(new_from, 1)?;
                    c.inc(new_to, 1)
                })?;
                c.restore_from_temporary(from, new_from)
            },
        )?;

        Ok(new_to)
    }

    /// The destructive-read, non-destructive-net-effect addition at the
    /// bottom of everything: drain `from` while mirroring it into both
    /// `to` and a temporary, then drain the temporary back.
    fn add_cells<T, F>(&mut self, to: T, from: F) -> CodegenResult<()>
    where
        T: Operand + Copy,
        F: Operand + Copy,
    {
        self.move_to(from)?;
        let new_from = self.scopes.declare_temporary(self.cursor);

        self.loop_of(from, |c| {
            c.inc(new_from, 1)?;
            c.inc(to, 1)
        })?;

        self.restore_from_temporary(from, new_from)
    }

    /// Stage non-destructive copies of dividend and divisor into the
    /// scratch block, run the verified sequence, then drain the results
    /// out and zero the scratch.
    fn divmod_cells<D, M, A, B>(
        &mut self,
        div_result: D,
        mod_result: M,
        dividend: A,
        divisor: B,
    ) -> CodegenResult<()>
    where
        D: Operand + Copy,
        M: Operand + Copy,
        A: Operand + Copy,
        B: Operand + Copy,
    {
        let anchor = div_result.resolve(&self.scopes)? + 2;
        let scratch = self.scopes.declare_temporary_array(anchor, 7)?;

        self.add_cells(scratch.at(0), dividend)?;
        self.add_cells(scratch.at(2), divisor)?;
        // Bias for the remainder counter; see DIVMOD_SEQUENCE.
        self.inc(scratch.at(3), 1)?;

        self.move_to(scratch.at(0))?;
        self.emit(DIVMOD_SEQUENCE);

        self.reset(mod_result)?;
        self.dec(scratch.at(3), 1)?;
        self.move_value(mod_result, scratch.at(3))?;
        self.reset(div_result)?;
        self.move_value(div_result, scratch.at(4))?;

        for cell in scratch.cells() {
            self.reset(cell)?;
        }
        self.scopes.unset_temporary_array(scratch)
    }

    /// Single-branch conditional: loop once over a copy of the
    /// condition, force-zeroing the copy before the close so the branch
    /// can never repeat.
    fn whenever_cells<O, F>(&mut self, condition: O, if_positive: F) -> CodegenResult<()>
    where
        O: Operand + Copy,
        F: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        let condition_copy = self.copy(condition)?;

        self.operation(format!("if {}", condition.describe()), |c| {
            c.move_to(condition_copy)?;
            c.emit_one(Instruction::LoopOpen);
            Ok(())
        })?;
        self.scope(if_positive)?;
        self.operation(format!("endif {}", condition.describe()), |c| {
            c.move_to(condition_copy)?;
            c.emit("[-]]");
            Ok(())
        })?;

        self.scopes.unset_temporary(condition_copy)
    }

    /// Two-branch conditional built from zero-test loops only: an
    /// else-flag starts at 1 and is cleared inside the positive branch's
    /// loop, so the second loop (keyed on the flag) runs exactly when
    /// the first one did not.
    fn whenever_else_cells<O, F, G>(
        &mut self,
        condition: O,
        if_positive: F,
        if_negative: G,
    ) -> CodegenResult<()>
    where
        O: Operand + Copy,
        F: FnOnce(&mut Self) -> CodegenResult<()>,
        G: FnOnce(&mut Self) -> CodegenResult<()>,
    {
        let condition_copy = self.copy(condition)?;
        let else_flag = self.scopes.declare_temporary(condition_copy.address());

        self.operation(format!("if {}", condition.describe()), |c| {
            c.inc(else_flag, 1)?;
            c.move_to(condition_copy)?;
            c.emit_one(Instruction::LoopOpen);
            Ok(())
        })?;
        self.scope(if_positive)?;
        self.operation(format!("else {}", condition.describe()), |c| {
            c.reset(condition_copy)?;
            c.dec(else_flag, 1)?;
            c.move_to(condition_copy)?;
            c.emit_one(Instruction::LoopClose);
            c.move_to(else_flag)?;
            c.emit_one(Instruction::LoopOpen);
            Ok(())
        })?;
        self.scope(if_negative)?;
        self.operation(format!("endif {}", condition.describe()), |c| {
            c.dec(else_flag, 1)?;
            c.emit_one(Instruction::LoopClose);
            Ok(())
        })?;

        self.scopes.unset_temporary(else_flag)?;
        self.scopes.unset_temporary(condition_copy)
    }
}

impl Default for Transcompiler {
    fn default() -> Self {
        Self::new()
    }
}
