//! The tape machine.

use std::collections::HashMap;

use tapec_types::Instruction;

use crate::error::{EvalError, EvalResult};

const DEFAULT_TAPE_LEN: usize = 30_000;
const DEFAULT_STEP_LIMIT: u64 = 50_000_000;

/// What a finished program left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Bytes the program wrote, in order.
    pub output: Vec<u8>,
    /// Final tape state, trailing zero cells trimmed.
    pub tape: Vec<u8>,
}

/// A single-tape, single-cursor machine over wrapping byte cells.
///
/// Non-instruction characters in the program text are ignored, so
/// annotated output can be executed directly.
pub struct Machine {
    tape_len: usize,
    step_limit: u64,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            tape_len: DEFAULT_TAPE_LEN,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Run `program` against `input`, reading zero once input runs out.
    pub fn execute(&self, program: &str, input: &[u8]) -> EvalResult<Run> {
        let instructions: Vec<Instruction> = program
            .chars()
            .filter_map(Instruction::from_char)
            .collect();
        let jumps = jump_table(&instructions)?;

        let mut tape = vec![0u8; self.tape_len];
        let mut cursor = 0usize;
        let mut pc = 0usize;
        let mut read = input.iter().copied();
        let mut output = Vec::new();
        let mut steps = 0u64;

        while pc < instructions.len() {
            steps += 1;
            if steps > self.step_limit {
                return Err(EvalError::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }

            match instructions[pc] {
                Instruction::Right => {
                    cursor += 1;
                    if cursor >= self.tape_len {
                        return Err(EvalError::CursorOverflow { len: self.tape_len });
                    }
                }
                Instruction::Left => {
                    cursor = cursor.checked_sub(1).ok_or(EvalError::CursorUnderflow)?;
                }
                Instruction::Increment => tape[cursor] = tape[cursor].wrapping_add(1),
                Instruction::Decrement => tape[cursor] = tape[cursor].wrapping_sub(1),
                Instruction::Output => output.push(tape[cursor]),
                Instruction::Input => tape[cursor] = read.next().unwrap_or(0),
                Instruction::LoopOpen => {
                    if tape[cursor] == 0 {
                        pc = jumps[&pc];
                    }
                }
                Instruction::LoopClose => {
                    if tape[cursor] != 0 {
                        pc = jumps[&pc];
                    }
                }
            }
            pc += 1;
        }

        let used = tape.iter().rposition(|&v| v != 0).map_or(0, |i| i + 1);
        tape.truncate(used);

        Ok(Run { output, tape })
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of each bracket's partner, both directions.
fn jump_table(instructions: &[Instruction]) -> EvalResult<HashMap<usize, usize>> {
    let mut jumps = HashMap::new();
    let mut stack = Vec::new();

    for (i, instruction) in instructions.iter().enumerate() {
        match instruction {
            Instruction::LoopOpen => stack.push(i),
            Instruction::LoopClose => {
                let open = stack.pop().ok_or(EvalError::UnbalancedLoops)?;
                jumps.insert(open, i);
                jumps.insert(i, open);
            }
            _ => {}
        }
    }

    if stack.is_empty() {
        Ok(jumps)
    } else {
        Err(EvalError::UnbalancedLoops)
    }
}
