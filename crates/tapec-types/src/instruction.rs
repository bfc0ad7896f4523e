//! The eight-symbol instruction alphabet of the target tape machine.

use std::fmt;

/// One primitive instruction of the target machine.
///
/// The machine is a single cursor over a tape of wrapping byte cells:
/// cells wrap modulo 256 under increment/decrement, and loops execute
/// while the cell under the cursor is non-zero. The wraparound is
/// load-bearing for the generated arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `>` — move the cursor one cell right.
    Right,
    /// `<` — move the cursor one cell left.
    Left,
    /// `+` — increment the current cell (wrapping).
    Increment,
    /// `-` — decrement the current cell (wrapping).
    Decrement,
    /// `.` — write the current cell as one output byte.
    Output,
    /// `,` — read one input byte into the current cell.
    Input,
    /// `[` — jump past the matching `]` if the current cell is zero.
    LoopOpen,
    /// `]` — jump back to the matching `[` if the current cell is non-zero.
    LoopClose,
}

impl Instruction {
    /// Every instruction, in alphabet order.
    pub const ALPHABET: [Instruction; 8] = [
        Instruction::Right,
        Instruction::Left,
        Instruction::Increment,
        Instruction::Decrement,
        Instruction::Output,
        Instruction::Input,
        Instruction::LoopOpen,
        Instruction::LoopClose,
    ];

    /// The textual character for this instruction.
    pub fn as_char(self) -> char {
        match self {
            Instruction::Right => '>',
            Instruction::Left => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Output => '.',
            Instruction::Input => ',',
            Instruction::LoopOpen => '[',
            Instruction::LoopClose => ']',
        }
    }

    /// Parse one program character. Anything outside the alphabet is a
    /// comment character and returns `None`.
    pub fn from_char(c: char) -> Option<Instruction> {
        match c {
            '>' => Some(Instruction::Right),
            '<' => Some(Instruction::Left),
            '+' => Some(Instruction::Increment),
            '-' => Some(Instruction::Decrement),
            '.' => Some(Instruction::Output),
            ',' => Some(Instruction::Input),
            '[' => Some(Instruction::LoopOpen),
            ']' => Some(Instruction::LoopClose),
            _ => None,
        }
    }

    /// Whether `c` collides with the instruction alphabet. Trace labels
    /// are sanitized with this so a trailing comment can never be
    /// mistaken for instructions.
    pub fn is_instruction_char(c: char) -> bool {
        Instruction::from_char(c).is_some()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
