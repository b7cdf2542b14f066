use std::fmt;

use super::Instruction;

/// A complete translated program, ready to be rendered as a `.asm` file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Render the program as assembly text, one instruction per line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
