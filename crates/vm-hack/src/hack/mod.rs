//! The target language: Hack assembly instructions and programs.

mod instruction;
mod program;

pub use instruction::{Address, Comp, Dest, Instruction, Jump};
pub use program::Program;
