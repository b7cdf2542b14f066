//! The source language: stack-machine VM commands.

mod parser;

pub use parser::{Line, parse_line, parse_source};

/// A named memory segment referenced by `push` and `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
}

/// One VM command, operands already typed and arity-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Push { segment: Segment, index: u16 },
    Pop { segment: Segment, index: u16 },
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}
