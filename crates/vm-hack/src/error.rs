/// Lexical errors raised while reading a single command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` expects {expected} operand(s), got {got}")]
    OperandCount {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown segment `{0}`")]
    UnknownSegment(String),

    #[error("invalid index `{0}` (expected a non-negative integer)")]
    InvalidIndex(String),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

/// Errors raised by the segment mapper and code generator on commands that
/// are well-formed but meaningless.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("temp index {0} out of range (0-7)")]
    TempIndexOutOfRange(u16),

    #[error("pointer index {0} out of range (0-1)")]
    PointerIndexOutOfRange(u16),

    #[error("constant {0} exceeds the maximum addressable value 32767")]
    ConstantOutOfRange(u16),

    #[error("index {0} exceeds the maximum addressable value 32767")]
    IndexOutOfRange(u16),

    #[error("cannot pop to the constant segment")]
    PopConstant,

    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),

    #[error("duplicate function `{0}`")]
    DuplicateFunction(String),

    #[error("goto target `{0}` is never declared")]
    UndeclaredLabel(String),
}

/// Translation errors, tagged with the source unit and line they came from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{file}:{line}: {source}")]
    Parse {
        file: String,
        line: usize,
        source: ParseError,
    },

    #[error("{file}:{line}: {source}")]
    Semantic {
        file: String,
        line: usize,
        source: SemanticError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
