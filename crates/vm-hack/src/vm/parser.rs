//! The command reader: one normalized line in, one typed [`Command`] out.
//!
//! Comment stripping and blank-line skipping happen in a single pass over
//! the unit's text in [`parse_source`]; [`parse_line`] itself only ever
//! sees trimmed, comment-free, non-empty lines.

use super::{Command, Segment};
use crate::error::{Error, ParseError};

/// A parsed command together with its 1-based source line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub command: Command,
}

/// Parse a whole source unit. `file` is only used to tag errors.
pub fn parse_source(file: &str, source: &str) -> Result<Vec<Line>, Error> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let text = raw.split("//").next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let number = idx + 1;
        let command = parse_line(text).map_err(|source| Error::Parse {
            file: file.to_string(),
            line: number,
            source,
        })?;
        lines.push(Line { number, command });
    }
    Ok(lines)
}

/// Parse one normalized command line.
pub fn parse_line(text: &str) -> Result<Command, ParseError> {
    let mut words = text.split_whitespace();
    let keyword = words.next().unwrap_or("");
    let operands: Vec<&str> = words.collect();

    let arity = |expected: usize| -> Result<(), ParseError> {
        if operands.len() == expected {
            Ok(())
        } else {
            Err(ParseError::OperandCount {
                command: keyword.to_string(),
                expected,
                got: operands.len(),
            })
        }
    };

    match keyword {
        "add" | "sub" | "neg" | "eq" | "gt" | "lt" | "and" | "or" | "not" => {
            arity(0)?;
            Ok(match keyword {
                "add" => Command::Add,
                "sub" => Command::Sub,
                "neg" => Command::Neg,
                "eq" => Command::Eq,
                "gt" => Command::Gt,
                "lt" => Command::Lt,
                "and" => Command::And,
                "or" => Command::Or,
                _ => Command::Not,
            })
        }
        "push" | "pop" => {
            arity(2)?;
            let segment = parse_segment(operands[0])?;
            let index = parse_index(operands[1])?;
            if keyword == "push" {
                Ok(Command::Push { segment, index })
            } else {
                Ok(Command::Pop { segment, index })
            }
        }
        "label" | "goto" | "if-goto" => {
            arity(1)?;
            let target = parse_identifier(operands[0])?;
            Ok(match keyword {
                "label" => Command::Label(target),
                "goto" => Command::Goto(target),
                _ => Command::IfGoto(target),
            })
        }
        "function" | "call" => {
            arity(2)?;
            let name = parse_identifier(operands[0])?;
            let count = parse_index(operands[1])?;
            if keyword == "function" {
                Ok(Command::Function {
                    name,
                    locals: count,
                })
            } else {
                Ok(Command::Call { name, args: count })
            }
        }
        "return" => {
            arity(0)?;
            Ok(Command::Return)
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_segment(word: &str) -> Result<Segment, ParseError> {
    match word {
        "constant" => Ok(Segment::Constant),
        "local" => Ok(Segment::Local),
        "argument" => Ok(Segment::Argument),
        "this" => Ok(Segment::This),
        "that" => Ok(Segment::That),
        "temp" => Ok(Segment::Temp),
        "pointer" => Ok(Segment::Pointer),
        "static" => Ok(Segment::Static),
        other => Err(ParseError::UnknownSegment(other.to_string())),
    }
}

fn parse_index(word: &str) -> Result<u16, ParseError> {
    word.parse()
        .map_err(|_| ParseError::InvalidIndex(word.to_string()))
}

fn parse_identifier(word: &str) -> Result<String, ParseError> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':');
    // Identifiers must open with a letter or underscore; the leading-`$`
    // namespace is reserved for generated comparison labels.
    let starts_well = word
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if starts_well && word.chars().all(valid_char) {
        Ok(word.to_string())
    } else {
        Err(ParseError::InvalidIdentifier(word.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_keywords() {
        assert_eq!(parse_line("add"), Ok(Command::Add));
        assert_eq!(parse_line("not"), Ok(Command::Not));
    }

    #[test]
    fn parses_push_pop() {
        assert_eq!(
            parse_line("push constant 17"),
            Ok(Command::Push {
                segment: Segment::Constant,
                index: 17
            })
        );
        assert_eq!(
            parse_line("pop local 2"),
            Ok(Command::Pop {
                segment: Segment::Local,
                index: 2
            })
        );
    }

    #[test]
    fn parses_branching_and_subroutines() {
        assert_eq!(parse_line("label LOOP"), Ok(Command::Label("LOOP".into())));
        assert_eq!(
            parse_line("if-goto END$1"),
            Ok(Command::IfGoto("END$1".into()))
        );
        assert_eq!(
            parse_line("function Main.fact 0"),
            Ok(Command::Function {
                name: "Main.fact".into(),
                locals: 0
            })
        );
        assert_eq!(
            parse_line("call Main.fact 1"),
            Ok(Command::Call {
                name: "Main.fact".into(),
                args: 1
            })
        );
        assert_eq!(parse_line("return"), Ok(Command::Return));
    }

    #[test]
    fn rejects_unknown_command() {
        assert_eq!(
            parse_line("frobnicate"),
            Err(ParseError::UnknownCommand("frobnicate".into()))
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        assert_eq!(
            parse_line("push constant"),
            Err(ParseError::OperandCount {
                command: "push".into(),
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            parse_line("add 1"),
            Err(ParseError::OperandCount {
                command: "add".into(),
                expected: 0,
                got: 1
            })
        );
    }

    #[test]
    fn rejects_bad_indices() {
        assert_eq!(
            parse_line("push constant -1"),
            Err(ParseError::InvalidIndex("-1".into()))
        );
        assert_eq!(
            parse_line("push constant x"),
            Err(ParseError::InvalidIndex("x".into()))
        );
    }

    #[test]
    fn rejects_identifier_starting_with_digit() {
        assert_eq!(
            parse_line("label 1LOOP"),
            Err(ParseError::InvalidIdentifier("1LOOP".into()))
        );
    }

    #[test]
    fn rejects_identifier_starting_with_dollar() {
        assert_eq!(
            parse_line("function $CMP.TRUE.0 0"),
            Err(ParseError::InvalidIdentifier("$CMP.TRUE.0".into()))
        );
        assert_eq!(
            parse_line("label $L"),
            Err(ParseError::InvalidIdentifier("$L".into()))
        );
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let source = "\n// header comment\npush constant 1 // trailing\n\n   \nadd\n";
        let lines = parse_source("Test", source).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].number, 6);
        assert_eq!(lines[1].command, Command::Add);
    }

    #[test]
    fn errors_carry_file_and_line() {
        let err = parse_source("Foo", "add\nbogus\n").unwrap_err();
        assert_eq!(
            err,
            Error::Parse {
                file: "Foo".into(),
                line: 2,
                source: ParseError::UnknownCommand("bogus".into()),
            }
        );
        assert_eq!(err.to_string(), "Foo:2: unknown command `bogus`");
    }
}
