//! The segment mapper: a pure lookup from `(segment, index)` to an
//! addressing recipe. No code is emitted here.

use crate::error::SemanticError;
use crate::vm::Segment;

/// Base address of the `temp` segment in RAM (registers R5-R12).
const TEMP_BASE: u16 = 5;
/// Number of `temp` slots.
const TEMP_SLOTS: u16 = 8;
/// Largest value an A-instruction can load directly (15-bit immediate).
pub(crate) const MAX_CONSTANT: u16 = 0x7FFF;

/// How to compute the effective address of one `push`/`pop` operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recipe {
    /// Dereference a base pointer register and add `index`.
    PointerRelative { base: &'static str, index: u16 },
    /// A fixed cell addressed by symbol: `temp` slots, the THIS/THAT
    /// pointer pair, or a per-file static variable.
    Direct { symbol: String },
    /// The literal value itself; only meaningful for `push`.
    Immediate { value: u16 },
}

/// Resolve `(segment, index)` against the current source unit.
pub(crate) fn resolve(
    segment: Segment,
    index: u16,
    file_stem: &str,
) -> Result<Recipe, SemanticError> {
    match segment {
        Segment::Constant => {
            if index > MAX_CONSTANT {
                return Err(SemanticError::ConstantOutOfRange(index));
            }
            Ok(Recipe::Immediate { value: index })
        }
        Segment::Local => pointer_relative("LCL", index),
        Segment::Argument => pointer_relative("ARG", index),
        Segment::This => pointer_relative("THIS", index),
        Segment::That => pointer_relative("THAT", index),
        Segment::Temp => {
            if index >= TEMP_SLOTS {
                return Err(SemanticError::TempIndexOutOfRange(index));
            }
            Ok(Recipe::Direct {
                symbol: format!("R{}", TEMP_BASE + index),
            })
        }
        Segment::Pointer => match index {
            0 => Ok(Recipe::Direct {
                symbol: "THIS".to_string(),
            }),
            1 => Ok(Recipe::Direct {
                symbol: "THAT".to_string(),
            }),
            other => Err(SemanticError::PointerIndexOutOfRange(other)),
        },
        Segment::Static => Ok(Recipe::Direct {
            symbol: format!("{file_stem}.{index}"),
        }),
    }
}

/// The index lands in an A-instruction, so it is bound by the same 15-bit
/// range as a constant.
fn pointer_relative(base: &'static str, index: u16) -> Result<Recipe, SemanticError> {
    if index > MAX_CONSTANT {
        return Err(SemanticError::IndexOutOfRange(index));
    }
    Ok(Recipe::PointerRelative { base, index })
}
