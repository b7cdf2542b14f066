//! Per-command code generation: fixed Hack templates with addresses and
//! labels substituted in.

use crate::error::SemanticError;
use crate::hack::{Comp, Dest, Instruction, Jump};
use crate::vm::Command;

use super::Context;
use super::segment::{self, Recipe};

/// RAM address the stack pointer is initialized to by the bootstrap.
const STACK_BASE: u16 = 256;
/// Scratch register holding the effective address during a pointer-relative
/// pop, and the frame pointer during `return`.
const SCRATCH_ADDR: &str = "R13";
/// Scratch register holding the return address during `return`. It must
/// survive the frame teardown, which clobbers LCL.
const SCRATCH_RET: &str = "R14";
/// Size of the save area a `call` pushes: return address plus four
/// caller pointers.
const FRAME_SAVE_SLOTS: u16 = 5;

/// Translate one command, appending its assembly to `out`.
pub(crate) fn translate_command(
    ctx: &mut Context,
    out: &mut Vec<Instruction>,
    command: &Command,
) -> Result<(), SemanticError> {
    match command {
        Command::Add => binary(out, Comp::DPlusM),
        Command::Sub => binary(out, Comp::MMinusD),
        Command::And => binary(out, Comp::DAndM),
        Command::Or => binary(out, Comp::DOrM),
        Command::Neg => unary(out, Comp::NegM),
        Command::Not => unary(out, Comp::NotM),
        Command::Eq => compare(ctx, out, Jump::JEQ),
        Command::Gt => compare(ctx, out, Jump::JGT),
        Command::Lt => compare(ctx, out, Jump::JLT),
        Command::Push { segment, index } => {
            let recipe = segment::resolve(*segment, *index, ctx.file_stem())?;
            push(out, &recipe);
        }
        Command::Pop { segment, index } => {
            let recipe = segment::resolve(*segment, *index, ctx.file_stem())?;
            pop(out, &recipe)?;
        }
        Command::Label(name) => {
            let qualified = ctx.qualify(name);
            ctx.declare_label(&qualified)?;
            out.push(Instruction::label(qualified));
        }
        Command::Goto(name) => {
            let qualified = ctx.qualify(name);
            ctx.reference_label(name, &qualified);
            out.push(Instruction::at_symbol(qualified));
            out.push(Instruction::branch(Comp::Zero, Jump::JMP));
        }
        Command::IfGoto(name) => {
            let qualified = ctx.qualify(name);
            ctx.reference_label(name, &qualified);
            pop_to_d(out);
            out.push(Instruction::at_symbol(qualified));
            out.push(Instruction::branch(Comp::D, Jump::JNE));
        }
        Command::Function { name, locals } => {
            ctx.enter_function(name)?;
            out.push(Instruction::label(name.clone()));
            // Locals start zero-initialized; the front end relies on it.
            for _ in 0..*locals {
                out.push(Instruction::at_symbol("SP"));
                out.push(Instruction::assign(Dest::AM, Comp::MPlusOne));
                out.push(Instruction::assign(Dest::A, Comp::AMinusOne));
                out.push(Instruction::assign(Dest::M, Comp::Zero));
            }
        }
        Command::Call { name, args } => {
            // The save-area offset must itself fit in an A-instruction.
            if *args > segment::MAX_CONSTANT - FRAME_SAVE_SLOTS {
                return Err(SemanticError::ConstantOutOfRange(*args));
            }
            call(ctx, out, name, *args);
        }
        Command::Return => emit_return(out),
    }
    Ok(())
}

/// The once-per-run preamble: point SP at the stack base, then hand
/// control to `Sys.init` through the regular calling convention.
pub(crate) fn emit_bootstrap(ctx: &mut Context, out: &mut Vec<Instruction>) {
    out.push(Instruction::at(STACK_BASE));
    out.push(Instruction::assign(Dest::D, Comp::A));
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::M, Comp::D));
    call(ctx, out, "Sys.init", 0);
}

/// `*SP = D; SP += 1`
fn push_d(out: &mut Vec<Instruction>) {
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::AM, Comp::MPlusOne));
    out.push(Instruction::assign(Dest::A, Comp::AMinusOne));
    out.push(Instruction::assign(Dest::M, Comp::D));
}

/// `SP -= 1; D = *SP`
fn pop_to_d(out: &mut Vec<Instruction>) {
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::AM, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::D, Comp::M));
}

fn push(out: &mut Vec<Instruction>, recipe: &Recipe) {
    match recipe {
        Recipe::Immediate { value } => {
            out.push(Instruction::at(*value));
            out.push(Instruction::assign(Dest::D, Comp::A));
        }
        Recipe::Direct { symbol } => {
            out.push(Instruction::at_symbol(symbol.clone()));
            out.push(Instruction::assign(Dest::D, Comp::M));
        }
        Recipe::PointerRelative { base, index } => {
            out.push(Instruction::at_symbol(*base));
            out.push(Instruction::assign(Dest::D, Comp::M));
            out.push(Instruction::at(*index));
            out.push(Instruction::assign(Dest::A, Comp::DPlusA));
            out.push(Instruction::assign(Dest::D, Comp::M));
        }
    }
    push_d(out);
}

fn pop(out: &mut Vec<Instruction>, recipe: &Recipe) -> Result<(), SemanticError> {
    match recipe {
        Recipe::Immediate { .. } => return Err(SemanticError::PopConstant),
        Recipe::Direct { symbol } => {
            pop_to_d(out);
            out.push(Instruction::at_symbol(symbol.clone()));
            out.push(Instruction::assign(Dest::M, Comp::D));
        }
        Recipe::PointerRelative { base, index } => {
            // The effective address is parked in R13 while D fetches the
            // value to store.
            out.push(Instruction::at_symbol(*base));
            out.push(Instruction::assign(Dest::D, Comp::M));
            out.push(Instruction::at(*index));
            out.push(Instruction::assign(Dest::D, Comp::DPlusA));
            out.push(Instruction::at_symbol(SCRATCH_ADDR));
            out.push(Instruction::assign(Dest::M, Comp::D));
            pop_to_d(out);
            out.push(Instruction::at_symbol(SCRATCH_ADDR));
            out.push(Instruction::assign(Dest::A, Comp::M));
            out.push(Instruction::assign(Dest::M, Comp::D));
        }
    }
    Ok(())
}

/// Rewrite the stack top in place.
fn unary(out: &mut Vec<Instruction>, comp: Comp) {
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::A, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::M, comp));
}

/// Pop the top into D, combine with the new top in place.
fn binary(out: &mut Vec<Instruction>, comp: Comp) {
    pop_to_d(out);
    out.push(Instruction::assign(Dest::A, Comp::AMinusOne));
    out.push(Instruction::assign(Dest::M, comp));
}

/// Compute `second - top`, jump on the comparison, and leave the canonical
/// boolean (-1 true, 0 false) on the stack. Each comparison gets a fresh
/// label pair so repeated comparisons never collide. The `$$` prefix is
/// unreachable from user code: identifiers cannot start with `$`, so even
/// a top-level label only ever qualifies to `$` followed by a letter.
fn compare(ctx: &mut Context, out: &mut Vec<Instruction>, jump: Jump) {
    let id = ctx.fresh_label_id();
    let true_label = format!("$$CMP.TRUE.{id}");
    let end_label = format!("$$CMP.END.{id}");

    pop_to_d(out);
    out.push(Instruction::assign(Dest::A, Comp::AMinusOne));
    out.push(Instruction::assign(Dest::D, Comp::MMinusD));
    out.push(Instruction::at_symbol(true_label.clone()));
    out.push(Instruction::branch(Comp::D, jump));
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::A, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::M, Comp::Zero));
    out.push(Instruction::at_symbol(end_label.clone()));
    out.push(Instruction::branch(Comp::Zero, Jump::JMP));
    out.push(Instruction::Label(true_label));
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::A, Comp::MMinusOne));
    out.push(Instruction::assign(Dest::M, Comp::NegOne));
    out.push(Instruction::Label(end_label));
}

/// The caller half of the protocol: push the return address and the four
/// caller pointers, reposition ARG and LCL, jump, and declare the
/// resumption label.
fn call(ctx: &mut Context, out: &mut Vec<Instruction>, name: &str, args: u16) {
    let return_label = format!("{name}$ret.{}", ctx.fresh_label_id());

    out.push(Instruction::at_symbol(return_label.clone()));
    out.push(Instruction::assign(Dest::D, Comp::A));
    push_d(out);
    for saved in ["LCL", "ARG", "THIS", "THAT"] {
        out.push(Instruction::at_symbol(saved));
        out.push(Instruction::assign(Dest::D, Comp::M));
        push_d(out);
    }

    // ARG = SP - 5 - n
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::D, Comp::M));
    out.push(Instruction::at(FRAME_SAVE_SLOTS + args));
    out.push(Instruction::assign(Dest::D, Comp::DMinusA));
    out.push(Instruction::at_symbol("ARG"));
    out.push(Instruction::assign(Dest::M, Comp::D));

    // LCL = SP
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::D, Comp::M));
    out.push(Instruction::at_symbol("LCL"));
    out.push(Instruction::assign(Dest::M, Comp::D));

    out.push(Instruction::at_symbol(name));
    out.push(Instruction::branch(Comp::Zero, Jump::JMP));
    out.push(Instruction::Label(return_label));
}

/// The callee half: store the return value at `*ARG`, collapse the stack
/// to `ARG + 1`, restore the caller pointers from the frame, and jump to
/// the saved return address.
fn emit_return(out: &mut Vec<Instruction>) {
    // R13 = LCL (frame pointer)
    out.push(Instruction::at_symbol("LCL"));
    out.push(Instruction::assign(Dest::D, Comp::M));
    out.push(Instruction::at_symbol(SCRATCH_ADDR));
    out.push(Instruction::assign(Dest::M, Comp::D));

    // R14 = *(frame - 5), grabbed before the return value can overwrite it
    // when the callee has zero arguments.
    out.push(Instruction::at(FRAME_SAVE_SLOTS));
    out.push(Instruction::assign(Dest::A, Comp::DMinusA));
    out.push(Instruction::assign(Dest::D, Comp::M));
    out.push(Instruction::at_symbol(SCRATCH_RET));
    out.push(Instruction::assign(Dest::M, Comp::D));

    // *ARG = pop()
    pop_to_d(out);
    out.push(Instruction::at_symbol("ARG"));
    out.push(Instruction::assign(Dest::A, Comp::M));
    out.push(Instruction::assign(Dest::M, Comp::D));

    // SP = ARG + 1
    out.push(Instruction::at_symbol("ARG"));
    out.push(Instruction::assign(Dest::D, Comp::MPlusOne));
    out.push(Instruction::at_symbol("SP"));
    out.push(Instruction::assign(Dest::M, Comp::D));

    // THAT, THIS, ARG, LCL = *(frame-1), *(frame-2), *(frame-3), *(frame-4)
    for restored in ["THAT", "THIS", "ARG", "LCL"] {
        out.push(Instruction::at_symbol(SCRATCH_ADDR));
        out.push(Instruction::assign(Dest::AM, Comp::MMinusOne));
        out.push(Instruction::assign(Dest::D, Comp::M));
        out.push(Instruction::at_symbol(restored));
        out.push(Instruction::assign(Dest::M, Comp::D));
    }

    out.push(Instruction::at_symbol(SCRATCH_RET));
    out.push(Instruction::assign(Dest::A, Comp::M));
    out.push(Instruction::branch(Comp::Zero, Jump::JMP));
}
