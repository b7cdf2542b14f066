//! Test harness for vm-hack unit and integration tests.
//!
//! Provides translation shortcuts plus [`Machine`], a minimal Hack CPU
//! simulator that executes the typed instruction stream directly, so tests
//! can assert on the runtime effect of generated code (stack contents,
//! pointer restoration) and not just its text.

use std::collections::HashMap;

use crate::hack::{Address, Comp, Dest, Instruction, Jump, Program};
use crate::translate::{Options, SourceUnit, translate, translate_with_options};

/// Canonical boolean encoding of the target: all bits set.
pub const TRUE: i16 = -1;
/// Canonical boolean encoding of the target: all bits clear.
pub const FALSE: i16 = 0;

/// Translate a single anonymous unit without the bootstrap preamble.
pub fn translate_snippet(source: &str) -> Program {
    let units = [SourceUnit::new("Test", source)];
    translate_with_options(&units, &Options { bootstrap: false }).expect("snippet should translate")
}

/// Translate named units as a full run, bootstrap included.
pub fn translate_units(units: &[(&str, &str)]) -> Program {
    let units: Vec<SourceUnit> = units
        .iter()
        .map(|(name, source)| SourceUnit::new(*name, *source))
        .collect();
    translate(&units).expect("units should translate")
}

/// Translate a snippet and run it to completion with SP preset to 256.
pub fn run_snippet(source: &str) -> Machine {
    let program = translate_snippet(source);
    let mut machine = Machine::new();
    machine.set_ram(0, 256);
    machine.run(&program, 1_000_000);
    machine
}

/// Translate a full program (must define `Sys.init`) and run it until it
/// parks in a terminal spin loop.
pub fn run_program(units: &[(&str, &str)]) -> Machine {
    let program = translate_units(units);
    let mut machine = Machine::new();
    machine.run(&program, 4_000_000);
    machine
}

const RAM_WORDS: usize = 32 * 1024;
const FIRST_VARIABLE_ADDRESS: u16 = 16;

enum Rom {
    Load(u16),
    Compute { dest: Dest, comp: Comp, jump: Jump },
}

/// A minimal simulated Hack machine: 32K words of RAM, the A and D
/// registers, and a program counter.
pub struct Machine {
    ram: Vec<i16>,
    a: i16,
    d: i16,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; RAM_WORDS],
            a: 0,
            d: 0,
        }
    }

    pub fn set_ram(&mut self, address: usize, value: i16) {
        self.ram[address] = value;
    }

    #[must_use]
    pub fn ram(&self, address: usize) -> i16 {
        self.ram[address]
    }

    #[must_use]
    pub fn sp(&self) -> i16 {
        self.ram[0]
    }

    /// The value on top of the stack (`RAM[SP - 1]`).
    #[must_use]
    pub fn stack_top(&self) -> i16 {
        let sp = usize::try_from(self.sp()).expect("SP below zero");
        assert!(sp > 0, "stack is empty");
        self.ram[sp - 1]
    }

    /// Execute a program until it runs off the end of ROM or parks in a
    /// `(HALT) @HALT 0;JMP` style spin loop. Panics if `max_steps` is
    /// exceeded, which in tests means runaway generated code.
    pub fn run(&mut self, program: &Program, max_steps: usize) {
        let rom = assemble(program.instructions());
        let mut pc = 0usize;
        for _ in 0..max_steps {
            let Some(instruction) = rom.get(pc) else {
                return;
            };
            match instruction {
                Rom::Load(value) => {
                    self.a = *value as i16;
                    pc += 1;
                }
                Rom::Compute { dest, comp, jump } => {
                    let address = (self.a as u16 as usize) % RAM_WORDS;
                    let value = eval(*comp, self.a, self.d, self.ram[address]);
                    if dest.writes_m() {
                        self.ram[address] = value;
                    }
                    let target = (self.a as u16) as usize;
                    if dest.writes_a() {
                        self.a = value;
                    }
                    if dest.writes_d() {
                        self.d = value;
                    }
                    if jump.taken(value) {
                        // A spin loop jumping back to its own @label means
                        // the program is done.
                        if *jump == Jump::JMP
                            && target + 1 == pc
                            && matches!(rom.get(target), Some(Rom::Load(_)))
                        {
                            return;
                        }
                        pc = target;
                    } else {
                        pc += 1;
                    }
                }
            }
        }
        panic!("machine did not halt within {max_steps} steps");
    }
}

/// Resolve symbols and strip label pseudo-instructions, producing an
/// executable ROM image.
fn assemble(instructions: &[Instruction]) -> Vec<Rom> {
    let mut symbols: HashMap<String, u16> = HashMap::new();
    for (name, address) in [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 16384),
        ("KBD", 24576),
    ] {
        symbols.insert(name.to_string(), address);
    }
    for r in 0..16u16 {
        symbols.insert(format!("R{r}"), r);
    }

    // First pass: label declarations point at the next ROM address.
    let mut rom_address = 0u16;
    for instruction in instructions {
        if let Instruction::Label(name) = instruction {
            let previous = symbols.insert(name.clone(), rom_address);
            assert!(
                previous.is_none(),
                "duplicate symbol `{name}` in generated code"
            );
        } else {
            rom_address += 1;
        }
    }

    // Second pass: resolve A-instruction symbols, allocating RAM cells for
    // the ones that are not labels (static variables).
    let mut next_variable = FIRST_VARIABLE_ADDRESS;
    let mut rom = Vec::new();
    for instruction in instructions {
        match instruction {
            Instruction::Label(_) => {}
            Instruction::A(Address::Value(value)) => {
                assert!(
                    *value <= 0x7FFF,
                    "A-instruction immediate {value} is not encodable"
                );
                rom.push(Rom::Load(*value));
            }
            Instruction::A(Address::Symbol(name)) => {
                let address = *symbols.entry(name.clone()).or_insert_with(|| {
                    let cell = next_variable;
                    next_variable += 1;
                    cell
                });
                rom.push(Rom::Load(address));
            }
            Instruction::C { dest, comp, jump } => rom.push(Rom::Compute {
                dest: *dest,
                comp: *comp,
                jump: *jump,
            }),
        }
    }
    rom
}

fn eval(comp: Comp, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        Comp::Zero => 0,
        Comp::One => 1,
        Comp::NegOne => -1,
        Comp::D => d,
        Comp::A => a,
        Comp::M => m,
        Comp::NotD => !d,
        Comp::NotA => !a,
        Comp::NotM => !m,
        Comp::NegD => d.wrapping_neg(),
        Comp::NegA => a.wrapping_neg(),
        Comp::NegM => m.wrapping_neg(),
        Comp::DPlusOne => d.wrapping_add(1),
        Comp::APlusOne => a.wrapping_add(1),
        Comp::MPlusOne => m.wrapping_add(1),
        Comp::DMinusOne => d.wrapping_sub(1),
        Comp::AMinusOne => a.wrapping_sub(1),
        Comp::MMinusOne => m.wrapping_sub(1),
        Comp::DPlusA => d.wrapping_add(a),
        Comp::DPlusM => d.wrapping_add(m),
        Comp::DMinusA => d.wrapping_sub(a),
        Comp::DMinusM => d.wrapping_sub(m),
        Comp::AMinusD => a.wrapping_sub(d),
        Comp::MMinusD => m.wrapping_sub(d),
        Comp::DAndA => d & a,
        Comp::DAndM => d & m,
        Comp::DOrA => d | a,
        Comp::DOrM => d | m,
    }
}

/// Count the declarations of a given label symbol in a program.
#[must_use]
pub fn label_declarations(program: &Program, symbol: &str) -> usize {
    program
        .instructions()
        .iter()
        .filter(|i| matches!(i, Instruction::Label(name) if name == symbol))
        .count()
}

/// Collect every symbol referenced by an A-instruction.
#[must_use]
pub fn referenced_symbols(program: &Program) -> Vec<String> {
    program
        .instructions()
        .iter()
        .filter_map(|i| match i {
            Instruction::A(Address::Symbol(name)) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_executes_a_and_c_instructions() {
        let program = Program::new(vec![
            Instruction::at(7),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at(100),
            Instruction::assign(Dest::M, Comp::D),
        ]);
        let mut machine = Machine::new();
        machine.run(&program, 100);
        assert_eq!(machine.ram(100), 7);
    }

    #[test]
    fn machine_stops_in_spin_loop() {
        let program = Program::new(vec![
            Instruction::label("HALT"),
            Instruction::at_symbol("HALT"),
            Instruction::branch(Comp::Zero, Jump::JMP),
        ]);
        let mut machine = Machine::new();
        machine.run(&program, 100);
    }

    #[test]
    fn unknown_symbols_become_ram_variables() {
        let program = Program::new(vec![
            Instruction::at(42),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at_symbol("Test.0"),
            Instruction::assign(Dest::M, Comp::D),
        ]);
        let mut machine = Machine::new();
        machine.run(&program, 100);
        assert_eq!(machine.ram(usize::from(FIRST_VARIABLE_ADDRESS)), 42);
    }
}
