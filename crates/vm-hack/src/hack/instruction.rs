use std::fmt;

/// Operand of an A-instruction: a literal address or a symbol left for the
/// assembler to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Value(u16),
    Symbol(String),
}

/// Destination field of a C-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    None,
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    #[must_use]
    pub const fn writes_a(self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    #[must_use]
    pub const fn writes_d(self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    #[must_use]
    pub const fn writes_m(self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }
}

/// Computation field of a C-instruction. The full Hack ALU table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    NegOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

/// Jump field of a C-instruction; the condition tests the computed value
/// against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Never,
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

impl Jump {
    #[must_use]
    pub const fn taken(self, value: i16) -> bool {
        match self {
            Jump::Never => false,
            Jump::JGT => value > 0,
            Jump::JEQ => value == 0,
            Jump::JGE => value >= 0,
            Jump::JLT => value < 0,
            Jump::JNE => value != 0,
            Jump::JLE => value <= 0,
            Jump::JMP => true,
        }
    }
}

/// One line of Hack assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `@value` or `@SYMBOL`
    A(Address),
    /// `dest=comp;jump`
    C { dest: Dest, comp: Comp, jump: Jump },
    /// `(SYMBOL)` declares a jump target; occupies no ROM address.
    Label(String),
}

impl Instruction {
    #[must_use]
    pub const fn at(value: u16) -> Self {
        Instruction::A(Address::Value(value))
    }

    pub fn at_symbol(symbol: impl Into<String>) -> Self {
        Instruction::A(Address::Symbol(symbol.into()))
    }

    #[must_use]
    pub const fn assign(dest: Dest, comp: Comp) -> Self {
        Instruction::C {
            dest,
            comp,
            jump: Jump::Never,
        }
    }

    #[must_use]
    pub const fn branch(comp: Comp, jump: Jump) -> Self {
        Instruction::C {
            dest: Dest::None,
            comp,
            jump,
        }
    }

    pub fn label(symbol: impl Into<String>) -> Self {
        Instruction::Label(symbol.into())
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Dest::None => "",
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Comp::Zero => "0",
            Comp::One => "1",
            Comp::NegOne => "-1",
            Comp::D => "D",
            Comp::A => "A",
            Comp::M => "M",
            Comp::NotD => "!D",
            Comp::NotA => "!A",
            Comp::NotM => "!M",
            Comp::NegD => "-D",
            Comp::NegA => "-A",
            Comp::NegM => "-M",
            Comp::DPlusOne => "D+1",
            Comp::APlusOne => "A+1",
            Comp::MPlusOne => "M+1",
            Comp::DMinusOne => "D-1",
            Comp::AMinusOne => "A-1",
            Comp::MMinusOne => "M-1",
            Comp::DPlusA => "D+A",
            Comp::DPlusM => "D+M",
            Comp::DMinusA => "D-A",
            Comp::DMinusM => "D-M",
            Comp::AMinusD => "A-D",
            Comp::MMinusD => "M-D",
            Comp::DAndA => "D&A",
            Comp::DAndM => "D&M",
            Comp::DOrA => "D|A",
            Comp::DOrM => "D|M",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Jump::Never => "",
            Jump::JGT => "JGT",
            Jump::JEQ => "JEQ",
            Jump::JGE => "JGE",
            Jump::JLT => "JLT",
            Jump::JNE => "JNE",
            Jump::JLE => "JLE",
            Jump::JMP => "JMP",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::A(Address::Value(v)) => write!(f, "@{v}"),
            Instruction::A(Address::Symbol(s)) => write!(f, "@{s}"),
            Instruction::Label(s) => write!(f, "({s})"),
            Instruction::C { dest, comp, jump } => {
                if *dest != Dest::None {
                    write!(f, "{dest}=")?;
                }
                write!(f, "{comp}")?;
                if *jump != Jump::Never {
                    write!(f, ";{jump}")?;
                }
                Ok(())
            }
        }
    }
}
