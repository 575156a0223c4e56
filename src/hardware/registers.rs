use crate::hardware::memory::PROGRAM_SECTION_START;
use crate::numbers;
use std::fmt::{Debug, Formatter};

/// Index into the register file.
/// `R0`..`R7` are general purpose, `Pc` and `Cond` are special purpose.
#[repr(u8)]
#[derive(enumn::N, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    /// Program counter
    Pc,
    /// Condition flags, see [`ConditionFlag`]
    Cond,
}

impl Reg {
    const GENERAL_PURPOSE: [Self; 8] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];
    const COUNT: usize = 10;

    /// Maps the lowest 3 bits of an instruction field to a general purpose register.
    #[must_use]
    pub const fn general_purpose(field: u16) -> Self {
        Self::GENERAL_PURPOSE[(field & 0b111) as usize]
    }
}

/// A single 16 bit register value.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct Register(u16);

impl Register {
    #[must_use]
    pub const fn from_binary(value: u16) -> Self {
        Self(value)
    }
    #[must_use]
    pub const fn from_decimal(value: i16) -> Self {
        Self(numbers::decimal_to_twos_complement(value))
    }
    #[must_use]
    pub const fn as_binary(self) -> u16 {
        self.0
    }
    #[must_use]
    pub const fn as_decimal(self) -> i16 {
        numbers::twos_complement_to_decimal(self.0)
    }
}

impl Debug for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X} ({})", self.0, self.as_decimal())
    }
}

#[must_use]
pub const fn from_binary(value: u16) -> Register {
    Register::from_binary(value)
}
#[must_use]
pub const fn from_decimal(value: i16) -> Register {
    Register::from_decimal(value)
}

/// The register file: 8 general purpose registers, program counter and condition flags.
#[derive(Clone, PartialEq, Eq)]
pub struct Registers {
    data: [Register; Reg::COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// All registers zeroed, except `Cond` set to [`ConditionFlag::Zero`]
    /// and `Pc` set to the start of the program section.
    #[must_use]
    pub const fn new() -> Self {
        let mut data = [Register(0); Reg::COUNT];
        data[Reg::Pc as usize] = Register(PROGRAM_SECTION_START);
        data[Reg::Cond as usize] = Register(ConditionFlag::Zero as u16);
        Self { data }
    }

    #[must_use]
    pub const fn get(&self, r: Reg) -> Register {
        self.data[r as usize]
    }
    pub const fn set(&mut self, r: Reg, value: Register) {
        self.data[r as usize] = value;
    }

    #[must_use]
    pub const fn pc(&self) -> Register {
        self.get(Reg::Pc)
    }
    pub const fn set_pc(&mut self, value: u16) {
        self.set(Reg::Pc, Register(value));
    }
    /// Returns the current PC and moves it to the next instruction.
    pub const fn inc_pc(&mut self) -> u16 {
        let pc = self.pc().as_binary();
        self.set_pc(pc.wrapping_add(1));
        pc
    }

    /// Typed view of the condition register, `None` only if it was overwritten with a
    /// value which is not exactly one flag.
    #[must_use]
    pub fn condition_flag(&self) -> Option<ConditionFlag> {
        ConditionFlag::n(self.get(Reg::Cond).as_binary())
    }
    /// Sets the condition flag according to the sign of the value in `r`.
    pub fn update_conditional_register(&mut self, r: Reg) {
        let flag = ConditionFlag::from(self.get(r).as_binary());
        self.set(Reg::Cond, Register(flag as u16));
    }
}

impl Debug for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Registers");
        for r in Reg::GENERAL_PURPOSE {
            s.field(&format!("{r:?}"), &self.get(r));
        }
        s.field("PC", &self.pc())
            .field("COND", &self.condition_flag())
            .finish()
    }
}

#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFlag {
    Pos = 1 << 0, // Positive
    Zero = 1 << 1,
    Neg = 1 << 2, // Negative
}

impl From<u16> for ConditionFlag {
    fn from(value: u16) -> Self {
        if value == 0 {
            Self::Zero
        } else if value >> 15 == 1 {
            // leftmost bit is 1 for negative numbers
            Self::Neg
        } else {
            Self::Pos
        }
    }
}
