use crate::hardware::registers::Reg;
use crate::numbers::sign_extend;
use std::fmt::{Debug, Formatter};

/// The 16 LC-3 opcodes, encoded in bits 15 to 12 of an instruction.
#[repr(u8)]
#[derive(enumn::N, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Opcode {
    Br = 0,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    /// Return from interrupt, unimplemented
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    /// Reserved, unused
    Res,
    Lea,
    Trap,
}

impl Opcode {
    const ALL: [Self; 16] = [
        Self::Br,
        Self::Add,
        Self::Ld,
        Self::St,
        Self::Jsr,
        Self::And,
        Self::Ldr,
        Self::Str,
        Self::Rti,
        Self::Not,
        Self::Ldi,
        Self::Sti,
        Self::Jmp,
        Self::Res,
        Self::Lea,
        Self::Trap,
    ];
}

/// Wrapper for LC-3 u16 instruction.
/// format is: `OOOO_DDD_P_PPPP_PPPP`
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instruction(u16);

impl Instruction {
    /// Gives the value of only the specified bit range.
    ///
    /// # Parameters
    /// - `from`: starting index
    /// - `to`: end index (inclusive), mut be greater or equal to `from`
    ///
    /// # Panics
    /// - asserts that to is greater or equal from and both are valid indexes
    #[must_use]
    pub fn get_bit_range(self, from: u8, to: u8) -> u16 {
        debug_assert!(
            to >= from,
            "wrong direction of from: {from:?} and to: {to:?}"
        );
        debug_assert!(
            (0..u16::BITS).contains(&u32::from(to)),
            "index: {to:?} to u16 is greater than maximum value {:?}",
            u16::BITS - 1
        );
        let width = u32::from(to - from) + 1;
        let mask = u16::try_from((1u32 << width) - 1).unwrap_or(u16::MAX);
        (self.0 >> from) & mask
    }
    #[must_use]
    pub fn get_bit(self, index: u8) -> bool {
        self.get_bit_range(index, index) == 1
    }
    #[must_use]
    pub const fn op_code(self) -> Opcode {
        Opcode::ALL[(self.0 >> 12) as usize]
    }
    /// Destination register, or source register for the store instructions.
    #[must_use]
    pub fn dr(self) -> Reg {
        Reg::general_purpose(self.get_bit_range(9, 11))
    }
    #[must_use]
    pub fn sr1(self) -> Reg {
        Reg::general_purpose(self.get_bit_range(6, 8))
    }
    /// Same field as SR1, named `BaseR` by the addressing instructions.
    #[must_use]
    pub fn base_r(self) -> Reg {
        self.sr1()
    }
    #[must_use]
    pub fn sr2(self) -> Reg {
        Reg::general_purpose(self.get_bit_range(0, 2))
    }
    /// Bit 5 of ADD and AND.
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self.get_bit(5)
    }
    /// Bit 11 of JSR, unset for JSRR.
    #[must_use]
    pub fn jsr_is_immediate(self) -> bool {
        self.get_bit(11)
    }
    /// The `nzp` condition mask of BR, laid out like
    /// [`ConditionFlag`](crate::hardware::registers::ConditionFlag).
    #[must_use]
    pub fn nzp(self) -> u16 {
        self.get_bit_range(9, 11)
    }
    #[must_use]
    pub fn imm5(self) -> u16 {
        sign_extend(self.get_bit_range(0, 4), 5)
    }
    #[must_use]
    pub fn offset6(self) -> u16 {
        sign_extend(self.get_bit_range(0, 5), 6)
    }
    #[must_use]
    pub fn pc_offset9(self) -> u16 {
        sign_extend(self.get_bit_range(0, 8), 9)
    }
    #[must_use]
    pub fn pc_offset11(self) -> u16 {
        sign_extend(self.get_bit_range(0, 10), 11)
    }
    #[must_use]
    pub const fn trap_vector(self) -> u8 {
        self.0.to_be_bytes()[1]
    }
}

impl Debug for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:#06X} Op: {:?}, DR: {:?}, SR1: {:?}, PC_Off9: {:#06X}",
            self.0,
            self.op_code(),
            self.dr(),
            self.sr1(),
            self.pc_offset9()
        )
    }
}

impl From<u16> for Instruction {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}
