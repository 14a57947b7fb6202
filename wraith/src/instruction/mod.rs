use derive_more::From;
use derive_more::IsVariant;
use serde::Deserialize;
use serde::Serialize;

mod arithmetic;
mod bit;
mod bit_shift;
mod control;
mod interrupt;
mod jump;
mod load;

pub use arithmetic::*;
pub use bit::*;
pub use bit_shift::*;
pub use control::*;
pub use interrupt::*;
pub use jump::*;
pub use load::*;

/// A decoded operation. Descriptors carry no immediate operands; those are read from the bytes
/// following the opcode when the instruction is executed. Every descriptor knows its cost in
/// cycles, its length in bytes, and how to print itself.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, IsVariant, derive_more::Display)]
#[display("{_variant}")]
pub enum Instruction {
    #[display("{_0}")]
    Load(LoadOp),
    #[display("{_0}")]
    ControlOp(ControlOp),
    #[display("{_0}")]
    Jump(JumpOp),
    #[display("{_0}")]
    Arithmetic(ArithmeticOp),
    #[display("{_0}")]
    BitShift(BitShiftOp),
    #[display("{_0}")]
    Bit(BitOp),
    /// Not an opcode. This is the call to an interrupt handler that the CPU performs in place of
    /// the next fetch.
    #[display("Interrupt {_0}")]
    Interrupt(InterruptOp),
    #[display("DAA")]
    Daa,
    /// Set Carry.
    #[display("SCF")]
    Scf,
    /// ComPLement accumulator.
    #[display("CPL")]
    Cpl,
    /// CompLement carry flag.
    #[display("CCF")]
    Ccf,
    /// Disable interupts
    #[display("DI")]
    Di,
    /// Enable interupts
    #[display("EI")]
    Ei,
    /// Load the next byte as an op code for a prefixed instruction
    #[display("PREFIX CB")]
    Prefixed,
    /// Used for the handful of unused op codes. Executing one of these locks up the CPU.
    #[display("ILLEGAL 0x{_0:0>2X}")]
    Illegal(u8),
}

impl Instruction {
    /// Returns the number of cycles this instruction takes. For conditional instructions, this is
    /// the cost when the condition fails; see [`Instruction::branch_cycles`].
    pub const fn cycles(&self) -> u8 {
        match self {
            Instruction::Load(op) => op.cycles(),
            Instruction::ControlOp(op) => op.cycles(),
            Instruction::Jump(op) => op.cycles(),
            Instruction::Arithmetic(op) => op.cycles(),
            Instruction::BitShift(op) => op.cycles(),
            Instruction::Bit(op) => op.cycles(),
            Instruction::Interrupt(_) => InterruptOp::CYCLES,
            Instruction::Daa
            | Instruction::Scf
            | Instruction::Cpl
            | Instruction::Ccf
            | Instruction::Di
            | Instruction::Ei
            | Instruction::Prefixed => 4,
            Instruction::Illegal(_) => 0,
        }
    }

    /// The number of cycles a conditional instruction takes when its condition passes. `None` for
    /// every unconditional instruction.
    pub const fn branch_cycles(&self) -> Option<u8> {
        match self {
            Instruction::Jump(op) => op.branch_cycles(),
            _ => None,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            Instruction::Load(op) => op.size(),
            Instruction::ControlOp(op) => op.size(),
            Instruction::Jump(op) => op.size(),
            Instruction::Arithmetic(op) => op.size(),
            Instruction::BitShift(op) => op.size(),
            Instruction::Bit(op) => op.size(),
            Instruction::Interrupt(_) => 0,
            Instruction::Daa
            | Instruction::Scf
            | Instruction::Cpl
            | Instruction::Ccf
            | Instruction::Di
            | Instruction::Ei
            | Instruction::Prefixed
            | Instruction::Illegal(_) => 1,
        }
    }
}

/// The source of the second operand for the 8-bit ALU operations.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, From, IsVariant, derive_more::Display)]
#[display("{_variant}")]
pub enum SomeByte {
    #[display("{_0}")]
    Referenced(RegOrPointer),
    /// The byte following the opcode.
    #[display("d8")]
    Direct,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideReg {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("SP")]
    SP,
}

impl WideReg {
    /// Decodes the two bit register field used by the 16-bit loads and arithmetic.
    pub(crate) const fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => WideReg::BC,
            1 => WideReg::DE,
            2 => WideReg::HL,
            _ => WideReg::SP,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideRegWithoutSP {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("AF")]
    AF,
}

impl WideRegWithoutSP {
    /// Decodes the two bit register field used by PUSH and POP.
    pub(crate) const fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => WideRegWithoutSP::BC,
            1 => WideRegWithoutSP::DE,
            2 => WideRegWithoutSP::HL,
            _ => WideRegWithoutSP::AF,
        }
    }

    pub fn split(self) -> (HalfRegister, HalfRegister) {
        match self {
            WideRegWithoutSP::BC => (HalfRegister::B, HalfRegister::C),
            WideRegWithoutSP::DE => (HalfRegister::D, HalfRegister::E),
            WideRegWithoutSP::HL => (HalfRegister::H, HalfRegister::L),
            WideRegWithoutSP::AF => (HalfRegister::A, HalfRegister::F),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Condition {
    #[display("Z")]
    Zero,
    #[display("NZ")]
    NotZero,
    #[display("C")]
    Carry,
    #[display("NC")]
    NotCarry,
}

impl Condition {
    pub(crate) const fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => Condition::NotZero,
            1 => Condition::Zero,
            2 => Condition::NotCarry,
            _ => Condition::Carry,
        }
    }
}

/// There are special operations for loading into the A register, so it is easier to have a special
/// enum for the unique types of pointers they use.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadAPointer {
    /// Use the BC register
    #[display("(BC)")]
    BC,
    /// Use the DE register
    #[display("(DE)")]
    DE,
    /// Use the HL register and increment after performing the operation
    #[display("(HL+)")]
    Hli,
    /// Use the HL register and decrement after performing the operation
    #[display("(HL-)")]
    Hld,
}

impl LoadAPointer {
    pub(crate) const fn from_index(index: u8) -> Self {
        match index & 0b11 {
            0 => LoadAPointer::BC,
            1 => LoadAPointer::DE,
            2 => LoadAPointer::Hli,
            _ => LoadAPointer::Hld,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display("{_variant}")]
pub enum HalfRegister {
    #[display("A")]
    A,
    #[display("F")]
    F,
    #[display("B")]
    B,
    #[display("C")]
    C,
    #[display("D")]
    D,
    #[display("E")]
    E,
    #[display("H")]
    H,
    #[display("L")]
    L,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, IsVariant, derive_more::Display)]
#[display("{_variant}")]
pub enum RegOrPointer {
    #[display("{_0}")]
    Reg(HalfRegister),
    /// The byte that HL points to.
    #[display("(HL)")]
    Pointer,
}

impl RegOrPointer {
    /// Decodes the three bit register field that almost every 8-bit operation uses. Index 6 is
    /// the byte that HL points to.
    pub(crate) const fn from_index(index: u8) -> Self {
        match index & 0b111 {
            0 => RegOrPointer::Reg(HalfRegister::B),
            1 => RegOrPointer::Reg(HalfRegister::C),
            2 => RegOrPointer::Reg(HalfRegister::D),
            3 => RegOrPointer::Reg(HalfRegister::E),
            4 => RegOrPointer::Reg(HalfRegister::H),
            5 => RegOrPointer::Reg(HalfRegister::L),
            6 => RegOrPointer::Pointer,
            _ => RegOrPointer::Reg(HalfRegister::A),
        }
    }
}
