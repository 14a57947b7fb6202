use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ArithmeticOp {
    #[display("ADD A, {_0}")]
    Add(SomeByte),
    #[display("ADD HL, {_0}")]
    Add16(WideReg),
    #[display("ADD SP, e8")]
    AddSP,
    #[display("ADC A, {_0}")]
    Adc(SomeByte),
    #[display("SUB A, {_0}")]
    Sub(SomeByte),
    #[display("SBC A, {_0}")]
    Sbc(SomeByte),
    #[display("AND A, {_0}")]
    And(SomeByte),
    #[display("XOR A, {_0}")]
    Xor(SomeByte),
    #[display("OR A, {_0}")]
    Or(SomeByte),
    #[display("CP A, {_0}")]
    Cp(SomeByte),
    #[display("INC {_0}")]
    Inc(RegOrPointer),
    #[display("INC {_0}")]
    Inc16(WideReg),
    #[display("DEC {_0}")]
    Dec(RegOrPointer),
    #[display("DEC {_0}")]
    Dec16(WideReg),
}

impl ArithmeticOp {
    /// Decodes the three bit ALU field of opcodes 0x80-0xBF and 0xC6-0xFE.
    pub(crate) const fn from_alu_index(index: u8, byte: SomeByte) -> Self {
        match index & 0b111 {
            0 => ArithmeticOp::Add(byte),
            1 => ArithmeticOp::Adc(byte),
            2 => ArithmeticOp::Sub(byte),
            3 => ArithmeticOp::Sbc(byte),
            4 => ArithmeticOp::And(byte),
            5 => ArithmeticOp::Xor(byte),
            6 => ArithmeticOp::Or(byte),
            _ => ArithmeticOp::Cp(byte),
        }
    }

    /// Returns the number of cycles it will take to complete this instruction.
    pub const fn cycles(&self) -> u8 {
        match self {
            ArithmeticOp::Add(byte)
            | ArithmeticOp::Adc(byte)
            | ArithmeticOp::Sub(byte)
            | ArithmeticOp::Sbc(byte)
            | ArithmeticOp::And(byte)
            | ArithmeticOp::Xor(byte)
            | ArithmeticOp::Or(byte)
            | ArithmeticOp::Cp(byte) => match byte {
                SomeByte::Referenced(RegOrPointer::Reg(_)) => 4,
                _ => 8,
            },
            ArithmeticOp::Add16(_) => 8,
            ArithmeticOp::Inc(RegOrPointer::Pointer) => 12,
            ArithmeticOp::Inc(RegOrPointer::Reg(_)) => 4,
            ArithmeticOp::Dec(RegOrPointer::Pointer) => 12,
            ArithmeticOp::Dec(RegOrPointer::Reg(_)) => 4,
            ArithmeticOp::Inc16(_) => 8,
            ArithmeticOp::Dec16(_) => 8,
            ArithmeticOp::AddSP => 16,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            ArithmeticOp::Add(SomeByte::Direct)
            | ArithmeticOp::Adc(SomeByte::Direct)
            | ArithmeticOp::Sub(SomeByte::Direct)
            | ArithmeticOp::Sbc(SomeByte::Direct)
            | ArithmeticOp::And(SomeByte::Direct)
            | ArithmeticOp::Xor(SomeByte::Direct)
            | ArithmeticOp::Or(SomeByte::Direct)
            | ArithmeticOp::Cp(SomeByte::Direct) => 2,
            ArithmeticOp::AddSP => 2,
            _ => 1,
        }
    }
}
