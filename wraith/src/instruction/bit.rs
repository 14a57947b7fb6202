use super::*;

/// The BIT, RES, and SET operations. These are all prefixed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{op} {bit}, {reg}")]
pub struct BitOp {
    pub bit: u8,
    pub reg: RegOrPointer,
    pub op: BitOpInner,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum BitOpInner {
    #[display("BIT")]
    Bit,
    #[display("RES")]
    Res,
    #[display("SET")]
    Set,
}

impl BitOp {
    /// Returns the number of cycles it will take to complete this instruction, including the
    /// prefix. BIT only reads the pointer, so it is cheaper than RES and SET.
    pub const fn cycles(&self) -> u8 {
        match (self.op, self.reg) {
            (_, RegOrPointer::Reg(_)) => 8,
            (BitOpInner::Bit, RegOrPointer::Pointer) => 12,
            (_, RegOrPointer::Pointer) => 16,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        2
    }
}
