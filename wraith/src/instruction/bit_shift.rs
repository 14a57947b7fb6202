use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum BitShiftOp {
    #[display("RLC {_0}")]
    Rlc(RegOrPointer),
    #[display("RLCA")]
    Rlca,
    #[display("RRC {_0}")]
    Rrc(RegOrPointer),
    #[display("RRCA")]
    Rrca,
    #[display("RL {_0}")]
    Rl(RegOrPointer),
    #[display("RLA")]
    Rla,
    #[display("RR {_0}")]
    Rr(RegOrPointer),
    #[display("RRA")]
    Rra,
    #[display("SLA {_0}")]
    Sla(RegOrPointer),
    #[display("SRA {_0}")]
    Sra(RegOrPointer),
    #[display("SWAP {_0}")]
    Swap(RegOrPointer),
    #[display("SRL {_0}")]
    Srl(RegOrPointer),
}

impl BitShiftOp {
    /// Decodes the shift field of the first quarter of the prefixed table.
    pub(crate) const fn from_index(index: u8, reg: RegOrPointer) -> Self {
        match index & 0b111 {
            0 => BitShiftOp::Rlc(reg),
            1 => BitShiftOp::Rrc(reg),
            2 => BitShiftOp::Rl(reg),
            3 => BitShiftOp::Rr(reg),
            4 => BitShiftOp::Sla(reg),
            5 => BitShiftOp::Sra(reg),
            6 => BitShiftOp::Swap(reg),
            _ => BitShiftOp::Srl(reg),
        }
    }

    /// Returns the number of cycles it will take to complete this instruction. The prefixed forms
    /// include the cost of the prefix.
    pub const fn cycles(&self) -> u8 {
        match self {
            BitShiftOp::Rlca | BitShiftOp::Rrca | BitShiftOp::Rla | BitShiftOp::Rra => 4,
            BitShiftOp::Rlc(RegOrPointer::Pointer)
            | BitShiftOp::Rrc(RegOrPointer::Pointer)
            | BitShiftOp::Rl(RegOrPointer::Pointer)
            | BitShiftOp::Rr(RegOrPointer::Pointer)
            | BitShiftOp::Sla(RegOrPointer::Pointer)
            | BitShiftOp::Sra(RegOrPointer::Pointer)
            | BitShiftOp::Swap(RegOrPointer::Pointer)
            | BitShiftOp::Srl(RegOrPointer::Pointer) => 16,
            _ => 8,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            BitShiftOp::Rlca | BitShiftOp::Rrca | BitShiftOp::Rla | BitShiftOp::Rra => 1,
            _ => 2,
        }
    }
}
