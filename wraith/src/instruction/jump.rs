use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum JumpOp {
    /// Op Codes: 0x20, 0x30, 0x28, 0x38
    #[display("JR {_0}, e8")]
    ConditionalRelative(Condition),
    /// Op Code: 0x18
    #[display("JR e8")]
    Relative,
    /// Op Codes: 0xC2, 0xD2, 0xCA, 0xDA
    #[display("JP {_0}, a16")]
    ConditionalAbsolute(Condition),
    /// Op Code: 0xC3
    #[display("JP a16")]
    Absolute,
    /// Op Code: 0xE9
    #[display("JP HL")]
    JumpToHL,
    /// Op Code: 0xCD
    #[display("CALL a16")]
    Call,
    /// Op Codes: 0xC4, 0xD4, 0xCC, 0xDC
    #[display("CALL {_0}, a16")]
    ConditionalCall(Condition),
    /// Op Code: 0xC9
    #[display("RET")]
    Return,
    /// Op Codes: 0xC0, 0xD0, 0xC8, 0xD8
    #[display("RET {_0}")]
    ConditionalReturn(Condition),
    /// Op Code: 0xD9
    /// Return from the subroutine and enable intrupts
    #[display("RETI")]
    ReturnAndEnable,
    /// Op Codes: 0xC7, 0xCF, ..., 0xFF
    /// Calls the fixed address held in the variant.
    #[display("RST 0x{_0:0>2X}")]
    Rst(u8),
}

impl JumpOp {
    /// Returns the number of cycles it will take to complete this instruction if its condition
    /// (if any) fails.
    pub const fn cycles(&self) -> u8 {
        match self {
            JumpOp::ConditionalRelative(_) => 8,
            JumpOp::Relative => 12,
            JumpOp::ConditionalAbsolute(_) => 12,
            JumpOp::Absolute => 16,
            JumpOp::JumpToHL => 4,
            JumpOp::Call => 24,
            JumpOp::ConditionalCall(_) => 12,
            JumpOp::Return => 16,
            JumpOp::ConditionalReturn(_) => 8,
            JumpOp::ReturnAndEnable => 16,
            JumpOp::Rst(_) => 16,
        }
    }

    /// The number of cycles a conditional jump takes when the jump is taken.
    pub const fn branch_cycles(&self) -> Option<u8> {
        match self {
            JumpOp::ConditionalRelative(_) => Some(12),
            JumpOp::ConditionalAbsolute(_) => Some(16),
            JumpOp::ConditionalCall(_) => Some(24),
            JumpOp::ConditionalReturn(_) => Some(20),
            _ => None,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            JumpOp::ConditionalRelative(_) => 2,
            JumpOp::Relative => 2,
            JumpOp::ConditionalAbsolute(_) => 3,
            JumpOp::Absolute => 3,
            JumpOp::JumpToHL => 1,
            JumpOp::Call => 3,
            JumpOp::ConditionalCall(_) => 3,
            JumpOp::Return => 1,
            JumpOp::ConditionalReturn(_) => 1,
            JumpOp::ReturnAndEnable => 1,
            JumpOp::Rst(_) => 1,
        }
    }
}
