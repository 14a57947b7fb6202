use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadOp {
    /// Used for opcodes in 0x40..0x80
    #[display("LD {dest}, {src}")]
    Basic {
        dest: RegOrPointer,
        src: RegOrPointer,
    },
    /// Used for opcodes 0xX1
    #[display("LD {_0}, d16")]
    Direct16(WideReg),
    /// Used for opcodes 0x_6 and 0x_E
    #[display("LD {_0}, d8")]
    Direct(RegOrPointer),
    /// Used for opcodes 0x_A
    #[display("LD A, {_0}")]
    LoadIntoA(LoadAPointer),
    /// Used for opcodes 0x_2
    #[display("LD {_0}, A")]
    StoreFromA(LoadAPointer),
    /// Opcode: 0x08
    /// Store SP & $FF at address n16 and SP >> 8 at address n16 + 1.
    #[display("LD (a16), SP")]
    StoreSP,
    /// Opcode: 0xF9
    #[display("LD SP, HL")]
    HLIntoSP,
    /// Opcode: 0xF8
    /// Add the signed value e8 to SP and store the result in HL.
    #[display("LD HL, SP + e8")]
    SPIntoHL,
    /// Used for opcodes 0x_1
    #[display("POP {_0}")]
    Pop(WideRegWithoutSP),
    /// Used for opcodes 0x_5
    #[display("PUSH {_0}")]
    Push(WideRegWithoutSP),
    /// Opcode: 0xE0
    #[display("LDH (a8), A")]
    StoreHigh,
    /// Opcode: 0xF0
    #[display("LDH A, (a8)")]
    LoadHigh,
    /// Opcode: 0xE2
    #[display("LDH (C), A")]
    StoreHighC,
    /// Opcode: 0xF2
    #[display("LDH A, (C)")]
    LoadHighC,
    /// Opcode: 0xEA
    #[display("LD (a16), A")]
    StoreA,
    /// Opcode: 0xFA
    #[display("LD A, (a16)")]
    LoadA,
}

impl LoadOp {
    /// Returns the number of cycles it will take to complete this instruction.
    pub const fn cycles(&self) -> u8 {
        match self {
            LoadOp::Basic {
                dest: RegOrPointer::Pointer,
                ..
            }
            | LoadOp::Basic {
                src: RegOrPointer::Pointer,
                ..
            } => 8,
            LoadOp::Basic { .. } => 4,
            LoadOp::Direct16(_) => 12,
            LoadOp::Direct(RegOrPointer::Pointer) => 12,
            LoadOp::Direct(_) => 8,
            LoadOp::LoadIntoA(_) => 8,
            LoadOp::StoreFromA(_) => 8,
            LoadOp::StoreSP => 20,
            LoadOp::HLIntoSP => 8,
            LoadOp::SPIntoHL => 12,
            LoadOp::Pop(_) => 12,
            LoadOp::Push(_) => 16,
            LoadOp::StoreHigh => 12,
            LoadOp::LoadHigh => 12,
            LoadOp::StoreHighC => 8,
            LoadOp::LoadHighC => 8,
            LoadOp::StoreA => 16,
            LoadOp::LoadA => 16,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            LoadOp::Basic { .. } => 1,
            LoadOp::Direct16(_) => 3,
            LoadOp::Direct(_) => 2,
            LoadOp::LoadIntoA(_) => 1,
            LoadOp::StoreFromA(_) => 1,
            LoadOp::StoreSP => 3,
            LoadOp::HLIntoSP => 1,
            LoadOp::SPIntoHL => 2,
            LoadOp::Pop(_) => 1,
            LoadOp::Push(_) => 1,
            LoadOp::StoreHigh => 2,
            LoadOp::LoadHigh => 2,
            LoadOp::StoreHighC => 1,
            LoadOp::LoadHighC => 1,
            LoadOp::StoreA => 3,
            LoadOp::LoadA => 3,
        }
    }
}
