use crate::instruction::*;

/// Every unprefixed opcode, indexed by the opcode.
pub static OP_LOOKUP: [Instruction; 0x100] = build_op_lookup();

/// Every opcode that follows the 0xCB prefix, indexed by the second byte.
pub static PREFIXED_OP_LOOKUP: [Instruction; 0x100] = build_prefixed_op_lookup();

/// The eleven opcodes that do not correspond to any operation.
pub const ILLEGAL_OPS: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

const fn build_op_lookup() -> [Instruction; 0x100] {
    let mut table = [Instruction::Illegal(0); 0x100];
    let mut i = 0;
    while i < 0x100 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

const fn build_prefixed_op_lookup() -> [Instruction; 0x100] {
    let mut table = [Instruction::Illegal(0); 0x100];
    let mut i = 0;
    while i < 0x100 {
        table[i] = decode_prefixed(i as u8);
        i += 1;
    }
    table
}

/// Decodes an unprefixed opcode. The opcode is split into the usual fields: the top two bits pick
/// the block, bits 3-5 (`y`) and bits 0-2 (`z`) pick the operands.
const fn decode(op: u8) -> Instruction {
    let y = (op >> 3) & 0b111;
    let z = op & 0b111;
    let p = y >> 1;
    match op {
        /* --- Block 0 --- */
        0x00 => Instruction::ControlOp(ControlOp::Noop),
        0x10 => Instruction::ControlOp(ControlOp::Stop),
        0x08 => Instruction::Load(LoadOp::StoreSP),
        0x18 => Instruction::Jump(JumpOp::Relative),
        0x20 | 0x28 | 0x30 | 0x38 => {
            Instruction::Jump(JumpOp::ConditionalRelative(Condition::from_index(y - 4)))
        }
        0x01 | 0x11 | 0x21 | 0x31 => Instruction::Load(LoadOp::Direct16(WideReg::from_index(p))),
        0x09 | 0x19 | 0x29 | 0x39 => {
            Instruction::Arithmetic(ArithmeticOp::Add16(WideReg::from_index(p)))
        }
        0x02 | 0x12 | 0x22 | 0x32 => {
            Instruction::Load(LoadOp::StoreFromA(LoadAPointer::from_index(p)))
        }
        0x0A | 0x1A | 0x2A | 0x3A => {
            Instruction::Load(LoadOp::LoadIntoA(LoadAPointer::from_index(p)))
        }
        0x03 | 0x13 | 0x23 | 0x33 => {
            Instruction::Arithmetic(ArithmeticOp::Inc16(WideReg::from_index(p)))
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            Instruction::Arithmetic(ArithmeticOp::Dec16(WideReg::from_index(p)))
        }
        0x07 => Instruction::BitShift(BitShiftOp::Rlca),
        0x0F => Instruction::BitShift(BitShiftOp::Rrca),
        0x17 => Instruction::BitShift(BitShiftOp::Rla),
        0x1F => Instruction::BitShift(BitShiftOp::Rra),
        0x27 => Instruction::Daa,
        0x2F => Instruction::Cpl,
        0x37 => Instruction::Scf,
        0x3F => Instruction::Ccf,
        0x00..=0x3F if z == 4 => {
            Instruction::Arithmetic(ArithmeticOp::Inc(RegOrPointer::from_index(y)))
        }
        0x00..=0x3F if z == 5 => {
            Instruction::Arithmetic(ArithmeticOp::Dec(RegOrPointer::from_index(y)))
        }
        0x00..=0x3F => Instruction::Load(LoadOp::Direct(RegOrPointer::from_index(y))),
        /* --- Block 1 --- */
        // What would be `LD (HL), (HL)`
        0x76 => Instruction::ControlOp(ControlOp::Halt),
        0x40..=0x7F => Instruction::Load(LoadOp::Basic {
            dest: RegOrPointer::from_index(y),
            src: RegOrPointer::from_index(z),
        }),
        /* --- Block 2 --- */
        0x80..=0xBF => Instruction::Arithmetic(ArithmeticOp::from_alu_index(
            y,
            SomeByte::Referenced(RegOrPointer::from_index(z)),
        )),
        /* --- Block 3 --- */
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            Instruction::Jump(JumpOp::ConditionalReturn(Condition::from_index(y)))
        }
        0xC9 => Instruction::Jump(JumpOp::Return),
        0xD9 => Instruction::Jump(JumpOp::ReturnAndEnable),
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            Instruction::Jump(JumpOp::ConditionalAbsolute(Condition::from_index(y)))
        }
        0xC3 => Instruction::Jump(JumpOp::Absolute),
        0xE9 => Instruction::Jump(JumpOp::JumpToHL),
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            Instruction::Jump(JumpOp::ConditionalCall(Condition::from_index(y)))
        }
        0xCD => Instruction::Jump(JumpOp::Call),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => Instruction::Load(LoadOp::Pop(WideRegWithoutSP::from_index(p))),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            Instruction::Load(LoadOp::Push(WideRegWithoutSP::from_index(p)))
        }
        0xCB => Instruction::Prefixed,
        0xE0 => Instruction::Load(LoadOp::StoreHigh),
        0xF0 => Instruction::Load(LoadOp::LoadHigh),
        0xE2 => Instruction::Load(LoadOp::StoreHighC),
        0xF2 => Instruction::Load(LoadOp::LoadHighC),
        0xEA => Instruction::Load(LoadOp::StoreA),
        0xFA => Instruction::Load(LoadOp::LoadA),
        0xE8 => Instruction::Arithmetic(ArithmeticOp::AddSP),
        0xF8 => Instruction::Load(LoadOp::SPIntoHL),
        0xF9 => Instruction::Load(LoadOp::HLIntoSP),
        0xF3 => Instruction::Di,
        0xFB => Instruction::Ei,
        0xC0..=0xFF if z == 6 => {
            Instruction::Arithmetic(ArithmeticOp::from_alu_index(y, SomeByte::Direct))
        }
        0xC0..=0xFF if z == 7 => Instruction::Jump(JumpOp::Rst(y * 8)),
        _ => Instruction::Illegal(op),
    }
}

/// Decodes the byte that follows a 0xCB prefix. Every value is a valid operation.
const fn decode_prefixed(op: u8) -> Instruction {
    let bit = (op >> 3) & 0b111;
    let reg = RegOrPointer::from_index(op);
    match op >> 6 {
        0 => Instruction::BitShift(BitShiftOp::from_index(bit, reg)),
        1 => Instruction::Bit(BitOp {
            bit,
            reg,
            op: BitOpInner::Bit,
        }),
        2 => Instruction::Bit(BitOp {
            bit,
            reg,
            op: BitOpInner::Res,
        }),
        _ => Instruction::Bit(BitOp {
            bit,
            reg,
            op: BitOpInner::Set,
        }),
    }
}
