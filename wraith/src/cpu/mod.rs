use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::trace;

use crate::error::LockedUp;
use crate::instruction::ArithmeticOp;
use crate::instruction::BitOp;
use crate::instruction::BitOpInner;
use crate::instruction::BitShiftOp;
use crate::instruction::Condition;
use crate::instruction::ControlOp;
use crate::instruction::HalfRegister;
use crate::instruction::Instruction;
use crate::instruction::InterruptOp;
use crate::instruction::JumpOp;
use crate::instruction::LoadAPointer;
use crate::instruction::LoadOp;
use crate::instruction::RegOrPointer;
use crate::instruction::SomeByte;
use crate::instruction::WideReg;
use crate::instruction::WideRegWithoutSP;
use crate::lookup::OP_LOOKUP;
use crate::lookup::PREFIXED_OP_LOOKUP;
use crate::mem::MemoryLike;
use crate::utils::bool_to_mask;
use crate::utils::check_bit;
use crate::utils::check_bit_const;

#[cfg(test)]
mod cpu_tests;

#[derive(Debug, Hash, Clone, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
#[display(
    "CPU {{ A=0x{a:0>2X} F={f} B=0x{b:0>2X} C=0x{c:0>2X} D=0x{d:0>2X} E=0x{e:0>2X} H=0x{h:0>2X} L=0x{l:0>2X} SP=0x{sp:0>4X} PC=0x{pc:0>4X} IME={ime} State={state} }}"
)]
pub struct Cpu {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    /// The SP register
    pub sp: u16,
    /// The PC register
    pub pc: u16,
    pub ime: bool,
    /// Set by EI. IME is set once the instruction after EI completes.
    pub to_set_ime: bool,
    pub state: CpuState,
    /// Set when HALT is executed with IME cleared while an interrupt is already pending. The next
    /// opcode fetch does not advance PC, so the byte after HALT is read twice.
    pub halt_bug: bool,
}

#[derive(
    Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum CpuState {
    #[default]
    #[display("Running")]
    Running,
    /// Waiting for `IE & IF` to become non-zero.
    #[display("Halted")]
    Halted,
    /// Waiting for a button press.
    #[display("Stopped")]
    Stopped,
    /// An illegal opcode was fetched. Only a reset leaves this state.
    #[display("Locked(0x{opcode:0>2X} @ 0x{address:0>4X})")]
    Locked { opcode: u8, address: u16 },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display("Flags(Z={} N={} H={} C={})", *z as u8, *n as u8, *h as u8, *c as u8)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

impl Flags {
    pub fn set_from_byte(&mut self, val: u8) {
        *self = val.into();
    }

    /// Every shift and rotate clears N and H.
    pub fn set_for_byte_shift_op(&mut self, z: bool, c: bool) {
        self.z = z;
        self.n = false;
        self.h = false;
        self.c = c;
    }

    /// The F register. The bottom nibble always reads as zero.
    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.z)
            | bool_to_mask::<6>(self.n)
            | bool_to_mask::<5>(self.h)
            | bool_to_mask::<4>(self.c)
    }
}

fn addition_operation(val: &mut u8, op: u8, flags: &mut Flags) {
    let (a, carry) = val.overflowing_add(op);
    flags.z = a == 0;
    flags.n = false;
    flags.h = (*val & 0x0F) + (op & 0x0F) > 0x0F;
    flags.c = carry;
    *val = a;
}

fn subtraction_operation(val: &mut u8, op: u8, flags: &mut Flags) {
    let (a, carry) = val.overflowing_sub(op);
    flags.z = a == 0;
    flags.n = true;
    flags.h = (*val & 0x0F) < (op & 0x0F);
    flags.c = carry;
    *val = a;
}

/// Takes a byte that is in standard binary representation and converts it to binary coded decimal.
fn to_bcd(mut val: u8, flags: &mut Flags) -> u8 {
    if !flags.n {
        // after an addition, adjust if (half-)carry occurred or if result is out of bounds
        if flags.c || val > 0x99 {
            val = val.wrapping_add(0x60);
            flags.c = true;
        }
        if flags.h || (val & 0x0f) > 0x09 {
            val = val.wrapping_add(0x6);
        }
    } else {
        if flags.c {
            val = val.wrapping_sub(0x60);
        }
        if flags.h {
            val = val.wrapping_sub(0x6);
        }
    }
    flags.z = val == 0;
    flags.h = false;
    val
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Constructs a CPU in the state that the boot ROM leaves it in.
    pub fn new() -> Self {
        Self {
            a: 0x01,
            f: Flags::from(0xB0),
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: false,
            to_set_ime: false,
            state: CpuState::Running,
            halt_bug: false,
        }
    }

    /// Get the top four bits of the F register
    pub fn flags(&self) -> &Flags {
        &self.f
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.f
    }

    /// Returns the value of the Z flag
    pub fn zero_flag(&self) -> bool {
        self.f.z
    }

    /// Returns the value of the N flag
    pub fn subtraction_flag(&self) -> bool {
        self.f.n
    }

    /// Returns the value of the H flag
    pub fn half_carry_flag(&self) -> bool {
        self.f.h
    }

    /// Returns the value of the C flag
    pub fn carry_flag(&self) -> bool {
        self.f.c
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted)
    }

    pub fn is_locked(&self) -> Option<LockedUp> {
        match self.state {
            CpuState::Locked { opcode, address } => Some(LockedUp { opcode, address }),
            _ => None,
        }
    }

    /// Runs a single instruction (or an interrupt dispatch) and returns the number of cycles it
    /// took. A halted or stopped CPU reports 4 cycles per call. A locked CPU reports the same
    /// error on every call.
    pub fn step<M: MemoryLike>(&mut self, mem: &mut M) -> Result<u8, LockedUp> {
        match self.state {
            CpuState::Locked { opcode, address } => return Err(LockedUp { opcode, address }),
            CpuState::Stopped => {
                if mem.wake_from_stop() {
                    trace!("Leaving STOP");
                    self.state = CpuState::Running;
                }
                return Ok(4);
            }
            CpuState::Halted => {
                if mem.pending_interrupts() == 0 {
                    return Ok(4);
                }
                trace!("Leaving HALT");
                self.state = CpuState::Running;
            }
            CpuState::Running => {}
        }
        let instr = self.read_op(mem);
        self.execute(instr, mem)
    }

    /// Determines what the CPU should do next. Included in this, is a check for interrupts.
    pub fn read_op<M: MemoryLike>(&self, mem: &M) -> Instruction {
        if self.ime {
            if let Some(op) = InterruptOp::from_pending(mem.pending_interrupts()) {
                return Instruction::Interrupt(op);
            }
        }
        match OP_LOOKUP[mem.read_byte(self.pc) as usize] {
            Instruction::Prefixed => {
                PREFIXED_OP_LOOKUP[mem.read_byte(self.pc.wrapping_add(1)) as usize]
            }
            op => op,
        }
    }

    fn execute<M: MemoryLike>(&mut self, instr: Instruction, mem: &mut M) -> Result<u8, LockedUp> {
        let address = self.pc;
        if let Instruction::Interrupt(op) = instr {
            return Ok(self.dispatch_interrupt(op, mem));
        }
        trace!("0x{address:0>4X}: {instr}");
        // Move past the opcode (and prefix). Operands are read as they are needed.
        if self.halt_bug {
            self.halt_bug = false;
        } else {
            self.inc_pc();
        }
        let prefixed = match instr {
            Instruction::Bit(_) => true,
            Instruction::BitShift(op) => op.size() == 2,
            _ => false,
        };
        if prefixed {
            self.inc_pc();
        }
        let taken = match instr {
            Instruction::Load(op) => {
                self.execute_load_op(op, mem);
                false
            }
            Instruction::ControlOp(op) => {
                self.execute_control_op(op, mem);
                false
            }
            Instruction::Jump(op) => self.execute_jump_op(op, mem),
            Instruction::Arithmetic(op) => {
                self.execute_arithmetic_op(op, mem);
                false
            }
            Instruction::BitShift(op) => {
                self.execute_bit_shift_op(op, mem);
                false
            }
            Instruction::Bit(op) => {
                self.execute_bit_op(op, mem);
                false
            }
            Instruction::Daa => {
                self.a = to_bcd(self.a, &mut self.f);
                false
            }
            Instruction::Scf => {
                self.f.n = false;
                self.f.h = false;
                self.f.c = true;
                false
            }
            Instruction::Cpl => {
                self.a = !self.a;
                self.f.n = true;
                self.f.h = true;
                false
            }
            Instruction::Ccf => {
                self.f.n = false;
                self.f.h = false;
                self.f.c = !self.f.c;
                false
            }
            Instruction::Di => {
                self.disable_interupts();
                false
            }
            Instruction::Ei => {
                // A delay armed by an earlier EI still lands now. This one lands after the next
                // instruction completes.
                self.ime |= self.to_set_ime;
                self.enable_interupts();
                return Ok(instr.cycles());
            }
            Instruction::Illegal(opcode) => {
                error!("Illegal opcode 0x{opcode:0>2X} at 0x{address:0>4X}; locking up");
                self.pc = address;
                self.state = CpuState::Locked { opcode, address };
                return Err(LockedUp { opcode, address });
            }
            // Resolved by `read_op`
            Instruction::Prefixed | Instruction::Interrupt(_) => false,
        };
        self.ime |= self.to_set_ime;
        self.to_set_ime = false;
        Ok(match (taken, instr.branch_cycles()) {
            (true, Some(cycles)) => cycles,
            _ => instr.cycles(),
        })
    }

    fn dispatch_interrupt<M: MemoryLike>(&mut self, op: InterruptOp, mem: &mut M) -> u8 {
        trace!("Dispatching {op} interrupt from 0x{:0>4X}", self.pc);
        self.ime = false;
        self.to_set_ime = false;
        // An interrupt taken during the halt defect returns to the HALT itself.
        if self.halt_bug {
            self.halt_bug = false;
            self.pc = self.pc.wrapping_sub(1);
        }
        let [hi, lo] = self.pc.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, hi);
        // Pushing the high byte can overwrite IE, which changes (or cancels) the dispatch.
        let target = InterruptOp::from_pending(mem.pending_interrupts());
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, lo);
        match target {
            Some(op) => {
                mem.clear_interrupt_req(op);
                self.pc = op.vector();
            }
            None => self.pc = 0x0000,
        }
        InterruptOp::CYCLES
    }

    pub(crate) fn enable_interupts(&mut self) {
        self.to_set_ime = true;
    }

    pub(crate) fn disable_interupts(&mut self) {
        self.ime = false;
        self.to_set_ime = false;
    }

    pub fn inc_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    /// Reads the byte at PC and moves PC past it.
    fn fetch_byte<M: MemoryLike>(&mut self, mem: &M) -> u8 {
        let byte = mem.read_byte(self.pc);
        self.inc_pc();
        byte
    }

    /// Reads the little-endian word at PC and moves PC past it.
    fn fetch_word<M: MemoryLike>(&mut self, mem: &M) -> u16 {
        let lo = self.fetch_byte(mem);
        let hi = self.fetch_byte(mem);
        u16::from_le_bytes([lo, hi])
    }

    fn push<M: MemoryLike>(&mut self, mem: &mut M, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        mem.write_byte(self.sp, lo);
    }

    fn pop<M: MemoryLike>(&mut self, mem: &M) -> u16 {
        let lo = mem.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = mem.read_byte(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    pub fn reg(&self, reg: HalfRegister) -> u8 {
        match reg {
            HalfRegister::A => self.a,
            HalfRegister::F => self.f.as_byte(),
            HalfRegister::B => self.b,
            HalfRegister::C => self.c,
            HalfRegister::D => self.d,
            HalfRegister::E => self.e,
            HalfRegister::H => self.h,
            HalfRegister::L => self.l,
        }
    }

    pub fn set_reg(&mut self, reg: HalfRegister, val: u8) {
        match reg {
            HalfRegister::A => self.a = val,
            HalfRegister::F => self.f.set_from_byte(val),
            HalfRegister::B => self.b = val,
            HalfRegister::C => self.c = val,
            HalfRegister::D => self.d = val,
            HalfRegister::E => self.e = val,
            HalfRegister::H => self.h = val,
            HalfRegister::L => self.l = val,
        }
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn ptr(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    fn set_ptr(&mut self, val: u16) {
        [self.h, self.l] = val.to_be_bytes();
    }

    fn read_wide_reg(&self, reg: WideReg) -> u16 {
        match reg {
            WideReg::BC => self.bc(),
            WideReg::DE => self.de(),
            WideReg::HL => self.ptr(),
            WideReg::SP => self.sp,
        }
    }

    fn write_wide_reg(&mut self, reg: WideReg, val: u16) {
        match reg {
            WideReg::BC => [self.b, self.c] = val.to_be_bytes(),
            WideReg::DE => [self.d, self.e] = val.to_be_bytes(),
            WideReg::HL => self.set_ptr(val),
            WideReg::SP => self.sp = val,
        }
    }

    fn read_wide_reg_without_sp(&self, reg: WideRegWithoutSP) -> u16 {
        let (hi, lo) = reg.split();
        u16::from_be_bytes([self.reg(hi), self.reg(lo)])
    }

    fn write_wide_reg_without_sp(&mut self, reg: WideRegWithoutSP, val: u16) {
        let (hi, lo) = reg.split();
        let [hi_val, lo_val] = val.to_be_bytes();
        self.set_reg(hi, hi_val);
        self.set_reg(lo, lo_val);
    }

    pub fn copy_byte<M: MemoryLike>(&self, mem: &M, reg: RegOrPointer) -> u8 {
        match reg {
            RegOrPointer::Reg(reg) => self.reg(reg),
            RegOrPointer::Pointer => mem.read_byte(self.ptr()),
        }
    }

    fn write_byte<M: MemoryLike>(&mut self, mem: &mut M, reg: RegOrPointer, val: u8) {
        match reg {
            RegOrPointer::Reg(reg) => self.set_reg(reg, val),
            RegOrPointer::Pointer => mem.write_byte(self.ptr(), val),
        }
    }

    /// Reads a byte, lets the closure update it, writes it back, and returns the new value.
    fn update_byte<M, F>(&mut self, reg: RegOrPointer, mem: &mut M, update: F) -> u8
    where
        M: MemoryLike,
        F: FnOnce(&mut Self, u8) -> u8,
    {
        let byte = self.copy_byte(mem, reg);
        let byte = update(self, byte);
        self.write_byte(mem, reg, byte);
        byte
    }

    fn unwrap_some_byte<M: MemoryLike>(&mut self, mem: &M, byte: SomeByte) -> u8 {
        match byte {
            SomeByte::Direct => self.fetch_byte(mem),
            SomeByte::Referenced(reg) => self.copy_byte(mem, reg),
        }
    }

    /// Resolves the address of one of the A register's special pointers. HL+ and HL- update HL.
    fn load_a_addr(&mut self, ptr: LoadAPointer) -> u16 {
        match ptr {
            LoadAPointer::BC => self.bc(),
            LoadAPointer::DE => self.de(),
            LoadAPointer::Hli => {
                let addr = self.ptr();
                self.set_ptr(addr.wrapping_add(1));
                addr
            }
            LoadAPointer::Hld => {
                let addr = self.ptr();
                self.set_ptr(addr.wrapping_sub(1));
                addr
            }
        }
    }

    pub fn passed(&self, cond: Condition) -> bool {
        match cond {
            Condition::Zero => self.zero_flag(),
            Condition::NotZero => !self.zero_flag(),
            Condition::Carry => self.carry_flag(),
            Condition::NotCarry => !self.carry_flag(),
        }
    }

    /// SP plus a signed immediate. Used by `ADD SP, e8` and `LD HL, SP + e8`, which set H and C
    /// from the unsigned addition of the low byte.
    fn sp_plus_offset<M: MemoryLike>(&mut self, mem: &M) -> u16 {
        let offset = self.fetch_byte(mem);
        let sp = self.sp;
        self.f.z = false;
        self.f.n = false;
        self.f.h = (sp & 0x0F) + (offset as u16 & 0x0F) > 0x0F;
        self.f.c = (sp & 0xFF) + offset as u16 > 0xFF;
        sp.wrapping_add_signed(offset as i8 as i16)
    }

    fn execute_load_op<M: MemoryLike>(&mut self, op: LoadOp, mem: &mut M) {
        match op {
            LoadOp::Basic { dest, src } => {
                let byte = self.copy_byte(mem, src);
                self.write_byte(mem, dest, byte);
            }
            LoadOp::Direct16(reg) => {
                let val = self.fetch_word(mem);
                self.write_wide_reg(reg, val);
            }
            LoadOp::Direct(reg) => {
                let byte = self.fetch_byte(mem);
                self.write_byte(mem, reg, byte);
            }
            LoadOp::LoadIntoA(ptr) => {
                let addr = self.load_a_addr(ptr);
                self.a = mem.read_byte(addr);
            }
            LoadOp::StoreFromA(ptr) => {
                let addr = self.load_a_addr(ptr);
                mem.write_byte(addr, self.a);
            }
            LoadOp::StoreSP => {
                let addr = self.fetch_word(mem);
                let [hi, lo] = self.sp.to_be_bytes();
                mem.write_byte(addr, lo);
                mem.write_byte(addr.wrapping_add(1), hi);
            }
            LoadOp::HLIntoSP => self.sp = self.ptr(),
            LoadOp::SPIntoHL => {
                let val = self.sp_plus_offset(mem);
                self.set_ptr(val);
            }
            LoadOp::Pop(reg) => {
                let val = self.pop(mem);
                self.write_wide_reg_without_sp(reg, val);
            }
            LoadOp::Push(reg) => {
                let val = self.read_wide_reg_without_sp(reg);
                self.push(mem, val);
            }
            LoadOp::StoreHigh => {
                let addr = 0xFF00 | self.fetch_byte(mem) as u16;
                mem.write_byte(addr, self.a);
            }
            LoadOp::LoadHigh => {
                let addr = 0xFF00 | self.fetch_byte(mem) as u16;
                self.a = mem.read_byte(addr);
            }
            LoadOp::StoreHighC => mem.write_byte(0xFF00 | self.c as u16, self.a),
            LoadOp::LoadHighC => self.a = mem.read_byte(0xFF00 | self.c as u16),
            LoadOp::StoreA => {
                let addr = self.fetch_word(mem);
                mem.write_byte(addr, self.a);
            }
            LoadOp::LoadA => {
                let addr = self.fetch_word(mem);
                self.a = mem.read_byte(addr);
            }
        }
    }

    fn execute_control_op<M: MemoryLike>(&mut self, op: ControlOp, mem: &mut M) {
        match op {
            ControlOp::Noop => {}
            ControlOp::Halt => {
                if !self.ime && mem.pending_interrupts() != 0 {
                    trace!("HALT with a pending interrupt and IME cleared");
                    self.halt_bug = true;
                } else {
                    self.state = CpuState::Halted;
                }
            }
            ControlOp::Stop => {
                // The byte after STOP is skipped.
                self.inc_pc();
                mem.stop();
                self.state = CpuState::Stopped;
            }
        }
    }

    /// Returns whether or not the jump (or call or return) was taken.
    fn execute_jump_op<M: MemoryLike>(&mut self, op: JumpOp, mem: &mut M) -> bool {
        match op {
            JumpOp::ConditionalRelative(cond) => {
                let offset = self.fetch_byte(mem) as i8;
                let passed = self.passed(cond);
                if passed {
                    self.pc = self.pc.wrapping_add_signed(offset as i16);
                }
                passed
            }
            JumpOp::Relative => {
                let offset = self.fetch_byte(mem) as i8;
                self.pc = self.pc.wrapping_add_signed(offset as i16);
                true
            }
            JumpOp::ConditionalAbsolute(cond) => {
                let addr = self.fetch_word(mem);
                let passed = self.passed(cond);
                if passed {
                    self.pc = addr;
                }
                passed
            }
            JumpOp::Absolute => {
                self.pc = self.fetch_word(mem);
                true
            }
            JumpOp::JumpToHL => {
                self.pc = self.ptr();
                true
            }
            JumpOp::Call => {
                let addr = self.fetch_word(mem);
                self.push(mem, self.pc);
                self.pc = addr;
                true
            }
            JumpOp::ConditionalCall(cond) => {
                let addr = self.fetch_word(mem);
                let passed = self.passed(cond);
                if passed {
                    self.push(mem, self.pc);
                    self.pc = addr;
                }
                passed
            }
            JumpOp::Return => {
                self.pc = self.pop(mem);
                true
            }
            JumpOp::ConditionalReturn(cond) => {
                let passed = self.passed(cond);
                if passed {
                    self.pc = self.pop(mem);
                }
                passed
            }
            JumpOp::ReturnAndEnable => {
                self.pc = self.pop(mem);
                // Unlike EI, this takes effect immediately.
                self.ime = true;
                true
            }
            JumpOp::Rst(addr) => {
                self.push(mem, self.pc);
                self.pc = addr as u16;
                true
            }
        }
    }

    fn execute_arithmetic_op<M: MemoryLike>(&mut self, op: ArithmeticOp, mem: &mut M) {
        match op {
            ArithmeticOp::AddSP => self.sp = self.sp_plus_offset(mem),
            ArithmeticOp::Inc16(reg) => {
                let val = self.read_wide_reg(reg).wrapping_add(1);
                self.write_wide_reg(reg, val);
            }
            ArithmeticOp::Dec16(reg) => {
                let val = self.read_wide_reg(reg).wrapping_sub(1);
                self.write_wide_reg(reg, val);
            }
            ArithmeticOp::Add16(reg) => {
                let value = self.read_wide_reg(reg);
                let ptr = self.ptr();
                self.f.h = (ptr & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
                let (ptr, carry) = ptr.overflowing_add(value);
                self.set_ptr(ptr);
                self.f.n = false;
                self.f.c = carry;
            }
            ArithmeticOp::Add(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                addition_operation(&mut self.a, byte, &mut self.f);
            }
            ArithmeticOp::Adc(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                let carry = self.f.c as u8;
                let sum = self.a as u16 + byte as u16 + carry as u16;
                self.f.h = (self.a & 0x0F) + (byte & 0x0F) + carry > 0x0F;
                self.f.c = sum > 0xFF;
                self.a = sum as u8;
                self.f.z = self.a == 0;
                self.f.n = false;
            }
            ArithmeticOp::Sub(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                subtraction_operation(&mut self.a, byte, &mut self.f);
            }
            ArithmeticOp::Sbc(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                let carry = self.f.c as i16;
                let diff = self.a as i16 - byte as i16 - carry;
                self.f.h = (self.a & 0x0F) as i16 - (byte & 0x0F) as i16 - carry < 0;
                self.f.c = diff < 0;
                self.a = diff as u8;
                self.f.z = self.a == 0;
                self.f.n = true;
            }
            ArithmeticOp::And(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                self.a &= byte;
                self.f.z = self.a == 0;
                self.f.n = false;
                self.f.h = true;
                self.f.c = false;
            }
            ArithmeticOp::Xor(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                self.a ^= byte;
                self.f.z = self.a == 0;
                self.f.n = false;
                self.f.h = false;
                self.f.c = false;
            }
            ArithmeticOp::Or(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                self.a |= byte;
                self.f.z = self.a == 0;
                self.f.n = false;
                self.f.h = false;
                self.f.c = false;
            }
            ArithmeticOp::Cp(byte) => {
                let byte = self.unwrap_some_byte(mem, byte);
                let mut a = self.a;
                subtraction_operation(&mut a, byte, &mut self.f);
            }
            ArithmeticOp::Inc(reg) => {
                let val = self.update_byte(reg, mem, |cpu, byte| {
                    cpu.f.h = byte & 0x0F == 0x0F;
                    byte.wrapping_add(1)
                });
                self.f.z = val == 0;
                self.f.n = false;
            }
            ArithmeticOp::Dec(reg) => {
                let val = self.update_byte(reg, mem, |cpu, byte| {
                    cpu.f.h = byte & 0x0F == 0x00;
                    byte.wrapping_sub(1)
                });
                self.f.z = val == 0;
                self.f.n = true;
            }
        }
    }

    fn execute_bit_shift_op<M: MemoryLike>(&mut self, op: BitShiftOp, mem: &mut M) {
        match op {
            // The accumulator-only rotates always clear Z.
            BitShiftOp::Rlca => {
                let carry = check_bit_const::<7>(self.a);
                self.a = self.a.rotate_left(1);
                self.f.set_for_byte_shift_op(false, carry);
            }
            BitShiftOp::Rla => {
                let carry = check_bit_const::<7>(self.a);
                self.a = (self.a << 1) | self.f.c as u8;
                self.f.set_for_byte_shift_op(false, carry);
            }
            BitShiftOp::Rrca => {
                let carry = check_bit_const::<0>(self.a);
                self.a = self.a.rotate_right(1);
                self.f.set_for_byte_shift_op(false, carry);
            }
            BitShiftOp::Rra => {
                let carry = check_bit_const::<0>(self.a);
                self.a = (self.a >> 1) | ((self.f.c as u8) << 7);
                self.f.set_for_byte_shift_op(false, carry);
            }
            BitShiftOp::Rlc(reg) => self.shift(reg, mem, |byte, _| {
                (byte.rotate_left(1), check_bit_const::<7>(byte))
            }),
            BitShiftOp::Rrc(reg) => self.shift(reg, mem, |byte, _| {
                (byte.rotate_right(1), check_bit_const::<0>(byte))
            }),
            BitShiftOp::Rl(reg) => self.shift(reg, mem, |byte, carry| {
                ((byte << 1) | carry as u8, check_bit_const::<7>(byte))
            }),
            BitShiftOp::Rr(reg) => self.shift(reg, mem, |byte, carry| {
                ((byte >> 1) | ((carry as u8) << 7), check_bit_const::<0>(byte))
            }),
            BitShiftOp::Sla(reg) => self.shift(reg, mem, |byte, _| {
                (byte << 1, check_bit_const::<7>(byte))
            }),
            BitShiftOp::Sra(reg) => self.shift(reg, mem, |byte, _| {
                ((byte >> 1) | (byte & 0x80), check_bit_const::<0>(byte))
            }),
            BitShiftOp::Swap(reg) => self.shift(reg, mem, |byte, _| (byte.rotate_left(4), false)),
            BitShiftOp::Srl(reg) => self.shift(reg, mem, |byte, _| {
                (byte >> 1, check_bit_const::<0>(byte))
            }),
        }
    }

    /// Runs one of the prefixed shifts. The closure is given the byte and the carry flag and
    /// returns the new byte and the new carry flag. Z is set from the result.
    fn shift<M, F>(&mut self, reg: RegOrPointer, mem: &mut M, op: F)
    where
        M: MemoryLike,
        F: FnOnce(u8, bool) -> (u8, bool),
    {
        let mut carry = false;
        let val = self.update_byte(reg, mem, |cpu, byte| {
            let (byte, c) = op(byte, cpu.f.c);
            carry = c;
            byte
        });
        self.f.set_for_byte_shift_op(val == 0, carry);
    }

    fn execute_bit_op<M: MemoryLike>(&mut self, op: BitOp, mem: &mut M) {
        let BitOp { bit, reg, op } = op;
        match op {
            BitOpInner::Bit => {
                let byte = self.copy_byte(mem, reg);
                self.f.z = !check_bit(byte, bit);
                self.f.n = false;
                self.f.h = true;
            }
            BitOpInner::Res => {
                self.update_byte(reg, mem, |_, byte| byte & !(1 << bit));
            }
            BitOpInner::Set => {
                self.update_byte(reg, mem, |_, byte| byte | (1 << bit));
            }
        }
    }
}
