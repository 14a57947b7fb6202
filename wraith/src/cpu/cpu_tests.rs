use serde::{Deserialize, Serialize};

use super::{Cpu, CpuState, Flags};
use crate::error::LockedUp;
use crate::instruction::InterruptOp;
use crate::mem::{MemoryLike, MemoryMap};
use crate::{ButtonInput, SsabInput};

/// Single instruction cases in the same shape as the widely used per-opcode JSON suites. Every
/// number is decimal since JSON has no hex literals.
const CASES: &str = r#"[
    {
        "name": "80 ADD A, B carries out of both nibbles",
        "initial": { "pc": 256, "sp": 65534, "a": 58, "b": 198, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 128]] },
        "final": { "pc": 257, "sp": 65534, "a": 0, "b": 198, "c": 0, "d": 0, "e": 0, "f": 176, "h": 0, "l": 0, "ram": [[256, 128]] },
        "cycles": 4
    },
    {
        "name": "E8 ADD SP, e8 sets H and C from the low byte",
        "initial": { "pc": 256, "sp": 65528, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 128, "h": 0, "l": 0, "ram": [[256, 232], [257, 8]] },
        "final": { "pc": 258, "sp": 0, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 48, "h": 0, "l": 0, "ram": [[256, 232], [257, 8]] },
        "cycles": 16
    },
    {
        "name": "27 DAA after an addition",
        "initial": { "pc": 256, "sp": 65534, "a": 125, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 39]] },
        "final": { "pc": 257, "sp": 65534, "a": 131, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 39]] },
        "cycles": 4
    },
    {
        "name": "F8 LD HL, SP + e8 with a negative offset",
        "initial": { "pc": 256, "sp": 1, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 18, "l": 52, "ram": [[256, 248], [257, 255]] },
        "final": { "pc": 258, "sp": 1, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 48, "h": 0, "l": 0, "ram": [[256, 248], [257, 255]] },
        "cycles": 12
    },
    {
        "name": "CB 7E BIT 7, (HL) keeps the carry",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 16, "h": 192, "l": 0, "ram": [[256, 203], [257, 126], [49152, 127]] },
        "final": { "pc": 258, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 176, "h": 192, "l": 0, "ram": [[49152, 127]] },
        "cycles": 12
    },
    {
        "name": "F1 POP AF masks the bottom of F",
        "initial": { "pc": 256, "sp": 49152, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 241], [49152, 255], [49153, 18]] },
        "final": { "pc": 257, "sp": 49154, "a": 18, "b": 0, "c": 0, "d": 0, "e": 0, "f": 240, "h": 0, "l": 0, "ram": [[49152, 255], [49153, 18]] },
        "cycles": 12
    },
    {
        "name": "9F SBC A, A with the carry set",
        "initial": { "pc": 256, "sp": 65534, "a": 16, "b": 0, "c": 0, "d": 0, "e": 0, "f": 16, "h": 0, "l": 0, "ram": [[256, 159]] },
        "final": { "pc": 257, "sp": 65534, "a": 255, "b": 0, "c": 0, "d": 0, "e": 0, "f": 112, "h": 0, "l": 0, "ram": [[256, 159]] },
        "cycles": 4
    },
    {
        "name": "20 JR NZ, e8 taken",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 32], [257, 5]] },
        "final": { "pc": 263, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [] },
        "cycles": 12
    },
    {
        "name": "20 JR NZ, e8 not taken",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 128, "h": 0, "l": 0, "ram": [[256, 32], [257, 5]] },
        "final": { "pc": 258, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 128, "h": 0, "l": 0, "ram": [] },
        "cycles": 8
    },
    {
        "name": "CD CALL a16",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 205], [257, 52], [258, 18]] },
        "final": { "pc": 4660, "sp": 65532, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[65533, 1], [65532, 3]] },
        "cycles": 24
    },
    {
        "name": "FF RST 38",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 255]] },
        "final": { "pc": 56, "sp": 65532, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[65533, 1], [65532, 1]] },
        "cycles": 16
    },
    {
        "name": "32 LD (HL-), A",
        "initial": { "pc": 256, "sp": 65534, "a": 85, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 192, "l": 1, "ram": [[256, 50]] },
        "final": { "pc": 257, "sp": 65534, "a": 85, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 192, "l": 0, "ram": [[49153, 85]] },
        "cycles": 8
    },
    {
        "name": "34 INC (HL) half carry",
        "initial": { "pc": 256, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 16, "h": 192, "l": 0, "ram": [[256, 52], [49152, 15]] },
        "final": { "pc": 257, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 48, "h": 192, "l": 0, "ram": [[49152, 16]] },
        "cycles": 12
    },
    {
        "name": "08 LD (a16), SP",
        "initial": { "pc": 256, "sp": 48879, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 8], [257, 0], [258, 192]] },
        "final": { "pc": 259, "sp": 48879, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[49152, 239], [49153, 190]] },
        "cycles": 20
    },
    {
        "name": "CB 37 SWAP A clears every other flag",
        "initial": { "pc": 256, "sp": 65534, "a": 240, "b": 0, "c": 0, "d": 0, "e": 0, "f": 112, "h": 0, "l": 0, "ram": [[256, 203], [257, 55]] },
        "final": { "pc": 258, "sp": 65534, "a": 15, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [] },
        "cycles": 8
    },
    {
        "name": "1F RRA clears Z",
        "initial": { "pc": 256, "sp": 65534, "a": 1, "b": 0, "c": 0, "d": 0, "e": 0, "f": 0, "h": 0, "l": 0, "ram": [[256, 31]] },
        "final": { "pc": 257, "sp": 65534, "a": 0, "b": 0, "c": 0, "d": 0, "e": 0, "f": 16, "h": 0, "l": 0, "ram": [] },
        "cycles": 4
    }
]"#;

#[derive(Serialize, Deserialize)]
struct CpuTest {
    name: String,
    initial: TestState,
    #[serde(rename = "final")]
    end: TestState,
    cycles: u32,
}

impl CpuTest {
    fn execute(self) -> Result<(), String> {
        let Self {
            name,
            initial,
            end,
            cycles,
        } = self;
        let (mut cpu, mut mem) = initial.build();
        let mut taken = 0;
        while taken < cycles {
            let step = cpu
                .step(&mut mem)
                .map_err(|err| format!("{name}: {err}"))?;
            taken += step as u32;
        }
        if taken != cycles {
            return Err(format!("{name}: took {taken} cycles, expected {cycles}"));
        }
        end.validate(&name, &cpu, &mem)
    }
}

#[derive(Serialize, Deserialize)]
struct TestState {
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    pc: u16,
    sp: u16,
    #[serde(default)]
    ime: u8,
    ram: Vec<RamState>,
}

impl TestState {
    fn registers(&self) -> Cpu {
        Cpu {
            a: self.a,
            f: Flags::from(self.f),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            ime: self.ime != 0,
            ..Cpu::new()
        }
    }

    fn build(&self) -> (Cpu, Vec<u8>) {
        let mut mem = vec![0; 0x10000];
        self.ram
            .iter()
            .for_each(|RamState(addr, val)| mem[*addr as usize] = *val);
        (self.registers(), mem)
    }

    fn validate(&self, name: &str, cpu: &Cpu, mem: &[u8]) -> Result<(), String> {
        let expected = self.registers();
        if &expected != cpu {
            return Err(format!("{name}:\nexpected {expected}\n   found {cpu}"));
        }
        self.ram.iter().try_for_each(|RamState(addr, val)| {
            let found = mem[*addr as usize];
            if found == *val {
                Ok(())
            } else {
                Err(format!(
                    "{name}: 0x{addr:0>4X} holds 0x{found:0>2X}, expected 0x{val:0>2X}"
                ))
            }
        })
    }
}

/// The addr and expected value at that addr in RAM.
#[derive(Serialize, Deserialize)]
struct RamState(u16, u8);

#[test]
fn json_tests() {
    let tests: Vec<CpuTest> = serde_json::from_str(CASES).unwrap();
    let failures: Vec<String> = tests
        .into_iter()
        .filter_map(|test| test.execute().err())
        .collect();
    if !failures.is_empty() {
        panic!("{} failure(s):\n{}", failures.len(), failures.join("\n"));
    }
}

/// Builds a CPU and a flat memory with the given program at 0x0100.
fn with_program(program: &[u8]) -> (Cpu, Vec<u8>) {
    let mut mem = vec![0; 0x10000];
    mem[0x100..0x100 + program.len()].copy_from_slice(program);
    let mut cpu = Cpu::new();
    cpu.sp = 0xD000;
    (cpu, mem)
}

#[test]
fn post_boot_registers() {
    let cpu = Cpu::new();
    assert_eq!(cpu.a, 0x01);
    assert_eq!(cpu.f.as_byte(), 0xB0);
    assert_eq!(cpu.bc(), 0x0013);
    assert_eq!(cpu.de(), 0x00D8);
    assert_eq!(cpu.ptr(), 0x014D);
    assert_eq!(cpu.sp, 0xFFFE);
    assert_eq!(cpu.pc, 0x0100);
    assert!(!cpu.ime);
    assert_eq!(cpu.state, CpuState::Running);
    assert_eq!(Cpu::default(), cpu);
}

#[test]
fn ei_takes_effect_after_the_next_instruction() {
    // EI; NOP; NOP
    let (mut cpu, mut mem) = with_program(&[0xFB, 0x00, 0x00]);
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x01;
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(!cpu.ime);
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(cpu.ime);
    assert_eq!(cpu.pc, 0x0102);
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert_eq!(cpu.pc, InterruptOp::VBlank.vector());
    assert!(!cpu.ime);
    assert_eq!(mem[0xFF0F], 0x00);
    assert_eq!(cpu.sp, 0xCFFE);
    assert_eq!(mem[0xCFFF], 0x01);
    assert_eq!(mem[0xCFFE], 0x02);
}

#[test]
fn repeated_ei_does_not_push_back_interrupts() {
    // EI; EI; NOP
    let (mut cpu, mut mem) = with_program(&[0xFB, 0xFB, 0x00]);
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x01;
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(!cpu.ime);
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(cpu.ime);
    assert_eq!(cpu.pc, 0x0102);
    // The NOP is never run.
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert_eq!(cpu.pc, InterruptOp::VBlank.vector());
    assert!(!cpu.ime);
    assert_eq!(mem[0xCFFF], 0x01);
    assert_eq!(mem[0xCFFE], 0x02);
}

#[test]
fn di_cancels_a_pending_ei() {
    // EI; DI; NOP
    let (mut cpu, mut mem) = with_program(&[0xFB, 0xF3, 0x00]);
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x01;
    for _ in 0..3 {
        assert_eq!(cpu.step(&mut mem), Ok(4));
    }
    assert!(!cpu.ime);
    assert_eq!(cpu.pc, 0x0103);
}

#[test]
fn reti_enables_immediately() {
    // RETI
    let (mut cpu, mut mem) = with_program(&[0xD9]);
    mem[0xD000] = 0x34;
    mem[0xD001] = 0x12;
    assert_eq!(cpu.step(&mut mem), Ok(16));
    assert!(cpu.ime);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn halt_waits_for_pending_interrupt() {
    // HALT; NOP
    let (mut cpu, mut mem) = with_program(&[0x76, 0x00]);
    mem[0xFFFF] = 0x04;
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(cpu.is_halted());
    for _ in 0..10 {
        assert_eq!(cpu.step(&mut mem), Ok(4));
        assert_eq!(cpu.pc, 0x0101);
    }
    // With IME cleared, the CPU wakes up without dispatching
    mem[0xFF0F] = 0x04;
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc, 0x0102);
    assert_eq!(mem[0xFF0F], 0x04);
}

#[test]
fn halt_dispatches_when_enabled() {
    // HALT; NOP
    let (mut cpu, mut mem) = with_program(&[0x76, 0x00]);
    cpu.ime = true;
    mem[0xFFFF] = 0x04;
    cpu.step(&mut mem).unwrap();
    assert!(cpu.is_halted());
    mem[0xFF0F] = 0x04;
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert_eq!(cpu.pc, InterruptOp::Timer.vector());
    // The return address is the instruction after HALT
    assert_eq!(mem[0xCFFE], 0x01);
}

#[test]
fn halt_defect_reads_next_byte_twice() {
    // HALT; INC A; NOP
    let (mut cpu, mut mem) = with_program(&[0x76, 0x3C, 0x00]);
    cpu.a = 0;
    mem[0xFFFF] = 0x04;
    mem[0xFF0F] = 0x04;
    cpu.step(&mut mem).unwrap();
    assert!(!cpu.is_halted());
    assert!(cpu.halt_bug);
    assert_eq!(cpu.pc, 0x0101);
    cpu.step(&mut mem).unwrap();
    assert_eq!(cpu.a, 1);
    assert_eq!(cpu.pc, 0x0101);
    cpu.step(&mut mem).unwrap();
    assert_eq!(cpu.a, 2);
    assert_eq!(cpu.pc, 0x0102);
}

#[test]
fn ei_then_halt_with_pending_returns_to_halt() {
    // EI; HALT; NOP
    let (mut cpu, mut mem) = with_program(&[0xFB, 0x76, 0x00]);
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x01;
    cpu.step(&mut mem).unwrap();
    // HALT runs before IME is set, so it hits the defect
    cpu.step(&mut mem).unwrap();
    assert!(cpu.ime);
    assert!(cpu.halt_bug);
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert!(!cpu.halt_bug);
    assert_eq!(cpu.pc, 0x0040);
    assert_eq!(mem[0xCFFF], 0x01);
    assert_eq!(mem[0xCFFE], 0x01);
}

#[test]
fn push_onto_ie_cancels_dispatch() {
    let (mut cpu, mut mem) = with_program(&[]);
    cpu.pc = 0x0200;
    cpu.sp = 0x0000;
    cpu.ime = true;
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x01;
    assert_eq!(cpu.step(&mut mem), Ok(20));
    // The high byte of PC (0x02) lands in IE, which no longer enables VBlank
    assert_eq!(mem[0xFFFF], 0x02);
    assert_eq!(cpu.pc, 0x0000);
    assert_eq!(mem[0xFF0F], 0x01);
    assert_eq!(cpu.sp, 0xFFFE);
    assert!(!cpu.ime);
}

#[test]
fn push_onto_ie_redirects_dispatch() {
    let (mut cpu, mut mem) = with_program(&[]);
    cpu.pc = 0x0200;
    cpu.sp = 0x0000;
    cpu.ime = true;
    mem[0xFFFF] = 0x01;
    mem[0xFF0F] = 0x03;
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert_eq!(cpu.pc, InterruptOp::LCD.vector());
    assert_eq!(mem[0xFF0F], 0x01);
}

#[test]
fn illegal_opcode_locks_up() {
    let (mut cpu, mut mem) = with_program(&[0xD3]);
    let err = LockedUp {
        opcode: 0xD3,
        address: 0x0100,
    };
    assert_eq!(cpu.step(&mut mem), Err(err));
    assert_eq!(cpu.is_locked(), Some(err));
    assert_eq!(cpu.pc, 0x0100);
    // Nothing, not even an interrupt, gets the CPU out
    cpu.ime = true;
    mem[0xFFFF] = 0x1F;
    mem[0xFF0F] = 0x1F;
    assert_eq!(cpu.step(&mut mem), Err(err));
    assert_eq!(cpu.pc, 0x0100);
}

#[test]
fn stop_waits_for_a_button() {
    let mut mem = MemoryMap::construct();
    // STOP; 0x00; INC A
    mem.rom_mut()[0x100..0x103].copy_from_slice(&[0x10, 0x00, 0x3C]);
    let mut cpu = Cpu::new();
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert_eq!(cpu.state, CpuState::Stopped);
    assert_eq!(cpu.pc, 0x0102);
    assert_eq!(mem.read_byte(0xFF04), 0);
    for _ in 0..10 {
        assert_eq!(cpu.step(&mut mem), Ok(4));
        assert_eq!(cpu.state, CpuState::Stopped);
    }
    mem.register_button_input(ButtonInput::Ssab(SsabInput::Start));
    assert_eq!(cpu.step(&mut mem), Ok(4));
    assert_eq!(cpu.state, CpuState::Running);
    let a = cpu.a;
    cpu.step(&mut mem).unwrap();
    assert_eq!(cpu.a, a.wrapping_add(1));
}

#[test]
fn conditional_cycle_counts() {
    // CALL NZ, a16 (not taken); RET Z (not taken); RET C (taken)
    let (mut cpu, mut mem) = with_program(&[0xC4, 0x00, 0x02, 0xC8, 0xD8]);
    cpu.f = Flags::from(0x90);
    mem[0xD000] = 0x00;
    mem[0xD001] = 0x03;
    // Z is set, so NZ fails
    assert_eq!(cpu.step(&mut mem), Ok(12));
    assert_eq!(cpu.pc, 0x0103);
    cpu.f = Flags::from(0x10);
    assert_eq!(cpu.step(&mut mem), Ok(8));
    assert_eq!(cpu.step(&mut mem), Ok(20));
    assert_eq!(cpu.pc, 0x0300);
}

#[test]
fn flags_display() {
    let flags = Flags::from(0xA0);
    assert_eq!(flags.to_string(), "Flags(Z=1 N=0 H=1 C=0)");
    assert_eq!(flags.as_byte(), 0xA0);
    assert_eq!(Flags::from(0xFF).as_byte(), 0xF0);
}
