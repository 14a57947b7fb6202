#![allow(dead_code)]

use wraith::rom::header_checksum;
use wraith::Gameboy;

/// The address programs built by [`rom`] start at.
pub const PROGRAM_START: u16 = 0x150;

/// Builds a cartridge image with the given program right after the header. The entry point
/// jumps over the header to it.
pub fn rom(cart_type: u8, rom_size: u8, ram_size: u8, program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0; (32 * 1024) << rom_size];
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x134..0x13A].copy_from_slice(b"WRAITH");
    rom[0x147] = cart_type;
    rom[0x148] = rom_size;
    rom[0x149] = ram_size;
    rom[0x14D] = header_checksum(&rom[0x134..=0x14C]);
    let start = PROGRAM_START as usize;
    rom[start..start + program.len()].copy_from_slice(program);
    rom
}

/// A ROM-only session running the given program.
pub fn gameboy(program: &[u8]) -> Gameboy {
    Gameboy::new(rom(0x00, 0x00, 0x00, program)).unwrap()
}

/// Steps until the CPU halts, panicking if that takes more than a few frames.
pub fn run_until_halted(gb: &mut Gameboy) {
    for _ in 0..1_000_000 {
        if gb.cpu().is_halted() {
            return;
        }
        gb.step().unwrap();
    }
    panic!("the program never halted: {}", gb.cpu());
}
