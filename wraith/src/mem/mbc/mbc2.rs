use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::trace;

use super::{ram_enable_write, rom_offset};

/// The number of half-bytes of RAM built into the MBC2 chip.
const MBC2_RAM_SIZE: usize = 512;

#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC2 {
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) rom: Vec<u8>,
    /// Only the lower nibble of each byte is stored.
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) ram: Vec<u8>,
    /// Four bits wide. A write of zero is stored as one.
    rom_bank: u8,
    ram_enabled: bool,
}

impl Display for MBC2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC2 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROMB:  0x{:0>2X}", self.rom_bank)?;
        write!(f, "}}")
    }
}

impl MBC2 {
    pub fn new(rom: Vec<u8>) -> Self {
        Self {
            rom,
            ram: vec![0; MBC2_RAM_SIZE],
            rom_bank: 1,
            ram_enabled: false,
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_enabled = false;
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x3FFF => self.rom[rom_offset(&self.rom, 0, index)],
            0x4000..=0x7FFF => self.rom[rom_offset(&self.rom, self.rom_bank(), index)],
            // Only the bottom 9 bits of the address are used, so the 512 nibbles are echoed
            // throughout the whole region. The upper nibble is open bus.
            0xA000..=0xBFFF if self.ram_enabled => {
                0xF0 | self.ram[index as usize & (MBC2_RAM_SIZE - 1)]
            }
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            // Bit 8 of the address decides which register is written.
            0x0000..=0x3FFF if index & 0x0100 == 0 => self.ram_enabled = ram_enable_write(value),
            0x0000..=0x3FFF => {
                self.rom_bank = match value & 0x0F {
                    0 => 1,
                    n => n,
                };
                trace!("MBC2 switched to ROM bank 0x{:0>2X}", self.rom_bank);
            }
            0xA000..=0xBFFF if self.ram_enabled => {
                self.ram[index as usize & (MBC2_RAM_SIZE - 1)] = value & 0x0F
            }
            _ => {}
        }
    }
}
