use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::trace;

use super::{ram_enable_write, ram_offset, rom_offset};

#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC5 {
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) rom: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    pub(crate) ram: Vec<u8>,
    /// Nine bits wide: the low byte is written via 0x2000-0x2FFF and the ninth bit via
    /// 0x3000-0x3FFF. Unlike the older controllers, zero is a valid value.
    rom_bank: u16,
    /// Four bits wide.
    ram_bank: u8,
    ram_enabled: bool,
}

impl Display for MBC5 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC5 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROMB:  0x{:0>3X}", self.rom_bank)?;
        writeln!(f, "  RAMB:  0x{:0>2X}", self.ram_bank)?;
        write!(f, "}}")
    }
}

impl MBC5 {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        Self {
            rom,
            ram: vec![0; ram_size],
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
        }
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_bank = 0;
        self.ram_enabled = false;
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..=0x3FFF => self.rom[rom_offset(&self.rom, 0, index)],
            0x4000..=0x7FFF => self.rom[rom_offset(&self.rom, self.rom_bank(), index)],
            0xA000..=0xBFFF if self.ram_enabled => {
                ram_offset(&self.ram, self.ram_bank as usize, index)
                    .map(|i| self.ram[i])
                    .unwrap_or(0xFF)
            }
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..=0x1FFF => self.ram_enabled = ram_enable_write(value),
            0x2000..=0x2FFF => {
                self.rom_bank = (self.rom_bank & 0x100) | value as u16;
                trace!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank);
            }
            0x3000..=0x3FFF => {
                self.rom_bank = (self.rom_bank & 0xFF) | (((value & 0x01) as u16) << 8);
                trace!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank);
            }
            // NOTE: Bit 3 drives the motor on rumble carts, which never have more than 64 KiB of
            // RAM.
            0x4000..=0x5FFF => self.ram_bank = value & 0x0F,
            0xA000..=0xBFFF if self.ram_enabled => {
                if let Some(i) = ram_offset(&self.ram, self.ram_bank as usize, index) {
                    self.ram[i] = value;
                }
            }
            _ => {}
        }
    }
}
